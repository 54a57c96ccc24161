use divedraw_core::{
    image_sources, ConfigError, ImageSource, Item, ItemField, MachineConfig, ReelFilter, ReelSpec,
    RngState, SlotMachine, StopSchedule, Strategy,
};

fn dataset() -> Vec<Item> {
    let mut items = vec![
        Item::new("Weapon", "Primary", "Assault Rifle", "AR-23 Liberator"),
        Item::new("Weapon", "Primary", "Shotgun", "SG-225 Breaker"),
        Item::new("Weapon", "Secondary", "Pistol", "P-2 Peacemaker"),
        Item::new("Weapon", "Throwable", "Standard", "G-12 High Explosive"),
        Item::new("Booster", "", "", "Vitality Enhancement"),
        Item::new("Booster", "", "", "Stamina Enhancement"),
    ];
    items.extend([
        Item::new("Stratagem", "Support Weapon", "Heavy", "Autocannon").with_backpack(true),
        Item::new("Stratagem", "Support Weapon", "Heavy", "Railgun"),
        Item::new("Stratagem", "Support Weapon", "Expendable", "EAT-17"),
        Item::new("Stratagem", "Backpack", "", "Jump Pack").with_backpack(true),
        Item::new("Stratagem", "Orbital", "", "Orbital Laser"),
        Item::new("Stratagem", "Eagle", "", "Eagle Airstrike"),
        Item::new("Stratagem", "Sentry", "", "Gatling Sentry"),
    ]);
    items
}

#[test]
fn default_pull_fills_every_reel_from_its_own_pool() {
    let machine = SlotMachine::new(MachineConfig::default(), dataset()).expect("machine");
    for seed in 0..50 {
        let pull = machine.pull(&mut RngState::from_seed(seed));
        assert_eq!(pull.reels.len(), 5);
        assert_eq!(pull.empty_slots(), 0, "seed {seed}");
        for (reel, spec) in pull.reels.iter().zip(&machine.config().reels) {
            assert_eq!(reel.id, spec.id);
            assert_eq!(reel.slots.len(), spec.slots);
            for slot in &reel.slots {
                let item = slot.item.and_then(|idx| machine.item(idx)).expect("filled");
                assert!(spec.filter.matches(item), "{} in {}", item.name, reel.id);
            }
        }
        let stratagems: Vec<&Item> = pull.reels[3]
            .slots
            .iter()
            .filter_map(|slot| slot.item.and_then(|idx| machine.item(idx)))
            .collect();
        assert!(stratagems.iter().filter(|item| item.has_backpack).count() <= 1);
        assert!(stratagems.iter().filter(|item| item.is_heavy_support()).count() <= 1);
    }
}

#[test]
fn stop_offsets_increase_across_reels() {
    let machine = SlotMachine::new(MachineConfig::default(), dataset()).expect("machine");
    let pull = machine.pull(&mut RngState::from_seed(1));
    let stops: Vec<u64> = pull.slots().map(|slot| slot.stop_at_ms).collect();
    assert_eq!(stops.len(), 8);
    assert!(stops.windows(2).all(|pair| pair[0] < pair[1]));
    let schedule = StopSchedule::default();
    assert_eq!(stops[0], schedule.first_stop_ms);
    assert_eq!(stops[7], schedule.offset(7));
}

#[test]
fn missing_category_leaves_empty_slots() {
    let items: Vec<Item> = dataset()
        .into_iter()
        .filter(|item| item.category != "Booster")
        .collect();
    let machine = SlotMachine::new(MachineConfig::default(), items).expect("machine");
    let pull = machine.pull(&mut RngState::from_seed(3));
    assert_eq!(pull.empty_slots(), 1);
    assert_eq!(pull.reels[4].slots[0].item, None);
}

#[test]
fn pulls_replay_from_seed() {
    let machine = SlotMachine::new(MachineConfig::default(), dataset()).expect("machine");
    let first = machine.pull(&mut RngState::from_seed(77));
    let second = machine.pull(&mut RngState::from_seed(first.seed));
    assert_eq!(first, second);
}

#[test]
fn grouped_reel_spreads_across_types() {
    let config = MachineConfig {
        reels: vec![ReelSpec {
            id: "weapons".to_string(),
            label: "Weapons".to_string(),
            filter: ReelFilter::category("weapon"),
            slots: 3,
            strategy: Strategy::Grouped {
                field: ItemField::Type,
            },
        }],
        ..MachineConfig::default()
    };
    let machine = SlotMachine::new(config, dataset()).expect("machine");
    for seed in 0..20 {
        let pull = machine.pull(&mut RngState::from_seed(seed));
        let mut types: Vec<String> = pull
            .slots()
            .filter_map(|slot| slot.item.and_then(|idx| machine.item(idx)))
            .map(|item| item.item_type.to_lowercase())
            .collect();
        types.sort();
        assert_eq!(types, vec!["primary", "secondary", "throwable"]);
    }
}

#[test]
fn huge_stagger_in_json_config_still_pulls() {
    let raw = r#"{
        "reels": [
            {"id": "stratagems", "label": "Stratagems", "filter": {"category": "stratagem"},
             "slots": 3, "strategy": {"kind": "constrained"}}
        ],
        "stops": {"first_stop_ms": 0, "stagger_ms": 18446744073709551615}
    }"#;
    let config: MachineConfig = serde_json::from_str(raw).expect("parse");
    let machine = SlotMachine::new(config, dataset()).expect("machine");
    let pull = machine.pull(&mut RngState::from_seed(5));
    let stops: Vec<u64> = pull.slots().map(|slot| slot.stop_at_ms).collect();
    assert_eq!(stops, vec![0, u64::MAX, u64::MAX]);
}

#[test]
fn invalid_config_is_rejected() {
    let config = MachineConfig {
        retry_budget: 0,
        ..MachineConfig::default()
    };
    let err = SlotMachine::new(config, dataset()).expect_err("zero budget");
    assert_eq!(err, ConfigError::NoRetryBudget);
}

#[test]
fn pulled_items_resolve_to_images() {
    let item = dataset()[0]
        .clone()
        .with_images("assets/images/resized/weapon/primary/ar-23.png", "");
    let sources = image_sources(&item);
    assert_eq!(
        sources[0],
        ImageSource::Resized("assets/images/resized/weapon/primary/ar-23.png".to_string())
    );
    assert!(matches!(sources.last(), Some(ImageSource::Placeholder(_))));
}
