use crate::{ConfigError, Item, MachineConfig, ReelSpec, RngState, SamplerSettings};
use serde::Serialize;

#[derive(Debug, Clone)]
struct Reel {
    spec: ReelSpec,
    /// Indices into the machine's item list that pass the reel filter.
    pool: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct SlotMachine {
    config: MachineConfig,
    items: Vec<Item>,
    reels: Vec<Reel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotOutcome {
    /// Index into [`SlotMachine::items`]; `None` marks an empty slot.
    pub item: Option<usize>,
    pub stop_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReelOutcome {
    pub id: String,
    pub label: String,
    pub slots: Vec<SlotOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pull {
    /// Seed of the generator that produced the pull. A fresh `RngState` from
    /// this seed replays it.
    pub seed: u64,
    pub reels: Vec<ReelOutcome>,
}

impl Pull {
    pub fn slots(&self) -> impl Iterator<Item = &SlotOutcome> {
        self.reels.iter().flat_map(|reel| reel.slots.iter())
    }

    pub fn empty_slots(&self) -> usize {
        self.slots().filter(|slot| slot.item.is_none()).count()
    }
}

impl SlotMachine {
    pub fn new(config: MachineConfig, items: Vec<Item>) -> Result<Self, ConfigError> {
        config.validate()?;
        let reels = config
            .reels
            .iter()
            .map(|spec| Reel {
                spec: spec.clone(),
                pool: items
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| spec.filter.matches(item))
                    .map(|(idx, _)| idx)
                    .collect(),
            })
            .collect();
        Ok(Self {
            config,
            items,
            reels,
        })
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, idx: usize) -> Option<&Item> {
        self.items.get(idx)
    }

    /// Pool sizes per reel, in reel order.
    pub fn pool_sizes(&self) -> Vec<(&str, usize)> {
        self.reels
            .iter()
            .map(|reel| (reel.spec.id.as_str(), reel.pool.len()))
            .collect()
    }

    pub fn pull(&self, rng: &mut RngState) -> Pull {
        let settings: SamplerSettings = self.config.sampler_settings();
        let stops = self.config.stops;
        let mut slot_index = 0;
        let mut reels = Vec::with_capacity(self.reels.len());
        for reel in &self.reels {
            let pool: Vec<&Item> = reel.pool.iter().map(|&idx| &self.items[idx]).collect();
            let picks = reel
                .spec
                .strategy
                .sample(&pool, reel.spec.slots, &settings, rng);
            let slots = picks
                .into_iter()
                .map(|pick| {
                    let outcome = SlotOutcome {
                        item: pick.map(|local| reel.pool[local]),
                        stop_at_ms: stops.offset(slot_index),
                    };
                    slot_index += 1;
                    outcome
                })
                .collect();
            reels.push(ReelOutcome {
                id: reel.spec.id.clone(),
                label: reel.spec.label.clone(),
                slots,
            });
        }
        Pull {
            seed: rng.seed(),
            reels,
        }
    }
}
