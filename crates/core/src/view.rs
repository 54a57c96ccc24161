//! Serializable views of a pull for front ends.

use crate::{image_sources, label, ImageSource, Item, Pull, SlotMachine};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub empty: bool,
    pub name: String,
    pub category: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub subtype: String,
    pub label: String,
    pub images: Vec<ImageSource>,
    pub stop_at_ms: u64,
}

impl SlotView {
    pub fn new(item: Option<&Item>, stop_at_ms: u64) -> Self {
        let label = label(item).to_string();
        match item {
            Some(item) => Self {
                empty: false,
                name: item.name.clone(),
                category: item.category.clone(),
                item_type: item.item_type.clone(),
                subtype: item.subtype.clone(),
                label,
                images: image_sources(item),
                stop_at_ms,
            },
            None => Self {
                empty: true,
                name: String::new(),
                category: String::new(),
                item_type: String::new(),
                subtype: String::new(),
                label,
                images: Vec::new(),
                stop_at_ms,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReelView {
    pub id: String,
    pub label: String,
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullView {
    pub seed: u64,
    pub reels: Vec<ReelView>,
}

impl PullView {
    pub fn new(machine: &SlotMachine, pull: &Pull) -> Self {
        let reels = pull
            .reels
            .iter()
            .map(|reel| ReelView {
                id: reel.id.clone(),
                label: reel.label.clone(),
                slots: reel
                    .slots
                    .iter()
                    .map(|slot| {
                        let item = slot.item.and_then(|idx| machine.item(idx));
                        SlotView::new(item, slot.stop_at_ms)
                    })
                    .collect(),
            })
            .collect();
        Self {
            seed: pull.seed,
            reels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MachineConfig, RngState};

    #[test]
    fn empty_slots_have_label_and_no_images() {
        let view = SlotView::new(None, 900);
        assert!(view.empty);
        assert_eq!(view.label, crate::EMPTY_LABEL);
        assert!(view.images.is_empty());
        assert_eq!(view.stop_at_ms, 900);
    }

    #[test]
    fn pull_view_serializes_slot_fields() {
        let items = vec![Item::new("Booster", "", "", "Stamina Enhancement")];
        let machine = SlotMachine::new(MachineConfig::default(), items).expect("machine");
        let pull = machine.pull(&mut RngState::from_seed(4));
        let view = PullView::new(&machine, &pull);
        let json = serde_json::to_value(&view).expect("json");
        let booster = &json["reels"][4]["slots"][0];
        assert_eq!(booster["name"], "Stamina Enhancement");
        assert_eq!(booster["empty"], false);
        assert_eq!(booster["images"][0]["kind"], "placeholder");
        assert_eq!(json["reels"][0]["slots"][0]["empty"], true);
        assert_eq!(json["seed"], 4);
    }
}
