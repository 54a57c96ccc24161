use crate::{eq_field, ExclusionRules, Item, SamplerSettings, Strategy, DEFAULT_RETRY_BUDGET};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelFilter {
    pub category: String,
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
}

impl ReelFilter {
    pub fn category(category: &str) -> Self {
        Self {
            category: category.to_string(),
            ..Self::default()
        }
    }

    pub fn of_type(category: &str, item_type: &str) -> Self {
        Self {
            category: category.to_string(),
            item_type: Some(item_type.to_string()),
            subtype: None,
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        eq_field(&item.category, &self.category)
            && self
                .item_type
                .as_deref()
                .map_or(true, |wanted| eq_field(&item.item_type, wanted))
            && self
                .subtype
                .as_deref()
                .map_or(true, |wanted| eq_field(&item.subtype, wanted))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelSpec {
    pub id: String,
    pub label: String,
    pub filter: ReelFilter,
    pub slots: usize,
    pub strategy: Strategy,
}

impl ReelSpec {
    fn new(id: &str, label: &str, filter: ReelFilter, slots: usize, strategy: Strategy) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            filter,
            slots,
            strategy,
        }
    }
}

/// Stop offsets for the reel animation, counted across every slot of a pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopSchedule {
    pub first_stop_ms: u64,
    pub stagger_ms: u64,
}

impl Default for StopSchedule {
    fn default() -> Self {
        Self {
            first_stop_ms: 600,
            stagger_ms: 350,
        }
    }
}

impl StopSchedule {
    /// Saturates at `u64::MAX` for oversized schedules.
    pub fn offset(&self, slot: usize) -> u64 {
        (slot as u64)
            .saturating_mul(self.stagger_ms)
            .saturating_add(self.first_stop_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    pub reels: Vec<ReelSpec>,
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
    #[serde(default)]
    pub rules: ExclusionRules,
    #[serde(default)]
    pub stops: StopSchedule,
}

fn default_retry_budget() -> u32 {
    DEFAULT_RETRY_BUDGET
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("machine has no reels")]
    NoReels,
    #[error("reel {index} has an empty id")]
    EmptyReelId { index: usize },
    #[error("duplicate reel id: {0}")]
    DuplicateReel(String),
    #[error("reel {0} must have at least one slot")]
    NoSlots(String),
    #[error("retry budget must be at least 1")]
    NoRetryBudget,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            reels: vec![
                ReelSpec::new(
                    "primary",
                    "Primary",
                    ReelFilter::of_type("weapon", "primary"),
                    1,
                    Strategy::Unique,
                ),
                ReelSpec::new(
                    "secondary",
                    "Secondary",
                    ReelFilter::of_type("weapon", "secondary"),
                    1,
                    Strategy::Unique,
                ),
                ReelSpec::new(
                    "throwable",
                    "Throwable",
                    ReelFilter::of_type("weapon", "throwable"),
                    1,
                    Strategy::Unique,
                ),
                ReelSpec::new(
                    "stratagems",
                    "Stratagems",
                    ReelFilter::category("stratagem"),
                    4,
                    Strategy::Constrained,
                ),
                ReelSpec::new(
                    "booster",
                    "Booster",
                    ReelFilter::category("booster"),
                    1,
                    Strategy::Unique,
                ),
            ],
            retry_budget: DEFAULT_RETRY_BUDGET,
            rules: ExclusionRules::default(),
            stops: StopSchedule::default(),
        }
    }
}

impl MachineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reels.is_empty() {
            return Err(ConfigError::NoReels);
        }
        if self.retry_budget == 0 {
            return Err(ConfigError::NoRetryBudget);
        }
        let mut seen = HashSet::new();
        for (index, reel) in self.reels.iter().enumerate() {
            if reel.id.trim().is_empty() {
                return Err(ConfigError::EmptyReelId { index });
            }
            if !seen.insert(reel.id.as_str()) {
                return Err(ConfigError::DuplicateReel(reel.id.clone()));
            }
            if reel.slots == 0 {
                return Err(ConfigError::NoSlots(reel.id.clone()));
            }
        }
        Ok(())
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            rules: self.rules,
            retry_budget: self.retry_budget,
        }
    }

    pub fn total_slots(&self) -> usize {
        self.reels.iter().map(|reel| reel.slots).sum()
    }

    pub fn reel(&self, id: &str) -> Option<&ReelSpec> {
        self.reels.iter().find(|reel| reel.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_machine_is_valid() {
        let config = MachineConfig::default();
        config.validate().expect("default config");
        assert_eq!(config.total_slots(), 8);
        assert_eq!(
            config.reel("stratagems").map(|reel| reel.strategy),
            Some(Strategy::Constrained)
        );
    }

    #[test]
    fn rejects_duplicate_and_empty_reels() {
        let mut config = MachineConfig::default();
        config.reels[1].id = "primary".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateReel("primary".to_string()))
        );

        let mut config = MachineConfig::default();
        config.reels[4].slots = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NoSlots("booster".to_string()))
        );

        let config = MachineConfig {
            reels: Vec::new(),
            ..MachineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoReels));
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let filter = ReelFilter::of_type("Weapon", "Primary");
        assert!(filter.matches(&Item::new("weapon ", "PRIMARY", "Shotgun", "Breaker")));
        assert!(!filter.matches(&Item::new("weapon", "secondary", "Pistol", "P-2")));
        assert!(ReelFilter::category("booster").matches(&Item::new(
            "Booster",
            "",
            "",
            "Vitality Enhancement"
        )));
    }

    #[test]
    fn stop_offsets_stagger() {
        let stops = StopSchedule {
            first_stop_ms: 100,
            stagger_ms: 50,
        };
        assert_eq!(stops.offset(0), 100);
        assert_eq!(stops.offset(3), 250);
    }

    #[test]
    fn oversized_stagger_saturates() {
        let stops = StopSchedule {
            first_stop_ms: 0,
            stagger_ms: u64::MAX,
        };
        assert_eq!(stops.offset(0), 0);
        assert_eq!(stops.offset(1), u64::MAX);
        assert_eq!(stops.offset(2), u64::MAX);
    }

    #[test]
    fn parses_partial_json_config() {
        let raw = r#"{
            "reels": [
                {"id": "weapons", "label": "Weapons", "filter": {"category": "weapon"},
                 "slots": 3, "strategy": {"kind": "grouped", "field": "type"}}
            ]
        }"#;
        let config: MachineConfig = serde_json::from_str(raw).expect("parse");
        assert_eq!(config.retry_budget, DEFAULT_RETRY_BUDGET);
        assert_eq!(config.stops, StopSchedule::default());
        assert_eq!(config.reels[0].filter.item_type, None);
        config.validate().expect("valid");
    }
}
