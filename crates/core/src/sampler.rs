//! Random selection of items from a pool.
//!
//! Every sampler works on a fresh index array over an immutable pool slice and
//! returns a [`Selection`]: one entry per requested slot, `None` where the slot
//! could not be filled. Indices refer into the pool that was sampled.

use crate::{normalize, Item, ItemField, RngState};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use tracing::debug;

pub type Selection = Vec<Option<usize>>;

pub const DEFAULT_RETRY_BUDGET: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRules {
    pub max_backpacks: usize,
    pub max_heavy_support: usize,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            max_backpacks: 1,
            max_heavy_support: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    backpacks: usize,
    heavy_support: usize,
}

impl Tally {
    fn add(&mut self, item: &Item) {
        if item.has_backpack {
            self.backpacks += 1;
        }
        if item.is_heavy_support() {
            self.heavy_support += 1;
        }
    }
}

impl ExclusionRules {
    pub fn allows<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> bool {
        let mut tally = Tally::default();
        for item in items {
            tally.add(item);
        }
        self.within(&tally)
    }

    fn within(&self, tally: &Tally) -> bool {
        tally.backpacks <= self.max_backpacks && tally.heavy_support <= self.max_heavy_support
    }

    fn admits(&self, tally: &Tally, candidate: &Item) -> bool {
        let mut next = *tally;
        next.add(candidate);
        self.within(&next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerSettings {
    #[serde(default)]
    pub rules: ExclusionRules,
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
}

fn default_retry_budget() -> u32 {
    DEFAULT_RETRY_BUDGET
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            rules: ExclusionRules::default(),
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    Unique,
    Constrained,
    Grouped { field: ItemField },
}

impl Strategy {
    pub fn sample<T: Borrow<Item>>(
        &self,
        pool: &[T],
        count: usize,
        settings: &SamplerSettings,
        rng: &mut RngState,
    ) -> Selection {
        match self {
            Strategy::Unique => sample_unique(pool.len(), count, rng),
            Strategy::Constrained => sample_constrained(pool, count, settings, rng),
            Strategy::Grouped { field } => sample_grouped(pool, *field, count, rng),
        }
    }
}

/// Draws `count` distinct indices out of `0..len`, padding with `None` once
/// the pool runs dry.
pub fn sample_unique(len: usize, count: usize, rng: &mut RngState) -> Selection {
    let mut remaining: Vec<usize> = (0..len).collect();
    let mut picks = Vec::with_capacity(count);
    for _ in 0..count {
        if remaining.is_empty() {
            picks.push(None);
            continue;
        }
        let at = rng.index(remaining.len());
        picks.push(Some(remaining.swap_remove(at)));
    }
    picks
}

/// Unique sampling under [`ExclusionRules`].
///
/// Up to `retry_budget` independent unconstrained draws are tried first; the
/// first one that satisfies the rules wins. When none does, the selection is
/// built greedily: random candidates are accepted when they keep the rules
/// satisfied and dropped otherwise. The greedy pass is best effort and can
/// leave empty slots even when a full valid selection exists.
pub fn sample_constrained<T: Borrow<Item>>(
    pool: &[T],
    count: usize,
    settings: &SamplerSettings,
    rng: &mut RngState,
) -> Selection {
    if count == 0 {
        return Vec::new();
    }
    let rules = &settings.rules;
    for _ in 0..settings.retry_budget {
        let draw = sample_unique(pool.len(), count, rng);
        if rules.allows(draw.iter().flatten().map(|&idx| pool[idx].borrow())) {
            return draw;
        }
    }
    debug!(
        pool = pool.len(),
        count,
        attempts = settings.retry_budget,
        "no valid random draw, building selection greedily"
    );
    greedy_fill(pool, count, rules, rng)
}

fn greedy_fill<T: Borrow<Item>>(
    pool: &[T],
    count: usize,
    rules: &ExclusionRules,
    rng: &mut RngState,
) -> Selection {
    let mut remaining: Vec<usize> = (0..pool.len()).collect();
    let mut picks = Vec::with_capacity(count);
    let mut tally = Tally::default();
    while picks.len() < count && !remaining.is_empty() {
        let at = rng.index(remaining.len());
        let idx = remaining.swap_remove(at);
        let item = pool[idx].borrow();
        if rules.admits(&tally, item) {
            tally.add(item);
            picks.push(Some(idx));
        }
    }
    picks.resize(count, None);
    picks
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub key: String,
    pub members: Vec<usize>,
}

/// Buckets pool indices by the normalized value of `field`, in first-seen order.
pub fn group_by<T: Borrow<Item>>(pool: &[T], field: ItemField) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = Vec::new();
    for (idx, item) in pool.iter().enumerate() {
        let key = normalize(item.borrow().field(field));
        match buckets.iter_mut().find(|bucket| bucket.key == key) {
            Some(bucket) => bucket.members.push(idx),
            None => buckets.push(Bucket {
                key,
                members: vec![idx],
            }),
        }
    }
    buckets
}

/// One item from each of `count` distinct buckets. Buckets are never reused,
/// so slots past the bucket count come back empty.
pub fn sample_grouped<T: Borrow<Item>>(
    pool: &[T],
    field: ItemField,
    count: usize,
    rng: &mut RngState,
) -> Selection {
    let buckets = group_by(pool, field);
    let mut keys: Vec<usize> = (0..buckets.len()).collect();
    let mut picks = Vec::with_capacity(count);
    for _ in 0..count {
        if keys.is_empty() {
            picks.push(None);
            continue;
        }
        let at = rng.index(keys.len());
        let members = &buckets[keys.swap_remove(at)].members;
        picks.push(Some(members[rng.index(members.len())]));
    }
    picks
}
