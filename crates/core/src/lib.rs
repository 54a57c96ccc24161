//! Loadout sampling. Keep this crate free of IO and platform concerns.

pub mod config;
pub mod display;
pub mod item;
pub mod machine;
pub mod rng;
pub mod sampler;
pub mod view;

pub use config::*;
pub use display::*;
pub use item::*;
pub use machine::*;
pub use rng::*;
pub use sampler::*;
pub use view::*;
