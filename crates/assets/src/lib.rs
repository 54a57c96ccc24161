//! Image pipeline: download the images a dataset links to, resize them for the
//! web front end and record the resized paths back into the dataset.

mod error;
mod fetch;
mod layout;
mod pipeline;
mod resize;
mod slug;

pub use error::*;
pub use fetch::*;
pub use layout::*;
pub use pipeline::*;
pub use resize::*;
pub use slug::*;
