//! Dataset and configuration loading.

pub mod load;
pub mod schema;
pub mod table;

pub use load::*;
pub use schema::*;
pub use table::*;
