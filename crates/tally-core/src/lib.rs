pub mod entities;
pub mod error;
pub mod extract;
mod offsets;
pub mod segment;
pub mod types;

pub use error::*;
pub use extract::{ExtractOptions, extract_action_items, extract_action_items_with, extract_with_source};
pub use types::*;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
