pub mod defs;

pub use defs::{EnrichedPost, RawPost, TAG_OPTIONS};
