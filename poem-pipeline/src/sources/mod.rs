pub mod bluesky;

pub use bluesky::BlueskyClient;
