// Cache frontend: orchestration, serialization, TTL defaulting, tags.

pub mod cache;
pub mod tags;

pub use cache::{Cache, CleanReport};
pub use tags::TagIndex;

#[cfg(test)]
mod tags_test;
