#[cfg(test)]
mod tests;

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod frontend;
pub mod invalidation;
pub mod model;

pub use backend::{new_backend, Backend};
pub use config::{Config, Engine};
pub use error::{CacheError, Result};
pub use events::CacheEvent;
pub use frontend::{Cache, CleanReport};
pub use invalidation::ChannelState;
