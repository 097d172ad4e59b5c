// Cache entry model.

pub mod entry;

pub use entry::Entry;
