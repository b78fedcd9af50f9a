//! Token stores - in-memory and file-backed.

mod file;
mod memory;

pub use file::FileTokenStore;
pub use memory::InMemoryTokenStore;
