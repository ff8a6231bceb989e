pub mod file_store;
pub mod http;
pub mod memory_store;
mod wire;

pub use file_store::FileStore;
pub use http::{build_headers, HeaderOptions, HttpBackend};
pub use memory_store::MemoryStore;
