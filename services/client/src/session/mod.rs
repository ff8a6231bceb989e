pub mod manager;
pub mod watcher;

pub use manager::SessionManager;
pub use watcher::spawn_session_watcher;
