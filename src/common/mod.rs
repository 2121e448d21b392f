mod state;

pub use state::{AppState, CachedResponse, ResponseCache};
