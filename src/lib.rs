pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `jsmill::pipeline` instead of `jsmill::core::pipeline`
pub use self::core::*;
pub use self::utils::*;
