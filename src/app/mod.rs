//! Application state and core logic

pub mod round;
pub mod state;
pub mod timer;

pub use round::RoundState;
pub use state::{App, WordMode};
