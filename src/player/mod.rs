pub mod commands;
pub mod controller;
pub mod error;
pub mod state;

pub use controller::{PlayerController, PlayerEvent};
pub use error::PlayerError;
pub use state::{
    format_clock, Frame, PlaybackCursor, PlayerMode, PlayerOptions, PlayerSnapshot, PlayerStatus,
    SessionPlayer, TickOutcome, DEFAULT_CUE_THRESHOLD_SECS,
};
