//! Per-guild playback state and the seams to the outside world.
//!
//! The actual queue/repeat-mode state machine lives in [`session`]; the
//! [`controller`] wraps it with per-guild locking and wires it to the
//! [`transport`] (songbird) and [`resolver`] (yt-dlp) collaborators.

pub mod controller;
pub mod error;
pub mod resolver;
pub mod session;
pub mod track;
pub mod transport;

pub use controller::{Enqueued, PlayerController};
pub use error::{PlayerError, PlayerResult};
pub use session::QueueSnapshot;
pub use track::{PlaybackStatus, RepeatMode, Track};
pub use transport::{AudioTransport, PlaybackOutcome};
