pub mod controller;
pub mod reveal;
pub mod state;
pub mod turn;

pub use controller::{SessionController, TurnOutcome};
pub use reveal::RevealScheduler;
pub use state::{Chapter, SessionState, TurnEntry, TurnRole};
pub use turn::{Effect, apply_directive};
