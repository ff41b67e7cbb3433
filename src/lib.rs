#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

pub mod api;
pub mod app;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod publish;
pub mod session;
pub mod ui;

pub use config::Config;
pub use error::{Result, ScrybeError};
pub use session::{SessionController, TurnOutcome};
