pub mod pipeline;
pub mod recorder;

pub use pipeline::{CapturePhase, TranscriptionPipeline};
pub use recorder::{CpalRecorder, Recorder};
