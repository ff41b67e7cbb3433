//! Capture → upload → transcription orchestration.
//!
//! `IDLE → RECORDING → UPLOADING → IDLE`. The microphone is owned
//! exclusively for the duration of one capture, and capture and upload are
//! never concurrent for the same session.

use super::recorder::Recorder;
use crate::api::StoryApi;
use crate::error::CaptureError;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Recording,
    Uploading,
}

pub struct TranscriptionPipeline {
    recorder: Box<dyn Recorder>,
    api: Arc<dyn StoryApi>,
    phase: CapturePhase,
}

impl TranscriptionPipeline {
    pub fn new(recorder: Box<dyn Recorder>, api: Arc<dyn StoryApi>) -> Self {
        Self {
            recorder,
            api,
            phase: CapturePhase::Idle,
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Exclusively acquires the microphone. Fails fast with `ResourceBusy`
    /// while a capture or upload is still in progress; a recorder that
    /// cannot get permission never enters RECORDING.
    pub fn begin_capture(&mut self) -> Result<(), CaptureError> {
        if self.phase != CapturePhase::Idle {
            return Err(CaptureError::ResourceBusy);
        }
        self.recorder.start()?;
        self.phase = CapturePhase::Recording;
        Ok(())
    }

    /// Releases the microphone (on every exit path), uploads the captured
    /// audio, and returns the transcribed text. On failure no user turn is
    /// created and the pipeline returns to IDLE.
    pub async fn end_capture(&mut self) -> Result<String, CaptureError> {
        if self.phase != CapturePhase::Recording {
            return Err(CaptureError::NotRecording);
        }

        // The recorder releases the device even when stop fails.
        let audio = self.recorder.stop();
        self.phase = CapturePhase::Uploading;

        let audio = match audio {
            Ok(bytes) => bytes,
            Err(e) => {
                self.phase = CapturePhase::Idle;
                return Err(e);
            }
        };

        let result = self.api.transcribe(audio).await;
        self.phase = CapturePhase::Idle;

        match result {
            Ok(transcription) => Ok(transcription.text),
            Err(e) => Err(CaptureError::Upload(e)),
        }
    }

    #[cfg(test)]
    fn set_phase_for_tests(&mut self, phase: CapturePhase) {
        self.phase = phase;
    }

    /// Abandons an in-progress capture, dropping the audio. The device is
    /// still released.
    pub fn abort(&mut self) {
        if self.phase == CapturePhase::Recording {
            let _ = self.recorder.stop();
        }
        self.phase = CapturePhase::Idle;
    }
}
