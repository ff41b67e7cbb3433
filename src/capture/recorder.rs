//! Microphone ownership.
//!
//! The device is an exclusive resource: one capture at a time, released on
//! every exit path. The cpal stream is not `Send`, so a dedicated thread
//! owns it for the lifetime of the capture and hands the samples back when
//! told to stop.

use crate::error::CaptureError;
use cpal::SampleFormat;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::{WavSpec, WavWriter};
use std::io::Cursor;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Capture collaborator the transcription pipeline drives. Implementations
/// must release the underlying device in `stop` unconditionally.
pub trait Recorder: Send {
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Stops the capture and returns the recorded audio as WAV bytes.
    fn stop(&mut self) -> Result<Vec<u8>, CaptureError>;
}

struct CaptureWorker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<Result<CapturedAudio, CaptureError>>,
}

struct CapturedAudio {
    samples: Vec<i16>,
    channels: u16,
    sample_rate: u32,
}

/// Default-input-device recorder backed by cpal.
pub struct CpalRecorder {
    worker: Option<CaptureWorker>,
}

impl CpalRecorder {
    pub fn new() -> Self {
        Self { worker: None }
    }
}

impl Default for CpalRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder for CpalRecorder {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.worker.is_some() {
            return Err(CaptureError::ResourceBusy);
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), CaptureError>>();

        let handle = std::thread::spawn(move || capture_thread(&ready_tx, &stop_rx));

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.worker = Some(CaptureWorker { stop_tx, handle });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CaptureError::Device("capture thread died during setup".into()))
            }
        }
    }

    fn stop(&mut self) -> Result<Vec<u8>, CaptureError> {
        let worker = self.worker.take().ok_or(CaptureError::NotRecording)?;
        let _ = worker.stop_tx.send(());
        let captured = worker
            .handle
            .join()
            .map_err(|_| CaptureError::Device("capture thread panicked".into()))??;
        encode_wav(&captured.samples, captured.channels, captured.sample_rate)
    }
}

fn capture_thread(
    ready_tx: &mpsc::Sender<Result<(), CaptureError>>,
    stop_rx: &mpsc::Receiver<()>,
) -> Result<CapturedAudio, CaptureError> {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        let err = CaptureError::PermissionDenied("no input device available".into());
        let _ = ready_tx.send(Err(err.clone()));
        return Err(err);
    };

    let default_config = match device.default_input_config() {
        Ok(c) => c,
        Err(e) => {
            let err = CaptureError::Device(format!("no usable input config: {e}"));
            let _ = ready_tx.send(Err(err.clone()));
            return Err(err);
        }
    };

    let sample_format = default_config.sample_format();
    let config: cpal::StreamConfig = default_config.into();
    let channels = config.channels;
    let sample_rate = config.sample_rate.0;

    let samples: Arc<Mutex<Vec<i16>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&samples);
    let err_fn = |err: cpal::StreamError| {
        tracing::warn!("audio stream error: {err}");
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &_| {
                if let Ok(mut buf) = sink.lock() {
                    buf.extend_from_slice(data);
                }
            },
            err_fn,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &_| {
                if let Ok(mut buf) = sink.lock() {
                    buf.extend(
                        data.iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16),
                    );
                }
            },
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &_| {
                if let Ok(mut buf) = sink.lock() {
                    buf.extend(data.iter().map(|&s| (i32::from(s) - 32768) as i16));
                }
            },
            err_fn,
            None,
        ),
        other => {
            let err = CaptureError::Device(format!("unsupported sample format {other:?}"));
            let _ = ready_tx.send(Err(err.clone()));
            return Err(err);
        }
    };

    let stream = match stream {
        Ok(s) => s,
        Err(e) => {
            let err = map_build_error(&e);
            let _ = ready_tx.send(Err(err.clone()));
            return Err(err);
        }
    };

    if let Err(e) = stream.play() {
        let err = CaptureError::Device(format!("failed to start stream: {e}"));
        let _ = ready_tx.send(Err(err.clone()));
        return Err(err);
    }

    let _ = ready_tx.send(Ok(()));

    // Block until the pipeline asks us to stop (or it drops the sender).
    let _ = stop_rx.recv();
    drop(stream);

    let samples = samples
        .lock()
        .map_err(|_| CaptureError::Device("sample buffer poisoned".into()))?
        .clone();
    Ok(CapturedAudio {
        samples,
        channels,
        sample_rate,
    })
}

fn map_build_error(err: &cpal::BuildStreamError) -> CaptureError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => {
            CaptureError::PermissionDenied("input device not available".into())
        }
        other => CaptureError::Device(other.to_string()),
    }
}

/// Encodes interleaved i16 samples as 16-bit mono WAV, folding multi-channel
/// input by averaging.
fn encode_wav(samples: &[i16], channels: u16, sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| CaptureError::Device(format!("wav encode: {e}")))?;

        if channels <= 1 {
            for &s in samples {
                writer
                    .write_sample(s)
                    .map_err(|e| CaptureError::Device(format!("wav encode: {e}")))?;
            }
        } else {
            for frame in samples.chunks(usize::from(channels)) {
                let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                let mono = (sum / i32::from(channels)) as i16;
                writer
                    .write_sample(mono)
                    .map_err(|e| CaptureError::Device(format!("wav encode: {e}")))?;
            }
        }

        writer
            .finalize()
            .map_err(|e| CaptureError::Device(format!("wav encode: {e}")))?;
    }
    Ok(cursor.into_inner())
}
