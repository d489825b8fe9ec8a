use crate::error::SessionError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc as std_mpsc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, mono)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for microphone capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
    /// Frame channel depth before backpressure drops frames
    pub channel_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            buffer_duration_ms: 100, // 100ms buffers
            channel_capacity: 64,
        }
    }
}

/// Source of microphone capture handles.
///
/// The seam between the session lifecycle and the platform audio layer:
/// production code uses [`DefaultMicrophone`], tests substitute a fake that
/// tracks handle exclusivity.
pub trait AudioInput: Send + Sync {
    /// Bind the platform's default microphone input.
    ///
    /// Fails with `DeviceUnavailable` when no input device is present or
    /// permission is denied. Not retried automatically.
    fn open(&self) -> Result<AudioCaptureHandle, SessionError>;
}

/// An acquired microphone input.
///
/// Exactly one handle exists per active recognition session; while held, the
/// platform marks the microphone as in use. `release` is idempotent and also
/// runs on drop.
pub struct AudioCaptureHandle {
    device_name: String,
    frames: Option<mpsc::Receiver<AudioFrame>>,
    releaser: Option<Box<dyn FnOnce() + Send>>,
}

impl AudioCaptureHandle {
    /// Assemble a handle from a frame stream and a teardown hook.
    pub fn new(
        device_name: String,
        frames: mpsc::Receiver<AudioFrame>,
        releaser: Box<dyn FnOnce() + Send>,
    ) -> Self {
        Self {
            device_name,
            frames: Some(frames),
            releaser: Some(releaser),
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Hand the frame stream to the recognizer. One-shot: returns `None` on
    /// subsequent calls.
    pub fn take_frames(&mut self) -> Option<mpsc::Receiver<AudioFrame>> {
        self.frames.take()
    }

    pub fn is_acquired(&self) -> bool {
        self.releaser.is_some()
    }

    /// Release the device. No-op on an already-released handle.
    pub fn release(&mut self) {
        if let Some(release) = self.releaser.take() {
            info!("Releasing microphone: {}", self.device_name);
            release();
        }
        self.frames = None;
    }
}

impl Drop for AudioCaptureHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// The platform default microphone, captured through cpal.
///
/// cpal streams are not `Send`, so the stream lives on a dedicated thread
/// that forwards i16 PCM frames into a tokio channel until released.
pub struct DefaultMicrophone {
    config: CaptureConfig,
}

impl DefaultMicrophone {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }
}

impl AudioInput for DefaultMicrophone {
    fn open(&self) -> Result<AudioCaptureHandle, SessionError> {
        let (frame_tx, frame_rx) = mpsc::channel(self.config.channel_capacity);
        let (ready_tx, ready_rx) = std_mpsc::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let buffer_duration_ms = self.config.buffer_duration_ms;

        std::thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || {
                capture_thread(frame_tx, ready_tx, stop_rx, buffer_duration_ms);
            })
            .map_err(|e| SessionError::DeviceUnavailable(e.to_string()))?;

        // Wait for the thread to bind the device so permission/device errors
        // abort the load, not the first frame.
        let device_name = ready_rx
            .recv()
            .map_err(|_| {
                SessionError::DeviceUnavailable("capture thread exited during setup".into())
            })??;

        info!("Acquired microphone: {}", device_name);

        Ok(AudioCaptureHandle::new(
            device_name,
            frame_rx,
            Box::new(move || {
                // Thread exits when it sees the stop signal (or the sender
                // is gone entirely).
                let _ = stop_tx.send(());
            }),
        ))
    }
}

fn capture_thread(
    frame_tx: mpsc::Sender<AudioFrame>,
    ready_tx: std_mpsc::Sender<Result<String, SessionError>>,
    stop_rx: std_mpsc::Receiver<()>,
    buffer_duration_ms: u64,
) {
    let stream = match bind_default_input(frame_tx, buffer_duration_ms) {
        Ok((stream, name)) => {
            let _ = ready_tx.send(Ok(name));
            stream
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    // Park until release. A disconnected sender counts as release too, so a
    // leaked handle still frees the device when the process winds down.
    let _ = stop_rx.recv();
    drop(stream);
}

fn bind_default_input(
    frame_tx: mpsc::Sender<AudioFrame>,
    buffer_duration_ms: u64,
) -> Result<(cpal::Stream, String), SessionError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| SessionError::DeviceUnavailable("no default input device".into()))?;

    let device_name = device.name().unwrap_or_else(|_| "<unknown>".into());

    let supported = device
        .default_input_config()
        .map_err(|e| SessionError::DeviceUnavailable(format!("{}: {}", device_name, e)))?;

    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels();
    let samples_per_frame = (sample_rate as u64 * buffer_duration_ms / 1000).max(1) as usize;

    let mut accumulator = FrameAccumulator::new(frame_tx, sample_rate, channels, samples_per_frame);
    let err_fn = |err| warn!("Microphone stream error: {}", err);

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &supported.into(),
            move |data: &[f32], _: &_| {
                accumulator.push(data.iter().map(|&s| f32_to_i16(s)));
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &supported.into(),
            move |data: &[i16], _: &_| {
                accumulator.push(data.iter().copied());
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_input_stream(
            &supported.into(),
            move |data: &[u16], _: &_| {
                accumulator.push(data.iter().map(|&s| (s as i32 - 32768) as i16));
            },
            err_fn,
            None,
        ),
        format => {
            return Err(SessionError::DeviceUnavailable(format!(
                "unsupported sample format {:?} on {}",
                format, device_name
            )))
        }
    };

    let stream =
        stream.map_err(|e| SessionError::DeviceUnavailable(format!("{}: {}", device_name, e)))?;

    stream
        .play()
        .map_err(|e| SessionError::DeviceUnavailable(format!("{}: {}", device_name, e)))?;

    Ok((stream, device_name))
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Collects callback samples into fixed-duration frames and ships them on
/// the tokio channel. Runs inside the cpal callback; frames are dropped
/// rather than blocking when the consumer falls behind.
struct FrameAccumulator {
    frame_tx: mpsc::Sender<AudioFrame>,
    sample_rate: u32,
    channels: u16,
    samples_per_frame: usize,
    pending: Vec<i16>,
    frames_sent: u64,
    buffer_duration_ms: u64,
}

impl FrameAccumulator {
    fn new(
        frame_tx: mpsc::Sender<AudioFrame>,
        sample_rate: u32,
        channels: u16,
        samples_per_frame: usize,
    ) -> Self {
        // samples_per_frame is per-channel; duration derives back from it
        let buffer_duration_ms = samples_per_frame as u64 * 1000 / sample_rate as u64;
        Self {
            frame_tx,
            sample_rate,
            channels,
            samples_per_frame,
            pending: Vec::with_capacity(samples_per_frame),
            frames_sent: 0,
            buffer_duration_ms,
        }
    }

    fn push(&mut self, samples: impl Iterator<Item = i16>) {
        if self.channels <= 1 {
            self.pending.extend(samples);
        } else {
            // Downmix interleaved channels to mono by averaging each frame
            let ch = self.channels as usize;
            let interleaved: Vec<i16> = samples.collect();
            for group in interleaved.chunks_exact(ch) {
                let sum: i32 = group.iter().map(|&s| s as i32).sum();
                self.pending.push((sum / ch as i32) as i16);
            }
        }

        while self.pending.len() >= self.samples_per_frame {
            let rest = self.pending.split_off(self.samples_per_frame);
            let samples = std::mem::replace(&mut self.pending, rest);
            let frame = AudioFrame {
                samples,
                sample_rate: self.sample_rate,
                channels: 1,
                timestamp_ms: self.frames_sent * self.buffer_duration_ms,
            };
            self.frames_sent += 1;
            // Drop the frame when the consumer lags; never block the
            // platform callback.
            let _ = self.frame_tx.try_send(frame);
        }
    }
}
