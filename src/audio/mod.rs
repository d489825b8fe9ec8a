pub mod capture;

pub use capture::{AudioCaptureHandle, AudioFrame, AudioInput, CaptureConfig, DefaultMicrophone};
