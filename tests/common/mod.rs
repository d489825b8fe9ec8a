// Shared fakes for the session lifecycle tests: an in-memory microphone that
// tracks handle exclusivity and a speech client whose recognizers are driven
// by the test pushing events.
#![allow(dead_code)]

use live_translate::{
    AudioCaptureHandle, AudioFrame, AudioInput, Credential, RecognitionEvent, Recognizer,
    SessionError, SpeechClient, TranslationSessionConfig,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub fn credential() -> Credential {
    Credential {
        key: "test-key".to_string(),
        region: "test-region".to_string(),
    }
}

// ============================================================================
// Fake microphone
// ============================================================================

#[derive(Default)]
pub struct FakeMicrophone {
    /// Total successful opens
    pub opens: AtomicUsize,
    /// Handles currently held
    pub concurrently_open: Arc<AtomicUsize>,
    /// High-water mark of concurrently held handles
    pub max_concurrent: Arc<AtomicUsize>,
    /// When set, open fails with DeviceUnavailable
    pub fail: AtomicBool,
    /// Thread the last successful open ran on
    pub opened_on: Mutex<Option<std::thread::ThreadId>>,
}

impl FakeMicrophone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

impl AudioInput for FakeMicrophone {
    fn open(&self) -> Result<AudioCaptureHandle, SessionError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SessionError::DeviceUnavailable("fake microphone down".into()));
        }

        self.opens.fetch_add(1, Ordering::SeqCst);
        *self.opened_on.lock().unwrap() = Some(std::thread::current().id());
        let open = self.concurrently_open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(open, Ordering::SeqCst);

        let (frame_tx, frame_rx) = mpsc::channel(8);
        let concurrently_open = Arc::clone(&self.concurrently_open);

        Ok(AudioCaptureHandle::new(
            "fake-mic".to_string(),
            frame_rx,
            Box::new(move || {
                concurrently_open.fetch_sub(1, Ordering::SeqCst);
                drop(frame_tx);
            }),
        ))
    }
}

// ============================================================================
// Fake speech client / recognizer
// ============================================================================

/// Test-side hooks for one connected recognizer
pub struct FakeSessionHooks {
    pub config: TranslationSessionConfig,
    pub event_tx: mpsc::Sender<RecognitionEvent>,
    pub started: Arc<AtomicBool>,
    pub stopped: Arc<AtomicBool>,
    pub closed: Arc<AtomicBool>,
}

#[derive(Default)]
pub struct FakeSpeechClient {
    pub sessions: Mutex<Vec<FakeSessionHooks>>,
    /// When set, recognizer stop drains the captured frame stream before
    /// returning, the way the gateway's audio task winds down
    stall_stop_until_frames_close: AtomicBool,
}

impl FakeSpeechClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stall_stop_until_frames_close(&self) {
        self.stall_stop_until_frames_close
            .store(true, Ordering::SeqCst);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Event sender for the most recently connected recognizer
    pub fn latest_tx(&self) -> mpsc::Sender<RecognitionEvent> {
        self.sessions
            .lock()
            .unwrap()
            .last()
            .expect("no recognizer connected yet")
            .event_tx
            .clone()
    }

    /// Event sender for the recognizer connected `index`-th (0-based)
    pub fn tx_at(&self, index: usize) -> mpsc::Sender<RecognitionEvent> {
        self.sessions.lock().unwrap()[index].event_tx.clone()
    }

    pub fn config_at(&self, index: usize) -> TranslationSessionConfig {
        self.sessions.lock().unwrap()[index].config.clone()
    }

    pub fn closed_at(&self, index: usize) -> bool {
        self.sessions.lock().unwrap()[index]
            .closed
            .load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SpeechClient for FakeSpeechClient {
    async fn connect(
        &self,
        config: TranslationSessionConfig,
        audio: &mut AudioCaptureHandle,
    ) -> Result<Box<dyn Recognizer>, SessionError> {
        // Consume the frame stream the way the real client does
        let frames = audio
            .take_frames()
            .ok_or_else(|| SessionError::StreamError("frames already taken".into()))?;
        let frames = self
            .stall_stop_until_frames_close
            .load(Ordering::SeqCst)
            .then_some(frames);

        let (event_tx, event_rx) = mpsc::channel(16);
        let started = Arc::new(AtomicBool::new(false));
        let stopped = Arc::new(AtomicBool::new(false));
        let closed = Arc::new(AtomicBool::new(false));

        self.sessions.lock().unwrap().push(FakeSessionHooks {
            config,
            event_tx,
            started: Arc::clone(&started),
            stopped: Arc::clone(&stopped),
            closed: Arc::clone(&closed),
        });

        Ok(Box::new(FakeRecognizer {
            streaming: false,
            terminated: false,
            events: Some(event_rx),
            frames,
            started,
            stopped,
            closed,
        }))
    }
}

pub struct FakeRecognizer {
    streaming: bool,
    terminated: bool,
    events: Option<mpsc::Receiver<RecognitionEvent>>,
    frames: Option<mpsc::Receiver<AudioFrame>>,
    started: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl Recognizer for FakeRecognizer {
    async fn start(&mut self) -> Result<(), SessionError> {
        if self.terminated {
            return Err(SessionError::SessionClosed);
        }
        self.streaming = true;
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SessionError> {
        // In stall mode, wait for the capture side to close the frame
        // channel before reporting stopped
        if let Some(mut frames) = self.frames.take() {
            while frames.recv().await.is_some() {}
        }

        self.streaming = false;
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.streaming = false;
        self.terminated = true;
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn events(&mut self) -> Option<mpsc::Receiver<RecognitionEvent>> {
        self.events.take()
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn partial(offset_ms: u64, text: &str, translations: &[(&str, &str)]) -> RecognitionEvent {
    RecognitionEvent::Partial {
        offset_ms,
        text: text.to_string(),
        translations: translations
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    }
}

pub fn stream_error(message: &str) -> RecognitionEvent {
    RecognitionEvent::Error {
        message: message.to_string(),
    }
}

/// Poll a condition until it holds or a second passes. The event pump applies
/// updates asynchronously, so assertions on visible state go through here.
#[allow(unused_macros)]
macro_rules! eventually {
    ($cond:expr) => {{
        let mut ok = false;
        for _ in 0..100 {
            if $cond {
                ok = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        ok
    }};
}

/// Give in-flight pump events a chance to be processed (or dropped)
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
