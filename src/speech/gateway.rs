use crate::audio::{AudioCaptureHandle, AudioFrame};
use crate::error::SessionError;
use crate::speech::client::{RecognitionEvent, Recognizer, SpeechClient};
use crate::speech::messages::{AudioFrameMessage, SessionOpenMessage, TranslationResultMessage};
use crate::speech::TranslationSessionConfig;
use base64::Engine;
use futures::stream::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Speech service client speaking JSON-over-NATS to the streaming gateway.
///
/// Each recognizer gets its own session subject pair: audio frames go out on
/// `speech.audio.<session>`, partial results come back on
/// `speech.result.<session>`. The credential key authenticates the
/// connection; the region rides along in the session announcement.
pub struct GatewaySpeechClient {
    url: String,
}

impl GatewaySpeechClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait::async_trait]
impl SpeechClient for GatewaySpeechClient {
    async fn connect(
        &self,
        config: TranslationSessionConfig,
        audio: &mut AudioCaptureHandle,
    ) -> Result<Box<dyn Recognizer>, SessionError> {
        let frames = audio.take_frames().ok_or_else(|| {
            SessionError::StreamError("audio frame stream already consumed".into())
        })?;

        info!("Connecting to speech gateway at {}", self.url);

        let client = async_nats::ConnectOptions::new()
            .token(config.credential.key.clone())
            .connect(&self.url)
            .await
            .map_err(|e| SessionError::StreamError(format!("gateway connect: {}", e)))?;

        let session_id = uuid::Uuid::new_v4().to_string();

        let open = SessionOpenMessage {
            session_id: session_id.clone(),
            recognition_locale: config.recognition_locale.clone(),
            target_locales: vec![config.target_locale.clone()],
            profanity: config.profanity,
            region: config.credential.region.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&open)
            .map_err(|e| SessionError::StreamError(format!("encode session open: {}", e)))?;

        client
            .publish("speech.session.open", payload.into())
            .await
            .map_err(|e| SessionError::StreamError(format!("announce session: {}", e)))?;

        let subscriber = client
            .subscribe(format!("speech.result.{}", session_id))
            .await
            .map_err(|e| SessionError::StreamError(format!("subscribe results: {}", e)))?;

        info!("Speech gateway session opened: {}", session_id);

        let (event_tx, event_rx) = mpsc::channel(64);
        let result_task = tokio::spawn(receive_results(subscriber, session_id.clone(), event_tx));

        Ok(Box::new(GatewayRecognizer {
            client,
            session_id,
            frames: Some(frames),
            streaming: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            closed: false,
            audio_task: None,
            result_task: Some(result_task),
            events: Some(event_rx),
        }))
    }
}

struct GatewayRecognizer {
    client: async_nats::Client,
    session_id: String,
    frames: Option<mpsc::Receiver<AudioFrame>>,
    streaming: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    closed: bool,
    audio_task: Option<JoinHandle<()>>,
    result_task: Option<JoinHandle<()>>,
    events: Option<mpsc::Receiver<RecognitionEvent>>,
}

#[async_trait::async_trait]
impl Recognizer for GatewayRecognizer {
    async fn start(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::SessionClosed);
        }
        if self.streaming.swap(true, Ordering::SeqCst) {
            warn!("Recognizer already streaming: {}", self.session_id);
            return Ok(());
        }

        let frames = match claim_frames(&mut self.frames) {
            Ok(rx) => rx,
            Err(e) => {
                self.streaming.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        info!("Starting continuous recognition: {}", self.session_id);

        self.audio_task = Some(tokio::spawn(publish_audio(
            self.client.clone(),
            self.session_id.clone(),
            frames,
            Arc::clone(&self.streaming),
            Arc::clone(&self.shutdown),
        )));

        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SessionError> {
        if !self.streaming.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        info!("Stopping continuous recognition: {}", self.session_id);

        // Wake the audio task even if the capture stream has gone quiet; it
        // exits after publishing the final-frame marker.
        self.shutdown.notify_one();

        if let Some(task) = self.audio_task.take() {
            if let Err(e) = task.await {
                error!("Audio publish task panicked: {}", e);
            }
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.stop().await?;

        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Some(task) = self.result_task.take() {
            task.abort();
        }
        self.events = None;
        self.frames = None;

        info!("Speech gateway session closed: {}", self.session_id);

        Ok(())
    }

    fn events(&mut self) -> Option<mpsc::Receiver<RecognitionEvent>> {
        self.events.take()
    }
}

/// The frame stream is consumed by the first start; a recognizer cannot be
/// restarted once its audio has been claimed and torn down.
fn claim_frames(
    frames: &mut Option<mpsc::Receiver<AudioFrame>>,
) -> Result<mpsc::Receiver<AudioFrame>, SessionError> {
    frames
        .take()
        .ok_or_else(|| SessionError::StreamError("audio frame stream already consumed".into()))
}

/// Forward captured audio frames to the gateway until streaming stops, the
/// capture channel closes, or shutdown is signaled, then publish the
/// final-frame marker. Must never require another frame to make progress; a
/// stalled capture device would otherwise wedge stop.
async fn publish_audio(
    client: async_nats::Client,
    session_id: String,
    mut frames: mpsc::Receiver<AudioFrame>,
    streaming: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    let subject = format!("speech.audio.{}", session_id);
    let mut sequence: u32 = 0;
    let mut sample_rate = 16000;
    let mut channels = 1;

    loop {
        let frame = tokio::select! {
            maybe = frames.recv() => match maybe {
                Some(frame) => frame,
                None => break,
            },
            _ = shutdown.notified() => break,
        };

        if !streaming.load(Ordering::SeqCst) {
            break;
        }

        sample_rate = frame.sample_rate;
        channels = frame.channels;

        let pcm_bytes: Vec<u8> = frame.samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let message = AudioFrameMessage {
            session_id: session_id.clone(),
            sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(&pcm_bytes),
            sample_rate,
            channels,
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame: false,
        };

        match serde_json::to_vec(&message) {
            Ok(payload) => {
                if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                    error!("Failed to publish audio frame: {}", e);
                }
            }
            Err(e) => error!("Failed to encode audio frame: {}", e),
        }

        sequence += 1;
    }

    let final_marker = AudioFrameMessage {
        session_id: session_id.clone(),
        sequence,
        pcm: String::new(),
        sample_rate,
        channels,
        timestamp: chrono::Utc::now().to_rfc3339(),
        final_frame: true,
    };

    match serde_json::to_vec(&final_marker) {
        Ok(payload) => {
            if let Err(e) = client.publish(subject, payload.into()).await {
                error!("Failed to publish final frame marker: {}", e);
            }
        }
        Err(e) => error!("Failed to encode final frame marker: {}", e),
    }

    info!("Audio publishing stopped: {}", session_id);
}

/// Map gateway result messages into recognition events, filtered by session.
async fn receive_results(
    mut subscriber: async_nats::Subscriber,
    session_id: String,
    event_tx: mpsc::Sender<RecognitionEvent>,
) {
    while let Some(msg) = subscriber.next().await {
        let result = match serde_json::from_slice::<TranslationResultMessage>(&msg.payload) {
            Ok(result) => result,
            Err(e) => {
                warn!("Failed to parse translation result: {}", e);
                continue;
            }
        };

        if result.session_id != session_id {
            continue;
        }

        if let Some(message) = result.error {
            error!("Speech service reported stream failure: {}", message);
            let _ = event_tx.send(RecognitionEvent::Error { message }).await;
            break;
        }

        let event = RecognitionEvent::Partial {
            offset_ms: result.offset_ms,
            text: result.text,
            translations: result.translations,
        };

        if event_tx.send(event).await.is_err() {
            break;
        }
    }
}
