use thiserror::Error;

/// Failures surfaced by the session lifecycle.
///
/// `stop`/`close`/`release` paths never produce these; they are idempotent
/// and swallow "already stopped" conditions. Everything here is reported to
/// the controller so the visible state can reflect it.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No microphone input device present, or permission was denied.
    /// Not retried automatically; the user has to fix the device/permission
    /// and start again.
    #[error("no usable microphone input: {0}")]
    DeviceUnavailable(String),

    /// Subscription key or region is empty. Caught when building the session
    /// config, before the remote service gets a chance to reject the
    /// connection asynchronously and less informatively.
    #[error("speech credential incomplete: {0} is empty")]
    MissingCredential(&'static str),

    /// Operation attempted on a torn-down session.
    #[error("recognition session is closed")]
    SessionClosed,

    /// Mid-session network or service failure.
    #[error("recognition stream failed: {0}")]
    StreamError(String),
}
