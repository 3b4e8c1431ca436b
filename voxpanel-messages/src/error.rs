/// Failure taxonomy for gateway round trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Transport down: the engine process is gone or the channel closed.
    Unavailable,
    /// The engine received the command and refused it (e.g. unknown
    /// device name).
    Rejected(String),
    /// No reply arrived within the gateway's response bound.
    Timeout,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Unavailable => write!(f, "engine unavailable"),
            EngineError::Rejected(reason) => write!(f, "command rejected: {}", reason),
            EngineError::Timeout => write!(f, "engine did not respond in time"),
        }
    }
}

impl std::error::Error for EngineError {}
