use crate::{DeviceKind, Milliseconds, Subsystem};

/// Correlation id for a request/reply pair. Allocated by the gateway,
/// strictly increasing per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Commands sent from the control panel to the engine.
///
/// Each command is a single round trip; the engine answers with a
/// `Reply` carrying the same `RequestId`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// List the available devices of one kind.
    ListDevices(DeviceKind),
    /// Query the currently selected device of one kind.
    SelectedDevice(DeviceKind),
    /// Select a device by name. Unknown names are rejected engine-side.
    SetDevice(DeviceKind, String),
    /// Query the processing latency.
    GetLatency,
    /// Set the processing latency.
    SetLatency(Milliseconds),
    /// Start one engine subsystem.
    StartSubsystem(Subsystem),
    /// Stop one engine subsystem.
    StopSubsystem(Subsystem),
    /// Query whether one subsystem is running.
    SubsystemStatus(Subsystem),
    /// List the available voice effects.
    ListEffects,
    /// Query the active effect, if any.
    CurrentEffect,
    /// Activate an effect by name.
    SetEffect(String),
    /// Deactivate the active effect.
    ClearEffect,
    /// Open the spectrum bracket; frames may arrive after this succeeds.
    InitializeAudio,
    /// Close the spectrum bracket; no frames arrive afterwards.
    DeinitializeAudio,
}

/// A command tagged with its correlation id.
#[derive(Debug, Clone)]
pub struct Request {
    pub id: RequestId,
    pub command: Command,
}
