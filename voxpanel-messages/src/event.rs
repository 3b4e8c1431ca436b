use crate::{EngineError, Milliseconds, RequestId};

/// One snapshot of per-bin magnitude data pushed by the engine.
///
/// `magnitudes` and `frequencies` are index-aligned and always the same
/// length; the length itself may vary between deliveries.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    pub magnitudes: Vec<f32>,
    pub frequencies: Vec<f32>,
    pub sample_rate: f32,
    pub timestamp: f64,
}

impl SpectrumFrame {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Index alignment invariant between magnitudes and frequencies.
    pub fn is_consistent(&self) -> bool {
        self.magnitudes.len() == self.frequencies.len()
    }
}

/// Successful payloads, one variant per reply shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyValue {
    /// Acknowledgment with no payload (setters, start/stop, init/deinit).
    Ack,
    Devices(Vec<String>),
    Device(String),
    Latency(Milliseconds),
    Running(bool),
    Effects(Vec<String>),
    /// `None` means no effect is active.
    Effect(Option<String>),
}

/// The engine's answer to one `Request`.
#[derive(Debug, Clone)]
pub struct Reply {
    pub id: RequestId,
    pub result: Result<ReplyValue, EngineError>,
}

/// Events sent from the engine to the control panel.
#[derive(Debug, Clone)]
pub enum Event {
    /// Answer to a pending request.
    Reply(Reply),
    /// Spectrum push; only delivered inside the initialize/deinitialize
    /// bracket.
    Spectrum(SpectrumFrame),
}
