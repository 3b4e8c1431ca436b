/// Duration in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Milliseconds(pub f32);

impl std::fmt::Display for Milliseconds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0} ms", self.0)
    }
}

impl Milliseconds {
    pub const fn as_ms(self) -> f32 {
        self.0
    }

    /// Latency values must be strictly positive before dispatch.
    pub fn is_valid_latency(self) -> bool {
        self.0 > 0.0
    }
}

impl From<f32> for Milliseconds {
    fn from(ms: f32) -> Self {
        Self(ms)
    }
}

impl From<Milliseconds> for f32 {
    fn from(ms: Milliseconds) -> Self {
        ms.0
    }
}

/// Frequency in Hertz.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Hertz(pub f32);

impl std::fmt::Display for Hertz {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 >= 1_000.0 {
            write!(f, "{:.1} kHz", self.0 / 1_000.0)
        } else {
            write!(f, "{:.0} Hz", self.0)
        }
    }
}

impl Hertz {
    pub const fn as_hz(self) -> f32 {
        self.0
    }
}

impl From<f32> for Hertz {
    fn from(hz: f32) -> Self {
        Self(hz)
    }
}
