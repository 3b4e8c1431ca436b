/// The three device roles the engine routes audio between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Input,
    Output,
    Virtual,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 3] = [DeviceKind::Input, DeviceKind::Output, DeviceKind::Virtual];

    pub fn label(self) -> &'static str {
        match self {
            DeviceKind::Input => "Input Device",
            DeviceKind::Output => "Output Device",
            DeviceKind::Virtual => "Virtual Device",
        }
    }
}

/// Independent engine subsystems controlled by start/stop pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// Input monitored straight back to the output device.
    Loopback,
    /// Input routed through processing to the virtual device.
    Throughput,
    /// Modulation chain applied to the processed stream.
    Modulation,
}

impl Subsystem {
    pub const ALL: [Subsystem; 3] = [
        Subsystem::Loopback,
        Subsystem::Throughput,
        Subsystem::Modulation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Subsystem::Loopback => "Loopback",
            Subsystem::Throughput => "Throughput",
            Subsystem::Modulation => "Modulation",
        }
    }
}
