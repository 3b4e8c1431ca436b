//! Scripted stand-in for the external audio engine.
//!
//! The real engine lives in another process; this module answers the
//! same command surface against an in-memory model so the panel runs
//! and tests end to end. It serves commands on a dedicated thread and
//! pushes synthetic spectrum frames while the audio bracket is open.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use flume::{Receiver, Sender};
use log::debug;
use voxpanel_messages::{
    Command, DeviceKind, EngineError, Event, Milliseconds, Reply, ReplyValue, Request, Subsystem,
    SpectrumFrame,
};

/// Cadence of synthetic spectrum frames (roughly 30 fps).
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

const SPECTRUM_BINS: usize = 64;
const SAMPLE_RATE: f32 = 48_000.0;

/// In-memory engine model served over the command channel.
pub struct SimEngine {
    cmd_rx: Receiver<Request>,
    event_tx: Sender<Event>,
    devices: HashMap<DeviceKind, Vec<String>>,
    selected: HashMap<DeviceKind, String>,
    latency: Milliseconds,
    running: HashMap<Subsystem, bool>,
    effects: Vec<String>,
    current_effect: Option<String>,
    initialized: bool,
    started: Instant,
    last_frame: Instant,
}

impl SimEngine {
    pub fn new(cmd_rx: Receiver<Request>, event_tx: Sender<Event>) -> Self {
        debug!("constructing sim engine");
        let devices: HashMap<_, _> = [
            (
                DeviceKind::Input,
                vec!["Built-in Microphone".to_string(), "USB Condenser".to_string()],
            ),
            (
                DeviceKind::Output,
                vec![
                    "Built-in Speakers".to_string(),
                    "Studio Headphones".to_string(),
                ],
            ),
            (
                DeviceKind::Virtual,
                vec!["VoxPanel Virtual Cable".to_string()],
            ),
        ]
        .into_iter()
        .collect();
        let selected = devices
            .iter()
            .map(|(kind, names)| (*kind, names[0].clone()))
            .collect();
        Self {
            cmd_rx,
            event_tx,
            devices,
            selected,
            latency: Milliseconds(10.0),
            running: Subsystem::ALL.iter().map(|s| (*s, false)).collect(),
            effects: vec![
                "DemonVoice".to_string(),
                "Chipmunk".to_string(),
                "RoboVoice".to_string(),
                "Chorus".to_string(),
            ],
            current_effect: None,
            initialized: false,
            started: Instant::now(),
            last_frame: Instant::now(),
        }
    }

    /// Serve commands until the panel side of the channel disconnects.
    pub fn run(mut self) -> Result<()> {
        loop {
            match self.cmd_rx.recv_timeout(FRAME_INTERVAL) {
                Ok(request) => {
                    debug!("sim engine received {:?}", request);
                    let reply = Reply {
                        id: request.id,
                        result: self.execute(request.command),
                    };
                    if self.event_tx.send(Event::Reply(reply)).is_err() {
                        break;
                    }
                }
                Err(flume::RecvTimeoutError::Timeout) => {}
                Err(flume::RecvTimeoutError::Disconnected) => break,
            }

            if self.initialized && self.last_frame.elapsed() >= FRAME_INTERVAL {
                self.last_frame = Instant::now();
                if self
                    .event_tx
                    .send(Event::Spectrum(self.synthesize_frame()))
                    .is_err()
                {
                    break;
                }
            }
        }
        Ok(())
    }

    fn execute(&mut self, command: Command) -> Result<ReplyValue, EngineError> {
        match command {
            Command::ListDevices(kind) => Ok(ReplyValue::Devices(self.devices[&kind].clone())),
            Command::SelectedDevice(kind) => Ok(ReplyValue::Device(self.selected[&kind].clone())),
            Command::SetDevice(kind, name) => {
                if !self.devices[&kind].iter().any(|d| *d == name) {
                    return Err(EngineError::Rejected(format!(
                        "unknown {}: {:?}",
                        kind.label().to_lowercase(),
                        name
                    )));
                }
                self.selected.insert(kind, name);
                Ok(ReplyValue::Ack)
            }
            Command::GetLatency => Ok(ReplyValue::Latency(self.latency)),
            Command::SetLatency(latency) => {
                if !latency.is_valid_latency() {
                    return Err(EngineError::Rejected(format!(
                        "latency must be positive, got {}",
                        latency
                    )));
                }
                self.latency = latency;
                Ok(ReplyValue::Ack)
            }
            Command::StartSubsystem(subsystem) => {
                self.running.insert(subsystem, true);
                Ok(ReplyValue::Ack)
            }
            Command::StopSubsystem(subsystem) => {
                self.running.insert(subsystem, false);
                Ok(ReplyValue::Ack)
            }
            Command::SubsystemStatus(subsystem) => Ok(ReplyValue::Running(self.running[&subsystem])),
            Command::ListEffects => Ok(ReplyValue::Effects(self.effects.clone())),
            Command::CurrentEffect => Ok(ReplyValue::Effect(self.current_effect.clone())),
            Command::SetEffect(name) => {
                if !self.effects.iter().any(|e| *e == name) {
                    return Err(EngineError::Rejected(format!("unknown effect: {:?}", name)));
                }
                self.current_effect = Some(name);
                Ok(ReplyValue::Ack)
            }
            Command::ClearEffect => {
                self.current_effect = None;
                Ok(ReplyValue::Ack)
            }
            Command::InitializeAudio => {
                self.initialized = true;
                self.last_frame = Instant::now();
                Ok(ReplyValue::Ack)
            }
            Command::DeinitializeAudio => {
                self.initialized = false;
                Ok(ReplyValue::Ack)
            }
        }
    }

    /// One synthetic frame: a sine-driven peak wandering over a linear
    /// frequency axis up to Nyquist.
    fn synthesize_frame(&self) -> SpectrumFrame {
        let t = self.started.elapsed().as_secs_f64();
        let n = SPECTRUM_BINS;
        let peak = (n as f64 / 2.0) * (1.0 + (t * 0.7).sin()) / 2.0 + n as f64 / 4.0;

        let magnitudes: Vec<f32> = (0..n)
            .map(|i| {
                let d = i as f64 - peak;
                let lobe = 1.0 / (1.0 + d * d * 0.08);
                let ripple = 0.05 * ((i as f64 * 0.9 + t * 3.0).sin() + 1.0);
                (lobe + ripple) as f32
            })
            .collect();
        let frequencies: Vec<f32> = (0..n)
            .map(|i| i as f32 * (SAMPLE_RATE / 2.0) / n as f32)
            .collect();

        SpectrumFrame {
            magnitudes,
            frequencies,
            sample_rate: SAMPLE_RATE,
            timestamp: t,
        }
    }
}
