//! Spectrum push-stream consumer.
//!
//! The feed owns the init/subscribe lifecycle and the rolling smoothing
//! state. Subscription is only established after the engine has
//! acknowledged `InitializeAudio`; teardown drops the subscription and
//! tells the owner to close the audio bracket, at most once per bracket.

use log::warn;
use voxpanel_gateway::SpectrumSubscription;
use voxpanel_messages::SpectrumFrame;

/// Weight of the previous smoothed value when blending in a new frame.
const SMOOTHING: f32 = 0.7;

/// Elementwise exponential smoothing over magnitude sequences.
///
/// The first frame passes through unsmoothed. When consecutive frames
/// differ in length, indices past the overlap have no previous value
/// and pass through too; the stored state always ends up the length of
/// the newest frame.
#[derive(Debug, Default)]
pub struct Smoother {
    previous: Vec<f32>,
    primed: bool,
}

impl Smoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, magnitudes: &[f32]) -> Vec<f32> {
        let smoothed: Vec<f32> = magnitudes
            .iter()
            .enumerate()
            .map(|(i, &new)| match self.previous.get(i) {
                Some(&prev) if self.primed => new * (1.0 - SMOOTHING) + prev * SMOOTHING,
                _ => new,
            })
            .collect();
        self.previous = smoothed.clone();
        self.primed = true;
        smoothed
    }

    pub fn reset(&mut self) {
        self.previous.clear();
        self.primed = false;
    }
}

/// One smoothed frame, ready for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedFrame {
    pub magnitudes: Vec<f32>,
    pub frequencies: Vec<f32>,
    pub sample_rate: f32,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// No audio bracket open; no subscription.
    Uninitialized,
    /// `InitializeAudio` sent, acknowledgment outstanding.
    Initializing,
    /// Bracket open and subscribed; frames flow.
    Ready,
}

pub struct SpectrumFeed {
    phase: FeedPhase,
    subscription: Option<SpectrumSubscription>,
    smoother: Smoother,
}

impl SpectrumFeed {
    pub fn new() -> Self {
        Self {
            phase: FeedPhase::Uninitialized,
            subscription: None,
            smoother: Smoother::new(),
        }
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    /// Move to `Initializing`. Returns false (and does nothing) unless
    /// the feed is currently uninitialized; the caller sends
    /// `InitializeAudio` exactly when this returns true.
    pub fn request_initialize(&mut self) -> bool {
        if self.phase != FeedPhase::Uninitialized {
            return false;
        }
        self.phase = FeedPhase::Initializing;
        true
    }

    /// The engine acknowledged initialization; attach the subscription
    /// the caller opened.
    pub fn confirm_initialized(&mut self, subscription: SpectrumSubscription) {
        if self.phase != FeedPhase::Initializing {
            warn!("spectrum feed: unexpected init acknowledgment in {:?}", self.phase);
            return;
        }
        self.subscription = Some(subscription);
        self.phase = FeedPhase::Ready;
    }

    /// Initialization failed; back to square one, no subscription.
    pub fn init_failed(&mut self) {
        self.phase = FeedPhase::Uninitialized;
        self.subscription = None;
    }

    /// Drain pending frames in arrival order, smoothing each. Frames
    /// violating the magnitude/frequency alignment invariant are
    /// dropped with a warning.
    pub fn drain_frames(&mut self) -> Vec<SmoothedFrame> {
        let mut raw = Vec::new();
        if let Some(subscription) = &self.subscription {
            while let Some(frame) = subscription.try_recv() {
                raw.push(frame);
            }
        }

        let mut frames = Vec::with_capacity(raw.len());
        for frame in raw {
            if !frame.is_consistent() {
                warn!(
                    "spectrum feed: dropping misaligned frame ({} magnitudes, {} frequencies)",
                    frame.magnitudes.len(),
                    frame.frequencies.len()
                );
                continue;
            }
            frames.push(self.smooth(frame));
        }
        frames
    }

    fn smooth(&mut self, frame: SpectrumFrame) -> SmoothedFrame {
        SmoothedFrame {
            magnitudes: self.smoother.apply(&frame.magnitudes),
            frequencies: frame.frequencies,
            sample_rate: frame.sample_rate,
            timestamp: frame.timestamp,
        }
    }

    /// Tear down: drop the subscription and reset the smoothing state.
    /// Returns true exactly once per open bracket — that is the signal
    /// to send `DeinitializeAudio`. Safe to call any time, including
    /// before initialization ever completed.
    pub fn detach(&mut self) -> bool {
        let was_open = self.phase != FeedPhase::Uninitialized;
        self.phase = FeedPhase::Uninitialized;
        self.subscription = None;
        self.smoother.reset();
        was_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxpanel_gateway::Gateway;
    use voxpanel_messages::{Event, Request};

    fn frame(magnitudes: Vec<f32>, frequencies: Vec<f32>) -> SpectrumFrame {
        SpectrumFrame {
            magnitudes,
            frequencies,
            sample_rate: 48_000.0,
            timestamp: 0.0,
        }
    }

    /// Gateway wired to raw channels so tests can push engine events by
    /// hand.
    fn test_gateway() -> (Gateway, flume::Sender<Event>, flume::Receiver<Request>) {
        let (cmd_tx, cmd_rx) = flume::unbounded();
        let (event_tx, event_rx) = flume::unbounded();
        (Gateway::new(cmd_tx, event_rx), event_tx, cmd_rx)
    }

    #[test]
    fn first_frame_passes_through_unsmoothed() {
        let mut smoother = Smoother::new();
        assert_eq!(smoother.apply(&[1.0, 5.0, 2.0]), vec![1.0, 5.0, 2.0]);
    }

    #[test]
    fn constant_stream_stays_at_the_input_value() {
        let mut smoother = Smoother::new();
        let input = [0.25f32, 4.0, 1.5];

        let first = smoother.apply(&input);
        assert_eq!(first, input.to_vec());

        for _ in 0..10 {
            let out = smoother.apply(&input);
            for (o, i) in out.iter().zip(input.iter()) {
                assert!((o - i).abs() < 1e-4, "smoothed {} drifted from {}", o, i);
            }
        }
    }

    #[test]
    fn smoothing_blends_three_to_seven() {
        let mut smoother = Smoother::new();
        smoother.apply(&[10.0]);
        let out = smoother.apply(&[0.0]);
        assert!((out[0] - 7.0).abs() < 1e-4);
    }

    #[test]
    fn longer_frame_smooths_only_the_overlap() {
        let mut smoother = Smoother::new();
        smoother.apply(&[10.0, 10.0]);

        let out = smoother.apply(&[0.0, 0.0, 40.0]);
        assert!((out[0] - 7.0).abs() < 1e-4);
        assert!((out[1] - 7.0).abs() < 1e-4);
        assert_eq!(out[2], 40.0, "index past the overlap passes through");
    }

    #[test]
    fn shorter_frame_truncates_the_state() {
        let mut smoother = Smoother::new();
        smoother.apply(&[10.0, 10.0, 10.0]);

        let out = smoother.apply(&[0.0]);
        assert_eq!(out.len(), 1);

        // Next frame only has one previous index to blend with.
        let next = smoother.apply(&[0.0, 8.0]);
        assert_eq!(next[1], 8.0);
    }

    #[test]
    fn no_subscription_until_init_is_acknowledged() {
        let (mut gateway, event_tx, _cmd_rx) = test_gateway();
        let mut feed = SpectrumFeed::new();

        assert!(feed.request_initialize());
        assert_eq!(feed.phase(), FeedPhase::Initializing);
        // Double-starting is refused.
        assert!(!feed.request_initialize());

        // A frame pushed while the ack is outstanding reaches nobody.
        event_tx
            .send(Event::Spectrum(frame(vec![1.0], vec![100.0])))
            .unwrap();
        gateway.drain();
        assert!(feed.drain_frames().is_empty());

        feed.confirm_initialized(gateway.subscribe_spectrum());
        assert_eq!(feed.phase(), FeedPhase::Ready);

        event_tx
            .send(Event::Spectrum(frame(vec![1.0, 2.0], vec![100.0, 200.0])))
            .unwrap();
        gateway.drain();
        assert_eq!(feed.drain_frames().len(), 1);
    }

    #[test]
    fn failed_init_returns_to_uninitialized() {
        let mut feed = SpectrumFeed::new();
        assert!(feed.request_initialize());
        feed.init_failed();

        assert_eq!(feed.phase(), FeedPhase::Uninitialized);
        // Never-opened bracket needs no deinitialize.
        assert!(!feed.detach());
        // And a fresh attempt is allowed.
        assert!(feed.request_initialize());
    }

    #[test]
    fn detach_fires_exactly_once_per_bracket() {
        let (mut gateway, _event_tx, _cmd_rx) = test_gateway();
        let mut feed = SpectrumFeed::new();

        assert!(!feed.detach(), "nothing to tear down yet");

        feed.request_initialize();
        feed.confirm_initialized(gateway.subscribe_spectrum());

        assert!(feed.detach());
        assert!(!feed.detach(), "second teardown is a no-op");
    }

    #[test]
    fn misaligned_frames_are_dropped() {
        let (mut gateway, event_tx, _cmd_rx) = test_gateway();
        let mut feed = SpectrumFeed::new();
        feed.request_initialize();
        feed.confirm_initialized(gateway.subscribe_spectrum());

        event_tx
            .send(Event::Spectrum(frame(vec![1.0, 2.0], vec![100.0])))
            .unwrap();
        gateway.drain();
        assert!(feed.drain_frames().is_empty());
    }
}
