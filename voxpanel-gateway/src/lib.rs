pub mod sim;

use std::time::{Duration, Instant};

use flume::{Receiver, Sender};
use log::debug;
use voxpanel_messages::{Command, EngineError, Event, Reply, Request, RequestId, SpectrumFrame};

/// How long the gateway waits for a reply before synthesizing a
/// `Timeout` failure for the pending request.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Receiving end of the `audio-spectrum` push stream.
///
/// Dropping the handle unsubscribes: the gateway notices the
/// disconnected channel on the next forward and stops routing frames.
pub struct SpectrumSubscription {
    rx: Receiver<SpectrumFrame>,
}

impl SpectrumSubscription {
    /// Next frame, if one has been pushed since the last call.
    pub fn try_recv(&self) -> Option<SpectrumFrame> {
        self.rx.try_recv().ok()
    }
}

/// Typed command/reply boundary to the engine.
///
/// The gateway is a plain correlator: it allocates request ids, tracks
/// which ids are still unanswered, and demuxes the engine's event
/// channel into replies (returned from `drain`) and spectrum frames
/// (forwarded to the active subscription). It performs no retries and
/// caches nothing; every command is one round trip.
pub struct Gateway {
    cmd_tx: Sender<Request>,
    event_rx: Receiver<Event>,
    next_id: u64,
    pending: Vec<(RequestId, Instant)>,
    spectrum_tx: Option<Sender<SpectrumFrame>>,
    response_timeout: Duration,
}

impl Gateway {
    pub fn new(cmd_tx: Sender<Request>, event_rx: Receiver<Event>) -> Self {
        Self::with_timeout(cmd_tx, event_rx, RESPONSE_TIMEOUT)
    }

    pub fn with_timeout(
        cmd_tx: Sender<Request>,
        event_rx: Receiver<Event>,
        response_timeout: Duration,
    ) -> Self {
        Self {
            cmd_tx,
            event_rx,
            next_id: 0,
            pending: Vec::new(),
            spectrum_tx: None,
            response_timeout,
        }
    }

    /// Dispatch one command. Returns the id the eventual reply will
    /// carry, or `Unavailable` if the engine end of the channel is gone.
    pub fn send(&mut self, command: Command) -> Result<RequestId, EngineError> {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        debug!("gateway -> {} {:?}", id, command);
        self.cmd_tx
            .send(Request { id, command })
            .map_err(|_| EngineError::Unavailable)?;
        self.pending.push((id, Instant::now()));
        Ok(id)
    }

    /// Open the spectrum push stream. Replaces any previous
    /// subscription; the caller is responsible for only subscribing
    /// after `InitializeAudio` has been acknowledged.
    pub fn subscribe_spectrum(&mut self) -> SpectrumSubscription {
        let (tx, rx) = flume::unbounded();
        self.spectrum_tx = Some(tx);
        SpectrumSubscription { rx }
    }

    /// Pump the event channel: route frames to the subscription, collect
    /// replies for pending requests, and synthesize `Timeout` replies
    /// for requests past the response bound.
    ///
    /// Called once per UI tick; never blocks.
    pub fn drain(&mut self) -> Vec<Reply> {
        let mut replies = Vec::new();

        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                Event::Reply(reply) => {
                    if let Some(at) = self.pending.iter().position(|(id, _)| *id == reply.id) {
                        self.pending.remove(at);
                        replies.push(reply);
                    } else {
                        // Already timed out locally; late answers are dropped.
                        debug!("gateway: dropping late reply {}", reply.id);
                    }
                }
                Event::Spectrum(frame) => self.forward_frame(frame),
            }
        }

        let bound = self.response_timeout;
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].1.elapsed() >= bound {
                let (id, _) = self.pending.remove(i);
                debug!("gateway: request {} timed out", id);
                replies.push(Reply {
                    id,
                    result: Err(EngineError::Timeout),
                });
            } else {
                i += 1;
            }
        }

        replies
    }

    fn forward_frame(&mut self, frame: SpectrumFrame) {
        if let Some(tx) = &self.spectrum_tx {
            if tx.send(frame).is_err() {
                // Subscriber dropped its handle; treat as unsubscribe.
                self.spectrum_tx = None;
            }
        }
    }
}
