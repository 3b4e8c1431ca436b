//! UI-side application state: one gateway, one synchronizer per
//! setting, one device/effect cache, and the request routing that ties
//! replies back to whichever component issued them.

use std::collections::HashMap;
use std::time::Instant;

use log::warn;
use voxpanel_gateway::Gateway;
use voxpanel_messages::{
    Command, DeviceKind, EngineError, Milliseconds, Reply, ReplyValue, RequestId, Subsystem,
};

use crate::spectrum::{FeedPhase, SpectrumFeed, SpectrumView};
use crate::sync::{Commit, DEBOUNCE_WINDOW, SettingSync, SyncStatus};
use crate::toggles::Toggles;

/// Which editable setting a commit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingId {
    Device(DeviceKind),
    Latency,
    Effect,
}

impl SettingId {
    fn label(self) -> &'static str {
        match self {
            SettingId::Device(kind) => kind.label(),
            SettingId::Latency => "Latency",
            SettingId::Effect => "Effect",
        }
    }
}

/// What to do with the reply for an outstanding request.
#[derive(Debug)]
enum PendingAction {
    /// Commit acknowledgment for a setting edit (carries the edit seq).
    Setting(SettingId, u64),
    /// Commit acknowledgment for a toggle change.
    Toggle(Subsystem, u64),
    /// List fetch into the cache.
    DeviceList(DeviceKind),
    EffectList,
    /// Initial-value fetch, landed via `SettingSync::adopt`.
    SettingFetch(SettingId),
    ToggleFetch(Subsystem),
    InitAudio,
    DeinitAudio,
}

/// The single owned cache of device and effect lists; every selector
/// widget reads from here.
#[derive(Default)]
pub struct DeviceCache {
    lists: HashMap<DeviceKind, Vec<String>>,
    effects: Vec<String>,
}

impl DeviceCache {
    pub fn list(&self, kind: DeviceKind) -> &[String] {
        self.lists.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn effects(&self) -> &[String] {
        &self.effects
    }
}

pub struct UiState {
    gateway: Gateway,
    pending: HashMap<RequestId, PendingAction>,

    pub devices: DeviceCache,
    input_device: SettingSync<String>,
    output_device: SettingSync<String>,
    virtual_device: SettingSync<String>,
    latency: SettingSync<Milliseconds>,
    effect: SettingSync<Option<String>>,
    toggles: Toggles,

    feed: SpectrumFeed,
    pub view: SpectrumView,

    /// Short user-visible message for the most recent commit failure.
    status_message: Option<String>,
}

impl UiState {
    pub fn new(gateway: Gateway) -> Self {
        let mut state = Self {
            gateway,
            pending: HashMap::new(),
            devices: DeviceCache::default(),
            input_device: SettingSync::immediate(),
            output_device: SettingSync::immediate(),
            virtual_device: SettingSync::immediate(),
            latency: SettingSync::debounced(DEBOUNCE_WINDOW),
            effect: SettingSync::immediate(),
            toggles: Toggles::new(),
            feed: SpectrumFeed::new(),
            view: SpectrumView::new(),
            status_message: None,
        };
        state.fetch_initial_state();
        state
    }

    /// One reconciling fetch of everything the panel displays: lists,
    /// current selections, latency, effect, subsystem status.
    fn fetch_initial_state(&mut self) {
        for kind in DeviceKind::ALL {
            self.issue(Command::ListDevices(kind), PendingAction::DeviceList(kind));
            self.issue(
                Command::SelectedDevice(kind),
                PendingAction::SettingFetch(SettingId::Device(kind)),
            );
        }
        self.issue(
            Command::GetLatency,
            PendingAction::SettingFetch(SettingId::Latency),
        );
        self.issue(Command::ListEffects, PendingAction::EffectList);
        self.issue(
            Command::CurrentEffect,
            PendingAction::SettingFetch(SettingId::Effect),
        );
        for subsystem in Subsystem::ALL {
            self.issue(
                Command::SubsystemStatus(subsystem),
                PendingAction::ToggleFetch(subsystem),
            );
        }
    }

    /// Refresh the cached lists on demand.
    pub fn refresh_lists(&mut self) {
        for kind in DeviceKind::ALL {
            self.issue(Command::ListDevices(kind), PendingAction::DeviceList(kind));
        }
        self.issue(Command::ListEffects, PendingAction::EffectList);
    }

    fn issue(&mut self, command: Command, action: PendingAction) {
        match self.gateway.send(command) {
            Ok(id) => {
                self.pending.insert(id, action);
            }
            Err(err) => self.send_failed(action, &err),
        }
    }

    /// The command never left the panel; resolve the action as a
    /// failure immediately.
    fn send_failed(&mut self, action: PendingAction, err: &EngineError) {
        match action {
            PendingAction::Setting(id, seq) => self.setting_failed(id, seq, err),
            PendingAction::Toggle(subsystem, seq) => self.toggle_failed(subsystem, seq, err),
            PendingAction::DeviceList(kind) => {
                warn!("{} list fetch failed: {}", kind.label(), err);
            }
            PendingAction::EffectList => warn!("effect list fetch failed: {}", err),
            PendingAction::SettingFetch(id) => warn!("{} fetch failed: {}", id.label(), err),
            PendingAction::ToggleFetch(subsystem) => {
                warn!("{} status fetch failed: {}", subsystem.label(), err);
            }
            PendingAction::InitAudio => {
                self.feed.init_failed();
                self.status_message = Some(format!("Failed to initialize audio: {}", err));
            }
            PendingAction::DeinitAudio => warn!("deinitialize failed: {}", err),
        }
    }

    /// Per-tick pump: route replies, fire the latency debounce timer,
    /// and feed new spectrum frames to the view.
    pub fn tick(&mut self, now: Instant) {
        let replies = self.gateway.drain();
        for reply in replies {
            self.dispatch(reply);
        }

        if let Some(commit) = self.latency.poll(now) {
            let action = PendingAction::Setting(SettingId::Latency, commit.seq);
            self.issue(Command::SetLatency(commit.value), action);
        }

        for frame in self.feed.drain_frames() {
            self.view.set_frame(frame);
        }
    }

    fn dispatch(&mut self, reply: Reply) {
        let Some(action) = self.pending.remove(&reply.id) else {
            warn!("reply {} matches no pending request", reply.id);
            return;
        };

        match (action, reply.result) {
            (PendingAction::Setting(id, seq), Ok(_)) => self.setting_sync_mut(id).confirm(seq),
            (PendingAction::Setting(id, seq), Err(err)) => self.setting_failed(id, seq, &err),

            (PendingAction::Toggle(subsystem, seq), Ok(_)) => self.toggles.confirm(subsystem, seq),
            (PendingAction::Toggle(subsystem, seq), Err(err)) => {
                self.toggle_failed(subsystem, seq, &err)
            }

            (PendingAction::DeviceList(kind), Ok(ReplyValue::Devices(list))) => {
                self.devices.lists.insert(kind, list);
            }
            (PendingAction::DeviceList(kind), result) => {
                // Degrade to an empty list; non-fatal.
                warn!("{} list fetch failed: {:?}", kind.label(), result.err());
                self.devices.lists.insert(kind, Vec::new());
            }

            (PendingAction::EffectList, Ok(ReplyValue::Effects(list))) => {
                self.devices.effects = list;
            }
            (PendingAction::EffectList, result) => {
                warn!("effect list fetch failed: {:?}", result.err());
                self.devices.effects = Vec::new();
            }

            (PendingAction::SettingFetch(SettingId::Device(kind)), Ok(ReplyValue::Device(name))) => {
                self.device_sync_mut(kind).adopt(name);
            }
            (PendingAction::SettingFetch(SettingId::Latency), Ok(ReplyValue::Latency(ms))) => {
                self.latency.adopt(ms);
            }
            (PendingAction::SettingFetch(SettingId::Effect), Ok(ReplyValue::Effect(effect))) => {
                self.effect.adopt(effect);
            }
            (PendingAction::SettingFetch(id), result) => {
                warn!("{} fetch failed: {:?}", id.label(), result.err());
            }

            (PendingAction::ToggleFetch(subsystem), Ok(ReplyValue::Running(running))) => {
                self.toggles.adopt(subsystem, running);
            }
            (PendingAction::ToggleFetch(subsystem), result) => {
                warn!("{} status fetch failed: {:?}", subsystem.label(), result.err());
            }

            (PendingAction::InitAudio, Ok(_)) => {
                let subscription = self.gateway.subscribe_spectrum();
                self.feed.confirm_initialized(subscription);
            }
            (PendingAction::InitAudio, Err(err)) => {
                self.feed.init_failed();
                self.status_message = Some(format!("Failed to initialize audio: {}", err));
            }

            (PendingAction::DeinitAudio, Ok(_)) => {}
            (PendingAction::DeinitAudio, Err(err)) => warn!("deinitialize failed: {}", err),
        }
    }

    fn setting_failed(&mut self, id: SettingId, seq: u64, err: &EngineError) {
        if self.setting_sync_mut(id).fail(seq) {
            self.status_message = Some(format!("{} reverted: {}", id.label(), err));
        }
    }

    fn toggle_failed(&mut self, subsystem: Subsystem, seq: u64, err: &EngineError) {
        if self.toggles.fail(subsystem, seq) {
            self.status_message = Some(format!("{} reverted: {}", subsystem.label(), err));
        }
    }

    fn device_sync_mut(&mut self, kind: DeviceKind) -> &mut SettingSync<String> {
        match kind {
            DeviceKind::Input => &mut self.input_device,
            DeviceKind::Output => &mut self.output_device,
            DeviceKind::Virtual => &mut self.virtual_device,
        }
    }

    fn setting_sync_mut(&mut self, id: SettingId) -> &mut dyn FailableSync {
        match id {
            SettingId::Device(kind) => self.device_sync_mut(kind),
            SettingId::Latency => &mut self.latency,
            SettingId::Effect => &mut self.effect,
        }
    }

    // Accessors for the widgets.

    pub fn device_displayed(&self, kind: DeviceKind) -> Option<&String> {
        match kind {
            DeviceKind::Input => self.input_device.displayed(),
            DeviceKind::Output => self.output_device.displayed(),
            DeviceKind::Virtual => self.virtual_device.displayed(),
        }
    }

    pub fn device_status(&self, kind: DeviceKind) -> SyncStatus {
        match kind {
            DeviceKind::Input => self.input_device.status(),
            DeviceKind::Output => self.output_device.status(),
            DeviceKind::Virtual => self.virtual_device.status(),
        }
    }

    pub fn latency_displayed(&self) -> Option<Milliseconds> {
        self.latency.displayed().copied()
    }

    pub fn effect_displayed(&self) -> Option<&String> {
        self.effect.displayed().and_then(Option::as_ref)
    }

    pub fn toggles(&self) -> &Toggles {
        &self.toggles
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    pub fn feed_phase(&self) -> FeedPhase {
        self.feed.phase()
    }

    // User intents.

    pub fn select_device(&mut self, kind: DeviceKind, name: String, now: Instant) {
        if let Some(Commit { value, seq }) = self.device_sync_mut(kind).edit(name, now) {
            self.issue(
                Command::SetDevice(kind, value),
                PendingAction::Setting(SettingId::Device(kind), seq),
            );
        }
    }

    /// Latency edits are debounced; the commit is issued from `tick`
    /// once the value has been quiescent for the full window.
    /// Non-positive values are shown but never dispatched.
    pub fn edit_latency(&mut self, ms: f32, now: Instant) {
        let latency = Milliseconds(ms);
        if !latency.is_valid_latency() {
            self.latency.preview(latency);
            self.status_message = Some("Latency must be positive".to_string());
            return;
        }
        // Debounced: edit never returns a commit here.
        let _ = self.latency.edit(latency, now);
    }

    /// Select an effect, or clear it by selecting the active one again.
    pub fn choose_effect(&mut self, name: String, now: Instant) {
        let next = if self.effect_displayed() == Some(&name) {
            None
        } else {
            Some(name)
        };
        if let Some(Commit { value, seq }) = self.effect.edit(next, now) {
            let command = match value {
                Some(effect) => Command::SetEffect(effect),
                None => Command::ClearEffect,
            };
            self.issue(command, PendingAction::Setting(SettingId::Effect, seq));
        }
    }

    pub fn set_toggle(&mut self, subsystem: Subsystem, desired: bool, now: Instant) {
        if let Some(Commit { value, seq }) = self.toggles.set(subsystem, desired, now) {
            self.issue(
                Toggles::command_for(subsystem, value),
                PendingAction::Toggle(subsystem, seq),
            );
        }
    }

    /// Open the audio bracket; the subscription is attached once the
    /// engine acknowledges.
    pub fn initialize_feed(&mut self) {
        if self.feed.request_initialize() {
            self.issue(Command::InitializeAudio, PendingAction::InitAudio);
        }
    }

    /// Close the audio bracket and forget the visualizer state.
    pub fn deinitialize_feed(&mut self) {
        if self.feed.detach() {
            self.issue(Command::DeinitializeAudio, PendingAction::DeinitAudio);
            self.view.clear();
        }
    }
}

impl Drop for UiState {
    fn drop(&mut self) {
        // Teardown on window close; `detach` latches so this is a no-op
        // if the bracket was already closed by the button.
        if self.feed.detach() {
            let _ = self.gateway.send(Command::DeinitializeAudio);
        }
    }
}

/// Object-safe view of the per-setting machines, so reply routing can
/// treat differently-typed settings uniformly.
trait FailableSync {
    fn confirm(&mut self, seq: u64);
    fn fail(&mut self, seq: u64) -> bool;
}

impl<T: Clone + PartialEq> FailableSync for SettingSync<T> {
    fn confirm(&mut self, seq: u64) {
        SettingSync::confirm(self, seq);
    }

    fn fail(&mut self, seq: u64) -> bool {
        SettingSync::fail(self, seq)
    }
}
