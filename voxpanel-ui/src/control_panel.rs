use std::time::Instant;

use eframe::egui::{Color32, ComboBox, DragValue, Response, RichText, Ui, Widget};
use voxpanel_messages::{DeviceKind, Subsystem};

use crate::state::UiState;
use crate::sync::SyncStatus;

/// Settings panel: device selectors, latency, effects, and the three
/// subsystem toggles. All state lives in `UiState`; this widget only
/// renders it and forwards intents.
pub struct ControlPanelView<'a> {
    state: &'a mut UiState,
    now: Instant,
}

impl<'a> ControlPanelView<'a> {
    pub fn new(state: &'a mut UiState, now: Instant) -> Self {
        Self { state, now }
    }

    fn device_selector(&mut self, ui: &mut Ui, kind: DeviceKind) {
        let items = self.state.devices.list(kind).to_vec();
        let selected = self.state.device_displayed(kind).cloned();

        let mut chosen = None;
        ComboBox::from_label(kind.label())
            .selected_text(selected.clone().unwrap_or_else(|| "Select...".to_string()))
            .show_ui(ui, |ui| {
                for name in &items {
                    let is_selected = selected.as_deref() == Some(name.as_str());
                    if ui.selectable_label(is_selected, name).clicked() && !is_selected {
                        chosen = Some(name.clone());
                    }
                }
            });
        if self.state.device_status(kind) == SyncStatus::Failed {
            ui.label(RichText::new("sync failed").color(Color32::LIGHT_RED).small());
        }

        if let Some(name) = chosen {
            self.state.select_device(kind, name, self.now);
        }
    }

    fn latency_control(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label("Latency:");
            match self.state.latency_displayed() {
                Some(latency) => {
                    let mut ms = latency.as_ms();
                    if ui
                        .add(DragValue::new(&mut ms).speed(1).suffix(" ms"))
                        .changed()
                    {
                        self.state.edit_latency(ms, self.now);
                    }
                }
                None => {
                    ui.label(RichText::new("loading...").weak());
                }
            }
        });
    }

    fn effect_picker(&mut self, ui: &mut Ui) {
        let effects = self.state.devices.effects().to_vec();
        let active = self.state.effect_displayed().cloned();

        ui.horizontal(|ui| {
            ui.label("Active:");
            ui.label(
                RichText::new(active.clone().unwrap_or_else(|| "None".to_string())).strong(),
            );
        });

        let mut chosen = None;
        for name in &effects {
            let is_active = active.as_deref() == Some(name.as_str());
            // Clicking the active effect clears it.
            if ui.selectable_label(is_active, name).clicked() {
                chosen = Some(name.clone());
            }
        }
        if let Some(name) = chosen {
            self.state.choose_effect(name, self.now);
        }
    }

    fn subsystem_toggles(&mut self, ui: &mut Ui) {
        for subsystem in Subsystem::ALL {
            let mut on = self.state.toggles().is_on(subsystem);
            let changed = ui.checkbox(&mut on, subsystem.label()).changed();
            if self.state.toggles().status(subsystem) == SyncStatus::Failed {
                ui.label(RichText::new("command failed, state reverted")
                    .color(Color32::LIGHT_RED)
                    .small());
            }
            if changed {
                self.state.set_toggle(subsystem, on, self.now);
            }
        }
    }
}

impl Widget for ControlPanelView<'_> {
    fn ui(mut self, ui: &mut Ui) -> Response {
        ui.heading("Audio Settings");
        ui.separator();

        for kind in DeviceKind::ALL {
            self.device_selector(ui, kind);
        }
        if ui.button("Refresh lists").clicked() {
            self.state.refresh_lists();
        }

        ui.add_space(10.0);
        self.latency_control(ui);

        ui.add_space(10.0);
        ui.separator();
        ui.heading("Effects");
        self.effect_picker(ui);

        ui.add_space(10.0);
        ui.separator();
        ui.heading("Subsystems");
        self.subsystem_toggles(ui);

        if let Some(message) = self.state.status_message().map(str::to_string) {
            ui.add_space(10.0);
            ui.separator();
            ui.horizontal(|ui| {
                ui.label(RichText::new(message).color(Color32::LIGHT_RED));
                if ui.small_button("x").clicked() {
                    self.state.clear_status_message();
                }
            });
        }

        ui.response()
    }
}
