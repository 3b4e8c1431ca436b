mod control_panel;
mod state;
pub mod spectrum;
pub mod sync;
pub mod toggles;

use std::time::Instant;

use control_panel::ControlPanelView;
use spectrum::FeedPhase;
use state::UiState;
use voxpanel_gateway::Gateway;
use voxpanel_messages::{Event, Request};

/// Main application struct implementing the egui App trait.
pub struct VoxPanelApp {
    state: UiState,
}

impl VoxPanelApp {
    fn new(gateway: Gateway) -> Self {
        Self {
            state: UiState::new(gateway),
        }
    }
}

impl eframe::App for VoxPanelApp {
    fn update(&mut self, ctx: &eframe::egui::Context, _frame: &mut eframe::Frame) {
        // Pump replies, debounce timers, and spectrum frames.
        self.state.tick(Instant::now());

        // Continuous repainting keeps the visualizer live.
        ctx.request_repaint();

        eframe::egui::SidePanel::right("control_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.add(ControlPanelView::new(&mut self.state, Instant::now()));
            });

        eframe::egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                let phase = self.state.feed_phase();
                let can_init = phase == FeedPhase::Uninitialized;
                if ui
                    .add_enabled(can_init, eframe::egui::Button::new("Initialize Audio"))
                    .clicked()
                {
                    self.state.initialize_feed();
                }
                if ui
                    .add_enabled(!can_init, eframe::egui::Button::new("Deinitialize Audio"))
                    .clicked()
                {
                    self.state.deinitialize_feed();
                }
                ui.label(match phase {
                    FeedPhase::Uninitialized => "Not initialized",
                    FeedPhase::Initializing => "Initializing...",
                    FeedPhase::Ready => "Live",
                });
            });
            ui.add(&mut self.state.view);
        });
    }
}

/// Entry point for the UI.
///
/// Runs the eframe application on the main thread (blocking). The
/// channel pair is the boundary to the engine process.
pub fn run(cmd_tx: flume::Sender<Request>, event_rx: flume::Receiver<Event>) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 640.0])
            .with_title("VoxPanel"),
        ..Default::default()
    };

    let gateway = Gateway::new(cmd_tx, event_rx);
    eframe::run_native(
        "VoxPanel",
        options,
        Box::new(|_cc| Ok(Box::new(VoxPanelApp::new(gateway)))),
    )
    .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
