use voxpanel_gateway::sim::SimEngine;

use log::LevelFilter;
use std::io::Write;

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .format(|buf, record| {
            writeln!(
                buf,
                "{:<5} - mod path |{}| - target | {} | args: |{}|",
                record.level(),
                record.module_path().unwrap_or(""),
                record.target(),
                record.args()
            )
        })
        .filter_level(LevelFilter::Debug)
        .filter_module("voxpanel_gateway", LevelFilter::Info)
        .filter_module("voxpanel_ui", LevelFilter::Trace)
        .init();

    // Channels for bidirectional communication with the engine. The sim
    // engine stands in for the external engine process here; the UI only
    // ever sees the channel boundary.
    let (cmd_tx, cmd_rx) = flume::unbounded();
    let (event_tx, event_rx) = flume::unbounded();

    let engine_handle = std::thread::spawn(move || {
        let engine = SimEngine::new(cmd_rx, event_tx);
        engine.run().expect("Engine failed");
    });

    // Run UI on main thread (blocking).
    voxpanel_ui::run(cmd_tx, event_rx)?;

    // UI has exited and dropped its command sender; the engine loop ends
    // on channel disconnect.
    engine_handle
        .join()
        .map_err(|_| anyhow::anyhow!("Engine thread panicked"))?;

    Ok(())
}
