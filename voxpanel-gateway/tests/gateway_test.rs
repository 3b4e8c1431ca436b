use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use voxpanel_gateway::{Gateway, sim::SimEngine};
use voxpanel_messages::{
    Command, DeviceKind, EngineError, Event, Milliseconds, Reply, ReplyValue, Request, Subsystem,
};

// Test helpers to reduce boilerplate

fn setup() -> (Gateway, JoinHandle<anyhow::Result<()>>) {
    let (cmd_tx, cmd_rx) = flume::unbounded::<Request>();
    let (event_tx, event_rx) = flume::unbounded::<Event>();

    let handle = thread::spawn(move || {
        let engine = SimEngine::new(cmd_rx, event_tx);
        engine.run()
    });

    (Gateway::new(cmd_tx, event_rx), handle)
}

/// Pump the gateway until the reply for `id` arrives or the deadline
/// passes.
fn await_reply(gateway: &mut Gateway, id: voxpanel_messages::RequestId) -> Reply {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        for reply in gateway.drain() {
            if reply.id == id {
                return reply;
            }
        }
        assert!(Instant::now() < deadline, "no reply for {} in time", id);
        thread::sleep(Duration::from_millis(5));
    }
}

fn roundtrip(gateway: &mut Gateway, command: Command) -> Result<ReplyValue, EngineError> {
    let id = gateway.send(command).expect("send should succeed");
    await_reply(gateway, id).result
}

#[test]
fn test_device_list_roundtrip() {
    let (mut gateway, handle) = setup();

    let result = roundtrip(&mut gateway, Command::ListDevices(DeviceKind::Input));
    match result {
        Ok(ReplyValue::Devices(devices)) => {
            assert!(!devices.is_empty(), "input device list should not be empty")
        }
        other => panic!("expected device list, got {:?}", other),
    }

    drop(gateway);
    let _ = handle.join();
}

#[test]
fn test_set_unknown_device_is_rejected() {
    let (mut gateway, handle) = setup();

    let result = roundtrip(
        &mut gateway,
        Command::SetDevice(DeviceKind::Output, "No Such Card".to_string()),
    );
    match result {
        Err(EngineError::Rejected(reason)) => assert!(reason.contains("No Such Card")),
        other => panic!("expected rejection, got {:?}", other),
    }

    drop(gateway);
    let _ = handle.join();
}

#[test]
fn test_latency_roundtrip() {
    let (mut gateway, handle) = setup();

    let set = roundtrip(&mut gateway, Command::SetLatency(Milliseconds(25.0)));
    assert_eq!(set, Ok(ReplyValue::Ack));

    let get = roundtrip(&mut gateway, Command::GetLatency);
    assert_eq!(get, Ok(ReplyValue::Latency(Milliseconds(25.0))));

    drop(gateway);
    let _ = handle.join();
}

#[test]
fn test_nonpositive_latency_is_rejected() {
    let (mut gateway, handle) = setup();

    let result = roundtrip(&mut gateway, Command::SetLatency(Milliseconds(0.0)));
    assert!(matches!(result, Err(EngineError::Rejected(_))));

    drop(gateway);
    let _ = handle.join();
}

#[test]
fn test_subsystem_start_status_stop() {
    let (mut gateway, handle) = setup();

    assert_eq!(
        roundtrip(&mut gateway, Command::SubsystemStatus(Subsystem::Loopback)),
        Ok(ReplyValue::Running(false))
    );
    assert_eq!(
        roundtrip(&mut gateway, Command::StartSubsystem(Subsystem::Loopback)),
        Ok(ReplyValue::Ack)
    );
    assert_eq!(
        roundtrip(&mut gateway, Command::SubsystemStatus(Subsystem::Loopback)),
        Ok(ReplyValue::Running(true))
    );
    assert_eq!(
        roundtrip(&mut gateway, Command::StopSubsystem(Subsystem::Loopback)),
        Ok(ReplyValue::Ack)
    );
    assert_eq!(
        roundtrip(&mut gateway, Command::SubsystemStatus(Subsystem::Loopback)),
        Ok(ReplyValue::Running(false))
    );

    drop(gateway);
    let _ = handle.join();
}

#[test]
fn test_effect_set_and_clear() {
    let (mut gateway, handle) = setup();

    let effects = match roundtrip(&mut gateway, Command::ListEffects) {
        Ok(ReplyValue::Effects(effects)) => effects,
        other => panic!("expected effect list, got {:?}", other),
    };
    let first = effects.first().expect("sim should expose effects").clone();

    assert_eq!(
        roundtrip(&mut gateway, Command::SetEffect(first.clone())),
        Ok(ReplyValue::Ack)
    );
    assert_eq!(
        roundtrip(&mut gateway, Command::CurrentEffect),
        Ok(ReplyValue::Effect(Some(first)))
    );
    assert_eq!(
        roundtrip(&mut gateway, Command::ClearEffect),
        Ok(ReplyValue::Ack)
    );
    assert_eq!(
        roundtrip(&mut gateway, Command::CurrentEffect),
        Ok(ReplyValue::Effect(None))
    );

    drop(gateway);
    let _ = handle.join();
}

#[test]
fn test_frames_arrive_only_inside_audio_bracket() {
    let (mut gateway, handle) = setup();
    let subscription = gateway.subscribe_spectrum();

    // Not initialized yet: pumping for a while must yield no frames.
    let quiet_until = Instant::now() + Duration::from_millis(150);
    while Instant::now() < quiet_until {
        gateway.drain();
        thread::sleep(Duration::from_millis(10));
    }
    assert!(
        subscription.try_recv().is_none(),
        "no frames should arrive before InitializeAudio"
    );

    let init = roundtrip(&mut gateway, Command::InitializeAudio);
    assert_eq!(init, Ok(ReplyValue::Ack));

    let deadline = Instant::now() + Duration::from_secs(2);
    let frame = loop {
        gateway.drain();
        if let Some(frame) = subscription.try_recv() {
            break frame;
        }
        assert!(Instant::now() < deadline, "expected a frame after init");
        thread::sleep(Duration::from_millis(5));
    };
    assert!(frame.is_consistent());
    assert!(!frame.is_empty());

    let deinit = roundtrip(&mut gateway, Command::DeinitializeAudio);
    assert_eq!(deinit, Ok(ReplyValue::Ack));

    drop(gateway);
    let _ = handle.join();
}

#[test]
fn test_send_after_engine_gone_is_unavailable() {
    let (cmd_tx, cmd_rx) = flume::unbounded::<Request>();
    let (_event_tx, event_rx) = flume::unbounded::<Event>();
    let mut gateway = Gateway::new(cmd_tx, event_rx);

    drop(cmd_rx);
    let result = gateway.send(Command::GetLatency);
    assert_eq!(result.unwrap_err(), EngineError::Unavailable);
}

#[test]
fn test_unanswered_request_times_out() {
    let (cmd_tx, _cmd_rx) = flume::unbounded::<Request>();
    let (_event_tx, event_rx) = flume::unbounded::<Event>();
    let mut gateway = Gateway::with_timeout(cmd_tx, event_rx, Duration::from_millis(20));

    let id = gateway.send(Command::GetLatency).expect("send should succeed");
    thread::sleep(Duration::from_millis(40));

    let replies = gateway.drain();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].id, id);
    assert_eq!(replies[0].result, Err(EngineError::Timeout));
}
