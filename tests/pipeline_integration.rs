use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lamco_input_core::events::{EventData, EventKind, FingerPhase};
use lamco_input_core::platform::HeadlessBackend;
use lamco_input_core::scancode::Scancode;
use lamco_input_core::sync::ManualClock;
use lamco_input_core::{Config, Event, InputContext, NativeEvent, NativeEventPump, PumpWait};
use tempfile::TempDir;

const WIN: u32 = 1;

fn context(config: Config) -> (InputContext, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0));
    let ctx = InputContext::with_clock(
        config,
        Box::new(HeadlessBackend::new().with_window(WIN, 800, 600)),
        clock.clone(),
    );
    (ctx, clock)
}

fn kinds(events: &[Event]) -> Vec<EventKind> {
    events.iter().map(Event::kind).collect()
}

fn button(pressed: bool) -> NativeEvent {
    NativeEvent::PointerButton {
        window: Some(WIN),
        button: 1,
        pressed,
        clicks: None,
    }
}

#[test]
fn test_platform_thread_feeds_pipeline() {
    let (mut ctx, _) = context(Config::default());
    let pump = NativeEventPump::new();
    let handle = pump.handle();

    let producer = thread::spawn(move || {
        let script = [
            NativeEvent::KeyboardFocus { window: Some(WIN) },
            NativeEvent::X11Key {
                keycode: 38,
                pressed: true,
            },
            NativeEvent::Text {
                text: "a".to_string(),
            },
            NativeEvent::X11Key {
                keycode: 38,
                pressed: false,
            },
            NativeEvent::Quit,
        ];
        for event in script {
            handle.send(event).unwrap();
        }
    });

    let mut events = Vec::new();
    while !events.iter().any(|e: &Event| e.kind() == EventKind::Quit) {
        match ctx.wait_and_pump(&pump, Duration::from_secs(5)) {
            PumpWait::Event(_) => events.extend(ctx.drain_events()),
            other => panic!("pump stopped early: {:?}", other),
        }
    }
    producer.join().unwrap();

    let keys: Vec<_> = events
        .iter()
        .filter(|e| matches!(e.kind(), EventKind::KeyDown | EventKind::KeyUp | EventKind::TextInput))
        .map(Event::kind)
        .collect();
    assert_eq!(keys, vec![EventKind::KeyDown, EventKind::TextInput, EventKind::KeyUp]);
    assert!(!ctx.keyboard().is_pressed(Scancode::A));
}

#[test]
fn test_cancel_wakes_blocked_wait() {
    let (mut ctx, _) = context(Config::default());
    let pump = NativeEventPump::new();
    let handle = pump.handle();

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        handle.cancel();
    });

    assert_eq!(ctx.wait_and_pump(&pump, Duration::from_secs(5)), PumpWait::Cancelled);
    canceller.join().unwrap();
    assert!(ctx.drain_events().is_empty());
}

#[test]
fn test_config_file_shapes_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("input.toml");
    std::fs::write(
        &path,
        r#"
[keyboard]
key_repeat = false

[events]
disabled = ["mouse_motion"]
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert!(!config.keyboard.key_repeat);

    let (mut ctx, _) = context(config);
    ctx.handle_native(NativeEvent::KeyboardFocus { window: Some(WIN) }).unwrap();
    for _ in 0..3 {
        ctx.handle_native(NativeEvent::X11Key {
            keycode: 38,
            pressed: true,
        })
        .unwrap();
    }
    ctx.handle_native(NativeEvent::PointerMotion {
        window: Some(WIN),
        x: 40,
        y: 30,
    })
    .unwrap();

    let events = ctx.drain_events();
    let key_downs = events.iter().filter(|e| e.kind() == EventKind::KeyDown).count();
    assert_eq!(key_downs, 1);
    assert!(!kinds(&events).contains(&EventKind::MouseMotion));
    assert_eq!((ctx.mouse_state().x, ctx.mouse_state().y), (40, 30));
}

#[test]
fn test_invalid_config_file_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[mouse]\ndouble_click_time_ms = \"soon\"\n").unwrap();

    assert!(Config::load(&path).is_err());
    assert!(Config::load(temp_dir.path().join("missing.toml")).is_err());
}

#[test]
fn test_click_counting_follows_clock() {
    let (mut ctx, clock) = context(Config::default());
    ctx.handle_native(NativeEvent::PointerMotion {
        window: Some(WIN),
        x: 100,
        y: 100,
    })
    .unwrap();

    for step in [button(true), button(false), button(true), button(false)] {
        clock.advance(100);
        ctx.handle_native(step).unwrap();
    }
    clock.advance(1000);
    ctx.handle_native(button(true)).unwrap();

    let presses: Vec<u8> = ctx
        .drain_events()
        .into_iter()
        .filter_map(|e| match e.data {
            EventData::MouseButton {
                pressed: true, clicks, ..
            } => Some(clicks),
            _ => None,
        })
        .collect();
    assert_eq!(presses, vec![1, 2, 1]);
}

#[test]
fn test_touch_gesture_drives_pointer() {
    let (mut ctx, _) = context(Config::default());
    let touch = |phase, x, y| NativeEvent::Touch {
        touch_id: 3,
        finger_id: 0,
        window: Some(WIN),
        phase,
        x,
        y,
        pressure: 1.0,
    };

    ctx.handle_native(touch(FingerPhase::Down, 0.25, 0.5)).unwrap();
    ctx.handle_native(touch(FingerPhase::Motion, 0.5, 0.5)).unwrap();
    ctx.handle_native(touch(FingerPhase::Up, 0.5, 0.5)).unwrap();

    let events = ctx.drain_events();
    let fingers: Vec<_> = events
        .iter()
        .filter(|e| {
            matches!(
                e.kind(),
                EventKind::FingerDown | EventKind::FingerMotion | EventKind::FingerUp
            )
        })
        .map(Event::kind)
        .collect();
    assert_eq!(
        fingers,
        vec![EventKind::FingerDown, EventKind::FingerMotion, EventKind::FingerUp]
    );
    assert!(kinds(&events).contains(&EventKind::MouseButtonDown));
    assert!(kinds(&events).contains(&EventKind::MouseButtonUp));
    assert_eq!((ctx.mouse_state().x, ctx.mouse_state().y), (400, 300));
    assert_eq!(ctx.mouse_state().buttons, 0);
}

#[test]
fn test_events_serialize_with_type_tag() {
    let (mut ctx, clock) = context(Config::default());
    clock.set(42);
    ctx.handle_native(NativeEvent::Quit).unwrap();

    let event = ctx.poll_event().unwrap();
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "quit");
    assert_eq!(json["timestamp"], 42);

    let back: Event = serde_json::from_value(json).unwrap();
    assert_eq!(back, event);
}
