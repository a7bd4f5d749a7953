mod common;

use std::sync::atomic::Ordering;

use common::{Call, Rig};
use gesture_keyd::{
    handler::DeviceKeyHandler,
    input::{route_key_event, KeyRoute},
    keys::*,
    settings::{binding_key, KEY_HARDWARE_KEYS_DISABLE},
};

fn route(rig: &Rig, event: KeyEvent) -> KeyRoute {
    route_key_event(rig.handler.as_ref(), rig.device.as_ref(), rig.device.as_ref(), &event)
}

#[test]
fn navigation_keys_are_swallowed_for_every_action_while_disabled() {
    let rig = Rig::new();
    for code in [KEY_HOME, KEY_BACK, KEY_RECENTS] {
        assert!(!rig.handler.can_handle_key_event(&KeyEvent::release(code)));
        assert!(!rig.handler.handle_key_event(&KeyEvent::release(code)));
    }

    rig.settings.set_bool(KEY_HARDWARE_KEYS_DISABLE, true).unwrap();
    let change = gesture_keyd::settings::SettingsChange {
        keys: vec![KEY_HARDWARE_KEYS_DISABLE.to_string()],
        rev: rig.settings.rev(),
    };
    rig.handler.apply_settings_change(&change);
    assert_eq!(rig.device.calls(), vec![Call::Keypad(false)]);

    for code in [KEY_HOME, KEY_BACK, KEY_RECENTS] {
        for action in [KeyAction::Press, KeyAction::Repeat, KeyAction::Release] {
            assert!(rig.handler.handle_key_event(&KeyEvent::new(code, action)));
        }
    }
}

#[test]
fn circle_and_double_tap_go_to_camera_and_wake() {
    let rig = Rig::new();
    assert!(rig.handler.can_handle_key_event(&KeyEvent::release(GESTURE_CIRCLE_SCANCODE)));

    assert_eq!(route(&rig, KeyEvent::release(GESTURE_CIRCLE_SCANCODE)), KeyRoute::CameraLaunch);
    assert_eq!(route(&rig, KeyEvent::release(KEY_DOUBLE_TAP)), KeyRoute::Wake);
    assert_eq!(rig.device.calls(), vec![Call::LaunchCamera, Call::WakeUp]);

    // presses never ask
    assert_eq!(
        route(&rig, KeyEvent::new(GESTURE_CIRCLE_SCANCODE, KeyAction::Press)),
        KeyRoute::Passed
    );
    assert!(!rig.handler.is_wake_event(&KeyEvent::new(KEY_DOUBLE_TAP, KeyAction::Press)));
}

#[test]
fn disabled_circle_binding_stops_camera_launch() {
    let rig = Rig::new();
    rig.settings
        .set_string(&binding_key(GestureChannel::Circle), "disabled")
        .unwrap();
    assert_eq!(route(&rig, KeyEvent::release(GESTURE_CIRCLE_SCANCODE)), KeyRoute::Passed);
    assert!(rig.device.calls().is_empty());
}

#[test]
fn covered_sensor_blocks_camera_wake_and_torch() {
    let rig = Rig::new();
    rig.proximity_near.store(true, Ordering::SeqCst);

    for code in [GESTURE_CIRCLE_SCANCODE, KEY_DOUBLE_TAP, GESTURE_V_SCANCODE] {
        assert_eq!(route(&rig, KeyEvent::release(code)), KeyRoute::Consumed);
        assert!(rig.handler.is_disabled_key_event(&KeyEvent::release(code)));
    }
    assert!(rig.device.calls().is_empty());
    assert!(!rig.queue.is_pending());
    assert_eq!(rig.shared.read().unwrap().counters.blocked, 3);
}

#[test]
fn gestures_are_consumed_and_queued() {
    let rig = Rig::new();
    assert_eq!(route(&rig, KeyEvent::release(GESTURE_II_SCANCODE)), KeyRoute::Consumed);
    assert!(rig.queue.is_pending());
    assert_eq!(route(&rig, KeyEvent::release(42)), KeyRoute::Passed);
}
