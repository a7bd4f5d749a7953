//! Touchpanel and keypad readers feeding the key handler.

use std::{sync::Arc, thread, time::Duration};

use evdev::{Device, InputEventKind, Key};

use crate::{
    collab::{AppLauncher, PowerService},
    handler::DeviceKeyHandler,
    keys::{
        KeyAction, KeyEvent, GESTURE_CIRCLE_SCANCODE, GESTURE_II_SCANCODE,
        GESTURE_LEFT_V_SCANCODE, GESTURE_RIGHT_V_SCANCODE, GESTURE_V_SCANCODE, KEY_BACK,
        KEY_DOUBLE_TAP, KEY_HOME, KEY_RECENTS, KEY_SLIDER_BOTTOM, KEY_SLIDER_CENTER,
        KEY_SLIDER_TOP,
    },
};

const WATCHED_CODES: [u16; 12] = [
    GESTURE_CIRCLE_SCANCODE,
    GESTURE_II_SCANCODE,
    GESTURE_V_SCANCODE,
    GESTURE_LEFT_V_SCANCODE,
    GESTURE_RIGHT_V_SCANCODE,
    KEY_DOUBLE_TAP,
    KEY_HOME,
    KEY_BACK,
    KEY_RECENTS,
    KEY_SLIDER_TOP,
    KEY_SLIDER_CENTER,
    KEY_SLIDER_BOTTOM,
];

const READ_RETRY: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyRoute {
    /// The handler took it.
    Consumed,
    /// Gated or proximity-blocked.
    Disabled,
    CameraLaunch,
    Wake,
    Passed,
}

/// Same order of questions the framework's input pipeline asks.
pub fn route_key_event(
    handler: &dyn DeviceKeyHandler,
    launcher: &dyn AppLauncher,
    power: &dyn PowerService,
    event: &KeyEvent,
) -> KeyRoute {
    if handler.handle_key_event(event) {
        return KeyRoute::Consumed;
    }
    if handler.is_disabled_key_event(event) {
        return KeyRoute::Disabled;
    }
    if handler.is_camera_launch_event(event) {
        if let Err(e) = launcher.launch_camera() {
            log::warn!("KEY: camera launch failed: {}", e);
        }
        return KeyRoute::CameraLaunch;
    }
    if handler.is_wake_event(event) {
        if let Err(e) = power.wake_up() {
            log::warn!("KEY: wake failed: {}", e);
        }
        return KeyRoute::Wake;
    }
    KeyRoute::Passed
}

fn watches_keys(dev: &Device) -> bool {
    dev.supported_keys()
        .is_some_and(|keys| WATCHED_CODES.iter().any(|c| keys.contains(Key::new(*c))))
}

/// Start a reader for every input device that reports one of our scancodes.
/// Returns how many were found.
pub fn spawn_readers(
    handler: Arc<dyn DeviceKeyHandler>,
    launcher: Arc<dyn AppLauncher>,
    power: Arc<dyn PowerService>,
) -> usize {
    let mut found = 0;
    for (path, dev) in evdev::enumerate() {
        if !watches_keys(&dev) {
            continue;
        }
        log::info!(
            "KEY: reading {} ({})",
            path.display(),
            dev.name().unwrap_or("?")
        );
        found += 1;
        let (handler, launcher, power) = (handler.clone(), launcher.clone(), power.clone());
        thread::spawn(move || read_loop(dev, handler, launcher, power));
    }
    found
}

fn read_loop(
    mut dev: Device,
    handler: Arc<dyn DeviceKeyHandler>,
    launcher: Arc<dyn AppLauncher>,
    power: Arc<dyn PowerService>,
) {
    loop {
        let batch = match dev.fetch_events() {
            Ok(batch) => batch,
            Err(e) => {
                log::warn!("KEY: read failed: {}", e);
                thread::sleep(READ_RETRY);
                continue;
            }
        };
        for ev in batch {
            let InputEventKind::Key(key) = ev.kind() else {
                continue;
            };
            let Some(action) = KeyAction::from_raw(ev.value()) else {
                continue;
            };
            let event = KeyEvent::new(key.code(), action);
            let route = route_key_event(handler.as_ref(), launcher.as_ref(), power.as_ref(), &event);
            if route != KeyRoute::Passed {
                log::debug!("KEY: {} {:?} -> {:?}", event.scan_code, event.action, route);
            }
        }
    }
}
