//! The input pipeline boundary.

use std::sync::{Arc, RwLock};

use crate::{
    classifier::{Classification, GestureClassifier},
    clock::Clock,
    dispatcher::{GestureDispatcher, GestureKind},
    key_gate::HardwareKeyGate,
    keys::{GestureChannel, GestureKey, KeyEvent, GESTURE_CIRCLE_SCANCODE, KEY_DOUBLE_TAP},
    queue::{DispatchRequest, GestureQueue},
    settings::{
        SettingsChange, SettingsStore, KEY_HARDWARE_KEYS_DISABLE, KEY_PROXI_CHECK_ENABLED,
    },
    state::SharedState,
};

/// What the input pipeline asks of a device-specific key handler.
pub trait DeviceKeyHandler: Send + Sync {
    /// Scancodes this handler knows about at all.
    fn can_handle_key_event(&self, event: &KeyEvent) -> bool;
    /// Returns true when the event was consumed.
    fn handle_key_event(&self, event: &KeyEvent) -> bool;
    fn is_camera_launch_event(&self, event: &KeyEvent) -> bool;
    fn is_wake_event(&self, event: &KeyEvent) -> bool;
    fn is_disabled_key_event(&self, event: &KeyEvent) -> bool;
}

pub struct KeyHandler {
    settings: Arc<SettingsStore>,
    gate: HardwareKeyGate,
    classifier: GestureClassifier,
    dispatcher: Arc<GestureDispatcher>,
    queue: Arc<GestureQueue>,
    clock: Arc<dyn Clock>,
    shared: Arc<RwLock<SharedState>>,
}

impl KeyHandler {
    pub fn new(
        settings: Arc<SettingsStore>,
        gate: HardwareKeyGate,
        classifier: GestureClassifier,
        dispatcher: Arc<GestureDispatcher>,
        queue: Arc<GestureQueue>,
        clock: Arc<dyn Clock>,
        shared: Arc<RwLock<SharedState>>,
    ) -> Self {
        let handler = Self {
            settings,
            gate,
            classifier,
            dispatcher,
            queue,
            clock,
            shared,
        };
        handler.refresh_gate();
        handler
    }

    pub fn gate(&self) -> &HardwareKeyGate {
        &self.gate
    }

    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    pub fn dispatcher(&self) -> &Arc<GestureDispatcher> {
        &self.dispatcher
    }

    pub fn queue(&self) -> &Arc<GestureQueue> {
        &self.queue
    }

    fn refresh_gate(&self) {
        let disabled = self.gate.refresh(&self.settings);
        self.shared.write().unwrap().info.hardware_keys_disabled = disabled;
    }

    /// Refresh cached flags touched by `change`.
    pub fn apply_settings_change(&self, change: &SettingsChange) {
        if change.touches(KEY_HARDWARE_KEYS_DISABLE) {
            self.refresh_gate();
        }
        if change.touches(KEY_PROXI_CHECK_ENABLED) {
            self.classifier.refresh();
        }
    }

    fn submit(&self, gesture: GestureKind) {
        let req = DispatchRequest {
            gesture,
            issued_at_ms: self.clock.now_ms(),
        };
        if let Some(old) = self.queue.submit(req) {
            log::debug!("KEY: {} superseded before dispatch", old.gesture.label());
            self.shared.write().unwrap().counters.superseded += 1;
        }
    }
}

impl DeviceKeyHandler for KeyHandler {
    fn can_handle_key_event(&self, event: &KeyEvent) -> bool {
        GestureKey::from_scan_code(event.scan_code).is_some_and(GestureKey::is_supported)
    }

    fn handle_key_event(&self, event: &KeyEvent) -> bool {
        if self.gate.should_disable(event.scan_code) {
            log::debug!("KEY: {} swallowed, hardware keys disabled", event.scan_code);
            return true;
        }

        match self.classifier.classify(event.scan_code, event.action) {
            Classification::NotHandled => false,
            Classification::Blocked => {
                self.shared.write().unwrap().counters.blocked += 1;
                true
            }
            Classification::Gesture(gesture @ GestureKind::SliderModeChange(_)) => {
                self.dispatcher.dispatch(&gesture);
                true
            }
            Classification::Gesture(gesture) => {
                log::debug!("KEY: {} -> {}", event.scan_code, gesture.label());
                self.submit(gesture);
                true
            }
        }
    }

    fn is_camera_launch_event(&self, event: &KeyEvent) -> bool {
        event.is_release()
            && event.scan_code == GESTURE_CIRCLE_SCANCODE
            && self.settings.binding(GestureChannel::Circle).is_enabled()
    }

    fn is_wake_event(&self, event: &KeyEvent) -> bool {
        event.is_release() && event.scan_code == KEY_DOUBLE_TAP
    }

    fn is_disabled_key_event(&self, event: &KeyEvent) -> bool {
        if !event.is_release() {
            return false;
        }
        if self.gate.should_disable(event.scan_code) {
            return true;
        }
        GestureKey::from_scan_code(event.scan_code)
            .is_some_and(|key| self.classifier.is_proximity_blocked(key))
    }
}
