use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    collab::AudioService,
    dispatcher::GestureKind,
    keys::{GestureKey, KeyAction},
    settings::SettingsStore,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Not ours; the input pipeline keeps routing it.
    NotHandled,
    /// Consumed without side effect: the proximity sensor is covered.
    Blocked,
    Gesture(GestureKind),
}

/// Maps raw scancodes to gestures.
///
/// Bindings are read from the store on every call. The proximity-check flag
/// is cached and refreshed when the store reports a change.
pub struct GestureClassifier {
    settings: Arc<SettingsStore>,
    audio: Arc<dyn AudioService>,
    proximity_near: Arc<AtomicBool>,
    proxi_check: AtomicBool,
}

impl GestureClassifier {
    pub fn new(
        settings: Arc<SettingsStore>,
        audio: Arc<dyn AudioService>,
        proximity_near: Arc<AtomicBool>,
    ) -> Self {
        let proxi_check = AtomicBool::new(settings.proximity_check_enabled());
        Self {
            settings,
            audio,
            proximity_near,
            proxi_check,
        }
    }

    pub fn refresh(&self) {
        let enabled = self.settings.proximity_check_enabled();
        self.proxi_check.store(enabled, Ordering::SeqCst);
        log::debug!("KEY: proximity check {}", enabled);
    }

    pub fn proximity_check_enabled(&self) -> bool {
        self.proxi_check.load(Ordering::SeqCst)
    }

    /// True when `key` is proximity-checked and the sensor currently reads near.
    pub fn is_proximity_blocked(&self, key: GestureKey) -> bool {
        key.is_proximity_checked()
            && self.proximity_check_enabled()
            && self.proximity_near.load(Ordering::SeqCst)
    }

    pub fn classify(&self, scan_code: u16, action: KeyAction) -> Classification {
        if action != KeyAction::Release {
            return Classification::NotHandled;
        }
        let Some(key) = GestureKey::from_scan_code(scan_code) else {
            return Classification::NotHandled;
        };
        if !key.is_supported() {
            return Classification::NotHandled;
        }

        if let Some(position) = key.slider_position() {
            return Classification::Gesture(GestureKind::SliderModeChange(position));
        }

        if self.is_proximity_blocked(key) {
            log::debug!("KEY: {:?} blocked by proximity", key);
            return Classification::Blocked;
        }

        match key {
            // answered through is_camera_launch_event / is_wake_event
            GestureKey::Circle | GestureKey::DoubleTap => return Classification::NotHandled,
            GestureKey::LeftV | GestureKey::RightV if !self.audio.is_music_active() => {
                log::debug!("KEY: {:?} ignored, no music playing", key);
                return Classification::NotHandled;
            }
            _ => {}
        }

        let Some(channel) = key.channel() else {
            return Classification::NotHandled;
        };
        match GestureKind::from_binding(&self.settings.binding(channel)) {
            Some(kind) => Classification::Gesture(kind),
            None => Classification::NotHandled,
        }
    }
}
