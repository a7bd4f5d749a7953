use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{collab::KeypadControl, keys::GestureKey, settings::SettingsStore};

/// Vetoes the capacitive navigation keys while the user has them disabled.
pub struct HardwareKeyGate {
    disabled: AtomicBool,
    keypad: Arc<dyn KeypadControl>,
}

impl HardwareKeyGate {
    pub fn new(keypad: Arc<dyn KeypadControl>) -> Self {
        Self {
            disabled: AtomicBool::new(false),
            keypad,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    pub fn should_disable(&self, scan_code: u16) -> bool {
        self.is_disabled()
            && GestureKey::from_scan_code(scan_code).is_some_and(GestureKey::is_navigation)
    }

    /// Re-read the flag and mirror it to the keypad. The in-process flag is
    /// updated even when the keypad write fails.
    pub fn refresh(&self, settings: &SettingsStore) -> bool {
        let disabled = settings.hardware_keys_disabled();
        self.disabled.store(disabled, Ordering::SeqCst);
        if let Err(e) = self.keypad.set_keypad_enabled(!disabled) {
            log::warn!("KEY: keypad {} failed: {}", if disabled { "off" } else { "on" }, e);
        } else {
            log::info!("KEY: hardware keys {}", if disabled { "disabled" } else { "enabled" });
        }
        disabled
    }
}
