use serde::Serialize;

use crate::dispatcher::GestureKind;

#[derive(Clone, Debug, Default, Serialize)]
pub struct SensorRuntimeState {
    pub proximity_present: bool,
    pub tilt_present: bool,
    pub proximity_listening: bool,
    pub tilt_listening: bool,
    pub proximity_near: bool,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GestureCounters {
    pub dispatched: u64,
    pub superseded: u64,
    pub blocked: u64,
    pub doze_pulses: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct InfoState {
    pub screen_on: bool,
    pub torch_enabled: bool,
    pub hardware_keys_disabled: bool,
    pub last_gesture: Option<String>,
    pub last_gesture_at_ms: Option<i64>,
}

impl Default for InfoState {
    fn default() -> Self {
        Self {
            screen_on: true,
            torch_enabled: false,
            hardware_keys_disabled: false,
            last_gesture: None,
            last_gesture_at_ms: None,
        }
    }
}

/// Runtime status shared between the worker threads and the HTTP API.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SharedState {
    pub settings_rev: u64,
    pub last_settings_error: Option<String>,

    pub info: InfoState,
    pub sensors: SensorRuntimeState,
    pub counters: GestureCounters,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dispatch(&mut self, gesture: &GestureKind, at_ms: i64) {
        self.info.last_gesture = Some(gesture.label());
        self.info.last_gesture_at_ms = Some(at_ms);
        self.counters.dispatched += 1;
    }
}
