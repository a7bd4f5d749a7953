//! Services outside the daemon that the dispatch core talks to.
//!
//! Every call is fire-and-forget from the core's point of view: callers log
//! the error and move on.

use std::{sync::Arc, time::Duration};

use serde::Serialize;

use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZenMode {
    Off,
    ImportantInterruptions,
    Alarms,
    NoInterruptions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RingerMode {
    Silent,
    Vibrate,
    Normal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKeyCode {
    PlayPause,
    Previous,
    Next,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKeyAction {
    Down,
    Up,
}

/// Predefined vibration effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticEffect {
    Click,
    DoubleClick,
    Thud,
    Pop,
}

/// Synthetic media button event. Times are monotonic milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaKeyEvent {
    pub code: MediaKeyCode,
    pub action: MediaKeyAction,
    pub down_time_ms: i64,
    pub event_time_ms: i64,
}

pub trait CameraService: Send + Sync {
    /// Id of the back-facing camera with a flash unit, if any.
    fn find_rear_flash_camera(&self) -> Result<Option<String>>;
    fn set_torch_mode(&self, camera_id: &str, enabled: bool) -> Result<()>;
}

pub trait AudioService: Send + Sync {
    fn is_music_active(&self) -> bool;
    fn is_system_ready(&self) -> bool;
    fn set_ringer_mode(&self, mode: RingerMode) -> Result<()>;
    fn dispatch_media_key(&self, event: &MediaKeyEvent) -> Result<()>;
}

pub trait NotificationService: Send + Sync {
    fn set_zen_mode(&self, mode: ZenMode) -> Result<()>;
}

pub trait DozePulse: Send + Sync {
    fn request_pulse(&self) -> Result<()>;
}

pub trait PowerService: Send + Sync {
    /// Kernel-side wake lock that expires by itself after `timeout`.
    fn acquire_wake_lock(&self, tag: &str, timeout: Duration) -> Result<()>;
    fn wake_up(&self) -> Result<()>;
}

pub trait AppLauncher: Send + Sync {
    fn launch_component(&self, component: &str) -> Result<()>;
    fn launch_camera(&self) -> Result<()>;
}

pub trait Vibrator: Send + Sync {
    fn vibrate(&self, effect: HapticEffect) -> Result<()>;
}

/// The physical navigation keys' on/off switch.
pub trait KeypadControl: Send + Sync {
    fn set_keypad_enabled(&self, enabled: bool) -> Result<()>;
}

/// Bundle of collaborator handles passed around at construction time.
#[derive(Clone)]
pub struct Collaborators {
    pub camera: Arc<dyn CameraService>,
    pub audio: Arc<dyn AudioService>,
    pub notifications: Arc<dyn NotificationService>,
    pub doze: Arc<dyn DozePulse>,
    pub power: Arc<dyn PowerService>,
    pub launcher: Arc<dyn AppLauncher>,
    pub keypad: Arc<dyn KeypadControl>,
    pub vibrator: Arc<dyn Vibrator>,
}
