use std::sync::{
    atomic::{AtomicBool, AtomicI64, Ordering},
    Arc, Mutex, RwLock,
};

use crate::{
    clock::Clock,
    collab::{
        Collaborators, HapticEffect, MediaKeyAction, MediaKeyCode, MediaKeyEvent, RingerMode,
        ZenMode,
    },
    config::{GESTURE_WAKELOCK_DURATION, GESTURE_WAKELOCK_TAG},
    hold::ExclusiveHold,
    keys::SliderPosition,
    settings::{GestureBinding, SettingsStore},
    state::SharedState,
};

/// A side effect the dispatcher knows how to perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GestureKind {
    Torch,
    MediaPlayPause,
    MediaPrevious,
    MediaNext,
    Camera,
    Wake,
    LaunchApp(String),
    SliderModeChange(SliderPosition),
}

impl GestureKind {
    /// `None` for a disabled binding.
    pub fn from_binding(binding: &GestureBinding) -> Option<Self> {
        let kind = match binding {
            GestureBinding::Disabled => return None,
            GestureBinding::Torch => GestureKind::Torch,
            GestureBinding::Camera => GestureKind::Camera,
            GestureBinding::MediaPlayPause => GestureKind::MediaPlayPause,
            GestureBinding::MediaPrevious => GestureKind::MediaPrevious,
            GestureBinding::MediaNext => GestureKind::MediaNext,
            GestureBinding::Wake => GestureKind::Wake,
            GestureBinding::LaunchApp(c) => GestureKind::LaunchApp(c.clone()),
        };
        Some(kind)
    }

    pub fn label(&self) -> String {
        match self {
            GestureKind::Torch => "torch".to_string(),
            GestureKind::MediaPlayPause => "music_play".to_string(),
            GestureKind::MediaPrevious => "music_prev".to_string(),
            GestureKind::MediaNext => "music_next".to_string(),
            GestureKind::Camera => "camera".to_string(),
            GestureKind::Wake => "wake".to_string(),
            GestureKind::LaunchApp(c) => format!("launch:{}", c),
            GestureKind::SliderModeChange(p) => format!("slider:{:?}", p).to_lowercase(),
        }
    }
}

/// Slider mode id → (zen mode, ringer mode). Zen-only modes leave the ringer alone.
pub fn slider_mode(mode_id: i32) -> Option<(ZenMode, Option<RingerMode>)> {
    match mode_id {
        0 => Some((ZenMode::Off, Some(RingerMode::Normal))),
        1 => Some((ZenMode::Off, Some(RingerMode::Vibrate))),
        2 => Some((ZenMode::Off, Some(RingerMode::Silent))),
        3 => Some((ZenMode::ImportantInterruptions, None)),
        4 => Some((ZenMode::Alarms, None)),
        5 => Some((ZenMode::NoInterruptions, None)),
        _ => None,
    }
}

/// Vibration that confirms a slider move to the given mode.
pub fn slider_effect(mode_id: i32) -> HapticEffect {
    match mode_id {
        0 => HapticEffect::DoubleClick,
        1 => HapticEffect::Thud,
        _ => HapticEffect::Pop,
    }
}

/// Performs gesture side effects. Never fails towards the caller.
pub struct GestureDispatcher {
    settings: Arc<SettingsStore>,
    collab: Collaborators,
    clock: Arc<dyn Clock>,
    hold: ExclusiveHold,
    rear_camera_id: Mutex<Option<String>>,
    torch_enabled: AtomicBool,
    /// When the hold was last armed by a torch toggle.
    torch_armed_at_ms: AtomicI64,
    shared: Arc<RwLock<SharedState>>,
}

impl GestureDispatcher {
    pub fn new(
        settings: Arc<SettingsStore>,
        collab: Collaborators,
        clock: Arc<dyn Clock>,
        shared: Arc<RwLock<SharedState>>,
    ) -> Self {
        let hold = ExclusiveHold::new(
            GESTURE_WAKELOCK_TAG,
            GESTURE_WAKELOCK_DURATION,
            clock.clone(),
            collab.power.clone(),
        );
        Self {
            settings,
            collab,
            clock,
            hold,
            rear_camera_id: Mutex::new(None),
            torch_enabled: AtomicBool::new(false),
            torch_armed_at_ms: AtomicI64::new(i64::MIN),
            shared,
        }
    }

    pub fn hold(&self) -> &ExclusiveHold {
        &self.hold
    }

    pub fn torch_enabled(&self) -> bool {
        self.torch_enabled.load(Ordering::SeqCst)
    }

    pub fn dispatch(&self, gesture: &GestureKind) {
        log::info!("DISPATCH: {}", gesture.label());
        // torch confirms only once it gets past its repeat check
        if !matches!(gesture, GestureKind::Torch | GestureKind::SliderModeChange(_)) {
            self.gesture_feedback();
        }
        match gesture {
            GestureKind::Torch => self.toggle_torch(),
            GestureKind::MediaPlayPause => self.send_media_key(MediaKeyCode::PlayPause),
            GestureKind::MediaPrevious => self.send_media_key(MediaKeyCode::Previous),
            GestureKind::MediaNext => self.send_media_key(MediaKeyCode::Next),
            GestureKind::SliderModeChange(pos) => self.apply_slider(*pos),
            GestureKind::Camera => {
                if let Err(e) = self.collab.launcher.launch_camera() {
                    log::warn!("DISPATCH: camera launch failed: {}", e);
                }
            }
            GestureKind::Wake => {
                if let Err(e) = self.collab.power.wake_up() {
                    log::warn!("DISPATCH: wake failed: {}", e);
                }
            }
            GestureKind::LaunchApp(component) => {
                if let Err(e) = self.collab.launcher.launch_component(component) {
                    log::warn!("DISPATCH: launch {} failed: {}", component, e);
                }
            }
        }
        self.shared
            .write()
            .unwrap()
            .record_dispatch(gesture, self.clock.now_ms());
    }

    fn rear_camera_id(&self) -> Option<String> {
        let mut cached = self.rear_camera_id.lock().unwrap();
        if cached.is_none() {
            match self.collab.camera.find_rear_flash_camera() {
                Ok(found) => *cached = found,
                Err(e) => log::debug!("DISPATCH: torch camera lookup failed: {}", e),
            }
        }
        cached.clone()
    }

    fn toggle_torch(&self) {
        let Some(camera_id) = self.rear_camera_id() else {
            log::debug!("DISPATCH: no flash camera, torch ignored");
            return;
        };
        // only a repeat torch inside its own hold is dropped
        let now = self.clock.now_ms();
        let armed_at = self.torch_armed_at_ms.load(Ordering::SeqCst);
        if now.saturating_sub(armed_at) < self.hold.duration().as_millis() as i64 {
            log::debug!("DISPATCH: repeat torch toggle ignored");
            return;
        }
        self.hold.acquire();
        self.torch_armed_at_ms.store(now, Ordering::SeqCst);
        self.gesture_feedback();

        let target = !self.torch_enabled();
        match self.collab.camera.set_torch_mode(&camera_id, target) {
            Ok(()) => self.set_torch_flag(target),
            Err(e) => log::warn!("DISPATCH: torch {} failed: {}", camera_id, e),
        }
    }

    fn vibrate(&self, effect: HapticEffect) {
        if let Err(e) = self.collab.vibrator.vibrate(effect) {
            log::debug!("DISPATCH: vibrate {:?} failed: {}", effect, e);
        }
    }

    fn gesture_feedback(&self) {
        if self.settings.gesture_feedback_enabled() {
            self.vibrate(HapticEffect::Click);
        }
    }

    fn set_torch_flag(&self, enabled: bool) {
        self.torch_enabled.store(enabled, Ordering::SeqCst);
        self.shared.write().unwrap().info.torch_enabled = enabled;
    }

    /// Torch state reported by the camera service. Other cameras are ignored.
    pub fn on_torch_mode_changed(&self, camera_id: &str, enabled: bool) {
        let ours = self.rear_camera_id.lock().unwrap().as_deref() == Some(camera_id);
        if ours {
            self.set_torch_flag(enabled);
        }
    }

    pub fn on_torch_unavailable(&self, camera_id: &str) {
        self.on_torch_mode_changed(camera_id, false);
    }

    fn send_media_key(&self, code: MediaKeyCode) {
        self.hold.acquire();
        if !self.collab.audio.is_system_ready() {
            log::info!("DISPATCH: system not ready, {:?} dropped", code);
            return;
        }

        let down_time = self.clock.now_ms();
        let down = MediaKeyEvent {
            code,
            action: MediaKeyAction::Down,
            down_time_ms: down_time,
            event_time_ms: down_time,
        };
        if let Err(e) = self.collab.audio.dispatch_media_key(&down) {
            log::warn!("DISPATCH: media key down failed: {}", e);
        }

        let up = MediaKeyEvent {
            action: MediaKeyAction::Up,
            event_time_ms: self.clock.now_ms().max(down_time + 1),
            ..down
        };
        if let Err(e) = self.collab.audio.dispatch_media_key(&up) {
            log::warn!("DISPATCH: media key up failed: {}", e);
        }
    }

    fn apply_slider(&self, position: SliderPosition) {
        let mode_id = self.settings.slider_map().mode_at(position);
        let Some((zen, ringer)) = slider_mode(mode_id) else {
            log::debug!("DISPATCH: slider {:?} has unknown mode {}", position, mode_id);
            return;
        };
        if let Err(e) = self.collab.notifications.set_zen_mode(zen) {
            log::warn!("DISPATCH: zen {:?} failed: {}", zen, e);
        }
        if let Some(ringer) = ringer {
            if let Err(e) = self.collab.audio.set_ringer_mode(ringer) {
                log::warn!("DISPATCH: ringer {:?} failed: {}", ringer, e);
            }
        }
        self.vibrate(slider_effect(mode_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_mode_table() {
        assert_eq!(slider_mode(0), Some((ZenMode::Off, Some(RingerMode::Normal))));
        assert_eq!(slider_mode(2), Some((ZenMode::Off, Some(RingerMode::Silent))));
        assert_eq!(slider_mode(4), Some((ZenMode::Alarms, None)));
        assert_eq!(slider_mode(5), Some((ZenMode::NoInterruptions, None)));
        assert_eq!(slider_mode(6), None);
        assert_eq!(slider_mode(-1), None);
    }

    #[test]
    fn slider_effects_follow_the_mode() {
        assert_eq!(slider_effect(0), HapticEffect::DoubleClick);
        assert_eq!(slider_effect(1), HapticEffect::Thud);
        assert_eq!(slider_effect(2), HapticEffect::Pop);
        assert_eq!(slider_effect(5), HapticEffect::Pop);
    }

    #[test]
    fn disabled_binding_has_no_kind() {
        assert_eq!(GestureKind::from_binding(&GestureBinding::Disabled), None);
        assert_eq!(
            GestureKind::from_binding(&GestureBinding::LaunchApp("a/.B".into())),
            Some(GestureKind::LaunchApp("a/.B".into()))
        );
    }

    #[test]
    fn labels() {
        assert_eq!(GestureKind::SliderModeChange(SliderPosition::Top).label(), "slider:top");
        assert_eq!(GestureKind::MediaNext.label(), "music_next");
    }
}
