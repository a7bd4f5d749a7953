use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    config::{CAMERA_GESTURE_NODE, FLASHLIGHT_GESTURE_NODE, MUSIC_GESTURE_NODE},
    keys::GestureChannel,
    settings::SettingsStore,
    sysfs::write_str_if_needed,
};

/// Touchpanel switches that turn gesture recognition on in the firmware.
pub struct GestureNodes {
    camera: PathBuf,
    flashlight: PathBuf,
    music: PathBuf,
    cache: HashMap<PathBuf, String>,
}

impl Default for GestureNodes {
    fn default() -> Self {
        Self::new(
            Path::new(CAMERA_GESTURE_NODE),
            Path::new(FLASHLIGHT_GESTURE_NODE),
            Path::new(MUSIC_GESTURE_NODE),
        )
    }
}

impl GestureNodes {
    pub fn new(camera: &Path, flashlight: &Path, music: &Path) -> Self {
        Self {
            camera: camera.to_path_buf(),
            flashlight: flashlight.to_path_buf(),
            music: music.to_path_buf(),
            cache: HashMap::new(),
        }
    }

    /// Mirror the current bindings. Returns how many nodes were written.
    pub fn sync(&mut self, settings: &SettingsStore) -> usize {
        let on = |c: GestureChannel| settings.binding(c).is_enabled();
        let music = on(GestureChannel::TwoFingerSwipe)
            || on(GestureChannel::LeftV)
            || on(GestureChannel::RightV);
        let targets = [
            (self.camera.clone(), on(GestureChannel::Circle)),
            (self.flashlight.clone(), on(GestureChannel::V)),
            (self.music.clone(), music),
        ];

        let mut written = 0;
        for (path, enabled) in targets {
            let value = if enabled { "1" } else { "0" };
            match write_str_if_needed(&path, value, &mut self.cache) {
                Ok(true) => {
                    log::info!("KEY: {} = {}", path.display(), value);
                    written += 1;
                }
                Ok(false) => {}
                Err(e) => log::warn!("KEY: gesture node write failed: {}", e),
            }
        }
        written
    }
}
