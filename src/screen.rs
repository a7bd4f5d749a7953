use std::{
    path::{Path, PathBuf},
    sync::mpsc::Sender,
    thread,
};

use crate::{config::SCREEN_POLL, engine::EngineEvent, sysfs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenProbe {
    FbBlank(PathBuf),
    BacklightBright(PathBuf),
    BacklightPower(PathBuf),
}

pub fn detect_screen_probe() -> Option<ScreenProbe> {
    detect_screen_probe_in(Path::new("/sys/class/graphics/fb0/blank"), Path::new("/sys/class/backlight"))
}

fn detect_screen_probe_in(fb_blank: &Path, bl_dir: &Path) -> Option<ScreenProbe> {
    if fb_blank.exists() {
        return Some(ScreenProbe::FbBlank(fb_blank.to_path_buf()));
    }

    if let Ok(entries) = std::fs::read_dir(bl_dir) {
        for e in entries.flatten() {
            let p = e.path();
            let bright = p.join("brightness");
            if bright.exists() {
                return Some(ScreenProbe::BacklightBright(bright));
            }
            let blp = p.join("bl_power");
            if blp.exists() {
                return Some(ScreenProbe::BacklightPower(blp));
            }
        }
    }
    None
}

/// Unreadable nodes count as "on".
pub fn raw_screen_on(probe: &ScreenProbe) -> bool {
    match probe {
        ScreenProbe::FbBlank(p) => sysfs::read_i32(p).map(|v| v == 0).unwrap_or(true),
        ScreenProbe::BacklightBright(p) => sysfs::read_i32(p).map(|v| v > 0).unwrap_or(true),
        ScreenProbe::BacklightPower(p) => sysfs::read_i32(p).map(|v| v == 0).unwrap_or(true),
    }
}

/// Off needs two consecutive readings; on is taken at once.
#[derive(Debug)]
pub struct ScreenTracker {
    on: bool,
    off_streak: u8,
}

impl Default for ScreenTracker {
    fn default() -> Self {
        Self { on: true, off_streak: 0 }
    }
}

impl ScreenTracker {
    /// Feed a raw reading; returns the new state on a transition.
    pub fn update(&mut self, raw_on: bool) -> Option<bool> {
        let on = if raw_on {
            self.off_streak = 0;
            true
        } else {
            self.off_streak = self.off_streak.saturating_add(1);
            self.off_streak < 2
        };
        if on == self.on {
            return None;
        }
        self.on = on;
        Some(on)
    }
}

pub fn spawn_watch(probe: ScreenProbe, events: Sender<EngineEvent>) {
    thread::spawn(move || {
        let mut tracker = ScreenTracker::default();
        loop {
            if let Some(on) = tracker.update(raw_screen_on(&probe)) {
                if events.send(EngineEvent::Display { on }).is_err() {
                    break;
                }
            }
            thread::sleep(SCREEN_POLL);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn off_needs_two_readings() {
        let mut t = ScreenTracker::default();
        assert_eq!(t.update(false), None);
        assert_eq!(t.update(false), Some(false));
        assert_eq!(t.update(false), None);
        assert_eq!(t.update(true), Some(true));
        assert_eq!(t.update(false), None);
        assert_eq!(t.update(true), None);
    }

    #[test]
    fn backlight_probe_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let panel = dir.path().join("backlight/panel0");
        fs::create_dir_all(&panel).unwrap();
        fs::write(panel.join("brightness"), "0\n").unwrap();

        let probe = detect_screen_probe_in(&dir.path().join("fb0/blank"), &dir.path().join("backlight"));
        assert_eq!(probe, Some(ScreenProbe::BacklightBright(panel.join("brightness"))));
        assert!(!raw_screen_on(probe.as_ref().unwrap()));
    }
}
