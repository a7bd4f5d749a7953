//! Collaborators backed by the Android shell and sysfs.
//!
//! Framework services are reached through `cmd`/`am`/`input` run as the shell
//! UID (`su -lp 2000`), which is what works reliably from a root daemon.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
    sync::{mpsc::Sender, Arc, Mutex},
    thread,
    time::Duration,
};

use crate::{
    collab::{
        AppLauncher, AudioService, CameraService, DozePulse, HapticEffect, KeypadControl,
        MediaKeyAction, MediaKeyCode, MediaKeyEvent, NotificationService, PowerService,
        RingerMode, Vibrator, ZenMode,
    },
    config::{DOZE_PULSE_ACTION, LEDS_DIR, SCREEN_POLL, STILL_CAMERA_ACTION},
    engine::EngineEvent,
    error::{Error, Result},
    media_keys::UinputMediaKeys,
    sysfs,
};

fn find_bin(candidates: &[&str]) -> Option<String> {
    for p in candidates {
        if fs::metadata(p).is_ok() {
            return Some(p.to_string());
        }
    }
    None
}

fn sh_escape_single_quotes(s: &str) -> String {
    s.replace('\'', r#"'\''"#)
}

#[derive(Clone, Debug)]
pub struct Shell {
    cmd: String,
    su: String,
}

impl Shell {
    pub fn detect() -> Self {
        Self {
            cmd: find_bin(&["/system/bin/cmd", "/system/xbin/cmd"])
                .unwrap_or_else(|| "cmd".to_string()),
            su: find_bin(&["/system/bin/su", "/system/xbin/su", "/sbin/su", "/su/bin/su"])
                .unwrap_or_else(|| "su".to_string()),
        }
    }

    /// `cmd <service> <args>` as a shell line.
    pub fn cmd_line(&self, args: &str) -> String {
        format!("{} {}", self.cmd, args)
    }

    /// Run `line` as the shell user, falling back to plain `sh -c`.
    pub fn run(&self, line: &str) -> Result<String> {
        let out = Command::new(&self.su).args(["-lp", "2000", "-c", line]).output();
        if let Ok(out) = out {
            if out.status.success() {
                return Ok(String::from_utf8_lossy(&out.stdout).to_string());
            }
        }

        let out = Command::new("sh")
            .args(["-c", line])
            .output()
            .map_err(|e| Error::Command {
                command: line.to_string(),
                message: e.to_string(),
            })?;
        if out.status.success() {
            return Ok(String::from_utf8_lossy(&out.stdout).to_string());
        }
        Err(Error::Command {
            command: line.to_string(),
            message: format!(
                "code={} {}",
                out.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&out.stderr).trim()
            ),
        })
    }
}

/// `dumpsys media_session` reports a playing session as `state=3`.
pub fn media_session_playing(dump: &str) -> bool {
    dump.lines()
        .map(str::trim)
        .filter(|l| l.starts_with("state=PlaybackState"))
        .any(|l| l.contains("{state=3,") || l.contains("{state=3 "))
}

pub struct AndroidAudio {
    shell: Shell,
    media_keys: Option<Mutex<UinputMediaKeys>>,
}

impl AndroidAudio {
    pub fn new(shell: Shell, media_keys: Option<UinputMediaKeys>) -> Self {
        Self {
            shell,
            media_keys: media_keys.map(Mutex::new),
        }
    }
}

impl AudioService for AndroidAudio {
    fn is_music_active(&self) -> bool {
        match self.shell.run("dumpsys media_session") {
            Ok(dump) => media_session_playing(&dump),
            Err(e) => {
                log::debug!("DISPATCH: media session query failed: {}", e);
                false
            }
        }
    }

    fn is_system_ready(&self) -> bool {
        self.shell
            .run("getprop sys.boot_completed")
            .map(|v| v.trim() == "1")
            .unwrap_or(false)
    }

    fn set_ringer_mode(&self, mode: RingerMode) -> Result<()> {
        let arg = match mode {
            RingerMode::Normal => "NORMAL",
            RingerMode::Vibrate => "VIBRATE",
            RingerMode::Silent => "SILENT",
        };
        self.shell
            .run(&self.shell.cmd_line(&format!("audio set-ringer-mode {}", arg)))
            .map(|_| ())
    }

    fn dispatch_media_key(&self, event: &MediaKeyEvent) -> Result<()> {
        if let Some(keys) = &self.media_keys {
            return keys.lock().unwrap().send(event);
        }
        // `input keyevent` sends its own down/up pair.
        if event.action != MediaKeyAction::Up {
            return Ok(());
        }
        let keycode = match event.code {
            MediaKeyCode::PlayPause => "KEYCODE_MEDIA_PLAY_PAUSE",
            MediaKeyCode::Previous => "KEYCODE_MEDIA_PREVIOUS",
            MediaKeyCode::Next => "KEYCODE_MEDIA_NEXT",
        };
        self.shell.run(&format!("input keyevent {}", keycode)).map(|_| ())
    }
}

pub struct AndroidNotifications {
    shell: Shell,
}

impl AndroidNotifications {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }
}

impl NotificationService for AndroidNotifications {
    fn set_zen_mode(&self, mode: ZenMode) -> Result<()> {
        let arg = match mode {
            ZenMode::Off => "off",
            ZenMode::ImportantInterruptions => "priority",
            ZenMode::Alarms => "alarms",
            ZenMode::NoInterruptions => "none",
        };
        self.shell
            .run(&self.shell.cmd_line(&format!("notification set_dnd {}", arg)))
            .map(|_| ())
    }
}

pub struct AndroidDoze {
    shell: Shell,
}

impl AndroidDoze {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }
}

impl DozePulse for AndroidDoze {
    fn request_pulse(&self) -> Result<()> {
        self.shell
            .run(&format!("am broadcast -a {} --user current", DOZE_PULSE_ACTION))
            .map(|_| ())
    }
}

/// Prebaked effect ids understood by `cmd vibrator_manager`.
fn prebaked_effect_id(effect: HapticEffect) -> u8 {
    match effect {
        HapticEffect::Click => 0,
        HapticEffect::DoubleClick => 1,
        HapticEffect::Thud => 3,
        HapticEffect::Pop => 4,
    }
}

pub struct AndroidVibrator {
    shell: Shell,
}

impl AndroidVibrator {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }
}

impl Vibrator for AndroidVibrator {
    fn vibrate(&self, effect: HapticEffect) -> Result<()> {
        let args = format!("vibrator_manager synced prebaked {}", prebaked_effect_id(effect));
        self.shell.run(&self.shell.cmd_line(&args)).map(|_| ())
    }
}

pub struct AndroidLauncher {
    shell: Shell,
}

impl AndroidLauncher {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }
}

impl AppLauncher for AndroidLauncher {
    fn launch_component(&self, component: &str) -> Result<()> {
        let line = format!(
            "am start --user current -n '{}'",
            sh_escape_single_quotes(component)
        );
        self.shell.run(&line).map(|_| ())
    }

    fn launch_camera(&self) -> Result<()> {
        self.shell
            .run(&format!("am start --user current -a {}", STILL_CAMERA_ACTION))
            .map(|_| ())
    }
}

/// Kernel wake locks through `/sys/power/wake_lock`, wake-up through `input`.
pub struct AndroidPower {
    shell: Shell,
    wake_lock_node: PathBuf,
}

impl AndroidPower {
    pub fn new(shell: Shell, wake_lock_node: &Path) -> Self {
        Self {
            shell,
            wake_lock_node: wake_lock_node.to_path_buf(),
        }
    }
}

impl PowerService for AndroidPower {
    fn acquire_wake_lock(&self, tag: &str, timeout: Duration) -> Result<()> {
        if !self.wake_lock_node.exists() {
            return Err(Error::Unavailable("wake_lock"));
        }
        sysfs::write_str(
            &self.wake_lock_node,
            &format!("{} {}", tag, timeout.as_nanos()),
        )
    }

    fn wake_up(&self) -> Result<()> {
        self.shell.run("input keyevent KEYCODE_WAKEUP").map(|_| ())
    }
}

pub struct SysfsKeypad {
    node: PathBuf,
}

impl SysfsKeypad {
    pub fn new(node: &Path) -> Self {
        Self {
            node: node.to_path_buf(),
        }
    }
}

impl KeypadControl for SysfsKeypad {
    fn set_keypad_enabled(&self, enabled: bool) -> Result<()> {
        if !self.node.exists() {
            return Err(Error::Unavailable("keypad"));
        }
        sysfs::write_str(&self.node, if enabled { "1" } else { "0" })
    }
}

/// Torch through the LED class device of the rear flash.
pub struct SysfsTorch {
    leds_dir: PathBuf,
}

impl Default for SysfsTorch {
    fn default() -> Self {
        Self::new(Path::new(LEDS_DIR))
    }
}

impl SysfsTorch {
    pub fn new(leds_dir: &Path) -> Self {
        Self {
            leds_dir: leds_dir.to_path_buf(),
        }
    }

    fn led_dir(&self, camera_id: &str) -> PathBuf {
        self.leds_dir.join(camera_id)
    }

    pub fn brightness(&self, camera_id: &str) -> Option<i32> {
        sysfs::read_i32(&self.led_dir(camera_id).join("brightness"))
    }

    /// Report torch changes made by anyone else into the engine.
    pub fn spawn_watch(self: Arc<Self>, camera_id: String, events: Sender<EngineEvent>) {
        thread::spawn(move || {
            let mut last = self.brightness(&camera_id).map(|b| b > 0);
            loop {
                thread::sleep(SCREEN_POLL);
                let now = self.brightness(&camera_id).map(|b| b > 0);
                if now == last {
                    continue;
                }
                last = now;
                let event = match now {
                    Some(enabled) => EngineEvent::TorchModeChanged {
                        camera_id: camera_id.clone(),
                        enabled,
                    },
                    None => EngineEvent::TorchUnavailable {
                        camera_id: camera_id.clone(),
                    },
                };
                if events.send(event).is_err() {
                    break;
                }
            }
        });
    }
}

impl CameraService for SysfsTorch {
    fn find_rear_flash_camera(&self) -> Result<Option<String>> {
        let mut names: Vec<String> = fs::read_dir(&self.leds_dir)?
            .flatten()
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|n| n.contains("torch") || n.contains("flashlight"))
            .collect();
        names.sort();
        // the first torch LED sits next to the main sensor on these boards
        Ok(names
            .into_iter()
            .find(|n| self.led_dir(n).join("brightness").exists()))
    }

    fn set_torch_mode(&self, camera_id: &str, enabled: bool) -> Result<()> {
        let dir = self.led_dir(camera_id);
        let value = if enabled {
            sysfs::read_i32(&dir.join("max_brightness")).unwrap_or(1).max(1)
        } else {
            0
        };
        sysfs::write_str(&dir.join("brightness"), &value.to_string())
    }
}
