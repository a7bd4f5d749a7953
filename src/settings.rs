//! Settings store: the daemon's equivalent of the system settings table.
//!
//! Values live in a flat JSON object on disk. Readers always go through
//! [`SettingsStore`], so every lookup sees the latest value; components that
//! cache a flag subscribe to [`SettingsChange`] notifications instead.

use serde_json::{Map, Value};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Receiver, Sender},
        Mutex, RwLock,
    },
};

use crate::{
    error::Result,
    keys::{GestureChannel, SliderPosition},
};

pub const KEY_HARDWARE_KEYS_DISABLE: &str = "hardware_keys_disable";
pub const KEY_PROXI_CHECK_ENABLED: &str = "device_proxi_check_enabled";
pub const KEY_FEATURE_SETTINGS: &str = "device_feature_settings";
pub const KEY_SLIDER_MAPPING: &str = "button_extra_key_mapping";
pub const KEY_GESTURE_FEEDBACK_ENABLED: &str = "device_off_screen_gesture_feedback_enabled";
pub const GESTURE_MAPPING_PREFIX: &str = "device_gesture_mapping_";

pub fn binding_key(channel: GestureChannel) -> String {
    format!("{}{}", GESTURE_MAPPING_PREFIX, channel.name())
}

/// Keys whose values changed, and the store revision after the change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsChange {
    pub keys: Vec<String>,
    pub rev: u64,
}

impl SettingsChange {
    pub fn touches(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn touches_bindings(&self) -> bool {
        self.keys.iter().any(|k| k.starts_with(GESTURE_MAPPING_PREFIX))
    }
}

#[derive(Debug, Default)]
struct Inner {
    values: Map<String, Value>,
    rev: u64,
}

#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    inner: RwLock<Inner>,
    subscribers: Mutex<Vec<Sender<SettingsChange>>>,
}

impl SettingsStore {
    /// Store backed by `path`. Missing or unparsable files are reset to an empty object.
    pub fn open(path: &Path) -> Self {
        let values = load_or_init(path);
        Self {
            path: Some(path.to_path_buf()),
            inner: RwLock::new(Inner { values, rev: 0 }),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: RwLock::new(Inner::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn rev(&self) -> u64 {
        self.inner.read().unwrap().rev
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner.read().unwrap().values.clone()
    }

    pub fn subscribe(&self) -> Receiver<SettingsChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        let g = self.inner.read().unwrap();
        match g.values.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().map(|v| v == 1).unwrap_or(default),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => default,
            },
            _ => default,
        }
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        let g = self.inner.read().unwrap();
        match g.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => default.to_string(),
        }
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_many(Map::from_iter([(key.to_string(), Value::Bool(value))]))
            .map(|_| ())
    }

    pub fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(Map::from_iter([(key.to_string(), Value::String(value.to_string()))]))
            .map(|_| ())
    }

    /// Merge `updates` into the store, persist, and notify subscribers.
    /// Returns the keys that actually changed.
    pub fn set_many(&self, updates: Map<String, Value>) -> Result<Vec<String>> {
        let change = {
            let mut g = self.inner.write().unwrap();
            let mut next = g.values.clone();
            let mut changed = Vec::new();
            for (k, v) in updates {
                if next.get(&k) != Some(&v) {
                    next.insert(k.clone(), v);
                    changed.push(k);
                }
            }
            if changed.is_empty() {
                return Ok(changed);
            }
            if let Some(path) = &self.path {
                write_settings_atomic(path, &next)?;
            }
            g.values = next;
            g.rev = g.rev.wrapping_add(1);
            SettingsChange { keys: changed, rev: g.rev }
        };
        let keys = change.keys.clone();
        self.notify(change);
        Ok(keys)
    }

    /// Re-read the backing file after an outside edit.
    pub fn reload(&self) -> Vec<String> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let change = {
            // read under the lock so a concurrent set_many cannot be reverted
            let mut g = self.inner.write().unwrap();
            let fresh = load_or_init(path);
            let changed = diff_keys(&g.values, &fresh);
            if changed.is_empty() {
                return changed;
            }
            g.values = fresh;
            g.rev = g.rev.wrapping_add(1);
            SettingsChange { keys: changed, rev: g.rev }
        };
        let keys = change.keys.clone();
        self.notify(change);
        keys
    }

    /// Write the in-memory values back, e.g. after the file was deleted.
    pub fn persist(&self) -> Result<()> {
        if let Some(path) = &self.path {
            let values = self.snapshot();
            write_settings_atomic(path, &values)?;
        }
        Ok(())
    }

    fn notify(&self, change: SettingsChange) {
        log::debug!("CFG: rev {} changed {:?}", change.rev, change.keys);
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(change.clone()).is_ok());
    }

    // Typed accessors. None of these cache.

    pub fn hardware_keys_disabled(&self) -> bool {
        self.get_bool(KEY_HARDWARE_KEYS_DISABLE, false)
    }

    pub fn proximity_check_enabled(&self) -> bool {
        self.get_bool(KEY_PROXI_CHECK_ENABLED, true)
    }

    /// Vibrate when an off-screen gesture fires.
    pub fn gesture_feedback_enabled(&self) -> bool {
        self.get_bool(KEY_GESTURE_FEEDBACK_ENABLED, false)
    }

    pub fn doze_features(&self) -> DozeFeatures {
        DozeFeatures::parse(&self.get_string(KEY_FEATURE_SETTINGS, ""))
    }

    pub fn slider_map(&self) -> SliderPositionMap {
        SliderPositionMap::parse(&self.get_string(KEY_SLIDER_MAPPING, ""))
    }

    pub fn binding(&self, channel: GestureChannel) -> GestureBinding {
        GestureBinding::parse(&self.get_string(&binding_key(channel), ""))
            .unwrap_or_else(|| GestureBinding::default_for(channel))
    }
}

fn diff_keys(old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = new
        .iter()
        .filter(|(k, v)| old.get(*k) != Some(*v))
        .map(|(k, _)| k.clone())
        .collect();
    keys.extend(old.keys().filter(|k| !new.contains_key(*k)).cloned());
    keys
}

pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn load_or_init(path: &Path) -> Map<String, Value> {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Map<String, Value>>(&s) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("CFG: failed to parse settings: {} (reset to default)", e);
                let def = Map::new();
                if let Err(e) = write_settings_atomic(path, &def) {
                    log::warn!("CFG: could not rewrite {}: {}", path.display(), e);
                }
                def
            }
        },
        Err(_) => {
            let def = Map::new();
            if let Err(e) = write_settings_atomic(path, &def) {
                log::warn!("CFG: could not create {}: {}", path.display(), e);
            }
            def
        }
    }
}

pub fn write_settings_atomic(path: &Path, values: &Map<String, Value>) -> Result<()> {
    ensure_parent_dir(path)?;
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    let data = serde_json::to_string_pretty(values)?;
    fs::write(&tmp, data.as_bytes())?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// What a gesture channel is bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GestureBinding {
    Disabled,
    Torch,
    Camera,
    MediaPlayPause,
    MediaPrevious,
    MediaNext,
    Wake,
    /// Opaque component reference handed to the launcher.
    LaunchApp(String),
}

impl GestureBinding {
    /// `None` for an empty value, meaning "use the channel default".
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let b = match s {
            "" => return None,
            "disabled" => GestureBinding::Disabled,
            "torch" => GestureBinding::Torch,
            "camera" => GestureBinding::Camera,
            "music_play" => GestureBinding::MediaPlayPause,
            "music_prev" => GestureBinding::MediaPrevious,
            "music_next" => GestureBinding::MediaNext,
            "wake" => GestureBinding::Wake,
            other => GestureBinding::LaunchApp(other.to_string()),
        };
        Some(b)
    }

    pub fn as_setting(&self) -> &str {
        match self {
            GestureBinding::Disabled => "disabled",
            GestureBinding::Torch => "torch",
            GestureBinding::Camera => "camera",
            GestureBinding::MediaPlayPause => "music_play",
            GestureBinding::MediaPrevious => "music_prev",
            GestureBinding::MediaNext => "music_next",
            GestureBinding::Wake => "wake",
            GestureBinding::LaunchApp(c) => c,
        }
    }

    pub fn default_for(channel: GestureChannel) -> Self {
        match channel {
            GestureChannel::Circle => GestureBinding::Camera,
            GestureChannel::V => GestureBinding::Torch,
            GestureChannel::TwoFingerSwipe => GestureBinding::MediaPlayPause,
            GestureChannel::LeftV => GestureBinding::MediaPrevious,
            GestureChannel::RightV => GestureBinding::MediaNext,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, GestureBinding::Disabled)
    }
}

/// Slider position → mode id. All three entries or none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliderPositionMap {
    modes: [i32; 3],
}

impl Default for SliderPositionMap {
    fn default() -> Self {
        Self { modes: [5, 3, 0] }
    }
}

impl SliderPositionMap {
    pub fn parse(s: &str) -> Self {
        if !s.contains(',') {
            return Self::default();
        }
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Self::default();
        }
        let mut modes = [0i32; 3];
        for (slot, part) in modes.iter_mut().zip(parts) {
            match part.trim().parse::<i32>() {
                Ok(v) => *slot = v,
                Err(_) => return Self::default(),
            }
        }
        Self { modes }
    }

    pub fn mode_at(&self, position: SliderPosition) -> i32 {
        self.modes[position.index()]
    }

    pub fn to_setting(&self) -> String {
        format!("{},{},{}", self.modes[0], self.modes[1], self.modes[2])
    }
}

/// The packed `wave:pocket:tilt` doze feature switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DozeFeatures {
    pub wave: bool,
    pub pocket: bool,
    pub tilt: bool,
}

impl DozeFeatures {
    pub fn parse(s: &str) -> Self {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 3 {
            return Self::default();
        }
        let flag = |p: &str| p.trim().eq_ignore_ascii_case("true");
        Self {
            wave: flag(parts[0]),
            pocket: flag(parts[1]),
            tilt: flag(parts[2]),
        }
    }

    pub fn to_setting(&self) -> String {
        format!("{}:{}:{}", self.wave, self.pocket, self.tilt)
    }

    pub fn uses_proximity(&self) -> bool {
        self.wave || self.pocket
    }
}
