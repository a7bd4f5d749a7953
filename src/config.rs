use std::time::Duration;

pub const SETTINGS_PATH: &str = "/data/adb/modules/gesture_keyd/config/settings.json";
pub const SETTINGS_PATH_ENV: &str = "GESTURE_KEYD_SETTINGS";

pub const BIND_ADDR: &str = "127.0.0.1:1005";

// Touchpanel / keypad nodes
pub const KEYPAD_ENABLE_NODE: &str = "/proc/touchpanel/keypad_enable";
pub const CAMERA_GESTURE_NODE: &str = "/proc/touchpanel/camera_enable";
pub const FLASHLIGHT_GESTURE_NODE: &str = "/proc/touchpanel/flashlight_enable";
pub const MUSIC_GESTURE_NODE: &str = "/proc/touchpanel/music_enable";

// Power / leds
pub const WAKE_LOCK_NODE: &str = "/sys/power/wake_lock";
pub const LEDS_DIR: &str = "/sys/class/leds";
pub const GESTURE_WAKELOCK_TAG: &str = "GestureWakeLock";

// Android intents / actions
pub const DOZE_PULSE_ACTION: &str = "com.android.systemui.doze.pulse";
pub const STILL_CAMERA_ACTION: &str = "android.media.action.STILL_IMAGE_CAMERA";

// Timings
pub const GESTURE_WAKELOCK_DURATION: Duration = Duration::from_millis(2000);
pub const HANDWAVE_MAX_DELTA_MS: i64 = 1000;
pub const POCKET_MIN_DELTA_MS: i64 = 5000;
pub const MIN_PULSE_INTERVAL_MS: i64 = 2500;
pub const TILT_BATCH_LATENCY: Duration = Duration::from_millis(100);

// Loops
pub const SCREEN_POLL: Duration = Duration::from_millis(500);
pub const SETTINGS_POLL: Duration = Duration::from_millis(1500);
pub const SENSOR_IDLE_POLL: Duration = Duration::from_millis(250);

// Slider
pub const DEFAULT_SLIDER_MAPPING: &str = "5,3,0";
