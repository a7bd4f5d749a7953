#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, RwLock,
    },
    time::Duration,
};

use gesture_keyd::{
    classifier::GestureClassifier,
    clock::{Clock, ManualClock},
    collab::{
        AppLauncher, AudioService, CameraService, Collaborators, DozePulse, HapticEffect,
        KeypadControl, MediaKeyEvent, NotificationService, PowerService, RingerMode, Vibrator,
        ZenMode,
    },
    debounce::{SensorDebouncer, SensorPresence},
    dispatcher::GestureDispatcher,
    engine::{Engine, SensorHub},
    error::{Error, Result},
    handler::{DeviceKeyHandler, KeyHandler},
    key_gate::HardwareKeyGate,
    keys::{KeyAction, KeyEvent},
    queue::GestureQueue,
    settings::SettingsStore,
    state::SharedState,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Torch(String, bool),
    Ringer(RingerMode),
    Zen(ZenMode),
    MediaKey(MediaKeyEvent),
    Pulse,
    WakeLock(String, Duration),
    WakeUp,
    Launch(String),
    LaunchCamera,
    Keypad(bool),
}

/// Every collaborator in one recording fake. Vibrations are kept apart from
/// `calls` so call-sequence assertions stay about side effects.
pub struct FakeDevice {
    pub calls: Mutex<Vec<Call>>,
    pub haptics: Mutex<Vec<HapticEffect>>,
    pub camera_id: Mutex<Option<String>>,
    pub camera_lookups: AtomicUsize,
    pub music_active: AtomicBool,
    pub system_ready: AtomicBool,
    pub fail_everything: AtomicBool,
}

impl Default for FakeDevice {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            haptics: Mutex::new(Vec::new()),
            camera_id: Mutex::new(Some("0".to_string())),
            camera_lookups: AtomicUsize::new(0),
            music_active: AtomicBool::new(true),
            system_ready: AtomicBool::new(true),
            fail_everything: AtomicBool::new(false),
        }
    }
}

impl FakeDevice {
    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail_everything.load(Ordering::SeqCst) {
            return Err(Error::Unavailable("fake"));
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
        self.haptics.lock().unwrap().clear();
    }

    pub fn haptics(&self) -> Vec<HapticEffect> {
        self.haptics.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }
}

impl CameraService for FakeDevice {
    fn find_rear_flash_camera(&self) -> Result<Option<String>> {
        self.camera_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.camera_id.lock().unwrap().clone())
    }
    fn set_torch_mode(&self, camera_id: &str, enabled: bool) -> Result<()> {
        self.record(Call::Torch(camera_id.to_string(), enabled))
    }
}

impl AudioService for FakeDevice {
    fn is_music_active(&self) -> bool {
        self.music_active.load(Ordering::SeqCst)
    }
    fn is_system_ready(&self) -> bool {
        self.system_ready.load(Ordering::SeqCst)
    }
    fn set_ringer_mode(&self, mode: RingerMode) -> Result<()> {
        self.record(Call::Ringer(mode))
    }
    fn dispatch_media_key(&self, event: &MediaKeyEvent) -> Result<()> {
        self.record(Call::MediaKey(*event))
    }
}

impl NotificationService for FakeDevice {
    fn set_zen_mode(&self, mode: ZenMode) -> Result<()> {
        self.record(Call::Zen(mode))
    }
}

impl DozePulse for FakeDevice {
    fn request_pulse(&self) -> Result<()> {
        self.record(Call::Pulse)
    }
}

impl PowerService for FakeDevice {
    fn acquire_wake_lock(&self, tag: &str, timeout: Duration) -> Result<()> {
        self.record(Call::WakeLock(tag.to_string(), timeout))
    }
    fn wake_up(&self) -> Result<()> {
        self.record(Call::WakeUp)
    }
}

impl AppLauncher for FakeDevice {
    fn launch_component(&self, component: &str) -> Result<()> {
        self.record(Call::Launch(component.to_string()))
    }
    fn launch_camera(&self) -> Result<()> {
        self.record(Call::LaunchCamera)
    }
}

impl Vibrator for FakeDevice {
    fn vibrate(&self, effect: HapticEffect) -> Result<()> {
        self.haptics.lock().unwrap().push(effect);
        Ok(())
    }
}

impl KeypadControl for FakeDevice {
    fn set_keypad_enabled(&self, enabled: bool) -> Result<()> {
        self.record(Call::Keypad(enabled))
    }
}

#[derive(Default)]
pub struct FakeSensors {
    pub proximity: AtomicBool,
    pub tilt: Mutex<Option<Duration>>,
}

impl SensorHub for FakeSensors {
    fn set_proximity_listening(&self, on: bool) {
        self.proximity.store(on, Ordering::SeqCst);
    }
    fn set_tilt_listening(&self, latency: Option<Duration>) {
        *self.tilt.lock().unwrap() = latency;
    }
}

/// The whole dispatch core wired to fakes and a manual clock.
pub struct Rig {
    pub clock: Arc<ManualClock>,
    pub settings: Arc<SettingsStore>,
    pub device: Arc<FakeDevice>,
    pub shared: Arc<RwLock<SharedState>>,
    pub proximity_near: Arc<AtomicBool>,
    pub dispatcher: Arc<GestureDispatcher>,
    pub queue: Arc<GestureQueue>,
    pub handler: Arc<KeyHandler>,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_settings(SettingsStore::in_memory())
    }

    pub fn with_settings(settings: SettingsStore) -> Self {
        let clock = Arc::new(ManualClock::new(10_000));
        let settings = Arc::new(settings);
        let device = Arc::new(FakeDevice::default());
        let shared = Arc::new(RwLock::new(SharedState::new()));
        let proximity_near = Arc::new(AtomicBool::new(false));
        let collab = Collaborators {
            camera: device.clone(),
            audio: device.clone(),
            notifications: device.clone(),
            doze: device.clone(),
            power: device.clone(),
            launcher: device.clone(),
            keypad: device.clone(),
            vibrator: device.clone(),
        };
        let clock_dyn: Arc<dyn Clock> = clock.clone();

        let dispatcher = Arc::new(GestureDispatcher::new(
            settings.clone(),
            collab.clone(),
            clock_dyn.clone(),
            shared.clone(),
        ));
        let queue = Arc::new(GestureQueue::new());
        let handler = Arc::new(KeyHandler::new(
            settings.clone(),
            HardwareKeyGate::new(collab.keypad.clone()),
            GestureClassifier::new(settings.clone(), collab.audio.clone(), proximity_near.clone()),
            dispatcher.clone(),
            queue.clone(),
            clock_dyn,
            shared.clone(),
        ));
        device.clear();

        Self {
            clock,
            settings,
            device,
            shared,
            proximity_near,
            dispatcher,
            queue,
            handler,
        }
    }

    pub fn classifier(&self) -> &GestureClassifier {
        self.handler.classifier()
    }

    /// Feed a press and a release; returns whether the release was consumed.
    pub fn tap(&self, scan_code: u16) -> bool {
        self.handler
            .handle_key_event(&KeyEvent::new(scan_code, KeyAction::Press));
        self.handler.handle_key_event(&KeyEvent::release(scan_code))
    }

    /// Run whatever the dispatch worker would pick up next.
    pub fn drain(&self) -> usize {
        let mut n = 0;
        while let Some(req) = self.queue.try_take() {
            self.dispatcher.dispatch(&req.gesture);
            n += 1;
        }
        n
    }

    pub fn engine(&self, presence: SensorPresence, sensors: Arc<FakeSensors>) -> Engine {
        let debouncer = SensorDebouncer::new(
            presence,
            self.settings.doze_features(),
            self.settings.proximity_check_enabled(),
            self.proximity_near.clone(),
        );
        Engine::new(
            self.settings.clone(),
            debouncer,
            sensors,
            self.device.clone(),
            self.handler.clone(),
            None,
            self.clock.clone(),
            self.shared.clone(),
        )
    }
}
