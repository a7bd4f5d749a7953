use std::{
    env,
    path::{Path, PathBuf},
    sync::{atomic::AtomicBool, mpsc, Arc, RwLock},
};

use gesture_keyd::{
    android::{
        AndroidAudio, AndroidDoze, AndroidLauncher, AndroidNotifications, AndroidPower,
        AndroidVibrator, Shell, SysfsKeypad, SysfsTorch,
    },
    classifier::GestureClassifier,
    clock::{Clock, MonotonicClock},
    collab::{CameraService, Collaborators},
    config::*,
    debounce::SensorDebouncer,
    dispatcher::GestureDispatcher,
    engine::{self, Engine},
    gesture_nodes::GestureNodes,
    handler::KeyHandler,
    input,
    key_gate::HardwareKeyGate,
    media_keys::UinputMediaKeys,
    queue::GestureQueue,
    screen,
    sensors::EvdevSensors,
    settings::SettingsStore,
    settings_watch,
    state::SharedState,
    web,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("gesture_keyd starting");

    let settings_path = env::var_os(SETTINGS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(SETTINGS_PATH));
    let settings = Arc::new(SettingsStore::open(&settings_path));
    log::info!("CFG: {}", settings_path.display());

    let shared = Arc::new(RwLock::new(SharedState::new()));
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let shell = Shell::detect();

    let media_keys = match UinputMediaKeys::create() {
        Ok(keys) => Some(keys),
        Err(e) => {
            log::warn!("DISPATCH: uinput unavailable ({}), using input keyevent", e);
            None
        }
    };
    let torch = Arc::new(SysfsTorch::default());
    let collab = Collaborators {
        camera: torch.clone(),
        audio: Arc::new(AndroidAudio::new(shell.clone(), media_keys)),
        notifications: Arc::new(AndroidNotifications::new(shell.clone())),
        doze: Arc::new(AndroidDoze::new(shell.clone())),
        power: Arc::new(AndroidPower::new(shell.clone(), Path::new(WAKE_LOCK_NODE))),
        vibrator: Arc::new(AndroidVibrator::new(shell.clone())),
        launcher: Arc::new(AndroidLauncher::new(shell)),
        keypad: Arc::new(SysfsKeypad::new(Path::new(KEYPAD_ENABLE_NODE))),
    };

    let (tx, rx) = mpsc::channel();
    let proximity_near = Arc::new(AtomicBool::new(false));

    let dispatcher = Arc::new(GestureDispatcher::new(
        settings.clone(),
        collab.clone(),
        clock.clone(),
        shared.clone(),
    ));
    let queue = Arc::new(GestureQueue::new());
    let handler = Arc::new(KeyHandler::new(
        settings.clone(),
        HardwareKeyGate::new(collab.keypad.clone()),
        GestureClassifier::new(settings.clone(), collab.audio.clone(), proximity_near.clone()),
        dispatcher.clone(),
        queue.clone(),
        clock.clone(),
        shared.clone(),
    ));

    let sensors = Arc::new(EvdevSensors::start(tx.clone()));
    let debouncer = SensorDebouncer::new(
        sensors.presence(),
        settings.doze_features(),
        settings.proximity_check_enabled(),
        proximity_near,
    );
    let engine = Engine::new(
        settings.clone(),
        debouncer,
        sensors,
        collab.doze.clone(),
        handler.clone(),
        Some(GestureNodes::default()),
        clock,
        shared.clone(),
    );

    engine::forward_settings(settings.subscribe(), tx.clone());
    settings_watch::spawn(settings.clone(), shared.clone(), SETTINGS_POLL);

    match screen::detect_screen_probe() {
        Some(probe) => {
            log::info!("SCREEN: {:?}", probe);
            screen::spawn_watch(probe, tx.clone());
        }
        None => log::warn!("SCREEN: probe not found (assume ON)"),
    }

    match torch.find_rear_flash_camera() {
        Ok(Some(id)) => {
            log::info!("DISPATCH: torch led {}", id);
            torch.clone().spawn_watch(id, tx.clone());
        }
        Ok(None) => log::info!("DISPATCH: no torch led"),
        Err(e) => log::warn!("DISPATCH: torch lookup failed: {}", e),
    }

    web::spawn(shared.clone(), settings.clone(), BIND_ADDR.to_string());

    let worker = engine::spawn_dispatch_worker(queue.clone(), dispatcher);
    let readers = input::spawn_readers(handler, collab.launcher.clone(), collab.power.clone());
    if readers == 0 {
        log::error!("KEY: no gesture input devices found");
    }
    drop(tx);

    if engine::spawn(engine, rx).join().is_err() {
        log::error!("SENSOR: engine thread panicked");
    }
    queue.close();
    let _ = worker.join();
}
