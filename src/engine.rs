//! The coordinating thread.
//!
//! All display, sensor, torch and settings traffic arrives on one channel and
//! is handled here in arrival order. The debouncer lives on this thread only.

use std::{
    sync::{mpsc::Receiver, mpsc::Sender, Arc, RwLock},
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{
    clock::Clock,
    collab::DozePulse,
    debounce::{SensorDebouncer, Subscriptions},
    dispatcher::GestureDispatcher,
    gesture_nodes::GestureNodes,
    handler::KeyHandler,
    queue::GestureQueue,
    settings::{SettingsChange, SettingsStore, KEY_FEATURE_SETTINGS, KEY_PROXI_CHECK_ENABLED},
    state::SharedState,
};

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Display { on: bool },
    Proximity { distance: f32, max_range: f32 },
    Tilt { triggered: bool },
    TorchModeChanged { camera_id: String, enabled: bool },
    TorchUnavailable { camera_id: String },
    SettingsChanged(SettingsChange),
    Shutdown,
}

/// Turns sensor delivery on and off.
pub trait SensorHub: Send + Sync {
    fn set_proximity_listening(&self, on: bool);
    /// `None` stops tilt delivery; `Some` carries the batching latency hint.
    fn set_tilt_listening(&self, latency: Option<Duration>);
}

pub struct Engine {
    settings: Arc<SettingsStore>,
    debouncer: SensorDebouncer,
    sensors: Arc<dyn SensorHub>,
    doze: Arc<dyn DozePulse>,
    handler: Arc<KeyHandler>,
    nodes: Option<GestureNodes>,
    clock: Arc<dyn Clock>,
    shared: Arc<RwLock<SharedState>>,
    screen_on: bool,
}

impl Engine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Arc<SettingsStore>,
        debouncer: SensorDebouncer,
        sensors: Arc<dyn SensorHub>,
        doze: Arc<dyn DozePulse>,
        handler: Arc<KeyHandler>,
        nodes: Option<GestureNodes>,
        clock: Arc<dyn Clock>,
        shared: Arc<RwLock<SharedState>>,
    ) -> Self {
        let mut engine = Self {
            settings,
            debouncer,
            sensors,
            doze,
            handler,
            nodes,
            clock,
            shared,
            screen_on: true,
        };
        if let Some(nodes) = engine.nodes.as_mut() {
            nodes.sync(&engine.settings);
        }
        {
            let presence = engine.debouncer.presence();
            let mut s = engine.shared.write().unwrap();
            s.sensors.proximity_present = presence.proximity;
            s.sensors.tilt_present = presence.tilt;
            s.settings_rev = engine.settings.rev();
        }
        engine
    }

    pub fn debouncer(&self) -> &SensorDebouncer {
        &self.debouncer
    }

    /// Returns false once the engine should stop.
    pub fn handle(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::Display { on } => self.on_display(on),
            EngineEvent::Proximity { distance, max_range } => {
                let now = self.clock.now_ms();
                let wake = self.debouncer.on_proximity(distance, max_range, now);
                if self.debouncer.subscriptions().proximity {
                    self.shared.write().unwrap().sensors.proximity_near = distance < max_range;
                }
                if wake {
                    self.request_pulse();
                }
            }
            EngineEvent::Tilt { triggered } => {
                if self.debouncer.on_tilt(triggered, self.clock.now_ms()) {
                    self.request_pulse();
                }
            }
            EngineEvent::TorchModeChanged { camera_id, enabled } => {
                self.handler.dispatcher().on_torch_mode_changed(&camera_id, enabled);
            }
            EngineEvent::TorchUnavailable { camera_id } => {
                self.handler.dispatcher().on_torch_unavailable(&camera_id);
            }
            EngineEvent::SettingsChanged(change) => self.on_settings_changed(&change),
            EngineEvent::Shutdown => return false,
        }
        true
    }

    pub fn run(mut self, events: Receiver<EngineEvent>) {
        log::info!("SENSOR: engine running");
        while let Ok(event) = events.recv() {
            if !self.handle(event) {
                break;
            }
        }
        self.handle(EngineEvent::Display { on: true });
        log::info!("SENSOR: engine stopped");
    }

    fn on_display(&mut self, on: bool) {
        if on == self.screen_on {
            return;
        }
        self.screen_on = on;
        log::info!("SENSOR: display {}", if on { "on" } else { "off" });

        let subs = if on {
            self.debouncer.on_display_on()
        } else {
            self.debouncer.on_display_off(self.clock.now_ms())
        };
        self.apply_subscriptions(subs);

        let mut s = self.shared.write().unwrap();
        s.info.screen_on = on;
        if on {
            s.sensors.proximity_near = false;
        }
    }

    fn apply_subscriptions(&self, subs: Subscriptions) {
        self.sensors.set_proximity_listening(subs.proximity);
        self.sensors.set_tilt_listening(subs.tilt);
        let mut s = self.shared.write().unwrap();
        s.sensors.proximity_listening = subs.proximity;
        s.sensors.tilt_listening = subs.tilt.is_some();
    }

    fn request_pulse(&self) {
        log::info!("SENSOR: doze pulse");
        if let Err(e) = self.doze.request_pulse() {
            log::warn!("SENSOR: doze pulse failed: {}", e);
            return;
        }
        self.shared.write().unwrap().counters.doze_pulses += 1;
    }

    fn on_settings_changed(&mut self, change: &SettingsChange) {
        self.handler.apply_settings_change(change);
        if change.touches(KEY_FEATURE_SETTINGS) || change.touches(KEY_PROXI_CHECK_ENABLED) {
            self.debouncer.apply_settings(
                self.settings.doze_features(),
                self.settings.proximity_check_enabled(),
            );
        }
        if change.touches_bindings() {
            if let Some(nodes) = self.nodes.as_mut() {
                nodes.sync(&self.settings);
            }
        }
        let mut s = self.shared.write().unwrap();
        s.settings_rev = change.rev;
        s.last_settings_error = None;
    }
}

pub fn spawn(engine: Engine, events: Receiver<EngineEvent>) -> JoinHandle<()> {
    thread::spawn(move || engine.run(events))
}

/// Drain the gesture queue until it is closed.
pub fn spawn_dispatch_worker(
    queue: Arc<GestureQueue>,
    dispatcher: Arc<GestureDispatcher>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Some(req) = queue.take() {
            log::debug!("DISPATCH: {} issued at {}", req.gesture.label(), req.issued_at_ms);
            dispatcher.dispatch(&req.gesture);
        }
    })
}

/// Forward settings notifications into the engine channel.
pub fn forward_settings(
    changes: Receiver<SettingsChange>,
    events: Sender<EngineEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for change in changes {
            if events.send(EngineEvent::SettingsChanged(change)).is_err() {
                break;
            }
        }
    })
}
