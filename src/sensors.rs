//! Proximity and tilt readers over evdev.
//!
//! Readers always drain their device; samples are only forwarded to the
//! engine while the engine has asked for that stream.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc,
    },
    thread,
    time::Duration,
};

use evdev::{AbsoluteAxisType, Device, InputEvent, InputEventKind};

use crate::{
    config::SENSOR_IDLE_POLL,
    debounce::SensorPresence,
    engine::{EngineEvent, SensorHub},
};

fn is_proximity_device(dev: &Device) -> bool {
    dev.supported_absolute_axes()
        .is_some_and(|axes| axes.contains(AbsoluteAxisType::ABS_DISTANCE))
}

fn is_tilt_device(dev: &Device) -> bool {
    dev.name()
        .map(|n| n.to_ascii_lowercase())
        .is_some_and(|n| n.contains("tilt") || n.contains("pickup"))
}

/// Tilt detectors report through a key or an axis; a value of 1 is a tilt.
/// Timestamps and other side-band events are not samples.
fn tilt_sample(ev: &InputEvent) -> Option<bool> {
    match ev.kind() {
        InputEventKind::Key(_) | InputEventKind::AbsAxis(_) => Some(ev.value() == 1),
        _ => None,
    }
}

fn proximity_max_range(dev: &Device) -> f32 {
    dev.get_abs_state()
        .map(|state| state[AbsoluteAxisType::ABS_DISTANCE.0 as usize].maximum as f32)
        .unwrap_or(1.0)
}

pub struct EvdevSensors {
    presence: SensorPresence,
    proximity_on: Arc<AtomicBool>,
    tilt_on: Arc<AtomicBool>,
}

impl EvdevSensors {
    /// Probe input devices once and start a reader per sensor found.
    pub fn start(events: Sender<EngineEvent>) -> Self {
        let proximity_on = Arc::new(AtomicBool::new(false));
        let tilt_on = Arc::new(AtomicBool::new(false));
        let mut presence = SensorPresence::default();

        for (path, dev) in evdev::enumerate() {
            if !presence.proximity && is_proximity_device(&dev) {
                let max_range = proximity_max_range(&dev);
                log::info!("SENSOR: proximity {} (max {})", path.display(), max_range);
                presence.proximity = true;
                spawn_proximity_reader(dev, max_range, proximity_on.clone(), events.clone());
            } else if !presence.tilt && is_tilt_device(&dev) {
                log::info!("SENSOR: tilt {}", path.display());
                presence.tilt = true;
                spawn_tilt_reader(dev, tilt_on.clone(), events.clone());
            }
        }
        if !presence.proximity {
            log::info!("SENSOR: no proximity sensor");
        }
        if !presence.tilt {
            log::info!("SENSOR: no tilt sensor");
        }

        Self {
            presence,
            proximity_on,
            tilt_on,
        }
    }

    pub fn presence(&self) -> SensorPresence {
        self.presence
    }
}

impl SensorHub for EvdevSensors {
    fn set_proximity_listening(&self, on: bool) {
        self.proximity_on.store(on, Ordering::SeqCst);
    }

    fn set_tilt_listening(&self, latency: Option<Duration>) {
        // evdev has no batching control; the hint is only logged
        if let Some(latency) = latency {
            log::debug!("SENSOR: tilt on (latency hint {:?})", latency);
        }
        self.tilt_on.store(latency.is_some(), Ordering::SeqCst);
    }
}

fn spawn_proximity_reader(
    mut dev: Device,
    max_range: f32,
    listening: Arc<AtomicBool>,
    events: Sender<EngineEvent>,
) {
    thread::spawn(move || loop {
        let batch = match dev.fetch_events() {
            Ok(batch) => batch,
            Err(e) => {
                log::warn!("SENSOR: proximity read failed: {}", e);
                thread::sleep(SENSOR_IDLE_POLL);
                continue;
            }
        };
        for ev in batch {
            let is_distance = matches!(
                ev.kind(),
                InputEventKind::AbsAxis(axis) if axis == AbsoluteAxisType::ABS_DISTANCE
            );
            if !is_distance {
                continue;
            }
            if !listening.load(Ordering::SeqCst) {
                continue;
            }
            let sample = EngineEvent::Proximity {
                distance: ev.value() as f32,
                max_range,
            };
            if events.send(sample).is_err() {
                return;
            }
        }
    });
}

fn spawn_tilt_reader(mut dev: Device, listening: Arc<AtomicBool>, events: Sender<EngineEvent>) {
    thread::spawn(move || loop {
        let batch = match dev.fetch_events() {
            Ok(batch) => batch,
            Err(e) => {
                log::warn!("SENSOR: tilt read failed: {}", e);
                thread::sleep(SENSOR_IDLE_POLL);
                continue;
            }
        };
        for ev in batch {
            let Some(triggered) = tilt_sample(&ev) else {
                continue;
            };
            if !listening.load(Ordering::SeqCst) {
                continue;
            }
            if events.send(EngineEvent::Tilt { triggered }).is_err() {
                return;
            }
        }
    });
}
