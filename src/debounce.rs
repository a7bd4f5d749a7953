//! Screen-off sensor debouncing.
//!
//! Proximity: a quick near→far edge is a hand wave, a slow one is the phone
//! leaving a pocket. Tilt: at most one accepted sample per window. Both only
//! run while the display is off.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use serde::Serialize;

use crate::{
    config::{HANDWAVE_MAX_DELTA_MS, MIN_PULSE_INTERVAL_MS, POCKET_MIN_DELTA_MS, TILT_BATCH_LATENCY},
    settings::DozeFeatures,
};

/// Which sensors the device has. Probed once at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SensorPresence {
    pub proximity: bool,
    pub tilt: bool,
}

/// Sensor streams the debouncer wants delivered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Subscriptions {
    pub proximity: bool,
    /// Reporting latency hint when tilt is wanted.
    pub tilt: Option<Duration>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ProximityWindow {
    was_near: bool,
    last_sample_ms: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TiltWindow {
    last_tilt_ms: i64,
}

#[derive(Debug)]
pub struct SensorDebouncer {
    presence: SensorPresence,
    features: DozeFeatures,
    proxi_check: bool,
    proximity: Option<ProximityWindow>,
    tilt: Option<TiltWindow>,
    proximity_near: Arc<AtomicBool>,
}

impl SensorDebouncer {
    pub fn new(
        presence: SensorPresence,
        features: DozeFeatures,
        proxi_check: bool,
        proximity_near: Arc<AtomicBool>,
    ) -> Self {
        Self {
            presence,
            features,
            proxi_check,
            proximity: None,
            tilt: None,
            proximity_near,
        }
    }

    pub fn presence(&self) -> SensorPresence {
        self.presence
    }

    pub fn features(&self) -> DozeFeatures {
        self.features
    }

    /// Takes effect for the next screen-off window; the edge checks of an
    /// open window see the new switches immediately.
    pub fn apply_settings(&mut self, features: DozeFeatures, proxi_check: bool) {
        self.features = features;
        self.proxi_check = proxi_check;
    }

    fn wants_proximity(&self) -> bool {
        self.presence.proximity && (self.features.uses_proximity() || self.proxi_check)
    }

    fn wants_tilt(&self) -> bool {
        self.presence.tilt && self.features.tilt
    }

    pub fn subscriptions(&self) -> Subscriptions {
        Subscriptions {
            proximity: self.proximity.is_some(),
            tilt: self.tilt.map(|_| TILT_BATCH_LATENCY),
        }
    }

    pub fn on_display_off(&mut self, now_ms: i64) -> Subscriptions {
        self.proximity = self.wants_proximity().then_some(ProximityWindow {
            was_near: false,
            last_sample_ms: now_ms,
        });
        self.tilt = self.wants_tilt().then_some(TiltWindow { last_tilt_ms: now_ms });
        self.subscriptions()
    }

    pub fn on_display_on(&mut self) -> Subscriptions {
        self.proximity = None;
        self.tilt = None;
        self.proximity_near.store(false, Ordering::SeqCst);
        self.subscriptions()
    }

    /// Returns true when the sample should wake the display.
    pub fn on_proximity(&mut self, distance: f32, max_range: f32, now_ms: i64) -> bool {
        let features = self.features;
        let Some(window) = self.proximity.as_mut() else {
            return false;
        };
        let is_near = distance < max_range;
        self.proximity_near.store(is_near, Ordering::SeqCst);

        let mut wake = false;
        if features.uses_proximity() && window.was_near && !is_near {
            let delta = now_ms - window.last_sample_ms;
            if features.wave && delta < HANDWAVE_MAX_DELTA_MS {
                log::debug!("SENSOR: hand wave after {} ms", delta);
                wake = true;
            }
            if features.pocket && delta > POCKET_MIN_DELTA_MS {
                log::debug!("SENSOR: out of pocket after {} ms", delta);
                wake = true;
            }
        }
        window.last_sample_ms = now_ms;
        window.was_near = is_near;
        wake
    }

    pub fn on_tilt(&mut self, triggered: bool, now_ms: i64) -> bool {
        let Some(window) = self.tilt.as_mut() else {
            return false;
        };
        if now_ms - window.last_tilt_ms < MIN_PULSE_INTERVAL_MS {
            return false;
        }
        window.last_tilt_ms = now_ms;
        triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH: SensorPresence = SensorPresence {
        proximity: true,
        tilt: true,
    };

    fn debouncer(features: &str, proxi_check: bool) -> SensorDebouncer {
        SensorDebouncer::new(
            BOTH,
            DozeFeatures::parse(features),
            proxi_check,
            Arc::new(AtomicBool::new(false)),
        )
    }

    /// near at `t0`, far at `t0 + delta`; returns whether the far sample woke.
    fn edge(d: &mut SensorDebouncer, t0: i64, delta: i64) -> bool {
        assert!(!d.on_proximity(0.0, 5.0, t0));
        d.on_proximity(5.0, 5.0, t0 + delta)
    }

    #[test]
    fn hand_wave_window() {
        let mut d = debouncer("true:false:false", false);
        d.on_display_off(0);
        assert!(edge(&mut d, 100, 999));
        assert!(!edge(&mut d, 5_000, 1_000));
    }

    #[test]
    fn pocket_window() {
        let mut d = debouncer("false:true:false", false);
        d.on_display_off(0);
        assert!(!edge(&mut d, 100, 5_000));
        assert!(edge(&mut d, 20_000, 5_001));
    }

    #[test]
    fn dead_band_between_wave_and_pocket() {
        let mut d = debouncer("true:true:false", false);
        d.on_display_off(0);
        for (i, delta) in [1_000, 2_500, 5_000].into_iter().enumerate() {
            assert!(!edge(&mut d, 100_000 * (i as i64 + 1), delta), "delta {}", delta);
        }
    }

    #[test]
    fn far_to_far_never_wakes() {
        let mut d = debouncer("true:true:false", false);
        d.on_display_off(0);
        assert!(!d.on_proximity(5.0, 5.0, 10));
        assert!(!d.on_proximity(5.0, 5.0, 20));
    }

    #[test]
    fn proximity_check_alone_listens_without_waking() {
        let near = Arc::new(AtomicBool::new(false));
        let mut d = SensorDebouncer::new(BOTH, DozeFeatures::default(), true, near.clone());
        let subs = d.on_display_off(0);
        assert!(subs.proximity);
        assert_eq!(subs.tilt, None);

        assert!(!edge(&mut d, 10, 100));
        d.on_proximity(0.0, 5.0, 200);
        assert!(near.load(Ordering::SeqCst));

        assert_eq!(d.on_display_on(), Subscriptions::default());
        assert!(!near.load(Ordering::SeqCst));
    }

    #[test]
    fn missing_sensor_never_listens() {
        let mut d = SensorDebouncer::new(
            SensorPresence::default(),
            DozeFeatures::parse("true:true:true"),
            true,
            Arc::new(AtomicBool::new(false)),
        );
        assert_eq!(d.on_display_off(0), Subscriptions::default());
        assert!(!edge(&mut d, 10, 100));
        assert!(!d.on_tilt(true, 10_000));
    }

    #[test]
    fn tilt_debounce() {
        let mut d = debouncer("false:false:true", false);
        let subs = d.on_display_off(0);
        assert_eq!(subs.tilt, Some(TILT_BATCH_LATENCY));
        assert!(!subs.proximity);

        assert!(!d.on_tilt(true, 1_000));
        assert!(d.on_tilt(true, 3_000));
        assert!(!d.on_tilt(true, 5_499));
        assert!(d.on_tilt(true, 5_500));
        // accepted but not tilted still moves the window
        assert!(!d.on_tilt(false, 8_000));
        assert!(!d.on_tilt(true, 9_000));
    }

    #[test]
    fn samples_while_idle_are_ignored() {
        let mut d = debouncer("true:true:true", true);
        assert!(!edge(&mut d, 0, 10));
        assert!(!d.on_tilt(true, 10_000));
        d.on_display_off(0);
        d.on_display_on();
        assert!(!edge(&mut d, 20_000, 10));
    }
}
