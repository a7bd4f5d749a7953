//! Scancodes reported by the touchpanel and keypad drivers.

use serde::Serialize;

// Touchpanel gestures
pub const GESTURE_CIRCLE_SCANCODE: u16 = 250;
pub const GESTURE_II_SCANCODE: u16 = 251;
pub const GESTURE_V_SCANCODE: u16 = 252;
pub const GESTURE_LEFT_V_SCANCODE: u16 = 253;
pub const GESTURE_RIGHT_V_SCANCODE: u16 = 254;
pub const KEY_DOUBLE_TAP: u16 = 143;

// Capacitive keys
pub const KEY_HOME: u16 = 102;
pub const KEY_BACK: u16 = 158;
pub const KEY_RECENTS: u16 = 580;

// Tri-state slider
pub const KEY_SLIDER_TOP: u16 = 601;
pub const KEY_SLIDER_CENTER: u16 = 602;
pub const KEY_SLIDER_BOTTOM: u16 = 603;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Press,
    Release,
    Repeat,
}

impl KeyAction {
    /// Maps an evdev EV_KEY value.
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyAction::Release),
            1 => Some(KeyAction::Press),
            2 => Some(KeyAction::Repeat),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub scan_code: u16,
    pub action: KeyAction,
}

impl KeyEvent {
    pub fn new(scan_code: u16, action: KeyAction) -> Self {
        Self { scan_code, action }
    }

    pub fn release(scan_code: u16) -> Self {
        Self::new(scan_code, KeyAction::Release)
    }

    pub fn is_release(&self) -> bool {
        self.action == KeyAction::Release
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureKey {
    Circle,
    TwoFingerSwipe,
    V,
    LeftV,
    RightV,
    DoubleTap,
    Home,
    Back,
    Recents,
    SliderTop,
    SliderCenter,
    SliderBottom,
}

impl GestureKey {
    pub fn from_scan_code(code: u16) -> Option<Self> {
        let key = match code {
            GESTURE_CIRCLE_SCANCODE => GestureKey::Circle,
            GESTURE_II_SCANCODE => GestureKey::TwoFingerSwipe,
            GESTURE_V_SCANCODE => GestureKey::V,
            GESTURE_LEFT_V_SCANCODE => GestureKey::LeftV,
            GESTURE_RIGHT_V_SCANCODE => GestureKey::RightV,
            KEY_DOUBLE_TAP => GestureKey::DoubleTap,
            KEY_HOME => GestureKey::Home,
            KEY_BACK => GestureKey::Back,
            KEY_RECENTS => GestureKey::Recents,
            KEY_SLIDER_TOP => GestureKey::SliderTop,
            KEY_SLIDER_CENTER => GestureKey::SliderCenter,
            KEY_SLIDER_BOTTOM => GestureKey::SliderBottom,
            _ => return None,
        };
        Some(key)
    }

    /// Keys the gesture engine understands. Navigation keys are only seen by the gate.
    pub fn is_supported(self) -> bool {
        !self.is_navigation()
    }

    pub fn is_navigation(self) -> bool {
        matches!(self, GestureKey::Home | GestureKey::Back | GestureKey::Recents)
    }

    pub fn is_proximity_checked(self) -> bool {
        matches!(self, GestureKey::Circle | GestureKey::V | GestureKey::DoubleTap)
    }

    pub fn slider_position(self) -> Option<SliderPosition> {
        match self {
            GestureKey::SliderTop => Some(SliderPosition::Top),
            GestureKey::SliderCenter => Some(SliderPosition::Center),
            GestureKey::SliderBottom => Some(SliderPosition::Bottom),
            _ => None,
        }
    }

    pub fn channel(self) -> Option<GestureChannel> {
        match self {
            GestureKey::Circle => Some(GestureChannel::Circle),
            GestureKey::V => Some(GestureChannel::V),
            GestureKey::TwoFingerSwipe => Some(GestureChannel::TwoFingerSwipe),
            GestureKey::LeftV => Some(GestureChannel::LeftV),
            GestureKey::RightV => Some(GestureChannel::RightV),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SliderPosition {
    Top,
    Center,
    Bottom,
}

impl SliderPosition {
    pub fn index(self) -> usize {
        match self {
            SliderPosition::Top => 0,
            SliderPosition::Center => 1,
            SliderPosition::Bottom => 2,
        }
    }
}

/// Gesture slots that carry a user binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureChannel {
    Circle,
    V,
    TwoFingerSwipe,
    LeftV,
    RightV,
}

impl GestureChannel {
    pub const ALL: [GestureChannel; 5] = [
        GestureChannel::Circle,
        GestureChannel::V,
        GestureChannel::TwoFingerSwipe,
        GestureChannel::LeftV,
        GestureChannel::RightV,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GestureChannel::Circle => "circle",
            GestureChannel::V => "v",
            GestureChannel::TwoFingerSwipe => "two_finger_swipe",
            GestureChannel::LeftV => "left_v",
            GestureChannel::RightV => "right_v",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_keys_are_not_gesture_keys() {
        for code in [KEY_HOME, KEY_BACK, KEY_RECENTS] {
            let k = GestureKey::from_scan_code(code).unwrap();
            assert!(k.is_navigation());
            assert!(!k.is_supported());
        }
        assert_eq!(GestureKey::from_scan_code(1), None);
    }

    #[test]
    fn only_circle_v_and_double_tap_are_proximity_checked() {
        let checked: Vec<_> = [
            GESTURE_CIRCLE_SCANCODE,
            GESTURE_II_SCANCODE,
            GESTURE_V_SCANCODE,
            GESTURE_LEFT_V_SCANCODE,
            GESTURE_RIGHT_V_SCANCODE,
            KEY_DOUBLE_TAP,
            KEY_SLIDER_TOP,
        ]
        .into_iter()
        .filter(|c| GestureKey::from_scan_code(*c).unwrap().is_proximity_checked())
        .collect();
        assert_eq!(checked, vec![GESTURE_CIRCLE_SCANCODE, GESTURE_V_SCANCODE, KEY_DOUBLE_TAP]);
    }

    #[test]
    fn raw_key_values() {
        assert_eq!(KeyAction::from_raw(0), Some(KeyAction::Release));
        assert_eq!(KeyAction::from_raw(1), Some(KeyAction::Press));
        assert_eq!(KeyAction::from_raw(2), Some(KeyAction::Repeat));
        assert_eq!(KeyAction::from_raw(7), None);
    }
}
