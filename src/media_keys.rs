use evdev::{uinput::VirtualDevice, uinput::VirtualDeviceBuilder, AttributeSet, EventType, InputEvent, Key};

use crate::{
    collab::{MediaKeyAction, MediaKeyCode, MediaKeyEvent},
    error::{Error, Result},
};

const DEVICE_NAME: &str = "gesture_keyd media keys";

pub fn key_for(code: MediaKeyCode) -> Key {
    match code {
        MediaKeyCode::PlayPause => Key::KEY_PLAYPAUSE,
        MediaKeyCode::Previous => Key::KEY_PREVIOUSSONG,
        MediaKeyCode::Next => Key::KEY_NEXTSONG,
    }
}

/// Virtual keyboard that only knows the three transport keys. The input
/// stack routes them to the active media session.
pub struct UinputMediaKeys {
    dev: VirtualDevice,
}

impl UinputMediaKeys {
    pub fn create() -> Result<Self> {
        let mut keys: AttributeSet<Key> = AttributeSet::new();
        for code in [MediaKeyCode::PlayPause, MediaKeyCode::Previous, MediaKeyCode::Next] {
            keys.insert(key_for(code));
        }
        let dev = VirtualDeviceBuilder::new()?
            .name(DEVICE_NAME)
            .with_keys(&keys)?
            .build()?;
        Ok(Self { dev })
    }

    pub fn send(&mut self, event: &MediaKeyEvent) -> Result<()> {
        let value = match event.action {
            MediaKeyAction::Down => 1,
            MediaKeyAction::Up => 0,
        };
        let key = InputEvent::new(EventType::KEY, key_for(event.code).code(), value);
        let sync = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        self.dev
            .emit(&[key, sync])
            .map_err(|e| Error::Device(format!("uinput emit: {}", e)))
    }
}
