use crate::{settings::SettingsStore, state::SharedState};
use std::{
    fs,
    path::Path,
    sync::{Arc, RwLock},
    thread,
    time::{Duration, UNIX_EPOCH},
};

fn mtime_ms(path: &Path) -> Option<u128> {
    fs::metadata(path)
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis())
}

/// Tracks the settings file between polls.
#[derive(Debug, Default)]
pub struct SettingsWatch {
    last_mtime: Option<u128>,
}

impl SettingsWatch {
    pub fn new(store: &SettingsStore) -> Self {
        Self {
            last_mtime: store.path().and_then(mtime_ms),
        }
    }

    /// One poll. Returns the keys that changed, if the file was reloaded.
    pub fn poll(&mut self, store: &SettingsStore, shared: &RwLock<SharedState>) -> Vec<String> {
        let Some(path) = store.path() else {
            return Vec::new();
        };
        let mtime = mtime_ms(path);

        if mtime.is_some() && mtime != self.last_mtime {
            self.last_mtime = mtime;
            let changed = store.reload();
            if !changed.is_empty() {
                log::info!("CFG: reloaded, {} key(s) changed", changed.len());
            }
            return changed;
        }

        if mtime.is_none() {
            // removed; write back what we have
            match store.persist() {
                Ok(()) => {
                    log::warn!("CFG: {} missing, rewritten", path.display());
                    shared.write().unwrap().last_settings_error =
                        Some("settings file missing: rewritten".to_string());
                    self.last_mtime = mtime_ms(path);
                }
                Err(e) => {
                    log::warn!("CFG: rewrite failed: {}", e);
                    shared.write().unwrap().last_settings_error = Some(e.to_string());
                }
            }
        }
        Vec::new()
    }
}

/// Poll the settings file for outside edits.
pub fn spawn(store: Arc<SettingsStore>, shared: Arc<RwLock<SharedState>>, every: Duration) {
    thread::spawn(move || {
        let mut watch = SettingsWatch::new(&store);
        loop {
            thread::sleep(every);
            watch.poll(&store, &shared);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::KEY_SLIDER_MAPPING;

    #[test]
    fn outside_edit_reaches_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path);
        let shared = RwLock::new(SharedState::new());
        let rx = store.subscribe();
        // no remembered mtime, so the next poll always reloads
        let mut watch = SettingsWatch::default();

        fs::write(&path, r#"{"button_extra_key_mapping":"1,4,2"}"#).unwrap();
        let changed = watch.poll(&store, &shared);
        assert_eq!(changed, vec![KEY_SLIDER_MAPPING.to_string()]);

        let change = rx.try_recv().unwrap();
        assert!(change.touches(KEY_SLIDER_MAPPING));
        assert_eq!(store.slider_map().to_setting(), "1,4,2");
    }

    #[test]
    fn removed_file_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path);
        store.set_string(KEY_SLIDER_MAPPING, "0,1,2").unwrap();
        let shared = RwLock::new(SharedState::new());
        let mut watch = SettingsWatch::new(&store);

        fs::remove_file(&path).unwrap();
        assert!(watch.poll(&store, &shared).is_empty());
        assert!(path.exists());
        assert!(shared.read().unwrap().last_settings_error.is_some());

        let reopened = SettingsStore::open(&path);
        assert_eq!(reopened.slider_map().to_setting(), "0,1,2");
    }
}
