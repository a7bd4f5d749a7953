use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

pub fn read_to_string(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

pub fn read_i32(path: &Path) -> Option<i32> {
    let s = read_to_string(path)?;
    s.trim().parse::<i32>().ok()
}

pub fn write_str(path: &Path, value: &str) -> Result<()> {
    fs::write(path, format!("{}\n", value).as_bytes()).map_err(|source| Error::Sysfs {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `target` unless the cache says it is already there.
/// Missing nodes are skipped (`Ok(false)`).
pub fn write_str_if_needed(
    path: &Path,
    target: &str,
    cache: &mut HashMap<PathBuf, String>,
) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    if let Some(last) = cache.get(path) {
        if last == target {
            return Ok(false);
        }
    }

    write_str(path, target)?;
    cache.insert(path.to_path_buf(), target.to_string());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_writes_skip_unchanged_values() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("music_enable");
        fs::write(&node, "0\n").unwrap();
        let mut cache = HashMap::new();

        assert!(write_str_if_needed(&node, "1", &mut cache).unwrap());
        assert!(!write_str_if_needed(&node, "1", &mut cache).unwrap());
        assert_eq!(read_i32(&node), Some(1));

        let missing = dir.path().join("nope");
        assert!(!write_str_if_needed(&missing, "1", &mut cache).unwrap());
    }
}
