//! Data file persistence: load-or-seed at startup, whole-file rewrite on save.

use crate::codec;
use crate::roster::Roster;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default data file location
pub fn default_data_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clinic")
        .join("data.dat")
}

/// Load the roster from `path`, or seed the defaults and write them if no
/// data file exists yet.
pub fn load_or_init(path: &Path) -> Result<Roster> {
    if path.is_file() {
        return load(path);
    }

    let roster = Roster::with_defaults();
    save(path, &roster)?;
    eprintln!("[store] Seeded default roster: {}", path.display());
    Ok(roster)
}

pub fn load(path: &Path) -> Result<Roster> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    codec::decode(&bytes).with_context(|| format!("Corrupt data file {}", path.display()))
}

/// Rewrite the whole data file. Writes a sibling temp file and renames it
/// over the target so a failed write leaves the previous file intact.
pub fn save(path: &Path, roster: &Roster) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = codec::encode(roster)?;
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "data.dat".into());
    name.push(".tmp");
    path.with_file_name(name)
}
