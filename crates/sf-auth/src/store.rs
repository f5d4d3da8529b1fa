//! Profile storage: one JSON file per profile in a config directory.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::profile::Profile;

/// Lists, selects and lazily parses connection profiles.
///
/// The selected profile is parsed on first access and cached until it is
/// re-selected or the file's modification time changes.
#[derive(Debug)]
pub struct ConfigStore {
    dir: PathBuf,
    current: Option<String>,
    cached: Option<CachedProfile>,
}

#[derive(Debug)]
struct CachedProfile {
    profile: Profile,
    modified: Option<SystemTime>,
}

impl ConfigStore {
    /// Create a store over the given directory. The directory need not exist.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            current: None,
            cached: None,
        }
    }

    /// The config directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Profile names (`*.json` stems), sorted. Empty when the directory is
    /// missing or unreadable.
    pub fn list(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.dir.display(), error = %e, "Config directory not readable");
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "json"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names
    }

    /// Select a profile by name and drop the cached configuration.
    ///
    /// Returns false and clears the selection if no record exists.
    pub fn select(&mut self, name: &str) -> bool {
        self.cached = None;

        if !is_valid_profile_name(name) {
            warn!(name, "Rejected profile name");
            self.current = None;
            return false;
        }

        if self.profile_path(name).is_file() {
            debug!(name, "Profile selected");
            self.current = Some(name.to_string());
            true
        } else {
            warn!(name, dir = %self.dir.display(), "Profile does not exist");
            self.current = None;
            false
        }
    }

    /// Name of the selected profile.
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The selected profile, parsed and defaulted.
    ///
    /// Returns `None` when nothing is selected or the record is unreadable
    /// or corrupt.
    pub fn current(&mut self) -> Option<Profile> {
        let name = self.current.clone()?;
        let path = self.profile_path(&name);
        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();

        if let Some(cached) = &self.cached {
            if cached.modified == modified {
                return Some(cached.profile.clone());
            }
            debug!(name, "Profile changed on disk, reloading");
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(name, error = %e, "Failed to read profile");
                self.cached = None;
                return None;
            }
        };

        match Profile::from_json(&name, &contents) {
            Ok(profile) => {
                self.cached = Some(CachedProfile {
                    profile: profile.clone(),
                    modified,
                });
                Some(profile)
            }
            Err(e) => {
                warn!(name, error = %e, "Failed to parse profile");
                self.cached = None;
                None
            }
        }
    }

    fn profile_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

fn is_valid_profile_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}
