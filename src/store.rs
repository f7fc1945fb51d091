//! Solution store: solution strings keyed by level fingerprint and namespace.
//!
//! Each entry lives in its own file named `<FINGERPRINT>.<namespace>`, e.g.
//! `0A1B2C3D.sol`. Writes go to a temporary file that is then renamed over the
//! old entry, so a crash never leaves a half-written solution behind.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::game::{Fingerprint, Game};

/// Namespace of the best known solution of a level.
pub const SOLUTION_NAMESPACE: &str = "sol";

/// Namespace of the in-progress autosave slot.
pub const AUTOSAVE_NAMESPACE: &str = "sav";

pub trait SolutionStore {
    /// Store `solution`, replacing any earlier entry under the same key.
    fn save(&mut self, fingerprint: Fingerprint, solution: &str, namespace: &str) -> Result<()>;

    /// Look up an entry. A missing entry is `Ok(None)`, not an error.
    fn load(&self, fingerprint: Fingerprint, namespace: &str) -> Result<Option<String>>;
}

fn check_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() || !namespace.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(Error::InvalidNamespace(namespace.to_string()));
    }
    Ok(())
}

/// A directory of solution files.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created on the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    /// `<data dir>/sokoban` for the current user, if the platform has one.
    pub fn default_location() -> Option<PathBuf> {
        dirs_next::data_dir().map(|dir| dir.join("sokoban"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, fingerprint: Fingerprint, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", fingerprint, namespace))
    }
}

impl SolutionStore for FileStore {
    fn save(&mut self, fingerprint: Fingerprint, solution: &str, namespace: &str) -> Result<()> {
        check_namespace(namespace)?;
        fs::create_dir_all(&self.dir).map_err(Error::StoreUnavailable)?;

        let path = self.entry_path(fingerprint, namespace);
        let tmp = path.with_extension(format!("{}.tmp", namespace));
        fs::write(&tmp, solution).map_err(Error::StoreUnavailable)?;
        if let Err(err) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::StoreUnavailable(err));
        }

        info!("saved {} ({} bytes)", path.display(), solution.len());
        Ok(())
    }

    fn load(&self, fingerprint: Fingerprint, namespace: &str) -> Result<Option<String>> {
        check_namespace(namespace)?;
        let path = self.entry_path(fingerprint, namespace);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!("loaded {}", path.display());
                Ok(Some(String::from_utf8_lossy(&bytes).trim().to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::StoreUnavailable(err)),
        }
    }
}

/// Store kept in memory, for tests and for running without a data directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<(Fingerprint, String), String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SolutionStore for MemoryStore {
    fn save(&mut self, fingerprint: Fingerprint, solution: &str, namespace: &str) -> Result<()> {
        check_namespace(namespace)?;
        self.entries
            .insert((fingerprint, namespace.to_string()), solution.to_string());
        Ok(())
    }

    fn load(&self, fingerprint: Fingerprint, namespace: &str) -> Result<Option<String>> {
        check_namespace(namespace)?;
        Ok(self
            .entries
            .get(&(fingerprint, namespace.to_string()))
            .cloned())
    }
}

/// Attach the stored best solution of every level as its `known_solution`.
///
/// Never fails: a store that cannot be read leaves the affected levels
/// without a known solution. Returns how many solutions were attached.
pub fn attach_best_known(store: &dyn SolutionStore, levels: &mut [Game]) -> usize {
    let mut attached = 0;
    for game in levels.iter_mut() {
        match store.load(game.fingerprint(), SOLUTION_NAMESPACE) {
            Ok(Some(solution)) if !solution.is_empty() => {
                game.set_known_solution(Some(solution));
                attached += 1;
            }
            Ok(_) => game.set_known_solution(None),
            Err(err) => {
                warn!("no stored solution for level {}: {}", game.index() + 1, err);
                game.set_known_solution(None);
            }
        }
    }
    debug!("attached {} of {} known solutions", attached, levels.len());
    attached
}
