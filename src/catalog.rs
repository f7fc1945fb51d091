//! Remote level catalog.
//!
//! The engine never talks to the network itself. A [`Transport`] hands over
//! raw bytes; this module only understands what those bytes mean.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::levels::LevelSet;

/// Path of the catalog relative to the transport root.
pub const CATALOG_PATH: &str = "index.txt";

/// Catalogs longer than this are truncated.
pub const MAX_ENTRIES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Location of the level file, relative to the transport root.
    pub path: String,
    pub title: String,
    pub author: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Parse a catalog body: one entry per line, fields separated by tabs in
    /// the order path, title, author, description. Missing trailing fields are
    /// left empty and blank lines are skipped.
    pub fn parse(bytes: &[u8]) -> Result<Catalog> {
        let text = String::from_utf8_lossy(bytes);
        let mut entries = Vec::new();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            if entries.len() == MAX_ENTRIES {
                warn!("catalog truncated at {} entries", MAX_ENTRIES);
                break;
            }

            let mut fields = line.split('\t').map(str::trim);
            let path = fields.next().unwrap_or_default().to_string();
            if path.is_empty() {
                debug!("skipping catalog line without a path: {:?}", line);
                continue;
            }
            entries.push(CatalogEntry {
                path,
                title: fields.next().unwrap_or_default().to_string(),
                author: fields.next().unwrap_or_default().to_string(),
                description: fields.next().unwrap_or_default().to_string(),
            });
        }

        if entries.is_empty() {
            return Err(Error::CatalogUnavailable("catalog has no entries".to_string()));
        }
        Ok(Catalog { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetches raw bytes by relative path.
pub trait Transport {
    fn get(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Serves a local mirror of a level server.
#[derive(Debug, Clone)]
pub struct DirTransport {
    root: PathBuf,
}

impl DirTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirTransport { root: root.into() }
    }

    /// Resolve `path` under the root, refusing anything that would leave it.
    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path {:?} is outside the mirror", path),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl Transport for DirTransport {
    fn get(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path)?)
    }
}

pub fn fetch_catalog(transport: &dyn Transport) -> Result<Catalog> {
    let bytes = transport
        .get(CATALOG_PATH)
        .map_err(|err| Error::CatalogUnavailable(err.to_string()))?;
    let catalog = Catalog::parse(&bytes)?;
    info!("catalog lists {} level sets", catalog.len());
    Ok(catalog)
}

/// Fetch one catalog entry and hand its body to the level parser unchanged.
pub fn fetch_level(transport: &dyn Transport, entry: &CatalogEntry) -> Result<LevelSet> {
    let bytes = transport
        .get(&entry.path)
        .map_err(|err| Error::LevelFetchFailed {
            path: entry.path.clone(),
            reason: err.to_string(),
        })?;
    debug!("fetched {} ({} bytes)", entry.path, bytes.len());
    LevelSet::from_bytes(&bytes)
}
