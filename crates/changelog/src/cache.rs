//! Memoized next-version computation keyed by file identity and configuration.

use crate::config::NextVersionCfg;
use crate::error::{Error, Result};
use crate::next::{ChangelogAndNext, Versions, assert_changelog_exists};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};

/// Identity of a changelog file at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSignature {
    canonical_path: PathBuf,
    size: u64,
    modified_secs: u64,
    modified_nanos: u32,
    sha256: String,
}

impl FileSignature {
    /// Signs the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be resolved or read.
    pub fn sign(path: &Path) -> Result<Self> {
        Self::read(path).map(|(signature, _)| signature)
    }

    /// Signs the file at `path` and returns the exact bytes that were hashed.
    fn read(path: &Path) -> Result<(Self, Vec<u8>)> {
        let canonical_path = path
            .canonicalize()
            .map_err(|e| Error::io(e, path, "canonicalize"))?;
        let metadata =
            fs::metadata(&canonical_path).map_err(|e| Error::io(e, &canonical_path, "stat"))?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .unwrap_or_default();
        let content = fs::read(&canonical_path).map_err(|e| Error::io(e, &canonical_path, "read"))?;

        let signature = Self {
            size: metadata.len(),
            modified_secs: modified.as_secs(),
            modified_nanos: modified.subsec_nanos(),
            sha256: hex::encode(Sha256::digest(&content)),
            canonical_path,
        };
        Ok((signature, content))
    }

    /// The canonical absolute path of the signed file.
    #[must_use]
    pub fn canonical_path(&self) -> &Path {
        &self.canonical_path
    }

    /// Hex-encoded SHA-256 of the file content.
    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }
}

#[derive(Serialize)]
struct SignatureInput<'a> {
    changelog_file: &'a FileSignature,
    cfg_next_version: &'a NextVersionCfg,
}

/// Canonical serialized form of everything the computed versions depend on.
///
/// Two signatures are equal only if their bytes are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Signature of a signed file plus configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the input cannot be encoded.
    pub fn of(changelog_file: &FileSignature, cfg: &NextVersionCfg) -> Result<Self> {
        let input = SignatureInput {
            changelog_file,
            cfg_next_version: cfg,
        };
        serde_json::to_string(&input)
            .map(Self)
            .map_err(|e| Error::serialization(format!("Failed to encode signature: {e}")))
    }

    /// The raw signature bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

#[derive(Debug, Clone)]
struct CacheSlot {
    signature: Signature,
    versions: Arc<Versions>,
}

#[derive(Serialize, Deserialize)]
struct PersistedSlot {
    path: PathBuf,
    signature: Signature,
    versions: Versions,
}

/// Thread-safe cache of computed [`Versions`], one slot per changelog file.
///
/// A hit returns the stored versions without parsing; the changelog itself is
/// read lazily if the caller asks for it.
#[derive(Debug, Default)]
pub struct SignatureCache {
    slots: Mutex<HashMap<PathBuf, CacheSlot>>,
}

impl SignatureCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Same result as [`ChangelogAndNext::calculate_file`], served from the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChangelogMissing`] if `path` is not a regular file, or
    /// any error from signing the file or computing its versions.
    pub fn calculate(&self, path: impl AsRef<Path>, cfg: &NextVersionCfg) -> Result<ChangelogAndNext> {
        let path = path.as_ref();
        assert_changelog_exists(path)?;
        let (file, content) = FileSignature::read(path)?;
        let signature = Signature::of(&file, cfg)?;

        // held across compute so concurrent callers never store a stale slot
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(file.canonical_path())
            && slot.signature == signature
        {
            debug!(path = %file.canonical_path().display(), "Versions cache hit");
            return Ok(ChangelogAndNext::deferred(
                path,
                cfg,
                Arc::clone(&slot.versions),
            ));
        }

        debug!(path = %file.canonical_path().display(), "Versions cache miss");
        // versions come from the same bytes the signature hashed
        let content = String::from_utf8(content).map_err(|e| {
            Error::io(
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                path,
                "read",
            )
        })?;
        let computed = ChangelogAndNext::calculate_named(&content, cfg, path.display().to_string())?;
        slots.insert(
            file.canonical_path.clone(),
            CacheSlot {
                signature,
                versions: Arc::clone(computed.versions()),
            },
        );
        Ok(computed)
    }

    /// Removes every slot.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Returns the number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Writes every slot to `path` as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut persisted: Vec<PersistedSlot> = self
            .slots
            .lock()
            .iter()
            .map(|(key, slot)| PersistedSlot {
                path: key.clone(),
                signature: slot.signature.clone(),
                versions: Versions::clone(&slot.versions),
            })
            .collect();
        persisted.sort_by(|a, b| a.path.cmp(&b.path));

        let bytes = serde_json::to_vec_pretty(&persisted)
            .map_err(|e| Error::serialization(format!("Failed to encode cache: {e}")))?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create_dir_all"))?;
        }
        fs::write(path, bytes).map_err(|e| Error::io(e, path, "write"))?;
        debug!(path = %path.display(), slots = persisted.len(), "Saved versions cache");
        Ok(())
    }

    /// Reads a cache written by [`SignatureCache::save`].
    ///
    /// A missing or unreadable file yields an empty cache.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable versions cache");
                return Self::new();
            }
        };
        let persisted: Vec<PersistedSlot> = match serde_json::from_slice(&bytes) {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt versions cache");
                return Self::new();
            }
        };
        let slots = persisted
            .into_iter()
            .map(|slot| {
                (
                    slot.path,
                    CacheSlot {
                        signature: slot.signature,
                        versions: Arc::new(slot.versions),
                    },
                )
            })
            .collect();
        Self {
            slots: Mutex::new(slots),
        }
    }
}
