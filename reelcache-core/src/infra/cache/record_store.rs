use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use reelcache_model::CacheRecord;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::store_kind::StoreKind;
use crate::error::{CacheError, Result};

/// Index-level metadata stored next to every entry.
///
/// Kept in the `cacache` index so enumeration, statistics and eviction never
/// have to read record content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub timestamp: u64,
    pub size: u64,
}

/// Byte estimate of a payload: raw UTF-8 length for strings, serialized JSON
/// length for everything else.
pub fn estimate_payload_bytes<T: Serialize + ?Sized>(
    payload: &T,
) -> Result<u64> {
    match serde_json::to_value(payload)? {
        serde_json::Value::String(s) => Ok(s.len() as u64),
        other => Ok(serde_json::to_vec(&other)?.len() as u64),
    }
}

/// A thin typed wrapper over one `cacache` root holding JSON records.
#[derive(Clone, Debug)]
pub struct RecordStore {
    kind: StoreKind,
    root: PathBuf,
}

impl RecordStore {
    pub fn new(kind: StoreKind, root: PathBuf) -> Self {
        Self { kind, root }
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replaces any existing entry for `record.key`.
    ///
    /// The new entry is committed before the previous content blob is
    /// dropped, so a failed write leaves the old record readable.
    pub async fn put<T: Serialize>(
        &self,
        record: &CacheRecord<T>,
    ) -> Result<()> {
        let bytes = serde_json::to_vec(record)?;
        let meta = serde_json::to_value(EntryMeta {
            timestamp: record.timestamp,
            size: record.size,
        })?;

        let old_integrity = cacache::metadata(&self.root, &record.key)
            .await
            .map_err(|e| map_cacache_error(self.kind, &record.key, e))?
            .map(|m| m.integrity);

        let mut writer = cacache::WriteOpts::new()
            .size(bytes.len())
            .metadata(meta)
            .open(&self.root, &record.key)
            .await
            .map_err(|e| map_cacache_error(self.kind, &record.key, e))?;
        writer.write_all(&bytes).await?;
        let integrity = writer
            .commit()
            .await
            .map_err(|e| map_cacache_error(self.kind, &record.key, e))?;

        if let Some(old_integrity) = old_integrity
            && old_integrity != integrity
        {
            self.remove_content(&record.key, &old_integrity).await;
        }

        Ok(())
    }

    /// Best effort: an orphaned blob only costs disk space.
    async fn remove_content(&self, key: &str, integrity: &cacache::Integrity) {
        match cacache::remove_hash(&self.root, integrity).await {
            Ok(()) => {}
            Err(cacache::Error::IoError(err, _))
                if err.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                debug!(
                    "{} stale blob removal failed; key={key}, err={e}",
                    self.kind
                );
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<CacheRecord<T>>> {
        let bytes = match cacache::read(&self.root, key).await {
            Ok(bytes) => bytes,
            Err(cacache::Error::EntryNotFound(_, _)) => return Ok(None),
            Err(e) => return Err(map_cacache_error(self.kind, key, e)),
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            CacheError::Corrupt(format!(
                "{}: record {key} failed to deserialize: {e}",
                self.kind
            ))
        })
    }

    pub async fn meta(&self, key: &str) -> Result<Option<EntryMeta>> {
        let meta = cacache::metadata(&self.root, key)
            .await
            .map_err(|e| map_cacache_error(self.kind, key, e))?;
        Ok(meta.map(|m| entry_meta_from_index(&m)))
    }

    /// Returns whether an entry was present.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        if self.meta(key).await?.is_none() {
            return Ok(false);
        }

        let r_opts = cacache::index::RemoveOpts::new().remove_fully(true);
        match r_opts.remove(&self.root, key).await {
            Ok(()) => Ok(true),
            Err(cacache::Error::IoError(err, _))
                if err.kind() == ErrorKind::NotFound =>
            {
                Ok(false)
            }
            Err(e) => Err(map_cacache_error(self.kind, key, e)),
        }
    }

    pub async fn clear(&self) -> Result<()> {
        cacache::clear(&self.root)
            .await
            .map_err(|e| map_cacache_error(self.kind, "*", e))
    }

    /// Every indexed entry, in index enumeration order.
    pub async fn list(&self) -> Result<Vec<(String, EntryMeta)>> {
        let root = self.root.clone();
        let kind = self.kind;
        tokio::task::spawn_blocking(move || list_sync(kind, &root)).await?
    }
}

fn list_sync(kind: StoreKind, root: &Path) -> Result<Vec<(String, EntryMeta)>> {
    let mut out = Vec::new();
    if !root.exists() {
        return Ok(out);
    }

    for entry in cacache::index::ls(root) {
        match entry {
            Ok(m) => {
                let meta = entry_meta_from_index(&m);
                out.push((m.key, meta));
            }
            // Missing index dir (fresh or just-cleared store) or a bucket
            // removed mid-scan.
            Err(cacache::Error::IoError(err, _))
                if err.kind() == ErrorKind::NotFound =>
            {
                debug!("{kind} index ls skipped missing path: {err}");
            }
            Err(e) => return Err(map_cacache_error(kind, "*", e)),
        }
    }
    Ok(out)
}

fn entry_meta_from_index(m: &cacache::Metadata) -> EntryMeta {
    serde_json::from_value::<EntryMeta>(m.metadata.clone()).unwrap_or(
        EntryMeta {
            timestamp: m.time.min(u128::from(u64::MAX)) as u64,
            size: m.size as u64,
        },
    )
}

fn map_cacache_error(
    kind: StoreKind,
    key: &str,
    e: cacache::Error,
) -> CacheError {
    match e {
        cacache::Error::EntryNotFound(_, _) => {
            CacheError::Storage(format!("{kind}: cache entry not found: {key}"))
        }
        cacache::Error::IntegrityError(err) => CacheError::Corrupt(format!(
            "{kind}: cache entry failed integrity check: {key} ({err})"
        )),
        cacache::Error::SizeMismatch(wanted, actual) => {
            CacheError::Corrupt(format!(
                "{kind}: cache entry size mismatch: key={key}, \
                 wanted={wanted}, actual={actual}"
            ))
        }
        cacache::Error::IoError(err, msg) => CacheError::Io(std::io::Error::new(
            err.kind(),
            format!("{kind}: {msg}: {err}"),
        )),
        cacache::Error::SerdeError(_, msg) => CacheError::Corrupt(format!(
            "{kind}: cache index serde error: key={key}, {msg}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::estimate_payload_bytes;
    use reelcache_model::TimelineFrame;

    #[test]
    fn strings_are_measured_raw() {
        assert_eq!(estimate_payload_bytes("abc").unwrap(), 3);
        assert_eq!(estimate_payload_bytes(&"é".to_string()).unwrap(), 2);
    }

    #[test]
    fn structured_payloads_are_measured_as_json() {
        let frames = vec![TimelineFrame::new(1.0, "X")];
        let expected = serde_json::to_vec(&frames).unwrap().len() as u64;
        assert_eq!(estimate_payload_bytes(&frames).unwrap(), expected);
    }
}
