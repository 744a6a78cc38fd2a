//! Single-entry wind profile cache.
//!
//! Holds the last successfully fetched profile with its fetch time (epoch ms).
//! An entry older than the max age, or stamped later than now beyond a small
//! clock-skew tolerance, is treated exactly like a missing one.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use jumprun_core::WindProfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub profile: WindProfile,
    /// Fetch time, epoch milliseconds
    pub timestamp: i64,
}

impl CacheEntry {
    pub fn new(profile: WindProfile, fetched_at: DateTime<Utc>) -> Self {
        Self {
            profile,
            timestamp: fetched_at.timestamp_millis(),
        }
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Age at `now`; entries stamped in the future count as brand new.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at()).to_std().unwrap_or(Duration::ZERO)
    }
}

/// How far in the future a cache timestamp may lie before it is distrusted.
pub const FUTURE_TOLERANCE: Duration = Duration::from_secs(60);

/// Storage for the single cache entry. I/O never blocks the runtime thread.
pub trait ProfileCache {
    fn load(&self) -> impl Future<Output = Result<Option<CacheEntry>>>;
    /// Replace any existing entry.
    fn store(&self, entry: &CacheEntry) -> impl Future<Output = Result<()>>;
}

/// Entry if present, no older than `max_age` and not stamped in the future.
pub async fn load_valid<C: ProfileCache>(
    cache: &C,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Option<CacheEntry> {
    let entry = match cache.load().await {
        Ok(Some(entry)) => entry,
        Ok(None) => return None,
        Err(err) => {
            tracing::warn!("Wind cache unreadable: {:#}", err);
            return None;
        }
    };

    let skew = (entry.fetched_at() - now).to_std().unwrap_or(Duration::ZERO);
    if skew > FUTURE_TOLERANCE {
        tracing::warn!(
            "Cached wind profile is stamped {} s in the future; ignoring it",
            skew.as_secs()
        );
        return None;
    }

    let age = entry.age(now);
    if age > max_age {
        tracing::info!(
            "Cached wind profile is stale ({} min old, max {} min)",
            age.as_secs() / 60,
            max_age.as_secs() / 60
        );
        return None;
    }
    Some(entry)
}

/// JSON file holding one entry.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileCache for FileCache {
    async fn load(&self) -> Result<Option<CacheEntry>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        let entry = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(Some(entry))
    }

    async fn store(&self, entry: &CacheEntry) -> Result<()> {
        let json = serde_json::to_vec(entry).context("serializing wind cache")?;
        // Write then rename so a crash never leaves a torn entry
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entry: Mutex<Option<CacheEntry>>,
}

impl MemoryCache {
    pub fn with_entry(entry: CacheEntry) -> Self {
        Self {
            entry: Mutex::new(Some(entry)),
        }
    }
}

impl ProfileCache for MemoryCache {
    async fn load(&self) -> Result<Option<CacheEntry>> {
        Ok(self
            .entry
            .lock()
            .map_err(|_| anyhow::anyhow!("wind cache lock poisoned"))?
            .clone())
    }

    async fn store(&self, entry: &CacheEntry) -> Result<()> {
        *self
            .entry
            .lock()
            .map_err(|_| anyhow::anyhow!("wind cache lock poisoned"))? = Some(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jumprun_core::{resample, RawWindLevel, SpotConfig};

    fn profile(speed: f64) -> WindProfile {
        let raw = vec![RawWindLevel {
            altitude_ft: 5000.0,
            direction_from_deg: Some(250.0),
            speed_kt: Some(speed),
        }];
        resample(&raw, &SpotConfig::default().target_altitudes_ft).unwrap()
    }

    const TWO_HOURS: Duration = Duration::from_secs(2 * 3600);

    #[tokio::test]
    async fn file_round_trip_within_max_age() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("wind.json"));
        let now = Utc::now();
        let entry = CacheEntry::new(profile(12.0), now - chrono::Duration::minutes(30));

        cache.store(&entry).await.unwrap();
        let loaded = load_valid(&cache, TWO_HOURS, now).await.unwrap();
        assert_eq!(loaded.profile, entry.profile);
        assert_eq!(loaded.timestamp, entry.timestamp);
    }

    #[tokio::test]
    async fn stale_entry_is_absent() {
        let cache = MemoryCache::with_entry(CacheEntry::new(
            profile(12.0),
            Utc::now() - chrono::Duration::minutes(121),
        ));
        assert!(load_valid(&cache, TWO_HOURS, Utc::now()).await.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("missing.json"));
        assert!(cache.load().await.unwrap().is_none());
        assert!(load_valid(&cache, TWO_HOURS, Utc::now()).await.is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wind.json");
        std::fs::write(&path, b"{not json").unwrap();
        let cache = FileCache::new(path);
        assert!(cache.load().await.is_err());
        assert!(load_valid(&cache, TWO_HOURS, Utc::now()).await.is_none());
    }

    #[tokio::test]
    async fn unordered_altitudes_in_file_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wind.json");
        let sample = |alt: f64| {
            serde_json::json!({ "altitude_ft": alt, "direction_from_deg": 250.0, "speed_kt": 12.0 })
        };
        let body = serde_json::json!({
            "profile": { "samples": [sample(9000.0), sample(1000.0), sample(1000.0)] },
            "timestamp": Utc::now().timestamp_millis(),
        });
        std::fs::write(&path, body.to_string()).unwrap();

        let cache = FileCache::new(path);
        assert!(cache.load().await.is_err());
        assert!(load_valid(&cache, TWO_HOURS, Utc::now()).await.is_none());
    }

    #[tokio::test]
    async fn store_overwrites_previous_entry() {
        let cache = MemoryCache::default();
        let now = Utc::now();
        cache.store(&CacheEntry::new(profile(5.0), now)).await.unwrap();
        cache.store(&CacheEntry::new(profile(9.0), now)).await.unwrap();
        let loaded = cache.load().await.unwrap().unwrap();
        assert_eq!(loaded.profile, profile(9.0));
    }

    #[test]
    fn future_timestamp_has_zero_age() {
        let now = Utc::now();
        let entry = CacheEntry::new(profile(5.0), now + chrono::Duration::seconds(30));
        assert_eq!(entry.age(now), Duration::ZERO);
    }

    #[tokio::test]
    async fn entry_from_the_future_is_absent() {
        let now = Utc::now();
        let slightly_ahead = MemoryCache::with_entry(CacheEntry::new(
            profile(5.0),
            now + chrono::Duration::seconds(30),
        ));
        assert!(load_valid(&slightly_ahead, TWO_HOURS, now).await.is_some());

        let far_ahead = MemoryCache::with_entry(CacheEntry::new(
            profile(5.0),
            now + chrono::Duration::hours(6),
        ));
        assert!(load_valid(&far_ahead, TWO_HOURS, now).await.is_none());
    }
}
