//! Retry and cache fallback around the wind fetch.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use jumprun_core::WindProfile;

use crate::backoff::{retry_with_backoff, RetryPolicy};
use crate::cache::{load_valid, CacheEntry, ProfileCache};

/// A usable wind profile and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum WindFetch {
    Fresh {
        profile: WindProfile,
        fetched_at: DateTime<Utc>,
    },
    /// Degraded success: every attempt failed but the cache was young enough.
    Cached {
        profile: WindProfile,
        fetched_at: DateTime<Utc>,
        age: Duration,
    },
}

impl WindFetch {
    pub fn profile(&self) -> &WindProfile {
        match self {
            WindFetch::Fresh { profile, .. } | WindFetch::Cached { profile, .. } => profile,
        }
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        match self {
            WindFetch::Fresh { fetched_at, .. } | WindFetch::Cached { fetched_at, .. } => {
                *fetched_at
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, WindFetch::Cached { .. })
    }
}

#[derive(Debug, Error)]
pub enum WindRefreshError {
    /// All retries failed and no cache entry within max age exists.
    #[error("wind fetch failed after {attempts} attempt(s) and no valid cache: {last_error}")]
    FetchExhausted { attempts: u32, last_error: String },
}

pub struct ResilienceLayer<C> {
    policy: RetryPolicy,
    cache: C,
    max_age: Duration,
}

impl<C: ProfileCache> ResilienceLayer<C> {
    pub fn new(policy: RetryPolicy, cache: C, max_age: Duration) -> Self {
        Self {
            policy,
            cache,
            max_age,
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Fetch with retries; on exhaustion fall back to the cache.
    ///
    /// A fresh profile overwrites the cache entry.
    pub async fn fetch<F, Fut>(&self, fetch: F) -> Result<WindFetch, WindRefreshError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<WindProfile>>,
    {
        let exhausted = match retry_with_backoff(self.policy, "Wind fetch", fetch).await {
            Ok(profile) => {
                let fetched_at = Utc::now();
                let entry = CacheEntry::new(profile.clone(), fetched_at);
                if let Err(err) = self.cache.store(&entry).await {
                    tracing::warn!("Failed to persist wind cache: {:#}", err);
                }
                return Ok(WindFetch::Fresh {
                    profile,
                    fetched_at,
                });
            }
            Err(exhausted) => exhausted,
        };

        let now = Utc::now();
        match load_valid(&self.cache, self.max_age, now).await {
            Some(entry) => {
                let age = entry.age(now);
                tracing::warn!(
                    "Using cached wind profile ({} min old) after {} failed attempt(s)",
                    age.as_secs() / 60,
                    exhausted.attempts
                );
                Ok(WindFetch::Cached {
                    fetched_at: entry.fetched_at(),
                    profile: entry.profile,
                    age,
                })
            }
            None => Err(WindRefreshError::FetchExhausted {
                attempts: exhausted.attempts,
                last_error: format!("{:#}", exhausted.last_error),
            }),
        }
    }
}
