use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use academy_core::types::{Cohort, Enrollment, Profile, User};
use academy_core::{envelope, StorageKey};
use serde::de::DeserializeOwned;
use tokio::time::Instant;

use crate::{ApiClient, RequestOptions, Result};

pub const PROFILE_ENDPOINT: &str = "/users/me";
pub const ENROLLMENTS_ENDPOINT: &str = "/enrollments";

// ─── ProfileCache ─────────────────────────────────────────────────────────

/// In-memory copy of the last assembled profile and when it was fetched.
///
/// Every [`clear`](Self::clear) starts a new generation. A fetch only lands
/// in the cache if no clear happened since it started.
#[derive(Debug)]
pub(crate) struct ProfileCache {
    ttl: Duration,
    generation: AtomicU64,
    slot: Mutex<Option<(Instant, Profile)>>,
}

impl ProfileCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: AtomicU64::new(0),
            slot: Mutex::new(None),
        }
    }

    /// The cached profile if it is younger than the freshness window.
    pub(crate) fn fresh(&self) -> Option<Profile> {
        let slot = self.slot.lock().ok()?;
        match slot.as_ref() {
            Some((at, profile)) if at.elapsed() < self.ttl => Some(profile.clone()),
            _ => None,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store `profile` and run `persist` if `generation` is still current.
    ///
    /// Both happen under the slot lock, so a concurrent clear either runs
    /// first and the write is dropped, or runs after and removes it.
    pub(crate) fn commit(
        &self,
        generation: u64,
        profile: Profile,
        persist: impl FnOnce(&Profile),
    ) -> bool {
        let Ok(mut slot) = self.slot.lock() else {
            return false;
        };
        if self.generation() != generation {
            return false;
        }
        persist(&profile);
        *slot = Some((Instant::now(), profile));
        true
    }

    pub(crate) fn clear(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            self.generation.fetch_add(1, Ordering::AcqRel);
            *slot = None;
        }
    }
}

// ─── Read-through ─────────────────────────────────────────────────────────

impl ApiClient {
    /// The current user's enriched profile.
    ///
    /// Served from memory while younger than the configured TTL. Otherwise
    /// the profile is assembled from the network and written to both the
    /// memory cache and the durable copy. If assembly fails and a durable
    /// copy from an earlier success exists, that copy is returned instead of
    /// the error, however old it is.
    ///
    /// Reads that start after [`invalidate_profile`](Self::invalidate_profile)
    /// never share a fetch that started before it, and such an older fetch
    /// is not written back.
    pub async fn profile(&self) -> Result<Profile> {
        if let Some(cached) = self.inner.profile.fresh() {
            tracing::debug!("profile served from cache");
            return Ok(cached);
        }

        let generation = self.inner.profile.generation();
        match self.fetch_profile(generation).await {
            Ok(profile) => {
                let committed = self
                    .inner
                    .profile
                    .commit(generation, profile.clone(), |p| self.persist_profile(p));
                if !committed {
                    tracing::debug!(generation, "profile invalidated during fetch; not cached");
                }
                Ok(profile)
            }
            Err(err) => match self.inner.storage.load_json::<Profile>(StorageKey::Profile) {
                Ok(Some(stale)) => {
                    tracing::warn!(error = %err, "profile fetch failed; using stored copy");
                    Ok(stale)
                }
                Ok(None) => Err(err),
                Err(e) => {
                    tracing::warn!(error = %e, "stored profile unreadable");
                    Err(err)
                }
            },
        }
    }

    /// Forget both the in-memory and the durable profile. The next
    /// [`profile`](Self::profile) call always goes to the network.
    pub fn invalidate_profile(&self) -> Result<()> {
        self.inner.profile.clear();
        self.inner.storage.remove(StorageKey::Profile)?;
        Ok(())
    }

    async fn fetch_profile(&self, generation: u64) -> Result<Profile> {
        let scope = format!("profile:{generation}");

        let user: User = self
            .profile_part(PROFILE_ENDPOINT, &scope, |v| envelope::entity(v, "user"))
            .await?;

        let cohort = match user.cohort_id {
            Some(id) => match self
                .profile_part::<Cohort>(&format!("/cohorts/{id}"), &scope, |v| {
                    envelope::entity(v, "cohort")
                })
                .await
            {
                Ok(c) => Some(c),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(cohort_id = id, "cohort referenced by profile not found");
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        let enrollments: Vec<Enrollment> = self
            .profile_part(ENROLLMENTS_ENDPOINT, &scope, envelope::list)
            .await?;

        Ok(Profile {
            user,
            cohort,
            enrollments,
        })
    }

    /// One read of the profile assembly, deduplicated only within `scope`.
    async fn profile_part<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        scope: &str,
        decode: impl FnOnce(serde_json::Value) -> academy_core::Result<T>,
    ) -> Result<T> {
        let value = self
            .request(endpoint, RequestOptions::get().dedup_scope(scope))
            .await?;
        Ok(decode(value)?)
    }

    fn persist_profile(&self, profile: &Profile) {
        let storage = &self.inner.storage;
        let written = storage
            .save_json(StorageKey::Profile, profile)
            .and_then(|()| storage.save_json(StorageKey::User, &profile.user));
        if let Err(e) = written {
            tracing::warn!(error = %e, "failed to persist profile");
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
