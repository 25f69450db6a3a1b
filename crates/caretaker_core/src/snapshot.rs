//! crates/caretaker_core/src/snapshot.rs
//!
//! The device-facing consistency cache: one hashed snapshot of the active
//! reminders, rebuilt wholesale when stale and served with conditional
//! (ETag-style) semantics. When the source of truth is unreachable the cache
//! degrades to the stale copy rather than failing the polling client.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use crate::domain::ReminderRecord;
use crate::ledger::Ledger;
use crate::ports::PortResult;

/// One cached, hashed rendering of the active-reminder projection.
/// Rebuilt wholesale, never patched.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub body: Vec<u8>,
    pub fingerprint: String,
    captured_at: Instant,
}

impl CacheSnapshot {
    fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }
}

/// What `get` hands the transport layer.
#[derive(Debug)]
pub enum SnapshotFetch {
    /// The caller's fingerprint matches; no body to transmit.
    NotModified { fingerprint: String },
    Modified {
        body: Vec<u8>,
        fingerprint: String,
    },
}

/// TTL-gated snapshot cache over the ledger's active-reminder view.
pub struct SnapshotCache {
    ledger: Ledger,
    ttl: Duration,
    current: RwLock<Option<Arc<CacheSnapshot>>>,
    /// Serializes rebuilds so concurrent stale readers trigger one rebuild,
    /// not several interleaved ones.
    rebuild: Mutex<()>,
}

impl SnapshotCache {
    pub fn new(ledger: Ledger, ttl: Duration) -> Self {
        Self {
            ledger,
            ttl,
            current: RwLock::new(None),
            rebuild: Mutex::new(()),
        }
    }

    /// Serves the snapshot, rebuilding it first when stale.
    ///
    /// Fails only when no snapshot has ever existed *and* the rebuild fails;
    /// with a prior snapshot in hand, staleness is preferred over
    /// unavailability.
    pub async fn get(&self, if_none_match: Option<&str>) -> PortResult<SnapshotFetch> {
        let snapshot = self.fresh_snapshot().await?;

        if let Some(tag) = if_none_match {
            if tag == snapshot.fingerprint {
                return Ok(SnapshotFetch::NotModified {
                    fingerprint: snapshot.fingerprint.clone(),
                });
            }
        }
        Ok(SnapshotFetch::Modified {
            body: snapshot.body.clone(),
            fingerprint: snapshot.fingerprint.clone(),
        })
    }

    async fn fresh_snapshot(&self) -> PortResult<Arc<CacheSnapshot>> {
        if let Some(current) = self.current.read().await.as_ref() {
            if current.age() <= self.ttl {
                return Ok(Arc::clone(current));
            }
        }

        let _rebuilding = self.rebuild.lock().await;
        // Another caller may have finished the rebuild while we waited.
        if let Some(current) = self.current.read().await.as_ref() {
            if current.age() <= self.ttl {
                return Ok(Arc::clone(current));
            }
        }

        match self.rebuild_snapshot().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                // Atomic publication: readers see the old snapshot or the
                // new one, never a partial write.
                *self.current.write().await = Some(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                if let Some(stale) = self.current.read().await.as_ref() {
                    warn!(error = %e, "snapshot rebuild failed, serving stale copy");
                    return Ok(Arc::clone(stale));
                }
                Err(e)
            }
        }
    }

    async fn rebuild_snapshot(&self) -> PortResult<CacheSnapshot> {
        let mut reminders = self.ledger.active_reminders().await?;
        reminders.sort_by_key(|r| r.id);

        let body = render_body(&reminders);
        let fingerprint = fingerprint_of(&body);
        Ok(CacheSnapshot {
            body,
            fingerprint,
            captured_at: Instant::now(),
        })
    }
}

/// Canonical serialization of the projection: records sorted by id, fields
/// rendered through a `BTreeMap` so key order is fixed. Identical data must
/// produce an identical body, or the fingerprint is useless for
/// revalidation.
fn render_body(reminders: &[ReminderRecord]) -> Vec<u8> {
    let entries: Vec<BTreeMap<&str, Value>> = reminders
        .iter()
        .map(|r| {
            BTreeMap::from([
                ("id", Value::String(r.id.to_string())),
                ("subject", Value::String(r.subject.clone())),
                (
                    "time_of_day",
                    Value::String(r.time_of_day.format("%H:%M").to_string()),
                ),
                ("substance", Value::String(r.substance.clone())),
                ("message", Value::String(r.message.clone())),
                ("audio_url", Value::String(r.audio_url.clone())),
                ("active", Value::Bool(r.active)),
            ])
        })
        .collect();

    // Serializing a Vec<BTreeMap> cannot fail.
    serde_json::to_vec(&entries).expect("canonical snapshot body serializes")
}

fn fingerprint_of(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
