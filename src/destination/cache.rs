//! Resolution cache: key policy, TTLs and single-flight coalescing on top
//! of a pluggable key-value store.
//!
//! Positive results live 12 hours, negative ("could not resolve") results
//! 1 hour so improving data is revisited sooner. The in-process flight map
//! makes concurrent callers for the same key wait for one pipeline run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;

use super::types::{ResolutionQuery, ResolutionResult, ResolveError, Result};

pub const POSITIVE_TTL: Duration = Duration::from_secs(12 * 3600);
pub const NEGATIVE_TTL: Duration = Duration::from_secs(3600);

const KEY_PREFIX: &str = "waypoint:v1:";

/// How often a caller re-reads the store while another process holds the
/// in-flight marker.
const REMOTE_POLL_INTERVAL: Duration = Duration::from_millis(25);

// ─── Key-value backends ─────────────────────────────────────────

/// External key-value store the cache policy sits on.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
    /// Atomically store `value` only if `key` is absent or expired.
    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool>;
}

struct MemoryValue {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Process-local store; the default backend.
#[derive(Default)]
pub struct InMemoryKvStore {
    entries: Mutex<HashMap<String, MemoryValue>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries currently held, expired ones included until the next write.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueCache for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .get(key)
            .filter(|v| Instant::now() < v.expires_at)
            .map(|v| v.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        entries.retain(|_, v| now < v.expires_at);
        entries.insert(
            key.to_string(),
            MemoryValue {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        entries.retain(|_, v| now < v.expires_at);
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            MemoryValue {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }
}

#[derive(Serialize, Deserialize, Clone)]
struct FileValue {
    value: Vec<u8>,
    /// Unix epoch milliseconds
    expires_at: i64,
}

/// JSON-file store at ~/.waypoint/cache.json, persisted on every write.
pub struct FileKvStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, FileValue>>,
    /// Held across a file write so snapshots reach disk in order.
    write_lock: tokio::sync::Mutex<()>,
}

impl FileKvStore {
    /// Load from the default location (~/.waypoint/cache.json).
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load from a specific path. Missing or corrupt files start empty.
    pub fn load_from(path: PathBuf) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        Self {
            path,
            entries: Mutex::new(entries),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".waypoint")
            .join("cache.json")
    }

    fn read_file(path: &PathBuf) -> Option<HashMap<String, FileValue>> {
        let data = fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// Drop expired entries and serialize what is left.
    fn snapshot(entries: &mut HashMap<String, FileValue>) -> Result<String> {
        let now = Utc::now().timestamp_millis();
        entries.retain(|_, v| v.expires_at > now);
        Ok(serde_json::to_string(&*entries)?)
    }

    /// Write a snapshot on the blocking pool.
    async fn persist(&self, data: String) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, data)?;
            Ok(())
        })
        .await
        .map_err(|e| ResolveError::Cache(format!("cache write task failed: {}", e)))?
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, FileValue>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn expiry(ttl: Duration) -> i64 {
        Utc::now().timestamp_millis() + ttl.as_millis() as i64
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueCache for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.lock_entries();
        let now = Utc::now().timestamp_millis();
        Ok(entries
            .get(key)
            .filter(|v| now < v.expires_at)
            .map(|v| v.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let _writing = self.write_lock.lock().await;
        let data = {
            let mut entries = self.lock_entries();
            entries.insert(
                key.to_string(),
                FileValue {
                    value,
                    expires_at: Self::expiry(ttl),
                },
            );
            Self::snapshot(&mut entries)?
        };
        self.persist(data).await
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool> {
        let _writing = self.write_lock.lock().await;
        let data = {
            let mut entries = self.lock_entries();
            let now = Utc::now().timestamp_millis();
            if entries.get(key).is_some_and(|v| now < v.expires_at) {
                return Ok(false);
            }
            entries.insert(
                key.to_string(),
                FileValue {
                    value,
                    expires_at: Self::expiry(ttl),
                },
            );
            Self::snapshot(&mut entries)?
        };
        self.persist(data).await?;
        Ok(true)
    }
}

// ─── Cache policy ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub positive_ttl: Duration,
    pub negative_ttl: Duration,
    /// Lifetime of the in-flight marker; matches the pipeline budget.
    pub in_flight_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            positive_ttl: POSITIVE_TTL,
            negative_ttl: NEGATIVE_TTL,
            in_flight_ttl: Duration::from_secs(10),
        }
    }
}

/// What the store holds under a resolution key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    /// `None` is the negative marker.
    #[serde(default)]
    pub payload: Option<ResolutionResult>,
    pub inserted_at: DateTime<Utc>,
    pub ttl_ms: u64,
    #[serde(default)]
    pub in_flight: bool,
}

impl CacheEntry {
    fn new(key: &str, payload: Option<ResolutionResult>, ttl: Duration, in_flight: bool) -> Self {
        Self {
            key: key.to_string(),
            payload,
            inserted_at: Utc::now(),
            ttl_ms: ttl.as_millis() as u64,
            in_flight,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.inserted_at >= chrono::Duration::milliseconds(self.ttl_ms as i64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(ResolutionResult),
    NegativeHit,
    /// Another process holds the in-flight marker for this key.
    InFlight,
    Miss,
}

type FlightMap = Arc<Mutex<HashMap<String, watch::Receiver<Option<ResolutionResult>>>>>;

/// Outcome of joining the flight for a key.
pub enum Flight {
    /// This caller runs the pipeline and must publish (or drop) the guard.
    Leader(FlightGuard),
    /// Another caller is running it; wait on the receiver.
    Follower(watch::Receiver<Option<ResolutionResult>>),
}

/// Held by the leader. Dropping it without publishing releases waiters,
/// who then retry.
pub struct FlightGuard {
    key: String,
    tx: watch::Sender<Option<ResolutionResult>>,
    flights: FlightMap,
}

impl FlightGuard {
    pub fn publish(self, result: &ResolutionResult) {
        self.tx.send_replace(Some(result.clone()));
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let mut flights = self.flights.lock().unwrap_or_else(|e| e.into_inner());
        flights.remove(&self.key);
    }
}

/// TTL/key policy plus single-flight coordination.
pub struct ResolutionCache {
    store: Arc<dyn KeyValueCache>,
    policy: CachePolicy,
    flights: FlightMap,
}

impl ResolutionCache {
    pub fn new(store: Arc<dyn KeyValueCache>, policy: CachePolicy) -> Self {
        Self {
            store,
            policy,
            flights: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryKvStore::new()), CachePolicy::default())
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Hash of the normalized text plus the context fields that change
    /// the outcome. Bias coordinates are rounded to 2 decimals.
    pub fn key_for(query: &ResolutionQuery) -> String {
        let mut hasher = Sha256::new();
        hasher.update(query.normalized_text.as_bytes());
        hasher.update([0x1f]);
        if let Some(cc) = &query.context.departure_country {
            hasher.update(cc.trim().to_uppercase().as_bytes());
        }
        hasher.update([0x1f]);
        if let Some(p) = query.context.bias_point() {
            hasher.update(format!("{:.2},{:.2}", p.lat, p.lon).as_bytes());
        }
        format!("{}{}", KEY_PREFIX, hex::encode(hasher.finalize()))
    }

    /// Backend failures and undecodable entries count as a miss.
    pub async fn lookup(&self, key: &str) -> CacheLookup {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => {
                tracing::warn!(error = %e, "cache get failed, treating as miss");
                return CacheLookup::Miss;
            }
        };
        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable cache entry, treating as miss");
                return CacheLookup::Miss;
            }
        };
        if entry.is_expired(Utc::now()) {
            return CacheLookup::Miss;
        }
        if entry.in_flight {
            tracing::debug!(key, "key in flight elsewhere");
            return CacheLookup::InFlight;
        }
        match entry.payload {
            Some(result) => CacheLookup::Hit(result),
            None => CacheLookup::NegativeHit,
        }
    }

    /// Write a positive entry for resolved results, negative otherwise.
    pub async fn store(&self, key: &str, result: &ResolutionResult) {
        let (payload, ttl) = if result.resolved {
            (Some(result.clone()), self.policy.positive_ttl)
        } else {
            (None, self.policy.negative_ttl)
        };
        self.write(key, &CacheEntry::new(key, payload, ttl, false), ttl).await;
    }

    /// Mark the key in flight in the backing store. Returns false when
    /// another process already holds the marker.
    pub async fn mark_in_flight(&self, key: &str) -> bool {
        let ttl = self.policy.in_flight_ttl;
        let entry = CacheEntry::new(key, None, ttl, true);
        let bytes = match serde_json::to_vec(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode in-flight marker");
                return true;
            }
        };
        match self.store.set_if_absent(key, bytes, ttl).await {
            Ok(acquired) => acquired,
            Err(e) => {
                tracing::warn!(error = %e, "cache set_if_absent failed");
                true
            }
        }
    }

    /// Expire the in-flight marker without writing a result.
    pub async fn clear_in_flight(&self, key: &str) {
        let entry = CacheEntry::new(key, None, Duration::ZERO, true);
        self.write(key, &entry, Duration::ZERO).await;
    }

    async fn write(&self, key: &str, entry: &CacheEntry, ttl: Duration) {
        let bytes = match serde_json::to_vec(entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode cache entry");
                return;
            }
        };
        if let Err(e) = self.store.set(key, bytes, ttl).await {
            tracing::warn!(error = %e, "cache set failed");
        }
    }

    /// Poll the store while another process holds the in-flight marker.
    ///
    /// Returns its published result, or `None` once the marker is cleared or
    /// `in_flight_ttl` has passed without a result.
    pub async fn wait_for_remote(&self, key: &str) -> Option<ResolutionResult> {
        let deadline = tokio::time::Instant::now() + self.policy.in_flight_ttl;
        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(REMOTE_POLL_INTERVAL).await;
            match self.lookup(key).await {
                CacheLookup::Hit(result) => return Some(result),
                CacheLookup::NegativeHit => return Some(ResolutionResult::unresolved()),
                CacheLookup::InFlight => continue,
                CacheLookup::Miss => return None,
            }
        }
        tracing::debug!(key, "in-flight marker outlived its ttl");
        None
    }

    /// Join the in-process flight for `key`, becoming leader if none exists.
    pub fn acquire(&self, key: &str) -> Flight {
        let mut flights = self.flights.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(rx) = flights.get(key) {
            return Flight::Follower(rx.clone());
        }
        let (tx, rx) = watch::channel(None);
        flights.insert(key.to_string(), rx);
        Flight::Leader(FlightGuard {
            key: key.to_string(),
            tx,
            flights: self.flights.clone(),
        })
    }

    /// Wait for the leader's result; `None` if the leader gave up.
    pub async fn wait(mut rx: watch::Receiver<Option<ResolutionResult>>) -> Option<ResolutionResult> {
        let published = rx.wait_for(|r| r.is_some()).await;
        match published {
            Ok(result) => result.clone(),
            Err(_) => None,
        }
    }

    /// Number of keys currently being resolved in this process.
    pub fn in_flight_count(&self) -> usize {
        self.flights.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
