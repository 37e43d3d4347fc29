// Distributed lock built on a session and a KV acquire

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::kv::validate_key;
use crate::client::ConsulClient;
use crate::error::{ConsulError, Result};
use crate::model::{KVPair, SessionRequest};
use crate::request::QueryOptions;

/// Flags value marking a key as a lock
pub const LOCK_FLAG_VALUE: u64 = 0x2ddccbc058a50c18;

/// TTL of the session created when none is supplied
pub const DEFAULT_LOCK_SESSION_TTL: Duration = Duration::from_secs(15);

/// Pause between acquire attempts while the lock delay is in effect
pub const DEFAULT_LOCK_RETRY_TIME: Duration = Duration::from_secs(5);

const DEFAULT_LOCK_WAIT_TIME: Duration = Duration::from_secs(15);
const DEFAULT_LOCK_SESSION_NAME: &str = "Consul API Lock";

#[derive(Clone, Debug)]
pub struct LockOptions {
    pub key: String,
    /// Stored under the key while the lock is held
    pub value: Vec<u8>,
    /// Existing session to lock with; a session is created and renewed when unset
    pub session: Option<String>,
    pub session_name: String,
    pub session_ttl: Duration,
    /// Blocking query wait while someone else holds the lock
    pub lock_wait_time: Duration,
    /// Give up after one `lock_wait_time` instead of waiting forever
    pub lock_try_once: bool,
    pub lock_retry_time: Duration,
}

impl LockOptions {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: Vec::new(),
            session: None,
            session_name: DEFAULT_LOCK_SESSION_NAME.to_string(),
            session_ttl: DEFAULT_LOCK_SESSION_TTL,
            lock_wait_time: DEFAULT_LOCK_WAIT_TIME,
            lock_try_once: false,
            lock_retry_time: DEFAULT_LOCK_RETRY_TIME,
        }
    }

    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_session(mut self, session: &str) -> Self {
        self.session = Some(session.to_string());
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_wait_time(mut self, wait: Duration) -> Self {
        self.lock_wait_time = wait;
        self
    }

    pub fn with_retry_time(mut self, retry: Duration) -> Self {
        self.lock_retry_time = retry;
        self
    }

    pub fn try_once(mut self) -> Self {
        self.lock_try_once = true;
        self
    }
}

#[derive(Default)]
struct LockState {
    session: Option<String>,
    renewal: Option<Renewal>,
}

struct Renewal {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Client side mutual exclusion on a single key.
///
/// Only one holder at a time can own the key through `acquire`. The lock is
/// lost when its session is invalidated, which [`Lock::is_held`] reports.
pub struct Lock {
    client: ConsulClient,
    opts: LockOptions,
    held: Arc<AtomicBool>,
    state: Mutex<LockState>,
}

impl Lock {
    pub(crate) fn new(client: ConsulClient, opts: LockOptions) -> Result<Self> {
        if opts.key.is_empty() {
            return Err(ConsulError::InvalidArgument("missing lock key".to_string()));
        }
        validate_key(&opts.key)?;
        if opts.session.is_none() && opts.session_ttl.is_zero() {
            return Err(ConsulError::InvalidArgument(
                "lock session TTL must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            client,
            opts,
            held: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(LockState::default()),
        })
    }

    pub fn key(&self) -> &str {
        &self.opts.key
    }

    /// Whether this handle currently holds the lock
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    /// Block until the lock is acquired.
    ///
    /// Returns `false` when `lock_try_once` is set and the lock stayed taken
    /// for the whole wait time.
    pub async fn acquire(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        if self.is_held() {
            return Err(ConsulError::LockHeld);
        }

        let session = match &self.opts.session {
            Some(session) => session.clone(),
            None => {
                let session = self.create_session().await?;
                state.renewal = Some(self.start_renewal(&session));
                session
            }
        };
        state.session = Some(session.clone());

        match self.wait_and_acquire(&session).await {
            Ok(true) => {
                self.held.store(true, Ordering::SeqCst);
                info!("Acquired lock on {}", self.opts.key);
                Ok(true)
            }
            other => {
                Self::stop_renewal(&mut state).await;
                state.session = None;
                other
            }
        }
    }

    /// Give the lock up; the session created by `acquire` is destroyed
    pub async fn release(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if !self.is_held() {
            return Err(ConsulError::LockNotHeld);
        }
        self.held.store(false, Ordering::SeqCst);

        let session = state.session.take().unwrap_or_default();
        let pair = KVPair::new(&self.opts.key, Vec::new())
            .with_flags(LOCK_FLAG_VALUE)
            .with_session(&session);
        let released = self.client.kv().release(&pair, None).await;
        Self::stop_renewal(&mut state).await;
        released?;
        debug!("Released lock on {}", self.opts.key);
        Ok(())
    }

    /// Remove the lock key once nobody holds it
    pub async fn destroy(&self) -> Result<()> {
        let _state = self.state.lock().await;
        if self.is_held() {
            return Err(ConsulError::LockHeld);
        }

        let kv = self.client.kv();
        let Some(pair) = kv.get(&self.opts.key, None).await?.response else {
            return Ok(());
        };
        if pair.flags != LOCK_FLAG_VALUE {
            return Err(ConsulError::LockConflict);
        }
        if pair.session.as_deref().is_some_and(|s| !s.is_empty()) {
            return Err(ConsulError::LockInUse);
        }
        if !kv.delete_cas(&pair, None).await?.response {
            return Err(ConsulError::LockInUse);
        }
        Ok(())
    }

    async fn wait_and_acquire(&self, session: &str) -> Result<bool> {
        let kv = self.client.kv();
        let started = Instant::now();
        let mut wait_index = 0;
        let mut attempts = 0u32;

        loop {
            if self.opts.lock_try_once && attempts > 0 {
                let elapsed = started.elapsed();
                if elapsed >= self.opts.lock_wait_time {
                    debug!("Gave up waiting for lock on {}", self.opts.key);
                    return Ok(false);
                }
            }
            attempts += 1;

            let mut wait = self.opts.lock_wait_time;
            if self.opts.lock_try_once {
                wait = wait.saturating_sub(started.elapsed());
            }
            let q = QueryOptions::new().consistent().blocking(wait_index, Some(wait));
            let current = kv.get(&self.opts.key, Some(&q)).await?;

            if let Some(existing) = &current.response {
                if existing.flags != LOCK_FLAG_VALUE {
                    return Err(ConsulError::LockConflict);
                }
                match existing.session.as_deref() {
                    Some(owner) if owner == session => return Ok(true),
                    Some(owner) if !owner.is_empty() => {
                        wait_index = current.last_index();
                        continue;
                    }
                    _ => {}
                }
            }

            let pair = KVPair::new(&self.opts.key, self.opts.value.clone())
                .with_flags(LOCK_FLAG_VALUE)
                .with_session(session);
            if kv.acquire(&pair, None).await?.response {
                return Ok(true);
            }

            // Lock delay after a session invalidation; retry shortly
            wait_index = 0;
            tokio::time::sleep(self.opts.lock_retry_time).await;
        }
    }

    async fn create_session(&self) -> Result<String> {
        let request = SessionRequest::new()
            .with_name(&self.opts.session_name)
            .with_ttl(self.opts.session_ttl);
        let result = self.client.session().create(&request, None).await?;
        Ok(result.response)
    }

    fn start_renewal(&self, session: &str) -> Renewal {
        let (stop, stopped) = oneshot::channel::<()>();
        let client = self.client.clone();
        let held = self.held.clone();
        let ttl = self.opts.session_ttl;
        let id = session.to_string();

        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = stopped.await;
            };
            if let Err(e) = client.session().renew_periodic(ttl, &id, None, shutdown).await {
                warn!("Lock session {} ended: {}", id, e);
                held.store(false, Ordering::SeqCst);
            }
        });
        Renewal { stop, task }
    }

    async fn stop_renewal(state: &mut LockState) {
        if let Some(renewal) = state.renewal.take() {
            let _ = renewal.stop.send(());
            if let Err(e) = renewal.task.await {
                warn!("Lock session renewal task failed: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for Lock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("key", &self.opts.key)
            .field("held", &self.is_held())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_options_defaults() {
        let opts = LockOptions::new("service/leader");
        assert_eq!(opts.session_ttl, DEFAULT_LOCK_SESSION_TTL);
        assert_eq!(opts.lock_retry_time, DEFAULT_LOCK_RETRY_TIME);
        assert!(opts.session.is_none());
        assert!(!opts.lock_try_once);
    }

    #[test]
    fn test_lock_rejects_bad_keys() {
        let client = ConsulClient::from_server_addr("http://127.0.0.1:8500").unwrap();
        assert!(matches!(
            client.lock_key("/leader"),
            Err(ConsulError::InvalidKey(_))
        ));
        assert!(client.lock_key("").is_err());
        let lock = client.lock_key("service/leader").unwrap();
        assert!(!lock.is_held());
        assert_eq!(lock.key(), "service/leader");
    }

    #[tokio::test]
    async fn test_release_without_acquire() {
        let client = ConsulClient::from_server_addr("http://127.0.0.1:8500").unwrap();
        let lock = client.lock_key("service/leader").unwrap();
        assert!(matches!(lock.release().await, Err(ConsulError::LockNotHeld)));
    }
}
