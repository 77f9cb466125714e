use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::api::HttpClient;
use crate::events::{emit, AppEvent, EventSender};
use crate::session;

// ── State ───────────────────────────────────────────────────────────────────

/// Keeps the current user marked online and caches who else is.
///
/// One heartbeat loop per process: `start` while running does nothing.
pub struct Presence {
    http: HttpClient,
    interval: Duration,
    events: EventSender,
    handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    active: Arc<AtomicBool>,
    online: Arc<RwLock<HashSet<i64>>>,
}

impl Presence {
    pub fn new(http: HttpClient, interval: Duration, events: EventSender) -> Self {
        Self {
            http,
            interval,
            events,
            handle: Arc::new(Mutex::new(None)),
            active: Arc::new(AtomicBool::new(false)),
            online: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_online(&self, user_id: i64) -> bool {
        self.online
            .read()
            .map(|set| set.contains(&user_id))
            .unwrap_or(false)
    }

    pub fn online_ids(&self) -> HashSet<i64> {
        self.online.read().map(|set| set.clone()).unwrap_or_default()
    }

    pub async fn start(&self) {
        if self.active.swap(true, Ordering::SeqCst) {
            tracing::debug!("heartbeat already running");
            return;
        }
        tracing::info!("heartbeat started ({}s)", self.interval.as_secs());

        let http = self.http.clone();
        let interval = self.interval;
        let events = self.events.clone();
        let active = self.active.clone();
        let online = self.online.clone();

        let handle = tokio::spawn(async move {
            ping(&http).await;
            refresh(&http, &online, &events).await;
            loop {
                tokio::time::sleep(interval).await;
                if !active.load(Ordering::SeqCst) {
                    break;
                }
                if !session::is_logged_in(http.store()) {
                    tracing::info!("session gone, heartbeat stopping");
                    active.store(false, Ordering::SeqCst);
                    break;
                }
                ping(&http).await;
                refresh(&http, &online, &events).await;
            }
        });

        *self.handle.lock().await = Some(handle);
    }

    pub fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            tracing::info!("heartbeat stopped");
        }
        if let Ok(mut guard) = self.handle.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }

    /// Fetch the online list now, outside the heartbeat cadence.
    pub async fn refresh_now(&self) -> usize {
        refresh(&self.http, &self.online, &self.events).await
    }
}

impl Drop for Presence {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

async fn ping(http: &HttpClient) {
    if let Err(e) = http.heartbeat().await {
        tracing::warn!("heartbeat failed: {e}");
    }
}

async fn refresh(http: &HttpClient, online: &RwLock<HashSet<i64>>, events: &EventSender) -> usize {
    match http.online_users().await {
        Ok(users) => {
            let ids: HashSet<i64> = users.iter().map(|u| u.id).collect();
            let count = ids.len();
            if let Ok(mut set) = online.write() {
                *set = ids;
            }
            emit(events, AppEvent::PresenceRefreshed { online: count });
            count
        }
        Err(e) => {
            tracing::warn!("online users refresh failed: {e}");
            online.read().map(|set| set.len()).unwrap_or(0)
        }
    }
}
