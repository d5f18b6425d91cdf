use crate::cache::CachedView;
use crate::config::WatchConfig;
use crate::error::PollError;
use chrono::{DateTime, Utc};
use cw_events::types::EventRecord;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const FETCH_TIMEOUT_SECS: u64 = 10;
const PROBE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollerView {
    pub events: Vec<EventRecord>,
    pub connected: bool,
    pub is_polling: bool,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Updated { delta: usize },
    Unchanged,
    Failed,
}

struct Shared {
    cache: Mutex<CachedView>,
    view_tx: watch::Sender<PollerView>,
    cache_path: PathBuf,
}

pub struct Poller {
    shared: Arc<Shared>,
    view_rx: watch::Receiver<PollerView>,
    shutdown: watch::Sender<bool>,
    refresh: Arc<Notify>,
    handles: Vec<JoinHandle<()>>,
}

impl Poller {
    // Loads the durable cache synchronously before any network traffic, so
    // a restarted session shows the last good view instead of an empty one.
    pub fn start(config: WatchConfig) -> Result<Self, PollError> {
        let cache = CachedView::load(&config.cache_path)?;
        let initial = PollerView {
            events: cache.events.clone(),
            connected: false,
            is_polling: false,
            last_update: cache.last_update,
        };
        let (view_tx, view_rx) = watch::channel(initial);
        let (shutdown, _) = watch::channel(false);
        let refresh = Arc::new(Notify::new());

        let shared = Arc::new(Shared {
            cache: Mutex::new(cache),
            view_tx,
            cache_path: config.cache_path.clone(),
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|err| PollError::Transport {
                message: err.to_string(),
            })?;

        let handles = vec![
            tokio::spawn(poll_loop(
                shared.clone(),
                client.clone(),
                config.clone(),
                shutdown.subscribe(),
                refresh.clone(),
            )),
            tokio::spawn(probe_loop(
                shared.clone(),
                client,
                config,
                shutdown.subscribe(),
            )),
        ];

        Ok(Self {
            shared,
            view_rx,
            shutdown,
            refresh,
            handles,
        })
    }

    pub fn view(&self) -> watch::Receiver<PollerView> {
        self.view_rx.clone()
    }

    pub fn force_refresh(&self) {
        self.refresh.notify_one();
    }

    pub async fn clear_events(&self) -> Result<(), PollError> {
        let mut cache = self.shared.cache.lock().await;
        cache.events.clear();
        cache.last_seen_count = 0;
        cache.last_seq = 0;
        cache.last_update = Some(Utc::now());
        cache.save(&self.shared.cache_path)?;
        let last_update = cache.last_update;
        self.shared.view_tx.send_modify(|view| {
            view.events.clear();
            view.last_update = last_update;
        });
        Ok(())
    }

    // Cancels both timers and joins them; an in-flight fetch re-checks the
    // shutdown flag before touching the cache, so nothing lands after stop.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
    }
}

async fn poll_loop(
    shared: Arc<Shared>,
    client: reqwest::Client,
    config: WatchConfig,
    mut shutdown: watch::Receiver<bool>,
    refresh: Arc<Notify>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let events_url = config.events_url();

    loop {
        tokio::select! {
            _ = shutdown.changed() => return,
            _ = interval.tick() => {}
            _ = refresh.notified() => {}
        }

        shared.view_tx.send_modify(|view| view.is_polling = true);
        let result = fetch_events(&client, &events_url).await;
        if *shutdown.borrow() {
            return;
        }

        let mut cache = shared.cache.lock().await;
        let outcome = apply_poll(&mut cache, result, Utc::now());
        match outcome {
            PollOutcome::Updated { delta } => {
                if let Err(err) = cache.save(&shared.cache_path) {
                    tracing::warn!(error = %err, "failed to persist cache");
                }
                tracing::debug!(delta, total = cache.last_seen_count, last_seq = cache.last_seq, "view updated");
            }
            PollOutcome::Unchanged => {
                tracing::trace!(total = cache.last_seen_count, "no new events");
            }
            PollOutcome::Failed => {
                tracing::debug!("poll failed, keeping last known view");
            }
        }

        let events = cache.events.clone();
        let last_update = cache.last_update;
        drop(cache);

        shared.view_tx.send_modify(|view| {
            view.is_polling = false;
            view.connected = outcome != PollOutcome::Failed;
            if let PollOutcome::Updated { .. } = outcome {
                view.events = events;
                view.last_update = last_update;
            }
        });
    }
}

async fn probe_loop(
    shared: Arc<Shared>,
    client: reqwest::Client,
    config: WatchConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(config.probe_interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let health_url = config.health_url();

    loop {
        tokio::select! {
            _ = shutdown.changed() => return,
            _ = interval.tick() => {}
        }

        let alive = probe_once(&client, &health_url).await;
        if *shutdown.borrow() {
            return;
        }
        shared.view_tx.send_modify(|view| view.connected = alive);
    }
}

async fn fetch_events(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<EventRecord>, PollError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| PollError::Transport {
            message: err.to_string(),
        })?;
    if !response.status().is_success() {
        return Err(PollError::Transport {
            message: format!("source returned {}", response.status()),
        });
    }
    response.json().await.map_err(|err| PollError::Transport {
        message: err.to_string(),
    })
}

async fn probe_once(client: &reqwest::Client, url: &str) -> bool {
    let request = client.get(url).timeout(Duration::from_secs(PROBE_TIMEOUT_SECS));
    match request.send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

// Count-based change detection, as the dashboard behaves today: growth
// replaces the whole view, shrinkage and equality are "no change", and a
// transport failure never discards previously good data.
fn apply_poll(
    cache: &mut CachedView,
    result: Result<Vec<EventRecord>, PollError>,
    now: DateTime<Utc>,
) -> PollOutcome {
    match result {
        Ok(events) => {
            if events.len() > cache.last_seen_count {
                let delta = events.len() - cache.last_seen_count;
                cache.last_seq = events.iter().map(|event| event.seq).max().unwrap_or(0);
                cache.last_seen_count = events.len();
                cache.events = events;
                cache.last_update = Some(now);
                PollOutcome::Updated { delta }
            } else {
                PollOutcome::Unchanged
            }
        }
        Err(_) => PollOutcome::Failed,
    }
}
