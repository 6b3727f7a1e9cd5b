//! Outbound bootstrap session orchestration.
//!
//! At most one session runs at a time. `warmup` deduplicates per endpoint
//! for the lifetime of the process; observers learn when a session ends,
//! whatever its outcome.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use weave_ledger::Ledger;
use weave_store::LedgerStore;

use crate::{BootstrapClient, BootstrapConfig, BootstrapMetrics};

type Observer = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct InitiatorState {
    in_progress: bool,
    warmed_up: HashSet<SocketAddr>,
}

/// State the spawned session task needs after the initiator call returns.
struct InitiatorShared {
    state: Mutex<InitiatorState>,
    observers: Mutex<Vec<Observer>>,
    metrics: Arc<BootstrapMetrics>,
}

impl InitiatorShared {
    fn session_finished(&self) {
        self.state.lock().unwrap().in_progress = false;
        self.metrics.in_progress.set(0);
        // Callbacks run outside every lock.
        let observers: Vec<Observer> = self.observers.lock().unwrap().clone();
        for observer in observers {
            observer(false);
        }
    }
}

pub struct BootstrapInitiator {
    store: Arc<LedgerStore>,
    ledger: Arc<Ledger>,
    config: BootstrapConfig,
    shared: Arc<InitiatorShared>,
    peers: Mutex<Vec<SocketAddr>>,
}

impl BootstrapInitiator {
    pub fn new(
        store: Arc<LedgerStore>,
        ledger: Arc<Ledger>,
        config: BootstrapConfig,
        metrics: Arc<BootstrapMetrics>,
    ) -> Self {
        Self {
            store,
            ledger,
            config,
            shared: Arc::new(InitiatorShared {
                state: Mutex::new(InitiatorState::default()),
                observers: Mutex::new(Vec::new()),
                metrics,
            }),
            peers: Mutex::new(Vec::new()),
        }
    }

    /// Register a callback invoked with the new `in_progress` value when a
    /// session ends.
    pub fn add_observer(&self, observer: impl Fn(bool) + Send + Sync + 'static) {
        self.shared.observers.lock().unwrap().push(Arc::new(observer));
    }

    pub fn add_peer(&self, endpoint: SocketAddr) {
        self.peers.lock().unwrap().push(endpoint);
    }

    pub fn in_progress(&self) -> bool {
        self.shared.state.lock().unwrap().in_progress
    }

    /// Start a session toward `endpoint` unless one is already running.
    pub fn bootstrap(&self, endpoint: SocketAddr) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if state.in_progress {
                tracing::debug!(%endpoint, "bootstrap already in progress, dropping request");
                return;
            }
            state.in_progress = true;
        }
        self.initiate(endpoint);
    }

    /// Bootstrap toward `endpoint` at most once per process lifetime.
    pub fn warmup(&self, endpoint: SocketAddr) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if !state.warmed_up.insert(endpoint) {
                return;
            }
            if state.in_progress {
                return;
            }
            state.in_progress = true;
        }
        self.initiate(endpoint);
    }

    /// Bootstrap toward some known peer, rotating through the list.
    pub fn bootstrap_any(&self) {
        let endpoint = {
            let mut peers = self.peers.lock().unwrap();
            if peers.is_empty() {
                None
            } else {
                let endpoint = peers.remove(0);
                peers.push(endpoint);
                Some(endpoint)
            }
        };
        match endpoint {
            Some(endpoint) => self.bootstrap(endpoint),
            None => tracing::debug!("no known peers to bootstrap from"),
        }
    }

    fn initiate(&self, endpoint: SocketAddr) {
        let shared = Arc::clone(&self.shared);
        shared.metrics.sessions_started.inc();
        shared.metrics.in_progress.set(1);
        let client = BootstrapClient::new(
            Arc::clone(&self.store),
            Arc::clone(&self.ledger),
            self.config.clone(),
            Arc::clone(&shared.metrics),
        );
        tokio::spawn(async move {
            match client.run(endpoint).await {
                Ok(()) => shared.metrics.sessions_completed.inc(),
                Err(e) => {
                    shared.metrics.sessions_failed.inc();
                    tracing::warn!(%endpoint, error = %e, "bootstrap session failed");
                }
            }
            shared.session_finished();
        });
    }
}
