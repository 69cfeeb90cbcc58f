//! Presence simulator service — owns the registry, the grant store, and the
//! two recurring timer tasks.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use amoria_core::config::presence::PresenceConfig;
use amoria_core::error::AppError;

use crate::candidate::{Candidate, CandidateRegistry};
use crate::clock::{Clock, SystemClock};
use crate::grant::GrantStore;
use crate::profile::ProfilePresence;
use crate::random::{RandomSource, ThreadRandom};
use crate::rotation::Rotation;
use crate::sweeper::Sweeper;

const STATE_IDLE: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_STOPPED: u8 = 2;

/// Process-wide service that fabricates temporary online status for a
/// rotating subset of otherwise-offline users.
///
/// Views register the users they render via [`register_candidates`] or
/// [`register_profiles`]; between [`start`] and [`stop`] a rotation task
/// grants batches of simulated presence and a sweeper task evicts lapsed
/// grants. The query facade ([`is_fake_online`], [`is_online_or_fake`])
/// answers whether to render an online indicator.
///
/// [`register_candidates`]: Self::register_candidates
/// [`register_profiles`]: Self::register_profiles
/// [`start`]: Self::start
/// [`stop`]: Self::stop
/// [`is_fake_online`]: Self::is_fake_online
/// [`is_online_or_fake`]: Self::is_online_or_fake
pub struct PresenceSimulator {
    /// Presence configuration.
    config: PresenceConfig,
    /// Registry of observed users.
    registry: Arc<CandidateRegistry>,
    /// Grant store.
    store: Arc<GrantStore>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Random source driving rotation sampling.
    random: Arc<Mutex<Box<dyn RandomSource>>>,
    /// Lifecycle state.
    state: AtomicU8,
    /// Shutdown signal sender, present while running.
    shutdown_tx: Mutex<Option<watch::Sender<bool>>>,
    /// Handles of the spawned timer tasks.
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for PresenceSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceSimulator").finish()
    }
}

impl PresenceSimulator {
    /// Create a stopped simulator with the system clock and the
    /// thread-local random source.
    pub fn new(config: PresenceConfig) -> Result<Self, AppError> {
        config.validate()?;

        Ok(Self {
            config,
            registry: Arc::new(CandidateRegistry::new()),
            store: Arc::new(GrantStore::new()),
            clock: Arc::new(SystemClock),
            random: Arc::new(Mutex::new(Box::new(ThreadRandom))),
            state: AtomicU8::new(STATE_IDLE),
            shutdown_tx: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Replace the time source. Call before [`start`](Self::start).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the random source. Call before [`start`](Self::start).
    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = Arc::new(Mutex::new(random));
        self
    }

    /// Start the rotation and sweep tasks.
    ///
    /// The first rotation runs after the warm-up delay so the initial render
    /// is not entirely without simulated presence; subsequent rotations run
    /// on the configured interval.
    pub fn start(&self) -> Result<(), AppError> {
        self.state
            .compare_exchange(STATE_IDLE, STATE_RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| AppError::conflict("Presence simulator can only be started once"))?;

        let (tx, rx) = watch::channel(false);

        let rotation = Rotation::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            Arc::clone(&self.random),
            &self.config,
        );
        let warmup = self.config.warmup_delay();
        let rotation_interval = self.config.rotation_interval();
        let mut rotation_cancel = rx.clone();
        let rotation_task = tokio::spawn(async move {
            // The only value ever sent on the channel is the shutdown signal,
            // and a dropped sender means the service is gone; either way the
            // task must end without touching the store again.
            tokio::select! {
                _ = rotation_cancel.changed() => return,
                _ = time::sleep(warmup) => {
                    rotation.rotate_once();
                }
            }

            let mut interval = time::interval(rotation_interval);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = rotation_cancel.changed() => break,
                    _ = interval.tick() => {
                        rotation.rotate_once();
                    }
                }
            }
        });

        let sweeper = Sweeper::new(Arc::clone(&self.store), Arc::clone(&self.clock));
        let sweep_interval = self.config.sweep_interval();
        let mut sweep_cancel = rx;
        let sweep_task = tokio::spawn(async move {
            let mut interval = time::interval(sweep_interval);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = sweep_cancel.changed() => break,
                    _ = interval.tick() => {
                        sweeper.sweep_once();
                    }
                }
            }
        });

        *self.shutdown_tx.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
        *self.tasks.lock().unwrap_or_else(|e| e.into_inner()) = vec![rotation_task, sweep_task];

        tracing::info!(
            rotation_interval_seconds = self.config.rotation_interval_seconds,
            sweep_interval_seconds = self.config.sweep_interval_seconds,
            grant_duration_minutes = self.config.grant_duration_minutes,
            "Presence simulator started"
        );
        Ok(())
    }

    /// Stop both timer tasks and wait for them to finish. No grant is
    /// created or evicted after this returns.
    pub async fn stop(&self) -> Result<(), AppError> {
        self.state
            .compare_exchange(
                STATE_RUNNING,
                STATE_STOPPED,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map_err(|_| AppError::conflict("Presence simulator is not running"))?;

        let tx = self.shutdown_tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(tx) = tx {
            let _ = tx.send(true);
        }

        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|e| e.into_inner()));
        for task in tasks {
            let _ = task.await;
        }

        tracing::info!("Presence simulator stopped");
        Ok(())
    }

    /// Upsert a batch of candidate observations. Best-effort and valid in
    /// any lifecycle state.
    pub fn register_candidates(&self, candidates: impl IntoIterator<Item = Candidate>) {
        self.registry.register(candidates);
    }

    /// Upsert observations derived from pre-fetched profile rows.
    pub fn register_profiles<'a>(&self, profiles: impl IntoIterator<Item = &'a ProfilePresence>) {
        let now = self.clock.now();
        let recency = self.config.real_recency();
        self.registry
            .register(profiles.into_iter().map(|p| p.observe(now, recency)));
    }

    /// Whether the user currently holds an unexpired simulated-presence
    /// grant. Lazy: does not require the sweeper to have run.
    ///
    /// # Panics
    ///
    /// Panics when called outside the running lifetime; that is an
    /// integration bug that should surface during development.
    pub fn is_fake_online(&self, user_id: &str) -> bool {
        self.assert_running();
        self.store.is_active(user_id, self.clock.now())
    }

    /// Whether the profile should render an online indicator: genuinely
    /// online by its own signals, or else holding a simulated grant. Real
    /// presence short-circuits; the grant store is never consulted for a
    /// genuinely online user.
    ///
    /// # Panics
    ///
    /// Panics when called outside the running lifetime.
    pub fn is_online_or_fake(&self, profile: &ProfilePresence) -> bool {
        self.assert_running();
        let now = self.clock.now();
        if profile.is_really_online(now, self.config.real_recency()) {
            return true;
        }
        self.store.is_active(&profile.user_id, now)
    }

    /// Number of currently active simulated-presence grants.
    pub fn fake_online_count(&self) -> usize {
        self.store.active_count(self.clock.now())
    }

    /// Number of grants held, including expired ones the sweeper has not
    /// evicted yet. Diagnostic.
    pub fn granted_count(&self) -> usize {
        self.store.len()
    }

    /// Number of users currently observed in the registry.
    pub fn candidate_count(&self) -> usize {
        self.registry.len()
    }

    fn assert_running(&self) {
        assert!(
            self.state.load(Ordering::SeqCst) == STATE_RUNNING,
            "presence queries are only valid between start() and stop()"
        );
    }
}
