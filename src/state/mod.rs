pub mod game;
mod sse;

use std::{
    sync::Arc,
    time::{Instant, SystemTime},
};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{RwLock, mpsc};

use crate::{
    config::AppConfig,
    dto::rounds::RoundSnapshot,
    engine::buzzer::TeamId,
    error::ServiceError,
    rounds::ScoreEvent,
    state::game::{Competition, RoundKind},
};

pub use self::sse::{EventChannel, EventChannels};

pub type SharedState = Arc<AppState>;

/// Handle used to push messages to a connected team console.
#[derive(Clone)]
pub struct ConsoleConnection {
    /// Team this console identified as.
    pub team_id: TeamId,
    /// Writer half of the console socket.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state storing the live competition and persistent
/// connections.
pub struct AppState {
    config: AppConfig,
    events: EventChannels,
    consoles: DashMap<TeamId, ConsoleConnection>,
    competition: RwLock<Option<Competition>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        let events = EventChannels::new(config.sse_capacity());
        Arc::new(Self {
            config,
            events,
            consoles: DashMap::new(),
            competition: RwLock::new(None),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Broadcast channels feeding the SSE streams, plus the host credential.
    pub fn events(&self) -> &EventChannels {
        &self.events
    }

    /// Registry of active console sockets keyed by team.
    pub fn consoles(&self) -> &DashMap<TeamId, ConsoleConnection> {
        &self.consoles
    }

    /// Install a freshly built competition, replacing any previous one.
    pub async fn install_competition(&self, competition: Competition) {
        let mut guard = self.competition.write().await;
        *guard = Some(competition);
    }

    /// Drop the current competition, if any.
    pub async fn clear_competition(&self) -> bool {
        let mut guard = self.competition.write().await;
        guard.take().is_some()
    }

    /// Whether a competition is currently loaded.
    pub async fn has_competition(&self) -> bool {
        self.competition.read().await.is_some()
    }

    /// Run a read-only closure against the loaded competition.
    pub async fn read_competition<T>(
        &self,
        f: impl FnOnce(&Competition) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let guard = self.competition.read().await;
        let competition = guard.as_ref().ok_or(ServiceError::NoCompetition)?;
        f(competition)
    }

    /// Snapshot one round as observed right now.
    pub async fn read_round_snapshot(&self, kind: RoundKind) -> Result<RoundSnapshot, ServiceError> {
        self.read_competition(|competition| {
            RoundSnapshot::build(competition, kind, Instant::now()).map_err(ServiceError::from)
        })
        .await
    }

    /// Apply one command to a round under the single write lock.
    ///
    /// The current [`Instant`] is sampled inside the critical section so every
    /// timestamp a command records is ordered by lock acquisition. The closure
    /// returns its own result plus the score deltas to settle; deltas are
    /// applied and the post-command snapshot is built before the lock drops,
    /// so the snapshot can never interleave with a concurrent command.
    pub async fn mutate_round<T>(
        &self,
        kind: RoundKind,
        f: impl FnOnce(&mut Competition, Instant) -> Result<(T, Vec<ScoreEvent>), ServiceError>,
    ) -> Result<(T, RoundSnapshot), ServiceError> {
        let mut guard = self.competition.write().await;
        let competition = guard.as_mut().ok_or(ServiceError::NoCompetition)?;
        let now = Instant::now();
        let (value, events) = f(competition, now)?;
        competition.apply_scores(&events)?;
        competition.updated_at = SystemTime::now();
        let snapshot = RoundSnapshot::build(competition, kind, now)?;
        Ok((value, snapshot))
    }
}
