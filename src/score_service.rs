//! Keeps the live standings current. One task owns the refresh cycle:
//! fetch the raw tables, run the aggregation, publish on a watch channel.
//! Table-change signals from the hub trigger refetches; consumers only
//! ever see complete standings, never partial ones.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use log::{error, info};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::{Profile, Round, Team, Tournament};
use crate::realtime::{ChangeHub, WatchedTable};
use crate::scoring::{team_scores, ScoreSnapshot, TeamScores};
use crate::store::{StoreError, TournamentStore};

/// Static data around the scoreboard, loaded in one parallel burst.
#[derive(Debug, Clone)]
pub struct TournamentOverview {
    pub tournament: Tournament,
    pub teams: Vec<Team>,
    pub rounds: Vec<Round>,
    pub profiles: Vec<Profile>,
}

pub async fn fetch_overview(
    store: &dyn TournamentStore,
) -> Result<TournamentOverview, StoreError> {
    let (tournament, teams, rounds, profiles) = futures::try_join!(
        store.fetch_tournament(),
        store.fetch_teams(),
        store.fetch_rounds(),
        store.fetch_profiles(),
    )?;
    Ok(TournamentOverview {
        tournament,
        teams,
        rounds,
        profiles,
    })
}

/// Everything the aggregation reads, fetched in parallel. Any single
/// failure abandons the whole pass.
pub async fn fetch_snapshot(store: &dyn TournamentStore) -> Result<ScoreSnapshot, StoreError> {
    let (matches, drinks, challenges, assignments, profiles, checkins) = futures::try_join!(
        store.fetch_matches(),
        store.fetch_drinks(),
        store.fetch_challenges(),
        store.fetch_assignments(),
        store.fetch_profiles(),
        store.fetch_checkins(),
    )?;
    Ok(ScoreSnapshot {
        matches,
        drinks,
        challenges,
        assignments,
        profiles,
        checkins,
    })
}

pub struct ScoreService {
    store: Arc<dyn TournamentStore>,
    hub: ChangeHub,
    scores_tx: watch::Sender<TeamScores>,
    last_error: Mutex<Option<String>>,
}

impl ScoreService {
    pub fn new(store: Arc<dyn TournamentStore>, hub: ChangeHub) -> Self {
        let (scores_tx, _) = watch::channel(TeamScores::empty());
        ScoreService {
            store,
            hub,
            scores_tx,
            last_error: Mutex::new(None),
        }
    }

    /// Standings channel. Starts out empty until the first refresh lands.
    pub fn subscribe_scores(&self) -> watch::Receiver<TeamScores> {
        self.scores_tx.subscribe()
    }

    /// Message of the most recent failed refresh, cleared by a good one.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|guard| (*guard).clone())
    }

    /// Refetches the raw tables and republishes the standings. On failure
    /// whatever was last published stays on the channel.
    pub async fn refresh(&self) -> Result<TeamScores, StoreError> {
        match fetch_snapshot(self.store.as_ref()).await {
            Ok(snapshot) => {
                // Hidalgo deadlines flip on the UTC date.
                let scores = team_scores(&snapshot, Utc::now().date_naive());
                if let Ok(mut last) = self.last_error.lock() {
                    *last = None;
                }
                self.scores_tx.send_replace(scores.clone());
                Ok(scores)
            }
            Err(e) => {
                error!("Score refresh failed, keeping previous standings: {}", e);
                if let Ok(mut last) = self.last_error.lock() {
                    *last = Some(e.to_string());
                }
                Err(e)
            }
        }
    }

    pub fn spawn(self: &Arc<Self>, cancel_token: CancellationToken) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.run(cancel_token).await })
    }

    async fn run(&self, cancel_token: CancellationToken) {
        // Subscribe before the initial refresh so writes racing the
        // startup are not lost.
        let mut changes = self.hub.subscribe();

        if cancel_token.is_cancelled() {
            info!("Score service cancelled before starting");
            return;
        }

        info!("Score service started");
        let _ = self.refresh().await;

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Score service shutting down");
                    return;
                }
                change = changes.recv() => match change {
                    Ok(change) if Self::triggers_refresh(change.table) => {
                        info!(
                            "Change on {}, recomputing standings",
                            change.table.table_name()
                        );
                        let _ = self.refresh().await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        info!("Change stream lagged by {}, recomputing standings", skipped);
                        let _ = self.refresh().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Change stream closed, score service stopping");
                        return;
                    }
                },
            }
        }
    }

    /// Only the four tables that feed the aggregation trigger a refetch.
    fn triggers_refresh(table: WatchedTable) -> bool {
        matches!(
            table,
            WatchedTable::Matches
                | WatchedTable::Drinks
                | WatchedTable::ChallengeAssignments
                | WatchedTable::HidalgoCheckins
        )
    }
}
