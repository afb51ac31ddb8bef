pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::hidalgo::ValidationSlot;
use crate::models::{
    Challenge, ChallengeAssignment, ChallengeStatus, CheckinUpsert, Drink, EventFeed,
    HidalgoCheckin, Match, MatchScoreUpdate, MatchStatus, NewAssignment, NewChallenge, NewDrink,
    NewEvent, NewMatchUpdate, Profile, ProfileUpdate, Round, Team, Tournament, Trophy, UserRole,
};

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("malformed row set: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("not found: {0}")]
    NotFound(&'static str),
}

/// Everything the app asks of the backend, one method per query or write
/// the pages perform. Small tables, so reads pull whole row sets.
#[async_trait]
pub trait TournamentStore: Send + Sync {
    // reads
    async fn fetch_tournament(&self) -> Result<Tournament, StoreError>;
    /// Teams ordered by name.
    async fn fetch_teams(&self) -> Result<Vec<Team>, StoreError>;
    /// Rounds in playing order.
    async fn fetch_rounds(&self) -> Result<Vec<Round>, StoreError>;
    async fn fetch_profiles(&self) -> Result<Vec<Profile>, StoreError>;
    async fn fetch_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;
    /// Every match of every round, oldest first.
    async fn fetch_matches(&self) -> Result<Vec<Match>, StoreError>;
    async fn fetch_match(&self, id: Uuid) -> Result<Option<Match>, StoreError>;
    async fn fetch_drinks(&self) -> Result<Vec<Drink>, StoreError>;
    /// Latest drinks first, capped.
    async fn fetch_recent_drinks(&self, limit: usize) -> Result<Vec<Drink>, StoreError>;
    async fn fetch_challenges(&self) -> Result<Vec<Challenge>, StoreError>;
    async fn fetch_assignments(&self) -> Result<Vec<ChallengeAssignment>, StoreError>;
    async fn fetch_checkins(&self) -> Result<Vec<HidalgoCheckin>, StoreError>;
    async fn fetch_trophies(&self) -> Result<Vec<Trophy>, StoreError>;
    /// Latest feed entries first, capped.
    async fn fetch_events(&self, limit: usize) -> Result<Vec<EventFeed>, StoreError>;

    // writes
    async fn insert_drink(&self, drink: NewDrink) -> Result<(), StoreError>;
    async fn insert_event(&self, event: NewEvent) -> Result<(), StoreError>;
    async fn insert_challenge(&self, challenge: NewChallenge) -> Result<(), StoreError>;
    async fn insert_assignment(&self, assignment: NewAssignment) -> Result<(), StoreError>;
    async fn set_assignment_status(
        &self,
        id: Uuid,
        status: ChallengeStatus,
        validated_by: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    async fn update_match_score(&self, id: Uuid, update: MatchScoreUpdate)
        -> Result<(), StoreError>;
    async fn set_match_status(&self, id: Uuid, status: MatchStatus) -> Result<(), StoreError>;
    async fn update_match_players(
        &self,
        id: Uuid,
        team_a_players: Vec<Uuid>,
        team_b_players: Vec<Uuid>,
    ) -> Result<(), StoreError>;
    async fn insert_match_update(&self, update: NewMatchUpdate) -> Result<(), StoreError>;
    /// Upsert on (user_id, for_date): answering twice overwrites said_yes.
    async fn upsert_checkin(&self, checkin: CheckinUpsert) -> Result<(), StoreError>;
    async fn fill_checkin_validation(
        &self,
        id: Uuid,
        slot: ValidationSlot,
        validator: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    async fn award_trophy(
        &self,
        id: Uuid,
        winner_user: Option<Uuid>,
        winner_team: Option<Uuid>,
    ) -> Result<(), StoreError>;
    async fn set_profile_role(&self, id: Uuid, role: UserRole) -> Result<(), StoreError>;
    async fn set_secret_word(&self, id: Uuid, word: &str) -> Result<(), StoreError>;
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<(), StoreError>;
}
