use std::env;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postgrest::{Builder, Postgrest};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::{StoreError, TournamentStore};
use crate::constants::SSS_TOURNAMENT_ID;
use crate::hidalgo::ValidationSlot;
use crate::models::{
    Challenge, ChallengeAssignment, ChallengeStatus, CheckinUpsert, Drink, EventFeed,
    HidalgoCheckin, Match, MatchScoreUpdate, MatchStatus, NewAssignment, NewChallenge, NewDrink,
    NewEvent, NewMatchUpdate, Profile, ProfileUpdate, Round, Team, Tournament, Trophy, UserRole,
};

/// PostgREST-backed store, the real thing. Holds a bare HTTP client; all
/// state lives on the other side.
pub struct SupabaseStore {
    client: Postgrest,
    tournament_id: Uuid,
}

impl SupabaseStore {
    /// Reads SUPABASE_URL and SUPABASE_KEY, the same pair every deploy
    /// of this app has carried around.
    pub fn from_env() -> Result<Self, StoreError> {
        let url = env::var("SUPABASE_URL").map_err(|_| StoreError::MissingEnv("SUPABASE_URL"))?;
        let key = env::var("SUPABASE_KEY").map_err(|_| StoreError::MissingEnv("SUPABASE_KEY"))?;
        Ok(Self::new(Postgrest::new(url).insert_header("apikey", key)))
    }

    pub fn new(client: Postgrest) -> Self {
        SupabaseStore {
            client,
            tournament_id: SSS_TOURNAMENT_ID,
        }
    }

    fn tournament_filter(&self) -> String {
        self.tournament_id.to_string()
    }
}

async fn rows<T: DeserializeOwned>(builder: Builder) -> Result<Vec<T>, StoreError> {
    let response = builder
        .execute()
        .await
        .map_err(|e| StoreError::Request(e.to_string()))?
        .error_for_status()
        .map_err(|e| StoreError::Request(e.to_string()))?;
    let body = response
        .text()
        .await
        .map_err(|e| StoreError::Request(e.to_string()))?;
    Ok(serde_json::from_str(&body)?)
}

async fn run(builder: Builder) -> Result<(), StoreError> {
    builder
        .execute()
        .await
        .map_err(|e| StoreError::Request(e.to_string()))?
        .error_for_status()
        .map_err(|e| StoreError::Request(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl TournamentStore for SupabaseStore {
    async fn fetch_tournament(&self) -> Result<Tournament, StoreError> {
        let found: Vec<Tournament> = rows(
            self.client
                .from("tournaments")
                .select("*")
                .eq("id", self.tournament_filter()),
        )
        .await?;
        found
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound("tournament"))
    }

    async fn fetch_teams(&self) -> Result<Vec<Team>, StoreError> {
        rows(
            self.client
                .from("teams")
                .select("*")
                .eq("tournament_id", self.tournament_filter())
                .order("name"),
        )
        .await
    }

    async fn fetch_rounds(&self) -> Result<Vec<Round>, StoreError> {
        rows(
            self.client
                .from("rounds")
                .select("*")
                .eq("tournament_id", self.tournament_filter())
                .order("round_order"),
        )
        .await
    }

    async fn fetch_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        rows(self.client.from("profiles").select("*")).await
    }

    async fn fetch_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let found: Vec<Profile> = rows(
            self.client
                .from("profiles")
                .select("*")
                .eq("id", id.to_string()),
        )
        .await?;
        Ok(found.into_iter().next())
    }

    async fn fetch_matches(&self) -> Result<Vec<Match>, StoreError> {
        rows(self.client.from("matches").select("*").order("created_at")).await
    }

    async fn fetch_match(&self, id: Uuid) -> Result<Option<Match>, StoreError> {
        let found: Vec<Match> = rows(
            self.client
                .from("matches")
                .select("*")
                .eq("id", id.to_string()),
        )
        .await?;
        Ok(found.into_iter().next())
    }

    async fn fetch_drinks(&self) -> Result<Vec<Drink>, StoreError> {
        rows(
            self.client
                .from("drinks")
                .select("*")
                .eq("tournament_id", self.tournament_filter()),
        )
        .await
    }

    async fn fetch_recent_drinks(&self, limit: usize) -> Result<Vec<Drink>, StoreError> {
        rows(
            self.client
                .from("drinks")
                .select("*")
                .eq("tournament_id", self.tournament_filter())
                .order("created_at.desc")
                .limit(limit),
        )
        .await
    }

    async fn fetch_challenges(&self) -> Result<Vec<Challenge>, StoreError> {
        rows(
            self.client
                .from("challenges")
                .select("*")
                .eq("tournament_id", self.tournament_filter()),
        )
        .await
    }

    async fn fetch_assignments(&self) -> Result<Vec<ChallengeAssignment>, StoreError> {
        rows(self.client.from("challenge_assignments").select("*")).await
    }

    async fn fetch_checkins(&self) -> Result<Vec<HidalgoCheckin>, StoreError> {
        rows(
            self.client
                .from("hidalgo_checkins")
                .select("*")
                .eq("tournament_id", self.tournament_filter()),
        )
        .await
    }

    async fn fetch_trophies(&self) -> Result<Vec<Trophy>, StoreError> {
        rows(
            self.client
                .from("trophies")
                .select("*")
                .eq("tournament_id", self.tournament_filter()),
        )
        .await
    }

    async fn fetch_events(&self, limit: usize) -> Result<Vec<EventFeed>, StoreError> {
        rows(
            self.client
                .from("events_feed")
                .select("*")
                .eq("tournament_id", self.tournament_filter())
                .order("created_at.desc")
                .limit(limit),
        )
        .await
    }

    async fn insert_drink(&self, drink: NewDrink) -> Result<(), StoreError> {
        run(self
            .client
            .from("drinks")
            .insert(serde_json::to_string(&drink)?))
        .await
    }

    async fn insert_event(&self, event: NewEvent) -> Result<(), StoreError> {
        run(self
            .client
            .from("events_feed")
            .insert(serde_json::to_string(&event)?))
        .await
    }

    async fn insert_challenge(&self, challenge: NewChallenge) -> Result<(), StoreError> {
        run(self
            .client
            .from("challenges")
            .insert(serde_json::to_string(&challenge)?))
        .await
    }

    async fn insert_assignment(&self, assignment: NewAssignment) -> Result<(), StoreError> {
        run(self
            .client
            .from("challenge_assignments")
            .insert(serde_json::to_string(&assignment)?))
        .await
    }

    async fn set_assignment_status(
        &self,
        id: Uuid,
        status: ChallengeStatus,
        validated_by: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let body = serde_json::json!({
            "status": status,
            "validated_by_user_id": validated_by,
            "completed_at": completed_at,
        })
        .to_string();
        run(self
            .client
            .from("challenge_assignments")
            .update(body)
            .eq("id", id.to_string()))
        .await
    }

    async fn update_match_score(
        &self,
        id: Uuid,
        update: MatchScoreUpdate,
    ) -> Result<(), StoreError> {
        run(self
            .client
            .from("matches")
            .update(serde_json::to_string(&update)?)
            .eq("id", id.to_string()))
        .await
    }

    async fn set_match_status(&self, id: Uuid, status: MatchStatus) -> Result<(), StoreError> {
        let body = serde_json::json!({ "status": status }).to_string();
        run(self
            .client
            .from("matches")
            .update(body)
            .eq("id", id.to_string()))
        .await
    }

    async fn update_match_players(
        &self,
        id: Uuid,
        team_a_players: Vec<Uuid>,
        team_b_players: Vec<Uuid>,
    ) -> Result<(), StoreError> {
        let body = serde_json::json!({
            "team_a_players": team_a_players,
            "team_b_players": team_b_players,
        })
        .to_string();
        run(self
            .client
            .from("matches")
            .update(body)
            .eq("id", id.to_string()))
        .await
    }

    async fn insert_match_update(&self, update: NewMatchUpdate) -> Result<(), StoreError> {
        run(self
            .client
            .from("match_updates")
            .insert(serde_json::to_string(&update)?))
        .await
    }

    async fn upsert_checkin(&self, checkin: CheckinUpsert) -> Result<(), StoreError> {
        run(self
            .client
            .from("hidalgo_checkins")
            .upsert(serde_json::to_string(&checkin)?)
            .on_conflict("user_id,for_date"))
        .await
    }

    async fn fill_checkin_validation(
        &self,
        id: Uuid,
        slot: ValidationSlot,
        validator: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut body = serde_json::Map::new();
        body.insert(slot.column().to_string(), serde_json::json!(validator));
        body.insert("updated_at".to_string(), serde_json::json!(at));
        run(self
            .client
            .from("hidalgo_checkins")
            .update(serde_json::Value::Object(body).to_string())
            .eq("id", id.to_string()))
        .await
    }

    async fn award_trophy(
        &self,
        id: Uuid,
        winner_user: Option<Uuid>,
        winner_team: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let body = serde_json::json!({
            "winner_user_id": winner_user,
            "winner_team_id": winner_team,
        })
        .to_string();
        run(self
            .client
            .from("trophies")
            .update(body)
            .eq("id", id.to_string()))
        .await
    }

    async fn set_profile_role(&self, id: Uuid, role: UserRole) -> Result<(), StoreError> {
        let body = serde_json::json!({ "role": role }).to_string();
        run(self
            .client
            .from("profiles")
            .update(body)
            .eq("id", id.to_string()))
        .await
    }

    async fn set_secret_word(&self, id: Uuid, word: &str) -> Result<(), StoreError> {
        let body = serde_json::json!({ "secret_word": word }).to_string();
        run(self
            .client
            .from("profiles")
            .update(body)
            .eq("id", id.to_string()))
        .await
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<(), StoreError> {
        run(self
            .client
            .from("profiles")
            .update(serde_json::to_string(&update)?)
            .eq("id", id.to_string()))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_requires_both_variables() {
        // Runs with whatever the environment has; the error path is the
        // interesting one and the only one we can count on in CI.
        env::remove_var("SUPABASE_URL");
        env::remove_var("SUPABASE_KEY");
        match SupabaseStore::from_env() {
            Err(StoreError::MissingEnv(name)) => assert_eq!(name, "SUPABASE_URL"),
            other => panic!("expected MissingEnv, got {:?}", other.err()),
        }
    }
}
