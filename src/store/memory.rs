use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use super::{StoreError, TournamentStore};
use crate::hidalgo::ValidationSlot;
use crate::models::{
    Challenge, ChallengeAssignment, ChallengeStatus, CheckinUpsert, Drink, EventFeed,
    HidalgoCheckin, Match, MatchScoreUpdate, MatchStatus, MatchUpdate, NewAssignment,
    NewChallenge, NewDrink, NewEvent, NewMatchUpdate, Profile, ProfileUpdate, Round, Team,
    Tournament, Trophy, UserRole,
};
use crate::realtime::{ChangeHub, ChangeKind, TableChange, WatchedTable};

/// In-memory backend for tests and offline demos. Writes mirror the
/// row shapes the live backend produces and feed the same change hub
/// the realtime channel would, so everything downstream behaves the
/// same against either store.
pub struct MemoryStore {
    tournaments: DashMap<Uuid, Tournament>,
    teams: DashMap<Uuid, Team>,
    rounds: DashMap<Uuid, Round>,
    profiles: DashMap<Uuid, Profile>,
    matches: DashMap<Uuid, Match>,
    match_updates: DashMap<Uuid, MatchUpdate>,
    drinks: DashMap<Uuid, Drink>,
    challenges: DashMap<Uuid, Challenge>,
    assignments: DashMap<Uuid, ChallengeAssignment>,
    checkins: DashMap<Uuid, HidalgoCheckin>,
    trophies: DashMap<Uuid, Trophy>,
    events: DashMap<Uuid, EventFeed>,
    hub: ChangeHub,
    offline: AtomicBool,
}

fn rows_of<T: Clone>(map: &DashMap<Uuid, T>) -> Vec<T> {
    map.iter().map(|entry| entry.value().clone()).collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            tournaments: DashMap::new(),
            teams: DashMap::new(),
            rounds: DashMap::new(),
            profiles: DashMap::new(),
            matches: DashMap::new(),
            match_updates: DashMap::new(),
            drinks: DashMap::new(),
            challenges: DashMap::new(),
            assignments: DashMap::new(),
            checkins: DashMap::new(),
            trophies: DashMap::new(),
            events: DashMap::new(),
            hub: ChangeHub::new(),
            offline: AtomicBool::new(false),
        }
    }

    /// The hub every write reports into. Hand a clone to whatever wants
    /// to react to changes.
    pub fn change_hub(&self) -> ChangeHub {
        self.hub.clone()
    }

    /// While offline every read and write fails with a request error,
    /// which is how backend outages reach the callers.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Request("store offline".to_string()));
        }
        Ok(())
    }

    fn publish<T: Serialize>(&self, table: WatchedTable, kind: ChangeKind, row: &T) {
        self.hub.publish(TableChange {
            table,
            kind,
            row: serde_json::to_value(row).unwrap_or_default(),
        });
    }

    // Seeds load fixture rows without emitting changes.

    pub fn seed_tournament(&self, tournament: Tournament) {
        self.tournaments.insert(tournament.id, tournament);
    }

    pub fn seed_team(&self, team: Team) {
        self.teams.insert(team.id, team);
    }

    pub fn seed_round(&self, round: Round) {
        self.rounds.insert(round.id, round);
    }

    pub fn seed_profile(&self, profile: Profile) {
        self.profiles.insert(profile.id, profile);
    }

    pub fn seed_match(&self, game: Match) {
        self.matches.insert(game.id, game);
    }

    pub fn seed_drink(&self, drink: Drink) {
        self.drinks.insert(drink.id, drink);
    }

    pub fn seed_challenge(&self, challenge: Challenge) {
        self.challenges.insert(challenge.id, challenge);
    }

    pub fn seed_assignment(&self, assignment: ChallengeAssignment) {
        self.assignments.insert(assignment.id, assignment);
    }

    pub fn seed_checkin(&self, checkin: HidalgoCheckin) {
        self.checkins.insert(checkin.id, checkin);
    }

    pub fn seed_trophy(&self, trophy: Trophy) {
        self.trophies.insert(trophy.id, trophy);
    }

    /// Audit rows recorded for one match, oldest first.
    pub fn match_updates_for(&self, match_id: Uuid) -> Vec<MatchUpdate> {
        let mut rows: Vec<MatchUpdate> = self
            .match_updates
            .iter()
            .filter(|entry| entry.value().match_id == match_id)
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        rows
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn fetch_tournament(&self) -> Result<Tournament, StoreError> {
        self.guard()?;
        self.tournaments
            .iter()
            .next()
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound("tournament"))
    }

    async fn fetch_teams(&self) -> Result<Vec<Team>, StoreError> {
        self.guard()?;
        let mut rows = rows_of(&self.teams);
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn fetch_rounds(&self) -> Result<Vec<Round>, StoreError> {
        self.guard()?;
        let mut rows = rows_of(&self.rounds);
        rows.sort_by_key(|row| row.round_order);
        Ok(rows)
    }

    async fn fetch_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        self.guard()?;
        // Map iteration order is arbitrary; pin one down.
        let mut rows = rows_of(&self.profiles);
        rows.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(rows)
    }

    async fn fetch_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.guard()?;
        Ok(self.profiles.get(&id).map(|entry| entry.value().clone()))
    }

    async fn fetch_matches(&self) -> Result<Vec<Match>, StoreError> {
        self.guard()?;
        let mut rows = rows_of(&self.matches);
        rows.sort_by_key(|row| (row.created_at, row.id));
        Ok(rows)
    }

    async fn fetch_match(&self, id: Uuid) -> Result<Option<Match>, StoreError> {
        self.guard()?;
        Ok(self.matches.get(&id).map(|entry| entry.value().clone()))
    }

    async fn fetch_drinks(&self) -> Result<Vec<Drink>, StoreError> {
        self.guard()?;
        let mut rows = rows_of(&self.drinks);
        rows.sort_by_key(|row| (row.created_at, row.id));
        Ok(rows)
    }

    async fn fetch_recent_drinks(&self, limit: usize) -> Result<Vec<Drink>, StoreError> {
        self.guard()?;
        let mut rows = rows_of(&self.drinks);
        rows.sort_by_key(|row| (row.created_at, row.id));
        rows.reverse();
        rows.truncate(limit);
        Ok(rows)
    }

    async fn fetch_challenges(&self) -> Result<Vec<Challenge>, StoreError> {
        self.guard()?;
        let mut rows = rows_of(&self.challenges);
        rows.sort_by_key(|row| (row.created_at, row.id));
        Ok(rows)
    }

    async fn fetch_assignments(&self) -> Result<Vec<ChallengeAssignment>, StoreError> {
        self.guard()?;
        let mut rows = rows_of(&self.assignments);
        rows.sort_by_key(|row| (row.created_at, row.id));
        Ok(rows)
    }

    async fn fetch_checkins(&self) -> Result<Vec<HidalgoCheckin>, StoreError> {
        self.guard()?;
        let mut rows = rows_of(&self.checkins);
        rows.sort_by_key(|row| (row.for_date, row.user_id));
        Ok(rows)
    }

    async fn fetch_trophies(&self) -> Result<Vec<Trophy>, StoreError> {
        self.guard()?;
        let mut rows = rows_of(&self.trophies);
        rows.sort_by_key(|row| (row.created_at, row.id));
        Ok(rows)
    }

    async fn fetch_events(&self, limit: usize) -> Result<Vec<EventFeed>, StoreError> {
        self.guard()?;
        let mut rows = rows_of(&self.events);
        rows.sort_by_key(|row| (row.created_at, row.id));
        rows.reverse();
        rows.truncate(limit);
        Ok(rows)
    }

    async fn insert_drink(&self, drink: NewDrink) -> Result<(), StoreError> {
        self.guard()?;
        let row = Drink {
            id: Uuid::new_v4(),
            tournament_id: drink.tournament_id,
            user_id: drink.user_id,
            drink_type: drink.drink_type,
            count: drink.count,
            created_at: Utc::now(),
        };
        self.publish(WatchedTable::Drinks, ChangeKind::Insert, &row);
        self.drinks.insert(row.id, row);
        Ok(())
    }

    async fn insert_event(&self, event: NewEvent) -> Result<(), StoreError> {
        self.guard()?;
        let row = EventFeed {
            id: Uuid::new_v4(),
            tournament_id: event.tournament_id,
            event_type: event.event_type,
            actor_user_id: event.actor_user_id,
            payload: event.payload,
            created_at: Utc::now(),
        };
        self.publish(WatchedTable::EventsFeed, ChangeKind::Insert, &row);
        self.events.insert(row.id, row);
        Ok(())
    }

    async fn insert_challenge(&self, challenge: NewChallenge) -> Result<(), StoreError> {
        self.guard()?;
        let now = Utc::now();
        let row = Challenge {
            id: Uuid::new_v4(),
            tournament_id: challenge.tournament_id,
            title: challenge.title,
            description: challenge.description,
            challenge_type: challenge.challenge_type,
            points_fun: challenge.points_fun,
            penalty_text: challenge.penalty_text,
            is_active: challenge.is_active,
            created_at: now,
            updated_at: now,
        };
        self.challenges.insert(row.id, row);
        Ok(())
    }

    async fn insert_assignment(&self, assignment: NewAssignment) -> Result<(), StoreError> {
        self.guard()?;
        let row = ChallengeAssignment {
            id: Uuid::new_v4(),
            challenge_id: assignment.challenge_id,
            assigned_to_user_id: assignment.assigned_to_user_id,
            assigned_to_team_id: assignment.assigned_to_team_id,
            status: assignment.status,
            validated_by_user_id: None,
            notes: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.publish(WatchedTable::ChallengeAssignments, ChangeKind::Insert, &row);
        self.assignments.insert(row.id, row);
        Ok(())
    }

    async fn set_assignment_status(
        &self,
        id: Uuid,
        status: ChallengeStatus,
        validated_by: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.guard()?;
        let mut row = self
            .assignments
            .get_mut(&id)
            .ok_or(StoreError::NotFound("challenge assignment"))?;
        row.status = status;
        row.validated_by_user_id = Some(validated_by);
        row.completed_at = Some(completed_at);
        self.publish(WatchedTable::ChallengeAssignments, ChangeKind::Update, &*row);
        Ok(())
    }

    async fn update_match_score(
        &self,
        id: Uuid,
        update: MatchScoreUpdate,
    ) -> Result<(), StoreError> {
        self.guard()?;
        let mut row = self
            .matches
            .get_mut(&id)
            .ok_or(StoreError::NotFound("match"))?;
        row.status = update.status;
        row.score_display = update.score_display;
        row.holes_played = update.holes_played;
        row.result = update.result;
        row.team_a_points = update.team_a_points;
        row.team_b_points = update.team_b_points;
        row.team_a_strokes = update.team_a_strokes;
        row.team_b_strokes = update.team_b_strokes;
        row.updated_at = Utc::now();
        self.publish(WatchedTable::Matches, ChangeKind::Update, &*row);
        Ok(())
    }

    async fn set_match_status(&self, id: Uuid, status: MatchStatus) -> Result<(), StoreError> {
        self.guard()?;
        let mut row = self
            .matches
            .get_mut(&id)
            .ok_or(StoreError::NotFound("match"))?;
        row.status = status;
        row.updated_at = Utc::now();
        self.publish(WatchedTable::Matches, ChangeKind::Update, &*row);
        Ok(())
    }

    async fn update_match_players(
        &self,
        id: Uuid,
        team_a_players: Vec<Uuid>,
        team_b_players: Vec<Uuid>,
    ) -> Result<(), StoreError> {
        self.guard()?;
        let mut row = self
            .matches
            .get_mut(&id)
            .ok_or(StoreError::NotFound("match"))?;
        row.team_a_players = team_a_players;
        row.team_b_players = team_b_players;
        row.updated_at = Utc::now();
        self.publish(WatchedTable::Matches, ChangeKind::Update, &*row);
        Ok(())
    }

    async fn insert_match_update(&self, update: NewMatchUpdate) -> Result<(), StoreError> {
        self.guard()?;
        let row = MatchUpdate {
            id: Uuid::new_v4(),
            match_id: update.match_id,
            updated_by: update.updated_by,
            payload: update.payload,
            created_at: Utc::now(),
        };
        self.match_updates.insert(row.id, row);
        Ok(())
    }

    async fn upsert_checkin(&self, checkin: CheckinUpsert) -> Result<(), StoreError> {
        self.guard()?;
        let existing = self
            .checkins
            .iter()
            .find(|entry| {
                let row = entry.value();
                row.user_id == checkin.user_id && row.for_date == checkin.for_date
            })
            .map(|entry| entry.value().id);
        match existing {
            Some(id) => {
                let mut row = self
                    .checkins
                    .get_mut(&id)
                    .ok_or(StoreError::NotFound("hidalgo check-in"))?;
                row.said_yes = checkin.said_yes;
                row.updated_at = checkin.updated_at;
                self.publish(WatchedTable::HidalgoCheckins, ChangeKind::Update, &*row);
            }
            None => {
                let row = HidalgoCheckin {
                    id: Uuid::new_v4(),
                    tournament_id: checkin.tournament_id,
                    user_id: checkin.user_id,
                    for_date: checkin.for_date,
                    said_yes: checkin.said_yes,
                    validated_by_same_team_id: None,
                    validated_by_opposite_team_id: None,
                    created_at: checkin.updated_at,
                    updated_at: checkin.updated_at,
                };
                self.publish(WatchedTable::HidalgoCheckins, ChangeKind::Insert, &row);
                self.checkins.insert(row.id, row);
            }
        }
        Ok(())
    }

    async fn fill_checkin_validation(
        &self,
        id: Uuid,
        slot: ValidationSlot,
        validator: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.guard()?;
        let mut row = self
            .checkins
            .get_mut(&id)
            .ok_or(StoreError::NotFound("hidalgo check-in"))?;
        match slot {
            ValidationSlot::SameTeam => row.validated_by_same_team_id = Some(validator),
            ValidationSlot::OppositeTeam => row.validated_by_opposite_team_id = Some(validator),
        }
        row.updated_at = at;
        self.publish(WatchedTable::HidalgoCheckins, ChangeKind::Update, &*row);
        Ok(())
    }

    async fn award_trophy(
        &self,
        id: Uuid,
        winner_user: Option<Uuid>,
        winner_team: Option<Uuid>,
    ) -> Result<(), StoreError> {
        self.guard()?;
        let mut row = self
            .trophies
            .get_mut(&id)
            .ok_or(StoreError::NotFound("trophy"))?;
        row.winner_user_id = winner_user;
        row.winner_team_id = winner_team;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn set_profile_role(&self, id: Uuid, role: UserRole) -> Result<(), StoreError> {
        self.guard()?;
        let mut row = self
            .profiles
            .get_mut(&id)
            .ok_or(StoreError::NotFound("profile"))?;
        row.role = role;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn set_secret_word(&self, id: Uuid, word: &str) -> Result<(), StoreError> {
        self.guard()?;
        let mut row = self
            .profiles
            .get_mut(&id)
            .ok_or(StoreError::NotFound("profile"))?;
        row.secret_word = Some(word.to_string());
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<(), StoreError> {
        self.guard()?;
        let mut row = self
            .profiles
            .get_mut(&id)
            .ok_or(StoreError::NotFound("profile"))?;
        if let Some(display_name) = update.display_name {
            row.display_name = display_name;
        }
        if let Some(nickname) = update.nickname {
            row.nickname = Some(nickname);
        }
        if let Some(avatar_url) = update.avatar_url {
            row.avatar_url = Some(avatar_url);
        }
        if let Some(bio) = update.bio {
            row.bio = Some(bio);
        }
        if let Some(handicap) = update.handicap {
            row.handicap = Some(handicap);
        }
        row.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SSS_TOURNAMENT_ID;
    use crate::models::DrinkType;
    use chrono::{NaiveDate, TimeZone};
    use tokio::sync::broadcast::error::TryRecvError;

    fn drink_at(hour: u32, minute: u32) -> Drink {
        Drink {
            id: Uuid::new_v4(),
            tournament_id: SSS_TOURNAMENT_ID,
            user_id: Uuid::new_v4(),
            drink_type: DrinkType::Cerveza,
            count: 1,
            created_at: Utc
                .with_ymd_and_hms(2026, 10, 31, hour, minute, 0)
                .single()
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_recent_drinks_come_newest_first_and_capped() {
        let store = MemoryStore::new();
        store.seed_drink(drink_at(20, 0));
        store.seed_drink(drink_at(23, 30));
        store.seed_drink(drink_at(21, 15));

        let recent = store.fetch_recent_drinks(2).await.unwrap();
        assert_eq!(recent.len(), 2, "limit should cap the row count");
        assert!(
            recent[0].created_at > recent[1].created_at,
            "expected newest drink first"
        );
    }

    #[tokio::test]
    async fn test_upsert_checkin_overwrites_same_night() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let for_date = NaiveDate::from_ymd_opt(2026, 10, 30).unwrap();

        let base = CheckinUpsert {
            user_id: user,
            tournament_id: SSS_TOURNAMENT_ID,
            for_date,
            said_yes: true,
            updated_at: Utc::now(),
        };
        store.upsert_checkin(base.clone()).await.unwrap();
        store
            .upsert_checkin(CheckinUpsert {
                said_yes: false,
                ..base
            })
            .await
            .unwrap();

        let rows = store.fetch_checkins().await.unwrap();
        assert_eq!(rows.len(), 1, "second answer should overwrite, not add");
        assert!(!rows[0].said_yes);
    }

    #[tokio::test]
    async fn test_fill_checkin_validation_writes_the_right_slot() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store
            .upsert_checkin(CheckinUpsert {
                user_id: user,
                tournament_id: SSS_TOURNAMENT_ID,
                for_date: NaiveDate::from_ymd_opt(2026, 10, 31).unwrap(),
                said_yes: true,
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        let id = store.fetch_checkins().await.unwrap()[0].id;

        let validator = Uuid::new_v4();
        store
            .fill_checkin_validation(id, ValidationSlot::OppositeTeam, validator, Utc::now())
            .await
            .unwrap();

        let row = store.fetch_checkins().await.unwrap().remove(0);
        assert_eq!(row.validated_by_opposite_team_id, Some(validator));
        assert!(row.validated_by_same_team_id.is_none());

        let missing = store
            .fill_checkin_validation(Uuid::new_v4(), ValidationSlot::SameTeam, validator, Utc::now())
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_offline_store_rejects_reads_and_writes() {
        let store = MemoryStore::new();
        store.set_offline(true);

        assert!(matches!(
            store.fetch_drinks().await,
            Err(StoreError::Request(_))
        ));
        let write = store
            .insert_drink(NewDrink {
                tournament_id: SSS_TOURNAMENT_ID,
                user_id: Uuid::new_v4(),
                drink_type: DrinkType::Copa,
                count: 1,
            })
            .await;
        assert!(matches!(write, Err(StoreError::Request(_))));

        store.set_offline(false);
        assert!(store.fetch_drinks().await.is_ok());
    }

    #[tokio::test]
    async fn test_only_watched_tables_reach_the_hub() {
        let store = MemoryStore::new();
        let mut changes = store.change_hub().subscribe();

        store
            .insert_challenge(NewChallenge {
                tournament_id: SSS_TOURNAMENT_ID,
                title: "Birdie de bar".to_string(),
                description: None,
                challenge_type: crate::models::ChallengeType::Individual,
                points_fun: 0.5,
                penalty_text: None,
                is_active: true,
            })
            .await
            .unwrap();
        assert!(
            matches!(changes.try_recv(), Err(TryRecvError::Empty)),
            "challenge templates are not a watched table"
        );

        store
            .insert_drink(NewDrink {
                tournament_id: SSS_TOURNAMENT_ID,
                user_id: Uuid::new_v4(),
                drink_type: DrinkType::Chupito,
                count: 2,
            })
            .await
            .unwrap();
        let change = changes.try_recv().expect("drink insert should be published");
        assert_eq!(change.table, WatchedTable::Drinks);
        assert_eq!(change.kind, ChangeKind::Insert);
        assert_eq!(change.row["count"], 2);
    }
}
