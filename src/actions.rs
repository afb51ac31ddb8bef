//! Write-path orchestration: everything a button in the app does ends up
//! as one function here. Each action performs its own permission and
//! state checks, then the store writes plus the feed events that belong
//! together.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::constants::{DRINKS_UNLOCK_AT, SSS_TOURNAMENT_ID};
use crate::hidalgo::{is_past_validation_deadline, slot_for_validator, ValidationSlot};
use crate::models::{
    ChallengeStatus, ChallengeType, CheckinUpsert, DrinkType, EventType, Match, MatchResult,
    MatchScoreUpdate, MatchStatus, NewAssignment, NewChallenge, NewDrink, NewEvent,
    NewMatchUpdate, Profile, Round, UserRole,
};
use crate::store::{StoreError, TournamentStore};

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("solo los administradores pueden hacer esto")]
    AdminRequired,

    #[error("las bebidas aún no están desbloqueadas")]
    DrinksLocked,

    #[error("el título es obligatorio")]
    TitleRequired,

    #[error("selecciona reto y jugador")]
    MissingAssignee,

    #[error("este reto ya está asignado")]
    AlreadyAssigned,

    #[error("selecciona un ganador")]
    MissingWinner,

    #[error("necesitas equipo para validar")]
    InvalidValidator,

    #[error("esa validación ya está hecha")]
    AlreadyValidated,

    #[error("fuera de plazo")]
    DeadlinePassed,

    #[error("no hay hidalgo que validar")]
    NothingPending,

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn require_admin(actor: &Profile) -> Result<(), ActionError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ActionError::AdminRequired)
    }
}

/// What the score editor sends when saving. For stroke-play rounds the
/// result and display text are derived from the strokes and whatever is
/// in `result`/`score_display` is ignored.
#[derive(Debug, Clone)]
pub struct MatchScoreForm {
    pub status: MatchStatus,
    pub result: MatchResult,
    pub score_display: String,
    pub holes_played: i32,
    pub team_a_strokes: i32,
    pub team_b_strokes: i32,
}

/// Turns a form into the full column set written to the match row.
///
/// Stroke play (singles) ignores the picked result: fewer strokes wins,
/// equal strokes is a draw, and the display is always "a - b". Matchplay
/// trusts the picked result. Points flow only on completion; a match
/// with points_value 0 pays out as if it were worth 1.
pub fn build_score_update(round: &Round, game: &Match, form: &MatchScoreForm) -> MatchScoreUpdate {
    let points_value = if game.points_value > 0.0 {
        game.points_value
    } else {
        1.0
    };
    let stroke_play = round.format.is_stroke_play();

    let mut team_a_points = 0.0;
    let mut team_b_points = 0.0;
    let mut result = form.result;
    let mut score_display = form.score_display.clone();

    if stroke_play && form.status == MatchStatus::Completed {
        score_display = format!("{} - {}", form.team_a_strokes, form.team_b_strokes);
        if form.team_a_strokes < form.team_b_strokes {
            result = MatchResult::TeamAWin;
            team_a_points = points_value;
        } else if form.team_b_strokes < form.team_a_strokes {
            result = MatchResult::TeamBWin;
            team_b_points = points_value;
        } else {
            result = MatchResult::Draw;
            team_a_points = points_value / 2.0;
            team_b_points = points_value / 2.0;
        }
    } else if form.status == MatchStatus::Completed {
        match form.result {
            MatchResult::TeamAWin => team_a_points = points_value,
            MatchResult::TeamBWin => team_b_points = points_value,
            MatchResult::Draw => {
                team_a_points = points_value / 2.0;
                team_b_points = points_value / 2.0;
            }
            MatchResult::InProgress => {}
        }
    }

    if stroke_play && form.status == MatchStatus::InProgress {
        score_display = format!("{} - {}", form.team_a_strokes, form.team_b_strokes);
    }

    MatchScoreUpdate {
        status: form.status,
        score_display,
        holes_played: form.holes_played,
        result,
        team_a_points,
        team_b_points,
        team_a_strokes: form.team_a_strokes,
        team_b_strokes: form.team_b_strokes,
    }
}

/// Saves a score edit: the match row, an audit entry, and a feed event
/// (match_completed once the match is over, score_update before that).
pub async fn save_match_score(
    store: &dyn TournamentStore,
    editor: &Profile,
    game: &Match,
    round: &Round,
    form: &MatchScoreForm,
) -> Result<MatchScoreUpdate, ActionError> {
    let update = build_score_update(round, game, form);
    store.update_match_score(game.id, update.clone()).await?;

    store
        .insert_match_update(NewMatchUpdate {
            match_id: game.id,
            updated_by: editor.id,
            payload: json!({
                "score_display": update.score_display,
                "holes_played": update.holes_played,
                "status": update.status,
                "result": update.result,
                "team_a_strokes": update.team_a_strokes,
                "team_b_strokes": update.team_b_strokes,
            }),
        })
        .await?;

    let event_type = if update.status == MatchStatus::Completed {
        EventType::MatchCompleted
    } else {
        EventType::ScoreUpdate
    };
    store
        .insert_event(NewEvent {
            tournament_id: SSS_TOURNAMENT_ID,
            event_type,
            actor_user_id: Some(editor.id),
            payload: Some(json!({
                "match_id": game.id,
                "score": update.score_display,
                "description": round.name,
            })),
        })
        .await?;

    Ok(update)
}

pub async fn start_match(
    store: &dyn TournamentStore,
    starter: &Profile,
    match_id: Uuid,
    round: &Round,
) -> Result<(), ActionError> {
    store
        .set_match_status(match_id, MatchStatus::InProgress)
        .await?;
    store
        .insert_event(NewEvent {
            tournament_id: SSS_TOURNAMENT_ID,
            event_type: EventType::MatchStarted,
            actor_user_id: Some(starter.id),
            payload: Some(json!({
                "match_id": match_id,
                "description": round.name,
            })),
        })
        .await?;
    Ok(())
}

/// Records drinks for the drinker plus the feed event. Locked until the
/// weekend actually starts.
pub async fn log_drink(
    store: &dyn TournamentStore,
    drinker: &Profile,
    drink_type: DrinkType,
    count: i32,
    now: DateTime<Utc>,
) -> Result<(), ActionError> {
    if now < *DRINKS_UNLOCK_AT {
        return Err(ActionError::DrinksLocked);
    }
    store
        .insert_drink(NewDrink {
            tournament_id: SSS_TOURNAMENT_ID,
            user_id: drinker.id,
            drink_type,
            count,
        })
        .await?;
    store
        .insert_event(NewEvent {
            tournament_id: SSS_TOURNAMENT_ID,
            event_type: EventType::Drink,
            actor_user_id: Some(drinker.id),
            payload: Some(json!({ "drink_type": drink_type })),
        })
        .await?;
    Ok(())
}

/// Raw creation form, trimmed on submit like the admin dialog does.
#[derive(Debug, Clone)]
pub struct ChallengeForm {
    pub title: String,
    pub description: String,
    pub challenge_type: ChallengeType,
    pub points_fun: f64,
    pub penalty_text: String,
}

pub async fn create_challenge(
    store: &dyn TournamentStore,
    admin: &Profile,
    form: ChallengeForm,
) -> Result<(), ActionError> {
    require_admin(admin)?;
    let title = form.title.trim();
    if title.is_empty() {
        return Err(ActionError::TitleRequired);
    }
    let description = form.description.trim();
    let penalty_text = form.penalty_text.trim();
    store
        .insert_challenge(NewChallenge {
            tournament_id: SSS_TOURNAMENT_ID,
            title: title.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            challenge_type: form.challenge_type,
            points_fun: form.points_fun,
            penalty_text: (!penalty_text.is_empty()).then(|| penalty_text.to_string()),
            is_active: true,
        })
        .await?;
    Ok(())
}

/// Hands a challenge to a player or a team. A challenge with an open
/// (still assigned) assignment cannot be handed out again; one that was
/// already completed or failed can.
pub async fn assign_challenge(
    store: &dyn TournamentStore,
    admin: &Profile,
    challenge_id: Uuid,
    user: Option<Uuid>,
    team: Option<Uuid>,
) -> Result<(), ActionError> {
    require_admin(admin)?;
    if user.is_none() && team.is_none() {
        return Err(ActionError::MissingAssignee);
    }
    let open_assignment = store.fetch_assignments().await?.into_iter().any(|a| {
        a.challenge_id == challenge_id && a.status == ChallengeStatus::Assigned
    });
    if open_assignment {
        return Err(ActionError::AlreadyAssigned);
    }
    store
        .insert_assignment(NewAssignment {
            challenge_id,
            assigned_to_user_id: user,
            assigned_to_team_id: team,
            status: ChallengeStatus::Assigned,
        })
        .await?;
    Ok(())
}

/// Admin verdict on an assignment. The feed event is attributed to the
/// player who carried the challenge, not to the validating admin.
pub async fn validate_assignment(
    store: &dyn TournamentStore,
    admin: &Profile,
    assignment_id: Uuid,
    success: bool,
    now: DateTime<Utc>,
) -> Result<(), ActionError> {
    require_admin(admin)?;
    let assignment = store
        .fetch_assignments()
        .await?
        .into_iter()
        .find(|a| a.id == assignment_id)
        .ok_or(StoreError::NotFound("challenge assignment"))?;

    let status = if success {
        ChallengeStatus::Completed
    } else {
        ChallengeStatus::Failed
    };
    store
        .set_assignment_status(assignment_id, status, admin.id, now)
        .await?;

    let title = store
        .fetch_challenges()
        .await?
        .into_iter()
        .find(|c| c.id == assignment.challenge_id)
        .map(|c| c.title);
    store
        .insert_event(NewEvent {
            tournament_id: SSS_TOURNAMENT_ID,
            event_type: if success {
                EventType::ChallengeCompleted
            } else {
                EventType::ChallengeFailed
            },
            actor_user_id: assignment.assigned_to_user_id,
            payload: Some(json!({ "title": title })),
        })
        .await?;
    Ok(())
}

pub async fn award_trophy(
    store: &dyn TournamentStore,
    admin: &Profile,
    trophy_id: Uuid,
    winner_user: Option<Uuid>,
    winner_team: Option<Uuid>,
) -> Result<(), ActionError> {
    require_admin(admin)?;
    if winner_user.is_none() && winner_team.is_none() {
        return Err(ActionError::MissingWinner);
    }
    store
        .award_trophy(trophy_id, winner_user, winner_team)
        .await?;

    let title = store
        .fetch_trophies()
        .await?
        .into_iter()
        .find(|t| t.id == trophy_id)
        .map(|t| t.title);
    store
        .insert_event(NewEvent {
            tournament_id: SSS_TOURNAMENT_ID,
            event_type: EventType::TrophyAwarded,
            actor_user_id: winner_user,
            payload: Some(json!({ "title": title })),
        })
        .await?;
    Ok(())
}

pub async fn set_user_role(
    store: &dyn TournamentStore,
    admin: &Profile,
    user_id: Uuid,
    role: UserRole,
) -> Result<(), ActionError> {
    require_admin(admin)?;
    store.set_profile_role(user_id, role).await?;
    Ok(())
}

pub async fn update_match_players(
    store: &dyn TournamentStore,
    admin: &Profile,
    match_id: Uuid,
    team_a_players: Vec<Uuid>,
    team_b_players: Vec<Uuid>,
) -> Result<(), ActionError> {
    require_admin(admin)?;
    store
        .update_match_players(match_id, team_a_players, team_b_players)
        .await?;
    Ok(())
}

/// The morning-after answer, always about yesterday. Answering again
/// overwrites the earlier answer for the same night.
pub async fn submit_hidalgo_answer(
    store: &dyn TournamentStore,
    player: &Profile,
    said_yes: bool,
    today: NaiveDate,
) -> Result<(), ActionError> {
    store
        .upsert_checkin(CheckinUpsert {
            user_id: player.id,
            tournament_id: SSS_TOURNAMENT_ID,
            for_date: today - Duration::days(1),
            said_yes,
            updated_at: Utc::now(),
        })
        .await?;
    Ok(())
}

/// A witness confirms somebody's hidalgo. Which slot gets filled depends
/// on whether the witness shares the confessor's team; each slot is
/// written at most once and only while the deadline is open.
pub async fn validate_hidalgo(
    store: &dyn TournamentStore,
    validator: &Profile,
    checkin_id: Uuid,
    today: NaiveDate,
) -> Result<ValidationSlot, ActionError> {
    let checkin = store
        .fetch_checkins()
        .await?
        .into_iter()
        .find(|c| c.id == checkin_id)
        .ok_or(StoreError::NotFound("hidalgo check-in"))?;

    if !checkin.said_yes {
        return Err(ActionError::NothingPending);
    }
    if is_past_validation_deadline(checkin.for_date, today) {
        return Err(ActionError::DeadlinePassed);
    }

    let owner_team = store
        .fetch_profile(checkin.user_id)
        .await?
        .and_then(|owner| owner.team_id);
    let slot =
        slot_for_validator(owner_team, validator.team_id).ok_or(ActionError::InvalidValidator)?;

    let occupied = match slot {
        ValidationSlot::SameTeam => checkin.validated_by_same_team_id.is_some(),
        ValidationSlot::OppositeTeam => checkin.validated_by_opposite_team_id.is_some(),
    };
    if occupied {
        return Err(ActionError::AlreadyValidated);
    }

    store
        .fill_checkin_validation(checkin_id, slot, validator.id, Utc::now())
        .await?;
    Ok(slot)
}
