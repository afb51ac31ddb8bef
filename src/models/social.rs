use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Drink types with a known point value. Anything else the backend hands
/// us lands on Unknown and scores at the fallback rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrinkType {
    Cerveza,
    Chupito,
    Copa,
    Hidalgo,
    #[serde(other)]
    Unknown,
}

impl DrinkType {
    /// Lenient parse for CLI input.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "cerveza" => DrinkType::Cerveza,
            "chupito" => DrinkType::Chupito,
            "copa" => DrinkType::Copa,
            "hidalgo" => DrinkType::Hidalgo,
            _ => DrinkType::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DrinkType::Cerveza => "Cerveza",
            DrinkType::Chupito => "Chupito",
            DrinkType::Copa => "Copa",
            DrinkType::Hidalgo => "Hidalgo",
            DrinkType::Unknown => "Otra",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            DrinkType::Cerveza => "🍺",
            DrinkType::Chupito => "🥃",
            DrinkType::Copa => "🍸",
            DrinkType::Hidalgo => "🫗",
            DrinkType::Unknown => "🥤",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drink {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub user_id: Uuid,
    pub drink_type: DrinkType,
    pub count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewDrink {
    pub tournament_id: Uuid,
    pub user_id: Uuid,
    pub drink_type: DrinkType,
    pub count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeType {
    Individual,
    Pair,
    Team,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Assigned,
    Completed,
    Failed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub challenge_type: ChallengeType,
    pub points_fun: f64,
    pub penalty_text: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewChallenge {
    pub tournament_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub challenge_type: ChallengeType,
    pub points_fun: f64,
    pub penalty_text: Option<String>,
    pub is_active: bool,
}

/// A challenge handed to a player or to a whole team. Exactly one of the
/// two assigned_to columns is expected to be set, but the scorer tolerates
/// both and attributes the points once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeAssignment {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub assigned_to_user_id: Option<Uuid>,
    pub assigned_to_team_id: Option<Uuid>,
    pub status: ChallengeStatus,
    pub validated_by_user_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAssignment {
    pub challenge_id: Uuid,
    pub assigned_to_user_id: Option<Uuid>,
    pub assigned_to_team_id: Option<Uuid>,
    pub status: ChallengeStatus,
}

/// Morning-after confession row. One per player and night, upserted on
/// (user_id, for_date). Two validator slots, one per side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HidalgoCheckin {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub user_id: Uuid,
    pub for_date: NaiveDate,
    pub said_yes: bool,
    pub validated_by_same_team_id: Option<Uuid>,
    pub validated_by_opposite_team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckinUpsert {
    pub user_id: Uuid,
    pub tournament_id: Uuid,
    pub for_date: NaiveDate,
    pub said_yes: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trophy {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub emoji: String,
    pub winner_user_id: Option<Uuid>,
    pub winner_team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ScoreUpdate,
    Drink,
    ChallengeCompleted,
    ChallengeFailed,
    TrophyAwarded,
    MatchStarted,
    MatchCompleted,
}

impl EventType {
    pub fn label(&self) -> &'static str {
        match self {
            EventType::ScoreUpdate => "Actualización de marcador",
            EventType::Drink => "Bebida registrada",
            EventType::ChallengeCompleted => "Reto completado",
            EventType::ChallengeFailed => "Reto fallido",
            EventType::TrophyAwarded => "Trofeo otorgado",
            EventType::MatchStarted => "Partido iniciado",
            EventType::MatchCompleted => "Partido finalizado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFeed {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub event_type: EventType,
    pub actor_user_id: Option<Uuid>,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewEvent {
    pub tournament_id: Uuid,
    pub event_type: EventType,
    pub actor_user_id: Option<Uuid>,
    pub payload: Option<serde_json::Value>,
}
