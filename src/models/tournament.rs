use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: Uuid,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub created_by: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The total_points column is legacy. Standings are recomputed from raw
/// rows on every read, never from this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub name: String,
    pub color: String,
    pub logo_url: Option<String>,
    pub total_points: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundFormat {
    Foursomes,
    Fourball,
    Singles,
    Scramble,
}

impl RoundFormat {
    pub fn label(&self) -> &'static str {
        match self {
            RoundFormat::Foursomes => "Foursomes",
            RoundFormat::Fourball => "Fourball",
            RoundFormat::Singles => "Singles",
            RoundFormat::Scramble => "Scramble",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RoundFormat::Foursomes => "Parejas alternando golpes con una sola bola",
            RoundFormat::Fourball => "Parejas con mejor bola de cada uno",
            RoundFormat::Singles => "Enfrentamientos 1 vs 1",
            RoundFormat::Scramble => {
                "Todos los jugadores del equipo juegan desde la mejor posición"
            }
        }
    }

    /// Singles are scored by strokes; every other format is matchplay-style
    /// and the result is picked by whoever edits the score.
    pub fn is_stroke_play(&self) -> bool {
        matches!(self, RoundFormat::Singles)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub name: String,
    pub round_order: i32,
    pub format: RoundFormat,
    pub date_time: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
