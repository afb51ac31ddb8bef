use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    InProgress,
    Completed,
}

impl MatchStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "Pendiente",
            MatchStatus::InProgress => "En juego",
            MatchStatus::Completed => "Finalizado",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    TeamAWin,
    TeamBWin,
    Draw,
    InProgress,
}

impl MatchResult {
    /// Label seen from team A's side.
    pub fn label(&self) -> &'static str {
        match self {
            MatchResult::TeamAWin => "Victoria",
            MatchResult::TeamBWin => "Derrota",
            MatchResult::Draw => "Empate",
            MatchResult::InProgress => "En juego",
        }
    }
}

/// One pairing inside a round. Points only count toward the standings
/// once status reaches completed; result is trusted as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub round_id: Uuid,
    pub team_a_players: Vec<Uuid>,
    pub team_b_players: Vec<Uuid>,
    pub team_a_id: Option<Uuid>,
    pub team_b_id: Option<Uuid>,
    pub status: MatchStatus,
    pub result: MatchResult,
    pub score_display: String,
    pub holes_played: i32,
    pub points_value: f64,
    pub team_a_points: f64,
    pub team_b_points: f64,
    pub team_a_strokes: i32,
    pub team_b_strokes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn involves_team(&self, team_id: Uuid) -> bool {
        self.team_a_id == Some(team_id) || self.team_b_id == Some(team_id)
    }
}

/// Audit row written alongside every score save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchUpdate {
    pub id: Uuid,
    pub match_id: Uuid,
    pub updated_by: Uuid,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMatchUpdate {
    pub match_id: Uuid,
    pub updated_by: Uuid,
    pub payload: serde_json::Value,
}

/// Full column set written by a score save. Built by the score editor,
/// never assembled by hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchScoreUpdate {
    pub status: MatchStatus,
    pub score_display: String,
    pub holes_played: i32,
    pub result: MatchResult,
    pub team_a_points: f64,
    pub team_b_points: f64,
    pub team_a_strokes: i32,
    pub team_b_strokes: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_result_wire_format() {
        let status: MatchStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, MatchStatus::InProgress);
        assert_eq!(
            serde_json::to_string(&MatchResult::TeamAWin).unwrap(),
            "\"team_a_win\""
        );
        let result: MatchResult = serde_json::from_str("\"draw\"").unwrap();
        assert_eq!(result, MatchResult::Draw);
    }

    #[test]
    fn test_involves_team_handles_unassigned_sides() {
        let team = Uuid::new_v4();
        let other = Uuid::new_v4();
        let row = Match {
            id: Uuid::new_v4(),
            round_id: Uuid::new_v4(),
            team_a_players: vec![],
            team_b_players: vec![],
            team_a_id: None,
            team_b_id: Some(team),
            status: MatchStatus::Pending,
            result: MatchResult::InProgress,
            score_display: String::new(),
            holes_played: 0,
            points_value: 1.0,
            team_a_points: 0.0,
            team_b_points: 0.0,
            team_a_strokes: 0,
            team_b_strokes: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(row.involves_team(team));
        assert!(!row.involves_team(other));
    }
}
