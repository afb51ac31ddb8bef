use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::constants::{
    drink_point_value, HIDALGO_PENALTY, POINTS_PER_CHALLENGE_DEFAULT, POINTS_PER_MATCH_DRAW,
    POINTS_PER_MATCH_WIN, TEAM_JORGE_ID, TEAM_JORGE_NAME, TEAM_YAGO_ID, TEAM_YAGO_NAME,
};
use crate::hidalgo::is_past_validation_deadline;
use crate::models::{
    Challenge, ChallengeAssignment, ChallengeStatus, Drink, HidalgoCheckin, Match, MatchResult,
    MatchStatus, Profile,
};

/// Everything the scorer needs, fetched wholesale. Tables are small (ten
/// players, one weekend) so there is no pagination anywhere.
#[derive(Debug, Clone, Default)]
pub struct ScoreSnapshot {
    pub matches: Vec<Match>,
    pub drinks: Vec<Drink>,
    pub challenges: Vec<Challenge>,
    pub assignments: Vec<ChallengeAssignment>,
    pub profiles: Vec<Profile>,
    pub checkins: Vec<HidalgoCheckin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamScoreBreakdown {
    pub team_id: Uuid,
    pub team_name: String,
    pub golf: f64,
    pub drinks: f64,
    pub challenges: f64,
    pub hidalgo_penalty: f64,
    pub total: f64,
    pub matches_won: u32,
    pub matches_drawn: u32,
    pub total_drinks: i64,
    pub challenges_completed: u32,
}

impl TeamScoreBreakdown {
    pub fn empty(team_id: Uuid, team_name: &str) -> Self {
        TeamScoreBreakdown {
            team_id,
            team_name: team_name.to_string(),
            golf: 0.0,
            drinks: 0.0,
            challenges: 0.0,
            hidalgo_penalty: 0.0,
            total: 0.0,
            matches_won: 0,
            matches_drawn: 0,
            total_drinks: 0,
            challenges_completed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamScores {
    pub pimentonas: TeamScoreBreakdown,
    pub tabaqueras: TeamScoreBreakdown,
}

impl TeamScores {
    pub fn empty() -> Self {
        TeamScores {
            pimentonas: TeamScoreBreakdown::empty(TEAM_JORGE_ID, TEAM_JORGE_NAME),
            tabaqueras: TeamScoreBreakdown::empty(TEAM_YAGO_ID, TEAM_YAGO_NAME),
        }
    }

    /// The team currently ahead, None on a tie.
    pub fn leader(&self) -> Option<&TeamScoreBreakdown> {
        if self.pimentonas.total > self.tabaqueras.total {
            Some(&self.pimentonas)
        } else if self.tabaqueras.total > self.pimentonas.total {
            Some(&self.tabaqueras)
        } else {
            None
        }
    }
}

/// Recompute both team totals from scratch. Pure arithmetic, no I/O;
/// `today` anchors the hidalgo deadline check.
pub fn team_scores(snapshot: &ScoreSnapshot, today: NaiveDate) -> TeamScores {
    TeamScores {
        pimentonas: team_breakdown(snapshot, TEAM_JORGE_ID, TEAM_JORGE_NAME, today),
        tabaqueras: team_breakdown(snapshot, TEAM_YAGO_ID, TEAM_YAGO_NAME, today),
    }
}

fn team_breakdown(
    snapshot: &ScoreSnapshot,
    team_id: Uuid,
    team_name: &str,
    today: NaiveDate,
) -> TeamScoreBreakdown {
    let members = team_user_ids(&snapshot.profiles, team_id);

    let golf = golf_points(&snapshot.matches, team_id);
    let drinks = drink_points(&snapshot.drinks, &members);
    let challenges = challenge_points(&snapshot.assignments, &snapshot.challenges, &members, team_id);
    let penalty = hidalgo_penalty(&snapshot.checkins, &members, today);

    let total = golf.points + drinks.points + challenges.points - penalty;

    TeamScoreBreakdown {
        team_id,
        team_name: team_name.to_string(),
        golf: golf.points,
        drinks: drinks.points,
        challenges: challenges.points,
        hidalgo_penalty: penalty,
        total,
        matches_won: golf.won,
        matches_drawn: golf.drawn,
        total_drinks: drinks.count,
        challenges_completed: challenges.count,
    }
}

fn team_user_ids(profiles: &[Profile], team_id: Uuid) -> HashSet<Uuid> {
    profiles
        .iter()
        .filter(|p| p.team_id == Some(team_id))
        .map(|p| p.id)
        .collect()
}

struct GolfTally {
    points: f64,
    won: u32,
    drawn: u32,
}

fn golf_points(matches: &[Match], team_id: Uuid) -> GolfTally {
    let mut tally = GolfTally { points: 0.0, won: 0, drawn: 0 };

    for m in matches {
        if m.status != MatchStatus::Completed {
            continue;
        }

        let is_team_a = m.team_a_id == Some(team_id);
        let is_team_b = m.team_b_id == Some(team_id);

        if !is_team_a && !is_team_b {
            continue;
        }

        if m.result == MatchResult::Draw {
            tally.points += POINTS_PER_MATCH_DRAW;
            tally.drawn += 1;
        } else if (m.result == MatchResult::TeamAWin && is_team_a)
            || (m.result == MatchResult::TeamBWin && is_team_b)
        {
            tally.points += POINTS_PER_MATCH_WIN;
            tally.won += 1;
        }
    }

    tally
}

struct DrinkTally {
    points: f64,
    count: i64,
}

fn drink_points(drinks: &[Drink], members: &HashSet<Uuid>) -> DrinkTally {
    let mut tally = DrinkTally { points: 0.0, count: 0 };

    for drink in drinks {
        if members.contains(&drink.user_id) {
            tally.count += i64::from(drink.count);
            tally.points += f64::from(drink.count) * drink_point_value(&drink.drink_type);
        }
    }

    tally
}

struct ChallengeTally {
    points: f64,
    count: u32,
}

fn challenge_points(
    assignments: &[ChallengeAssignment],
    challenges: &[Challenge],
    members: &HashSet<Uuid>,
    team_id: Uuid,
) -> ChallengeTally {
    let mut tally = ChallengeTally { points: 0.0, count: 0 };

    for assignment in assignments {
        if assignment.status != ChallengeStatus::Completed {
            continue;
        }

        let is_member = assignment
            .assigned_to_user_id
            .map_or(false, |user_id| members.contains(&user_id));
        let is_team_assignment = assignment.assigned_to_team_id == Some(team_id);

        if is_member || is_team_assignment {
            let points = challenges
                .iter()
                .find(|c| c.id == assignment.challenge_id)
                .map(|c| c.points_fun)
                .unwrap_or(POINTS_PER_CHALLENGE_DEFAULT);
            tally.points += points;
            tally.count += 1;
        }
    }

    tally
}

// -1 per said_yes check-in missing a validator slot once the deadline has
// passed. Derived fresh on every call, nothing is persisted.
fn hidalgo_penalty(checkins: &[HidalgoCheckin], members: &HashSet<Uuid>, today: NaiveDate) -> f64 {
    let mut penalty = 0.0;

    for checkin in checkins {
        if !checkin.said_yes {
            continue;
        }
        if !members.contains(&checkin.user_id) {
            continue;
        }
        if checkin.validated_by_same_team_id.is_some()
            && checkin.validated_by_opposite_team_id.is_some()
        {
            continue;
        }
        if !is_past_validation_deadline(checkin.for_date, today) {
            continue;
        }
        penalty += HIDALGO_PENALTY;
    }

    penalty
}
