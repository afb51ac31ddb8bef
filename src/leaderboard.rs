use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Challenge, ChallengeAssignment, ChallengeStatus, Drink, DrinkType};

/// One row of the drinks ranking. Totals are raw drink counts, points are
/// left to the team scorer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrinkStanding {
    pub user_id: Uuid,
    pub total: i64,
    pub breakdown: BTreeMap<DrinkType, i64>,
}

/// Drinks ranked per player, heaviest hitter first. Ties keep the order
/// the rows arrived in.
pub fn drink_leaderboard(drinks: &[Drink]) -> Vec<DrinkStanding> {
    let mut standings: Vec<DrinkStanding> = Vec::new();

    for row in drinks {
        let idx = match standings.iter().position(|s| s.user_id == row.user_id) {
            Some(idx) => idx,
            None => {
                standings.push(DrinkStanding {
                    user_id: row.user_id,
                    total: 0,
                    breakdown: BTreeMap::new(),
                });
                standings.len() - 1
            }
        };
        let entry = &mut standings[idx];
        entry.total += i64::from(row.count);
        *entry.breakdown.entry(row.drink_type).or_insert(0) += i64::from(row.count);
    }

    standings.sort_by(|a, b| b.total.cmp(&a.total));
    standings
}

/// What one player has had so far today, per type. Timestamps are compared
/// on their UTC date, so the day flips at midnight UTC rather than bar time.
pub fn my_drinks_today(drinks: &[Drink], user_id: Uuid, today: NaiveDate) -> BTreeMap<DrinkType, i64> {
    let mut counts = BTreeMap::new();

    for row in drinks {
        if row.user_id != user_id || row.created_at.date_naive() < today {
            continue;
        }
        *counts.entry(row.drink_type).or_insert(0) += i64::from(row.count);
    }

    counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeStanding {
    pub user_id: Uuid,
    pub completed: u32,
    pub points: f64,
}

/// Completed challenges ranked per player. Assignments made to a whole
/// team have no single owner and stay out of this ranking; a completed
/// assignment whose template vanished counts for zero points.
pub fn challenge_leaderboard(
    assignments: &[ChallengeAssignment],
    challenges: &[Challenge],
) -> Vec<ChallengeStanding> {
    let mut standings: Vec<ChallengeStanding> = Vec::new();

    for assignment in assignments {
        if assignment.status != ChallengeStatus::Completed {
            continue;
        }
        let user_id = match assignment.assigned_to_user_id {
            Some(user_id) => user_id,
            None => continue,
        };

        let idx = match standings.iter().position(|s| s.user_id == user_id) {
            Some(idx) => idx,
            None => {
                standings.push(ChallengeStanding { user_id, completed: 0, points: 0.0 });
                standings.len() - 1
            }
        };
        let entry = &mut standings[idx];
        entry.completed += 1;
        entry.points += challenges
            .iter()
            .find(|c| c.id == assignment.challenge_id)
            .map(|c| c.points_fun)
            .unwrap_or(0.0);
    }

    standings.sort_by(|a, b| b.points.total_cmp(&a.points));
    standings
}
