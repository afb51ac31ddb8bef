use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::models::DrinkType;

pub const SSS_TOURNAMENT_ID: Uuid = Uuid::from_u128(0x1);
pub const TEAM_JORGE_ID: Uuid = Uuid::from_u128(0x10);
pub const TEAM_YAGO_ID: Uuid = Uuid::from_u128(0x11);

pub const TEAM_JORGE_NAME: &str = "Pimentonas";
pub const TEAM_YAGO_NAME: &str = "Tabaqueras";
pub const TEAM_JORGE_COLOR: &str = "#DC2626";
pub const TEAM_YAGO_COLOR: &str = "#2563EB";

// Scoring rules. Golf: 1 point per match won, 0.5 per draw. Drinks pay
// per unit according to the type table. Challenges are worth whatever
// points_fun says, 0.5 when the template is missing.
pub const POINTS_PER_MATCH_WIN: f64 = 1.0;
pub const POINTS_PER_MATCH_DRAW: f64 = 0.5;
pub const POINTS_PER_DRINK: f64 = 0.1;
pub const POINTS_PER_CHALLENGE_DEFAULT: f64 = 0.5;

pub const HIDALGO_PENALTY: f64 = 1.0;
// They have until the day after for_date to get both validations in.
pub const HIDALGO_VALIDATION_DEADLINE_DAYS: i64 = 1;

pub fn drink_point_value(drink_type: &DrinkType) -> f64 {
    match drink_type {
        DrinkType::Cerveza => 0.1,
        DrinkType::Chupito => 0.2,
        DrinkType::Copa => 0.5,
        DrinkType::Hidalgo => 0.7,
        DrinkType::Unknown => POINTS_PER_DRINK,
    }
}

// Drinks unlock when the bus leaves Madrid on Friday evening.
pub static DRINKS_UNLOCK_AT: Lazy<DateTime<Utc>> = Lazy::new(|| {
    Utc.with_ymd_and_hms(2026, 10, 30, 17, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
});

// Hidalgo check-ins only make sense for the nights of the weekend
// itself: Friday through Sunday.
pub static HIDALGO_FOR_DATE_FIRST: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(2026, 10, 30).unwrap_or_default());
pub static HIDALGO_FOR_DATE_LAST: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(2026, 11, 1).unwrap_or_default());

// Valdecañas del Tajo, par 72. Both competition days are played here,
// Scramble on Saturday and Singles on Sunday.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoleInfo {
    pub hole: u8,
    pub par: u8,
    /// Handicap index, difficulty ranking 1-18.
    pub stroke_index: u8,
    /// Meters from the yellow tees.
    pub distance: u16,
}

pub const VALDECANAS_HOLES: [HoleInfo; 18] = [
    HoleInfo { hole: 1, par: 5, stroke_index: 17, distance: 466 },
    HoleInfo { hole: 2, par: 3, stroke_index: 3, distance: 207 },
    HoleInfo { hole: 3, par: 5, stroke_index: 11, distance: 500 },
    HoleInfo { hole: 4, par: 4, stroke_index: 5, distance: 382 },
    HoleInfo { hole: 5, par: 4, stroke_index: 9, distance: 369 },
    HoleInfo { hole: 6, par: 4, stroke_index: 15, distance: 364 },
    HoleInfo { hole: 7, par: 4, stroke_index: 13, distance: 383 },
    HoleInfo { hole: 8, par: 3, stroke_index: 7, distance: 178 },
    HoleInfo { hole: 9, par: 4, stroke_index: 1, distance: 414 },
    HoleInfo { hole: 10, par: 4, stroke_index: 4, distance: 382 },
    HoleInfo { hole: 11, par: 5, stroke_index: 10, distance: 471 },
    HoleInfo { hole: 12, par: 5, stroke_index: 2, distance: 516 },
    HoleInfo { hole: 13, par: 4, stroke_index: 19, distance: 309 },
    HoleInfo { hole: 14, par: 4, stroke_index: 14, distance: 325 },
    HoleInfo { hole: 15, par: 3, stroke_index: 6, distance: 202 },
    HoleInfo { hole: 16, par: 4, stroke_index: 8, distance: 375 },
    HoleInfo { hole: 17, par: 3, stroke_index: 16, distance: 134 },
    HoleInfo { hole: 18, par: 4, stroke_index: 12, distance: 342 },
];

pub fn valdecanas_total_par() -> u32 {
    VALDECANAS_HOLES.iter().map(|h| u32::from(h.par)).sum()
}

/// Label for a hole score relative to par.
pub fn score_label(strokes: i32, par: i32) -> String {
    let diff = strokes - par;
    match diff {
        d if d <= -3 => "Albatros".to_string(),
        -2 => "Eagle".to_string(),
        -1 => "Birdie".to_string(),
        0 => "Par".to_string(),
        1 => "Bogey".to_string(),
        2 => "Doble Bogey".to_string(),
        d => format!("+{}", d),
    }
}

/// Matchplay score display, e.g. "AS", "2UP" or "3&2".
pub fn matchplay_score(team_a_up: i32, holes_remaining: i32) -> String {
    if team_a_up == 0 {
        return "AS".to_string();
    }

    let up = team_a_up.abs();

    if holes_remaining == 0 {
        return format!("{}&0", up);
    }

    if up > holes_remaining {
        return format!("{}&{}", up, holes_remaining);
    }

    format!("{}UP", up)
}
