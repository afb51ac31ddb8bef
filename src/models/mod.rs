pub mod matches;
pub mod social;
pub mod tournament;
pub mod users;

pub use matches::{Match, MatchResult, MatchScoreUpdate, MatchStatus, MatchUpdate, NewMatchUpdate};
pub use social::{
    Challenge, ChallengeAssignment, ChallengeStatus, ChallengeType, CheckinUpsert, Drink,
    DrinkType, EventFeed, EventType, HidalgoCheckin, NewAssignment, NewChallenge, NewDrink,
    NewEvent, Trophy,
};
pub use tournament::{Round, RoundFormat, Team, Tournament};
pub use users::{Profile, ProfileUpdate, UserRole};
