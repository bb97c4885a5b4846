//! Scheduling and advancement rules, independent of storage and HTTP.

/// Winner resolution between consecutive rounds.
pub mod advancement;
/// Text forms of dates, clocks and timestamps.
pub mod calendar;
mod error;
/// Shared kickoff drawing.
pub mod kickoff;
mod round;
/// Random pairing of a round.
pub mod scheduler;
mod score;
/// League table from recorded results.
pub mod standings;

pub use self::advancement::{AdvancementRules, winners_of_round};
pub use self::error::ScheduleError;
pub use self::kickoff::{KickoffRules, random_kickoff};
pub use self::round::RoundTag;
pub use self::scheduler::generate_round;
pub use self::score::{MAX_GOALS, Outcome, Score, ScoreParseError, Side, UNPLAYED_SCORE};
pub use self::standings::{StandingRow, compute_standings};
