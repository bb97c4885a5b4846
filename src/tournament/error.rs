//! Failures of round generation.

use thiserror::Error;
use uuid::Uuid;

use crate::{
    dao::{storage::StorageError, unit_of_work::CommitError},
    tournament::{RoundTag, ScoreParseError},
};

/// Reasons a round cannot be scheduled.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Pairing needs an even number of teams.
    #[error("not enough teams to pair: pool of {count} is odd")]
    UnevenPool {
        /// Teams in the pool.
        count: usize,
    },
    /// A non-empty pool cannot be placed anywhere.
    #[error("no venue is registered")]
    NoVenues,
    /// The requested season does not exist.
    #[error("season {0} not found")]
    SeasonNotFound(Uuid),
    /// A concluded match of the previous round carries an unreadable result.
    #[error("match {match_id} has malformed score `{score}`")]
    MalformedScore {
        /// Match carrying the result.
        match_id: Uuid,
        /// Stored result text.
        score: String,
        /// Why the text is unreadable.
        #[source]
        source: ScoreParseError,
    },
    /// A drawn match cannot decide who advances.
    #[error("match {match_id} ended in a draw and ties are not credited")]
    UnresolvedTie {
        /// Drawn match.
        match_id: Uuid,
    },
    /// Advancement was asked for the first round.
    #[error("round {0} has no previous round to advance from")]
    NoPreviousRound(RoundTag),
    /// Persisting the generated matches stopped midway.
    #[error(transparent)]
    Commit(#[from] CommitError),
    /// Reading the season, pool or venues failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
