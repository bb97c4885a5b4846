//! Parsing of the persisted `"<home>:<away>"` result strings.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Score stored on a match that has not been played yet.
pub const UNPLAYED_SCORE: &str = "0";

const DELIMITER: char = ':';

/// Highest goal count one side can record.
pub const MAX_GOALS: u32 = u16::MAX as u32;

/// Which side of a fixture a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Team listed first.
    Home,
    /// Team listed second.
    Away,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => f.write_str("home"),
            Side::Away => f.write_str("away"),
        }
    }
}

/// Reasons a stored score string cannot be read as a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreParseError {
    /// No `:` separates the sides.
    #[error("missing `:` between home and away goals")]
    MissingDelimiter,
    /// One side has no digits.
    #[error("{0} goals are empty")]
    EmptySide(Side),
    /// One side is not a goal count.
    #[error("{side} goals `{value}` are not a number up to {MAX_GOALS}")]
    InvalidGoals { side: Side, value: String },
}

/// Outcome of a finished match, seen from the home side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Home scored more.
    HomeWin,
    /// Away scored more.
    AwayWin,
    /// Both scored the same.
    Draw,
}

/// Goals scored by each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    /// Goals of the home side.
    pub home: u32,
    /// Goals of the away side.
    pub away: u32,
}

impl Score {
    /// Score from goal counts.
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    /// Who won, if anyone.
    pub fn outcome(&self) -> Outcome {
        match self.home.cmp(&self.away) {
            std::cmp::Ordering::Greater => Outcome::HomeWin,
            std::cmp::Ordering::Less => Outcome::AwayWin,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    /// Goals scored by `side` and conceded by the other side.
    pub fn for_side(&self, side: Side) -> (u32, u32) {
        match side {
            Side::Home => (self.home, self.away),
            Side::Away => (self.away, self.home),
        }
    }
}

impl FromStr for Score {
    type Err = ScoreParseError;

    /// Split positionally on the first delimiter; anything else after it makes the away side
    /// invalid.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (home, away) = raw
            .split_once(DELIMITER)
            .ok_or(ScoreParseError::MissingDelimiter)?;
        Ok(Self {
            home: parse_goals(home, Side::Home)?,
            away: parse_goals(away, Side::Away)?,
        })
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{DELIMITER}{}", self.home, self.away)
    }
}

fn parse_goals(value: &str, side: Side) -> Result<u32, ScoreParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ScoreParseError::EmptySide(side));
    }
    trimmed
        .parse::<u32>()
        .ok()
        .filter(|goals| *goals <= MAX_GOALS)
        .ok_or_else(|| ScoreParseError::InvalidGoals {
            side,
            value: trimmed.to_owned(),
        })
}
