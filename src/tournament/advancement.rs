use indexmap::IndexSet;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::models::MatchEntity,
    tournament::{Outcome, RoundTag, ScheduleError, Score},
};

/// Knobs controlling how winners are read out of a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdvancementRules {
    /// A drawn match sends the away team through instead of failing.
    pub tie_credits_away: bool,
    /// Leave out teams that already play in the target round.
    pub skip_already_scheduled: bool,
    /// Seconds after kickoff before a match counts as concluded.
    pub concluded_after_secs: u32,
}

impl Default for AdvancementRules {
    fn default() -> Self {
        Self {
            tie_credits_away: true,
            skip_already_scheduled: true,
            concluded_after_secs: 100,
        }
    }
}

/// Teams advancing into `round`, in the order their matches were created.
///
/// `season_matches` holds every match of one season; only the concluded matches of the round
/// before `round` are read. Any unreadable score fails the whole resolution.
pub fn winners_of_round(
    round: RoundTag,
    season_matches: &[MatchEntity],
    now: OffsetDateTime,
    rules: &AdvancementRules,
) -> Result<Vec<Uuid>, ScheduleError> {
    let previous = round
        .previous()
        .ok_or(ScheduleError::NoPreviousRound(round))?;
    let threshold = now - Duration::seconds(i64::from(rules.concluded_after_secs));

    let mut winners = IndexSet::new();
    for fixture in season_matches
        .iter()
        .filter(|fixture| fixture.round == previous && fixture.kickoff_at < threshold)
    {
        let score: Score =
            fixture
                .score
                .parse()
                .map_err(|source| ScheduleError::MalformedScore {
                    match_id: fixture.id,
                    score: fixture.score.clone(),
                    source,
                })?;

        let winner = match score.outcome() {
            Outcome::HomeWin => fixture.home_team_id,
            Outcome::AwayWin => fixture.away_team_id,
            Outcome::Draw if rules.tie_credits_away => fixture.away_team_id,
            Outcome::Draw => {
                return Err(ScheduleError::UnresolvedTie {
                    match_id: fixture.id,
                });
            }
        };
        winners.insert(winner);
    }

    if rules.skip_already_scheduled {
        let before = winners.len();
        winners.retain(|team_id| {
            !season_matches
                .iter()
                .any(|fixture| fixture.round == round && fixture.involves(*team_id))
        });
        if winners.len() != before {
            warn!(
                round = %round,
                skipped = before - winners.len(),
                "winners already scheduled in the target round were left out"
            );
        }
    }

    debug!(round = %round, from = %previous, winners = winners.len(), "winners resolved");
    Ok(winners.into_iter().collect())
}
