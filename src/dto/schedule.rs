//! DTOs of the schedule endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::MatchEntity,
    tournament::{RoundTag, calendar::format_timestamp},
};

/// Request to generate the matches of one round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateScheduleRequest {
    /// Season to schedule.
    pub season_id: Uuid,
    /// Round to generate.
    pub round: RoundTag,
}

/// Body returned by the schedule endpoint when no match is generated.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleResult {
    /// `Not enough team` for an odd pool, `Failed` otherwise.
    #[serde(rename = "Result")]
    pub result: String,
}

/// Match as exposed over the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchView {
    /// Match identifier.
    pub id: Uuid,
    /// Season of the match.
    pub season_id: Uuid,
    /// Team listed first.
    pub home_team_id: Uuid,
    /// Team listed second.
    pub away_team_id: Uuid,
    /// Hosting venue.
    pub venue_id: Uuid,
    /// Round the match belongs to.
    pub round: RoundTag,
    /// RFC 3339 kickoff in UTC.
    pub kickoff_at: String,
    /// `"<home>:<away>"`, or `"0"` while unplayed.
    pub score: String,
    /// RFC 3339 generation time.
    pub created_at: String,
    /// RFC 3339 modification time.
    pub updated_at: String,
}

impl From<MatchEntity> for MatchView {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id,
            season_id: value.season_id,
            home_team_id: value.home_team_id,
            away_team_id: value.away_team_id,
            venue_id: value.venue_id,
            round: value.round,
            kickoff_at: format_timestamp(value.kickoff_at),
            score: value.score,
            created_at: format_timestamp(value.created_at),
            updated_at: format_timestamp(value.updated_at),
        }
    }
}

/// Query of the season schedule.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleQuery {
    /// Season to describe.
    pub season_id: Uuid,
}

/// Match ids of one round.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundSchedule {
    /// Round tag.
    pub round: RoundTag,
    /// Matches of the round, in insertion order.
    pub match_ids: Vec<Uuid>,
}

/// Season schedule grouped by round, in play order.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleOverview {
    /// Described season.
    pub season_id: Uuid,
    /// Rounds with at least one match.
    pub rounds: Vec<RoundSchedule>,
}
