//! DTOs of the match, goal and standings endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::GoalEntity,
    dto::{
        schedule::MatchView,
        validation::{validate_clock, validate_score, validate_timestamp},
    },
    tournament::{RoundTag, StandingRow, calendar::format_clock},
};

/// Filters of the match listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MatchListQuery {
    /// Only matches of this season.
    pub season_id: Option<Uuid>,
    /// Only matches of this round.
    pub round: Option<RoundTag>,
}

/// Match with the goals recorded for it.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchDetail {
    /// The match itself.
    #[serde(flatten)]
    pub fixture: MatchView,
    /// Goals recorded for the match.
    pub goals: Vec<GoalView>,
}

/// Fields of a match that can be changed after scheduling. Unknown fields are rejected.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct MatchUpdate {
    /// `"<home>:<away>"`, or `"0"` to clear the result.
    #[validate(custom(function = "validate_score"))]
    pub score: Option<String>,
    /// RFC 3339 kickoff.
    #[validate(custom(function = "validate_timestamp"))]
    pub kickoff_at: Option<String>,
    /// Venue to move the match to.
    pub venue_id: Option<Uuid>,
}

/// Goal as exposed over the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct GoalView {
    /// Goal identifier.
    pub id: Uuid,
    /// Match the goal was scored in.
    pub match_id: Uuid,
    /// Scorer.
    pub player_id: Uuid,
    /// Team credited with the goal.
    pub team_id: Uuid,
    /// Kind of goal.
    pub goal_type_id: Uuid,
    /// Match clock, `HH:MM:SS`.
    pub scored_at: String,
}

impl From<GoalEntity> for GoalView {
    fn from(value: GoalEntity) -> Self {
        Self {
            id: value.id,
            match_id: value.match_id,
            player_id: value.player_id,
            team_id: value.team_id,
            goal_type_id: value.goal_type_id,
            scored_at: format_clock(value.scored_at),
        }
    }
}

/// Payload recording a goal.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct RecordGoalRequest {
    /// Match the goal was scored in.
    pub match_id: Uuid,
    /// Scorer; must be on `team_id`.
    pub player_id: Uuid,
    /// One of the two teams of the match.
    pub team_id: Uuid,
    /// Registered goal type.
    pub goal_type_id: Uuid,
    /// Match clock, `HH:MM:SS`.
    #[validate(custom(function = "validate_clock"))]
    pub scored_at: String,
}

/// Filter of the goal listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GoalListQuery {
    /// Only goals of this match.
    pub match_id: Option<Uuid>,
}

/// One line of a season table.
#[derive(Debug, Serialize, ToSchema)]
pub struct StandingView {
    /// 1-based rank.
    pub position: usize,
    /// Ranked team.
    pub team_id: Uuid,
    /// Team display name.
    pub team_name: String,
    /// Matches with a recorded result.
    pub played: u32,
    /// Matches won.
    pub wins: u32,
    /// Matches drawn.
    pub draws: u32,
    /// Matches lost.
    pub losses: u32,
    /// Goals scored.
    pub goals_for: u32,
    /// Goals conceded.
    pub goals_against: u32,
    /// `goals_for - goals_against`.
    pub goal_difference: i64,
    /// 3 per win, 1 per draw.
    pub points: u32,
}

impl StandingView {
    /// Line for `row` at `position` in the table.
    pub fn ranked(position: usize, row: StandingRow) -> Self {
        Self {
            position,
            goal_difference: row.goal_difference(),
            team_id: row.team_id,
            team_name: row.team_name,
            played: row.played,
            wins: row.wins,
            draws: row.draws,
            losses: row.losses,
            goals_for: row.goals_for,
            goals_against: row.goals_against,
            points: row.points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_update_rejects_unknown_fields() {
        let err = serde_json::from_str::<MatchUpdate>(r#"{"score": "1:0", "home_team_id": null}"#)
            .unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn match_update_validates_score() {
        let update: MatchUpdate = serde_json::from_str(r#"{"score": "1-0"}"#).unwrap();
        assert!(update.validate().is_err());
        let update: MatchUpdate = serde_json::from_str(r#"{"score": "1:0"}"#).unwrap();
        assert!(update.validate().is_ok());
    }
}
