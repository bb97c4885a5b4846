//! Storage-agnostic entities shared by every backend.

use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use crate::tournament::{RoundTag, UNPLAYED_SCORE};

/// Team registered for a season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Season the team is registered for.
    pub season_id: Uuid,
    /// Display name, unique across the whole system.
    pub name: String,
    /// Venue the team usually plays at.
    pub home_venue_id: Option<Uuid>,
    /// Number of players on the roster.
    pub roster_size: u16,
}

/// Player belonging to a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Team the player is on.
    pub team_id: Uuid,
    /// Display name, unique within the team.
    pub name: String,
    /// Date of birth, when known.
    pub born_on: Option<Date>,
    /// Free-form label such as "goalkeeper" or "substitute".
    pub kind: String,
    /// Free-form remarks.
    pub note: String,
}

/// Place where matches are played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueEntity {
    /// Stable identifier for the venue.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Human readable location label (city, address...).
    pub location: String,
}

/// Season bounding the dates on which matches are scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonEntity {
    /// Stable identifier for the season.
    pub id: Uuid,
    /// Display name, e.g. "Spring Cup".
    pub name: String,
    /// First day on which matches can be scheduled.
    pub starts_on: Date,
    /// Last day on which matches can be scheduled.
    pub ends_on: Date,
}

/// Category of goal (header, penalty, own goal...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalTypeEntity {
    /// Stable identifier for the goal type.
    pub id: Uuid,
    /// Display label, unique by convention.
    pub label: String,
}

/// Fixture between two teams of a season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEntity {
    /// Stable identifier for the match.
    pub id: Uuid,
    /// Season the match belongs to.
    pub season_id: Uuid,
    /// Team listed first.
    pub home_team_id: Uuid,
    /// Team listed second; credited on a tie.
    pub away_team_id: Uuid,
    /// Venue hosting the match.
    pub venue_id: Uuid,
    /// Round of the tournament the match was generated for.
    pub round: RoundTag,
    /// Kickoff in UTC (minutes and seconds are always zero for generated matches).
    pub kickoff_at: OffsetDateTime,
    /// Result as `"<home>:<away>"`, or [`UNPLAYED_SCORE`] until one is recorded.
    pub score: String,
    /// When the match was generated. Shared by every match of one round.
    pub created_at: OffsetDateTime,
    /// Last time the match was edited.
    pub updated_at: OffsetDateTime,
}

impl MatchEntity {
    /// Build an unplayed match.
    pub fn scheduled(
        season_id: Uuid,
        round: RoundTag,
        home_team_id: Uuid,
        away_team_id: Uuid,
        venue_id: Uuid,
        kickoff_at: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            season_id,
            home_team_id,
            away_team_id,
            venue_id,
            round,
            kickoff_at,
            score: UNPLAYED_SCORE.to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `team_id` plays in this match, on either side.
    pub fn involves(&self, team_id: Uuid) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }
}

/// Goal scored during a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalEntity {
    /// Stable identifier for the goal.
    pub id: Uuid,
    /// Match the goal was scored in.
    pub match_id: Uuid,
    /// Scorer.
    pub player_id: Uuid,
    /// Team credited with the goal.
    pub team_id: Uuid,
    /// Kind of goal.
    pub goal_type_id: Uuid,
    /// Match clock when the goal was scored.
    pub scored_at: Time,
}

/// Named capability that can be granted to roles and users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionEntity {
    /// Stable identifier for the permission.
    pub id: Uuid,
    /// Unique machine key, e.g. `schedule.create`.
    pub key: String,
    /// Human readable name.
    pub name: String,
    /// Functional area the permission belongs to.
    pub module: String,
    /// Longer explanation shown to administrators.
    pub description: String,
}

/// Bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleEntity {
    /// Stable identifier for the role.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// What the role is meant for.
    pub description: String,
    /// Permissions granted by the role, without duplicates.
    pub permission_ids: Vec<Uuid>,
    /// Creation time.
    pub created_at: OffsetDateTime,
    /// Last modification time.
    pub updated_at: OffsetDateTime,
}

/// Account holding roles and direct permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntity {
    /// Stable identifier for the user.
    pub id: Uuid,
    /// Unique email address.
    pub email: String,
    /// Unique login name.
    pub username: String,
    /// Name shown in listings.
    pub full_name: String,
    /// Optional phone number.
    pub mobile: Option<String>,
    /// Inactive users hold no permission.
    pub is_active: bool,
    /// Roles assigned to the user.
    pub role_ids: Vec<Uuid>,
    /// Permissions granted directly, on top of the ones coming from roles.
    pub permission_ids: Vec<Uuid>,
    /// Creation time.
    pub created_at: OffsetDateTime,
    /// Last modification time.
    pub updated_at: OffsetDateTime,
    /// Last successful login, if any.
    pub last_login: Option<OffsetDateTime>,
}
