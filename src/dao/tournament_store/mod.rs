//! Storage trait for tournament data and its backends.

mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    dao::{
        models::{
            GoalEntity, GoalTypeEntity, MatchEntity, PermissionEntity, PlayerEntity, RoleEntity,
            SeasonEntity, TeamEntity, UserEntity, VenueEntity,
        },
        storage::StorageResult,
    },
    tournament::RoundTag,
};

pub use self::memory::{InjectedFailure, MemoryStore};

/// Default number of records returned by paginated listings.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Offset/limit window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Records skipped before the window.
    pub offset: usize,
    /// Maximum records returned.
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    /// Window from optional query values, falling back to the first page.
    pub fn new(offset: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        }
    }
}

/// Restricts a match listing to a season and optionally one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchFilter {
    /// Only matches of this season.
    pub season_id: Option<Uuid>,
    /// Only matches of this round.
    pub round: Option<RoundTag>,
}

impl MatchFilter {
    /// Every match of one season.
    pub fn season(season_id: Uuid) -> Self {
        Self {
            season_id: Some(season_id),
            round: None,
        }
    }

    /// Narrow to one round.
    pub fn with_round(mut self, round: RoundTag) -> Self {
        self.round = Some(round);
        self
    }

    /// Whether `fixture` passes the filter.
    pub fn matches(&self, fixture: &MatchEntity) -> bool {
        self.season_id.is_none_or(|id| fixture.season_id == id)
            && self.round.is_none_or(|round| fixture.round == round)
    }
}

/// Abstraction over the persistence layer for tournament data.
///
/// Listings return records in insertion order. Saves are upserts; `insert_*` fails on an existing
/// id. Unique keys (team name, permission key, user email and username) are enforced by the
/// backend and reported as [`StorageError::Duplicate`](crate::dao::storage::StorageError).
pub trait TournamentStore: Send + Sync {
    /// Insert or replace a team; its name is unique.
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a team by id.
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Teams registered for a season.
    fn list_teams(&self, season_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;

    /// Insert or replace a player.
    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a player by id.
    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Players on a team.
    fn list_players(&self, team_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;

    /// Insert or replace a venue.
    fn save_venue(&self, venue: VenueEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Every registered venue.
    fn list_venues(&self) -> BoxFuture<'static, StorageResult<Vec<VenueEntity>>>;

    /// Insert or replace a season.
    fn save_season(&self, season: SeasonEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a season by id.
    fn find_season(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SeasonEntity>>>;
    /// Every season.
    fn list_seasons(&self) -> BoxFuture<'static, StorageResult<Vec<SeasonEntity>>>;

    /// Insert or replace a goal type.
    fn save_goal_type(&self, goal_type: GoalTypeEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a goal type by id.
    fn find_goal_type(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GoalTypeEntity>>>;
    /// Every goal type.
    fn list_goal_types(&self) -> BoxFuture<'static, StorageResult<Vec<GoalTypeEntity>>>;

    /// Store a new match; an existing id is a duplicate.
    fn insert_match(&self, fixture: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Rewrite an existing match.
    fn save_match(&self, fixture: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a match by id.
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    /// Matches passing `filter`, in insertion order.
    fn list_matches(
        &self,
        filter: MatchFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;

    /// Store a new goal.
    fn insert_goal(&self, goal: GoalEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Goals of one match, or every goal.
    fn list_goals(
        &self,
        match_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<GoalEntity>>>;

    /// Insert or replace a permission; its key is unique.
    fn save_permission(&self, permission: PermissionEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a permission by id.
    fn find_permission(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PermissionEntity>>>;
    /// Look up a permission by key.
    fn find_permission_by_key(
        &self,
        key: String,
    ) -> BoxFuture<'static, StorageResult<Option<PermissionEntity>>>;
    /// One page of permissions.
    fn list_permissions(
        &self,
        page: Page,
    ) -> BoxFuture<'static, StorageResult<Vec<PermissionEntity>>>;

    /// Insert or replace a role.
    fn save_role(&self, role: RoleEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a role by id.
    fn find_role(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoleEntity>>>;
    /// One page of roles.
    fn list_roles(&self, page: Page) -> BoxFuture<'static, StorageResult<Vec<RoleEntity>>>;
    /// Remove a role; `false` when it did not exist.
    fn delete_role(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert or replace a user; email and username are unique.
    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a user by id.
    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Look up a user by normalized email.
    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Look up a user by username.
    fn find_user_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// One page of users.
    fn list_users(&self, page: Page) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>>;

    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
