//! In-process backend with the same uniqueness rules as the database.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MatchFilter, Page, TournamentStore};
use crate::dao::{
    models::{
        GoalEntity, GoalTypeEntity, MatchEntity, PermissionEntity, PlayerEntity, RoleEntity,
        SeasonEntity, TeamEntity, UserEntity, VenueEntity,
    },
    storage::{StorageError, StorageResult},
};

type Table<T> = RwLock<IndexMap<Uuid, T>>;

const TEAM_NAME: &str = "team";
const PERMISSION_KEY: &str = "permission";
const USER_EMAIL: &str = "user email";
const USER_NAME: &str = "username";
const UNLIMITED: usize = usize::MAX;

/// Error returned by writes that were set up to fail.
#[derive(Debug, Error)]
#[error("injected failure on {operation}")]
pub struct InjectedFailure {
    /// Store method that failed.
    pub operation: &'static str,
}

/// Process-local store, used when no database is configured and by tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    teams: Table<TeamEntity>,
    players: Table<PlayerEntity>,
    venues: Table<VenueEntity>,
    seasons: Table<SeasonEntity>,
    goal_types: Table<GoalTypeEntity>,
    matches: Table<MatchEntity>,
    goals: Table<GoalEntity>,
    permissions: Table<PermissionEntity>,
    roles: Table<RoleEntity>,
    users: Table<UserEntity>,
    unique: UniqueIndex,
    match_insert_budget: InsertBudget,
    venues_offline: AtomicBool,
}

/// Owners of unique keys, scoped per kind of key.
#[derive(Default)]
struct UniqueIndex {
    keys: DashMap<(&'static str, String), Uuid>,
}

impl UniqueIndex {
    fn ensure_free(&self, scope: &'static str, key: &str, owner: Uuid) -> StorageResult<()> {
        match self.keys.get(&(scope, key.to_owned())) {
            Some(existing) if *existing != owner => Err(StorageError::duplicate(scope, key)),
            _ => Ok(()),
        }
    }

    fn assign(&self, scope: &'static str, previous: Option<&str>, key: &str, owner: Uuid) {
        if let Some(previous) = previous.filter(|previous| *previous != key) {
            self.keys.remove(&(scope, previous.to_owned()));
        }
        self.keys.insert((scope, key.to_owned()), owner);
    }
}

/// Number of match inserts allowed before they start failing.
struct InsertBudget(AtomicUsize);

impl Default for InsertBudget {
    fn default() -> Self {
        Self(AtomicUsize::new(UNLIMITED))
    }
}

impl InsertBudget {
    fn take(&self) -> bool {
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                UNLIMITED => Some(UNLIMITED),
                0 => None,
                left => Some(left - 1),
            })
            .is_ok()
    }
}

async fn find<T: Clone>(table: &Table<T>, id: Uuid) -> Option<T> {
    table.read().await.get(&id).cloned()
}

async fn list<T: Clone>(table: &Table<T>, keep: impl Fn(&T) -> bool) -> Vec<T> {
    table
        .read()
        .await
        .values()
        .filter(|value| keep(value))
        .cloned()
        .collect()
}

async fn upsert<T>(table: &Table<T>, id: Uuid, value: T) {
    table.write().await.insert(id, value);
}

async fn page<T: Clone>(table: &Table<T>, page: Page) -> Vec<T> {
    table
        .read()
        .await
        .values()
        .skip(page.offset)
        .take(page.limit)
        .cloned()
        .collect()
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `successful` more match inserts through, then fail every following one.
    pub fn fail_match_inserts_after(&self, successful: usize) {
        self.inner
            .match_insert_budget
            .0
            .store(successful, Ordering::SeqCst);
    }

    /// Make every following venue listing fail as if the backend were unreachable.
    pub fn fail_venue_reads(&self) {
        self.inner.venues_offline.store(true, Ordering::SeqCst);
    }

    async fn save_team(&self, team: TeamEntity) -> StorageResult<()> {
        let mut teams = self.inner.teams.write().await;
        self.inner.unique.ensure_free(TEAM_NAME, &team.name, team.id)?;
        let previous = teams.get(&team.id).map(|existing| existing.name.clone());
        self.inner
            .unique
            .assign(TEAM_NAME, previous.as_deref(), &team.name, team.id);
        teams.insert(team.id, team);
        Ok(())
    }

    async fn insert_match(&self, fixture: MatchEntity) -> StorageResult<()> {
        if !self.inner.match_insert_budget.take() {
            return Err(StorageError::unavailable(
                format!("failed to insert match `{}`", fixture.id),
                InjectedFailure {
                    operation: "insert_match",
                },
            ));
        }
        let mut matches = self.inner.matches.write().await;
        if matches.contains_key(&fixture.id) {
            return Err(StorageError::duplicate("match", fixture.id.to_string()));
        }
        matches.insert(fixture.id, fixture);
        Ok(())
    }

    async fn insert_goal(&self, goal: GoalEntity) -> StorageResult<()> {
        let mut goals = self.inner.goals.write().await;
        if goals.contains_key(&goal.id) {
            return Err(StorageError::duplicate("goal", goal.id.to_string()));
        }
        goals.insert(goal.id, goal);
        Ok(())
    }

    async fn save_permission(&self, permission: PermissionEntity) -> StorageResult<()> {
        let mut permissions = self.inner.permissions.write().await;
        self.inner
            .unique
            .ensure_free(PERMISSION_KEY, &permission.key, permission.id)?;
        let previous = permissions
            .get(&permission.id)
            .map(|existing| existing.key.clone());
        self.inner.unique.assign(
            PERMISSION_KEY,
            previous.as_deref(),
            &permission.key,
            permission.id,
        );
        permissions.insert(permission.id, permission);
        Ok(())
    }

    async fn find_permission_by_key(&self, key: String) -> Option<PermissionEntity> {
        let permissions = self.inner.permissions.read().await;
        permissions
            .values()
            .find(|permission| permission.key == key)
            .cloned()
    }

    async fn delete_role(&self, id: Uuid) -> bool {
        self.inner.roles.write().await.shift_remove(&id).is_some()
    }

    async fn save_user(&self, user: UserEntity) -> StorageResult<()> {
        let mut users = self.inner.users.write().await;
        let unique = &self.inner.unique;
        unique.ensure_free(USER_EMAIL, &user.email, user.id)?;
        unique.ensure_free(USER_NAME, &user.username, user.id)?;

        let previous = users.get(&user.id);
        unique.assign(
            USER_EMAIL,
            previous.map(|existing| existing.email.as_str()),
            &user.email,
            user.id,
        );
        unique.assign(
            USER_NAME,
            previous.map(|existing| existing.username.as_str()),
            &user.username,
            user.id,
        );
        users.insert(user.id, user);
        Ok(())
    }

    async fn find_user_where(&self, predicate: impl Fn(&UserEntity) -> bool) -> Option<UserEntity> {
        let users = self.inner.users.read().await;
        users.values().find(|user| predicate(user)).cloned()
    }
}

impl TournamentStore for MemoryStore {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_team(team).await })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(find(&store.inner.teams, id).await) })
    }

    fn list_teams(&self, season_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(list(&store.inner.teams, |team| team.season_id == season_id).await)
        })
    }

    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            upsert(&store.inner.players, player.id, player).await;
            Ok(())
        })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(find(&store.inner.players, id).await) })
    }

    fn list_players(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(list(&store.inner.players, |player| player.team_id == team_id).await)
        })
    }

    fn save_venue(&self, venue: VenueEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            upsert(&store.inner.venues, venue.id, venue).await;
            Ok(())
        })
    }

    fn list_venues(&self) -> BoxFuture<'static, StorageResult<Vec<VenueEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            if store.inner.venues_offline.load(Ordering::SeqCst) {
                return Err(StorageError::unavailable(
                    "failed to list venues".into(),
                    InjectedFailure {
                        operation: "list_venues",
                    },
                ));
            }
            Ok(list(&store.inner.venues, |_| true).await)
        })
    }

    fn save_season(&self, season: SeasonEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            upsert(&store.inner.seasons, season.id, season).await;
            Ok(())
        })
    }

    fn find_season(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SeasonEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(find(&store.inner.seasons, id).await) })
    }

    fn list_seasons(&self) -> BoxFuture<'static, StorageResult<Vec<SeasonEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(list(&store.inner.seasons, |_| true).await) })
    }

    fn save_goal_type(&self, goal_type: GoalTypeEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            upsert(&store.inner.goal_types, goal_type.id, goal_type).await;
            Ok(())
        })
    }

    fn find_goal_type(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GoalTypeEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(find(&store.inner.goal_types, id).await) })
    }

    fn list_goal_types(&self) -> BoxFuture<'static, StorageResult<Vec<GoalTypeEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(list(&store.inner.goal_types, |_| true).await) })
    }

    fn insert_match(&self, fixture: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_match(fixture).await })
    }

    fn save_match(&self, fixture: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            upsert(&store.inner.matches, fixture.id, fixture).await;
            Ok(())
        })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(find(&store.inner.matches, id).await) })
    }

    fn list_matches(
        &self,
        filter: MatchFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(list(&store.inner.matches, |fixture| filter.matches(fixture)).await) })
    }

    fn insert_goal(&self, goal: GoalEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_goal(goal).await })
    }

    fn list_goals(
        &self,
        match_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<GoalEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(list(&store.inner.goals, |goal| {
                match_id.is_none_or(|id| goal.match_id == id)
            })
            .await)
        })
    }

    fn save_permission(
        &self,
        permission: PermissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_permission(permission).await })
    }

    fn find_permission(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PermissionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(find(&store.inner.permissions, id).await) })
    }

    fn find_permission_by_key(
        &self,
        key: String,
    ) -> BoxFuture<'static, StorageResult<Option<PermissionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_permission_by_key(key).await) })
    }

    fn list_permissions(
        &self,
        page: Page,
    ) -> BoxFuture<'static, StorageResult<Vec<PermissionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(self::page(&store.inner.permissions, page).await) })
    }

    fn save_role(&self, role: RoleEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            upsert(&store.inner.roles, role.id, role).await;
            Ok(())
        })
    }

    fn find_role(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoleEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(find(&store.inner.roles, id).await) })
    }

    fn list_roles(&self, page: Page) -> BoxFuture<'static, StorageResult<Vec<RoleEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(self::page(&store.inner.roles, page).await) })
    }

    fn delete_role(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.delete_role(id).await) })
    }

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_user(user).await })
    }

    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(find(&store.inner.users, id).await) })
    }

    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_user_where(|user| user.email == email).await) })
    }

    fn find_user_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .find_user_where(|user| user.username == username)
                .await)
        })
    }

    fn list_users(&self, page: Page) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(self::page(&store.inner.users, page).await) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use time::{OffsetDateTime, macros::date};

    use super::*;
    use crate::tournament::RoundTag;

    fn team(season_id: Uuid, name: &str) -> TeamEntity {
        TeamEntity {
            id: Uuid::new_v4(),
            season_id,
            name: name.into(),
            home_venue_id: None,
            roster_size: 18,
        }
    }

    fn user(email: &str, username: &str) -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            email: email.into(),
            username: username.into(),
            full_name: "Test User".into(),
            mobile: None,
            is_active: true,
            role_ids: Vec::new(),
            permission_ids: Vec::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            last_login: None,
        }
    }

    #[tokio::test]
    async fn team_names_are_unique() {
        let store = MemoryStore::new();
        let season_id = Uuid::new_v4();
        let mut falcons = team(season_id, "Falcons");
        TournamentStore::save_team(&store, falcons.clone()).await.unwrap();

        let err = TournamentStore::save_team(&store, team(season_id, "Falcons"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { entity: "team", .. }));

        // renaming frees the old name
        falcons.name = "Eagles".into();
        TournamentStore::save_team(&store, falcons.clone()).await.unwrap();
        TournamentStore::save_team(&store, team(season_id, "Falcons"))
            .await
            .unwrap();
        assert_eq!(store.list_teams(season_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn match_round_trip_keeps_fields() {
        let store = MemoryStore::new();
        let season_id = Uuid::new_v4();
        let fixture = MatchEntity::scheduled(
            season_id,
            RoundTag::Semifinal,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            OffsetDateTime::UNIX_EPOCH,
            OffsetDateTime::UNIX_EPOCH,
        );
        TournamentStore::insert_match(&store, fixture.clone())
            .await
            .unwrap();

        let stored = store.find_match(fixture.id).await.unwrap().unwrap();
        assert_eq!(stored, fixture);
        assert_eq!(stored.score, "0");

        let err = TournamentStore::insert_match(&store, fixture.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));

        let semis = store
            .list_matches(MatchFilter::season(season_id).with_round(RoundTag::Semifinal))
            .await
            .unwrap();
        assert_eq!(semis.len(), 1);
        let finals = store
            .list_matches(MatchFilter::season(season_id).with_round(RoundTag::Final))
            .await
            .unwrap();
        assert!(finals.is_empty());
    }

    #[tokio::test]
    async fn injected_failures_kick_in_after_budget() {
        let store = MemoryStore::new();
        store.fail_match_inserts_after(1);
        let fixture = || {
            MatchEntity::scheduled(
                Uuid::nil(),
                RoundTag::GroupStage,
                Uuid::new_v4(),
                Uuid::new_v4(),
                Uuid::new_v4(),
                OffsetDateTime::UNIX_EPOCH,
                OffsetDateTime::UNIX_EPOCH,
            )
        };
        assert!(TournamentStore::insert_match(&store, fixture()).await.is_ok());
        assert!(matches!(
            TournamentStore::insert_match(&store, fixture()).await,
            Err(StorageError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn user_email_and_username_are_unique() {
        let store = MemoryStore::new();
        TournamentStore::save_user(&store, user("ana@club.test", "ana"))
            .await
            .unwrap();

        let same_email = TournamentStore::save_user(&store, user("ana@club.test", "other")).await;
        assert!(matches!(
            same_email,
            Err(StorageError::Duplicate { entity: USER_EMAIL, .. })
        ));
        let same_name = TournamentStore::save_user(&store, user("b@club.test", "ana")).await;
        assert!(matches!(
            same_name,
            Err(StorageError::Duplicate { entity: USER_NAME, .. })
        ));

        let found = store
            .find_user_by_username("ana".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.email, "ana@club.test");
    }

    #[tokio::test]
    async fn listings_page_in_insertion_order() {
        let store = MemoryStore::new();
        for index in 0..5 {
            TournamentStore::save_permission(
                &store,
                PermissionEntity {
                    id: Uuid::new_v4(),
                    key: format!("perm.{index}"),
                    name: format!("Permission {index}"),
                    module: "test".into(),
                    description: String::new(),
                },
            )
            .await
            .unwrap();
        }

        let window = store
            .list_permissions(Page {
                offset: 1,
                limit: 2,
            })
            .await
            .unwrap();
        let keys: Vec<_> = window.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["perm.1", "perm.2"]);
    }

    #[tokio::test]
    async fn seasons_and_players_are_listed() {
        let store = MemoryStore::new();
        let season = SeasonEntity {
            id: Uuid::new_v4(),
            name: "Winter".into(),
            starts_on: date!(2025 - 01 - 01),
            ends_on: date!(2025 - 03 - 01),
        };
        store.save_season(season.clone()).await.unwrap();
        let team_id = Uuid::new_v4();
        store
            .save_player(PlayerEntity {
                id: Uuid::new_v4(),
                team_id,
                name: "Keeper".into(),
                born_on: None,
                kind: "goalkeeper".into(),
                note: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(store.list_seasons().await.unwrap(), vec![season]);
        assert_eq!(store.list_players(team_id).await.unwrap().len(), 1);
        assert!(!TournamentStore::delete_role(&store, Uuid::new_v4()).await.unwrap());
    }
}
