use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        COUNTERS, GOAL_TYPES, GOALS, MATCHES, MongoGoalDocument, MongoGoalTypeDocument, MongoMatchDocument,
        MongoPermissionDocument, MongoPlayerDocument, MongoRoleDocument, MongoSeasonDocument,
        MongoTeamDocument, MongoUserDocument, MongoVenueDocument, PERMISSIONS, PLAYERS, ROLES,
        SEASONS, TEAMS, USERS, VENUES, doc_id,
    },
};
use crate::dao::{
    models::{
        GoalEntity, GoalTypeEntity, MatchEntity, PermissionEntity, PlayerEntity, RoleEntity,
        SeasonEntity, TeamEntity, UserEntity, VenueEntity,
    },
    storage::StorageResult,
    tournament_store::{MatchFilter, Page, TournamentStore},
};

/// `(collection, field, index name, unique)`
const INDEXES: &[(&str, &str, &str, bool)] = &[
    (TEAMS, "name", "team_name_idx", true),
    (TEAMS, "season_id", "team_season_idx", false),
    (PLAYERS, "team_id", "player_team_idx", false),
    (MATCHES, "season_id", "match_season_idx", false),
    (MATCHES, "seq", "match_seq_idx", false),
    (GOALS, "match_id", "goal_match_idx", false),
    (PERMISSIONS, "key", "permission_key_idx", true),
    (USERS, "email", "user_email_idx", true),
    (USERS, "username", "user_username_idx", true),
];

/// Store keeping each entity kind in its own collection.
#[derive(Clone)]
pub struct MongoTournamentStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

/// What a write is about, for error reporting.
struct WriteTarget {
    collection: &'static str,
    entity: &'static str,
    id: Uuid,
    /// Unique key reported when the write hits a unique index.
    key: Option<String>,
}

impl WriteTarget {
    fn new(collection: &'static str, entity: &'static str, id: Uuid) -> Self {
        Self {
            collection,
            entity,
            id,
            key: None,
        }
    }

    fn keyed(mut self, key: &str) -> Self {
        self.key = Some(key.to_owned());
        self
    }

    fn error(self, source: mongodb::error::Error) -> MongoDaoError {
        if is_duplicate_key(&source) {
            return MongoDaoError::Duplicate {
                entity: self.entity,
                key: self.key.unwrap_or_else(|| self.id.to_string()),
            };
        }
        MongoDaoError::Save {
            collection: self.collection,
            id: self.id,
            source,
        }
    }
}

impl MongoTournamentStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        info!(
            database = %store.inner.config.database_name,
            "MongoDB tournament store ready"
        );
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        for &(collection, field, name, unique) in INDEXES {
            let mut keys = Document::new();
            keys.insert(field, 1);
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(name.to_owned()))
                        .unique(Some(unique))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: field,
                    source,
                })?;
        }
        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<D: Send + Sync>(&self, name: &'static str) -> Collection<D> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<D>(name)
    }

    async fn upsert<D>(&self, target: WriteTarget, document: D) -> MongoResult<()>
    where
        D: Serialize + Send + Sync,
    {
        let collection = self.collection::<D>(target.collection).await;
        match collection
            .replace_one(doc_id(target.id), &document)
            .upsert(true)
            .await
        {
            Ok(_) => Ok(()),
            Err(source) => Err(target.error(source)),
        }
    }

    /// Rewrite the fields of an existing match, creating it when absent.
    async fn save_match_fields(&self, id: Uuid, document: MongoMatchDocument) -> MongoResult<()> {
        let target = WriteTarget::new(MATCHES, "match", id);
        let fields = document.update_fields()?;
        let collection = self.collection::<Document>(MATCHES).await;
        match collection
            .update_one(doc_id(id), doc! { "$set": fields })
            .upsert(true)
            .await
        {
            Ok(_) => Ok(()),
            Err(source) => Err(target.error(source)),
        }
    }

    /// Next value of the `name` counter, starting at 1.
    async fn next_sequence(&self, name: &'static str) -> MongoResult<i64> {
        let counters = self.collection::<Document>(COUNTERS).await;
        let counter = counters
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::Sequence {
                counter: name,
                source,
            })?;
        counter
            .and_then(|document| document.get_i64("seq").ok())
            .ok_or_else(|| MongoDaoError::Decode {
                collection: COUNTERS,
                id: name.to_owned(),
                reason: "counter has no `seq`".into(),
            })
    }

    async fn insert<D>(&self, target: WriteTarget, document: D) -> MongoResult<()>
    where
        D: Serialize + Send + Sync,
    {
        let collection = self.collection::<D>(target.collection).await;
        match collection.insert_one(&document).await {
            Ok(_) => Ok(()),
            Err(source) => Err(target.error(source)),
        }
    }

    async fn load_one<D, E>(&self, name: &'static str, filter: Document) -> MongoResult<Option<E>>
    where
        D: DeserializeOwned + Send + Sync,
        E: TryFrom<D, Error = MongoDaoError>,
    {
        let collection = self.collection::<D>(name).await;
        let label = filter.to_string();
        let document = collection
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: name,
                id: label,
                source,
            })?;
        document.map(E::try_from).transpose()
    }

    async fn load_many<D, E>(
        &self,
        name: &'static str,
        filter: Document,
        sort: Option<Document>,
        page: Option<Page>,
    ) -> MongoResult<Vec<E>>
    where
        D: DeserializeOwned + Unpin + Send + Sync,
        E: TryFrom<D, Error = MongoDaoError>,
    {
        let collection = self.collection::<D>(name).await;
        let mut find = collection.find(filter);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }
        if let Some(page) = page {
            find = find
                .skip(page.offset as u64)
                .limit(i64::try_from(page.limit).unwrap_or(i64::MAX));
        }

        let documents: Vec<D> = find
            .await
            .map_err(|source| MongoDaoError::List {
                collection: name,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                collection: name,
                source,
            })?;

        documents.into_iter().map(E::try_from).collect()
    }

    async fn delete(&self, name: &'static str, id: Uuid) -> MongoResult<bool> {
        let collection = self.collection::<Document>(name).await;
        let result = collection
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: name,
                id,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }
}

/// Insertion order: creation stamp, then the per-insert sequence.
fn match_order() -> Document {
    doc! { "created_at": 1, "seq": 1 }
}

fn match_filter(filter: MatchFilter) -> Document {
    let mut query = Document::new();
    if let Some(season_id) = filter.season_id {
        query.insert("season_id", season_id.to_string());
    }
    if let Some(round) = filter.round {
        query.insert("round", round.as_str());
    }
    query
}

impl TournamentStore for MongoTournamentStore {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let target = WriteTarget::new(TEAMS, "team", team.id).keyed(&team.name);
            store
                .upsert(target, MongoTeamDocument::from(team))
                .await
                .map_err(Into::into)
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_one::<MongoTeamDocument, _>(TEAMS, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_teams(&self, season_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_many::<MongoTeamDocument, _>(
                    TEAMS,
                    doc! { "season_id": season_id.to_string() },
                    None,
                    None,
                )
                .await
                .map_err(Into::into)
        })
    }

    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let target = WriteTarget::new(PLAYERS, "player", player.id);
            store
                .upsert(target, MongoPlayerDocument::from(player))
                .await
                .map_err(Into::into)
        })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_one::<MongoPlayerDocument, _>(PLAYERS, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_players(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_many::<MongoPlayerDocument, _>(
                    PLAYERS,
                    doc! { "team_id": team_id.to_string() },
                    None,
                    None,
                )
                .await
                .map_err(Into::into)
        })
    }

    fn save_venue(&self, venue: VenueEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let target = WriteTarget::new(VENUES, "venue", venue.id);
            store
                .upsert(target, MongoVenueDocument::from(venue))
                .await
                .map_err(Into::into)
        })
    }

    fn list_venues(&self) -> BoxFuture<'static, StorageResult<Vec<VenueEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_many::<MongoVenueDocument, _>(VENUES, doc! {}, None, None)
                .await
                .map_err(Into::into)
        })
    }

    fn save_season(&self, season: SeasonEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let target = WriteTarget::new(SEASONS, "season", season.id);
            store
                .upsert(target, MongoSeasonDocument::from(season))
                .await
                .map_err(Into::into)
        })
    }

    fn find_season(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SeasonEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_one::<MongoSeasonDocument, _>(SEASONS, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_seasons(&self) -> BoxFuture<'static, StorageResult<Vec<SeasonEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_many::<MongoSeasonDocument, _>(SEASONS, doc! {}, None, None)
                .await
                .map_err(Into::into)
        })
    }

    fn save_goal_type(&self, goal_type: GoalTypeEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let target = WriteTarget::new(GOAL_TYPES, "goal type", goal_type.id);
            store
                .upsert(target, MongoGoalTypeDocument::from(goal_type))
                .await
                .map_err(Into::into)
        })
    }

    fn find_goal_type(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GoalTypeEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_one::<MongoGoalTypeDocument, _>(GOAL_TYPES, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_goal_types(&self) -> BoxFuture<'static, StorageResult<Vec<GoalTypeEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_many::<MongoGoalTypeDocument, _>(GOAL_TYPES, doc! {}, None, None)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_match(&self, fixture: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let target = WriteTarget::new(MATCHES, "match", fixture.id);
            let seq = store.next_sequence(MATCHES).await?;
            store
                .insert(target, MongoMatchDocument::from(fixture).with_seq(seq))
                .await
                .map_err(Into::into)
        })
    }

    fn save_match(&self, fixture: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save_match_fields(fixture.id, MongoMatchDocument::from(fixture))
                .await
                .map_err(Into::into)
        })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_one::<MongoMatchDocument, _>(MATCHES, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_matches(
        &self,
        filter: MatchFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_many::<MongoMatchDocument, _>(
                    MATCHES,
                    match_filter(filter),
                    Some(match_order()),
                    None,
                )
                .await
                .map_err(Into::into)
        })
    }

    fn insert_goal(&self, goal: GoalEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let target = WriteTarget::new(GOALS, "goal", goal.id);
            store
                .insert(target, MongoGoalDocument::from(goal))
                .await
                .map_err(Into::into)
        })
    }

    fn list_goals(
        &self,
        match_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<GoalEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = match match_id {
                Some(id) => doc! { "match_id": id.to_string() },
                None => doc! {},
            };
            store
                .load_many::<MongoGoalDocument, _>(GOALS, filter, None, None)
                .await
                .map_err(Into::into)
        })
    }

    fn save_permission(
        &self,
        permission: PermissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let target =
                WriteTarget::new(PERMISSIONS, "permission", permission.id).keyed(&permission.key);
            store
                .upsert(target, MongoPermissionDocument::from(permission))
                .await
                .map_err(Into::into)
        })
    }

    fn find_permission(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PermissionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_one::<MongoPermissionDocument, _>(PERMISSIONS, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_permission_by_key(
        &self,
        key: String,
    ) -> BoxFuture<'static, StorageResult<Option<PermissionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_one::<MongoPermissionDocument, _>(PERMISSIONS, doc! { "key": key })
                .await
                .map_err(Into::into)
        })
    }

    fn list_permissions(
        &self,
        page: Page,
    ) -> BoxFuture<'static, StorageResult<Vec<PermissionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_many::<MongoPermissionDocument, _>(PERMISSIONS, doc! {}, None, Some(page))
                .await
                .map_err(Into::into)
        })
    }

    fn save_role(&self, role: RoleEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let target = WriteTarget::new(ROLES, "role", role.id);
            store
                .upsert(target, MongoRoleDocument::from(role))
                .await
                .map_err(Into::into)
        })
    }

    fn find_role(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoleEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_one::<MongoRoleDocument, _>(ROLES, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_roles(&self, page: Page) -> BoxFuture<'static, StorageResult<Vec<RoleEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_many::<MongoRoleDocument, _>(ROLES, doc! {}, None, Some(page))
                .await
                .map_err(Into::into)
        })
    }

    fn delete_role(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete(ROLES, id).await.map_err(Into::into) })
    }

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let key = format!("{} / {}", user.email, user.username);
            let target = WriteTarget::new(USERS, "user", user.id).keyed(&key);
            store
                .upsert(target, MongoUserDocument::from(user))
                .await
                .map_err(Into::into)
        })
    }

    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_one::<MongoUserDocument, _>(USERS, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_one::<MongoUserDocument, _>(USERS, doc! { "email": email })
                .await
                .map_err(Into::into)
        })
    }

    fn find_user_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_one::<MongoUserDocument, _>(USERS, doc! { "username": username })
                .await
                .map_err(Into::into)
        })
    }

    fn list_users(&self, page: Page) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_many::<MongoUserDocument, _>(USERS, doc! {}, None, Some(page))
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
