//! Explicit staging of writes, committed or discarded by the caller.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dao::{
    models::{
        GoalTypeEntity, MatchEntity, PermissionEntity, PlayerEntity, SeasonEntity, TeamEntity,
        UserEntity, VenueEntity,
    },
    storage::{StorageError, StorageResult},
    tournament_store::TournamentStore,
};

/// One pending write.
#[derive(Debug, Clone)]
pub enum StagedWrite {
    /// Store a newly generated match.
    InsertMatch(MatchEntity),
    /// Upsert a team.
    SaveTeam(TeamEntity),
    /// Upsert a player.
    SavePlayer(PlayerEntity),
    /// Upsert a venue.
    SaveVenue(VenueEntity),
    /// Upsert a season.
    SaveSeason(SeasonEntity),
    /// Upsert a goal type.
    SaveGoalType(GoalTypeEntity),
    /// Upsert a permission.
    SavePermission(PermissionEntity),
    /// Remove a role by id.
    DeleteRole(Uuid),
    /// Upsert a user.
    SaveUser(UserEntity),
}

impl StagedWrite {
    fn label(&self) -> &'static str {
        match self {
            StagedWrite::InsertMatch(_) => "insert_match",
            StagedWrite::SaveTeam(_) => "save_team",
            StagedWrite::SavePlayer(_) => "save_player",
            StagedWrite::SaveVenue(_) => "save_venue",
            StagedWrite::SaveSeason(_) => "save_season",
            StagedWrite::SaveGoalType(_) => "save_goal_type",
            StagedWrite::SavePermission(_) => "save_permission",
            StagedWrite::DeleteRole(_) => "delete_role",
            StagedWrite::SaveUser(_) => "save_user",
        }
    }

    async fn apply(self, store: &dyn TournamentStore) -> StorageResult<()> {
        match self {
            StagedWrite::InsertMatch(fixture) => store.insert_match(fixture).await,
            StagedWrite::SaveTeam(team) => store.save_team(team).await,
            StagedWrite::SavePlayer(player) => store.save_player(player).await,
            StagedWrite::SaveVenue(venue) => store.save_venue(venue).await,
            StagedWrite::SaveSeason(season) => store.save_season(season).await,
            StagedWrite::SaveGoalType(goal_type) => store.save_goal_type(goal_type).await,
            StagedWrite::SavePermission(permission) => store.save_permission(permission).await,
            StagedWrite::DeleteRole(id) => store.delete_role(id).await.map(|_| ()),
            StagedWrite::SaveUser(user) => store.save_user(user).await,
        }
    }
}

/// A staged write failed; the writes before it stay persisted.
#[derive(Debug, Error)]
#[error("commit stopped after {applied} of {total} write(s)")]
pub struct CommitError {
    /// Writes that reached the store before the failure.
    pub applied: usize,
    /// Writes staged in the unit.
    pub total: usize,
    /// Error of the failing write.
    #[source]
    pub source: StorageError,
}

/// Writes collected against one store and applied in staging order.
///
/// The backends have no transactions, so a commit that fails midway is not undone. Dropping an
/// uncommitted unit of work discards everything it staged.
#[must_use = "staged writes are lost unless the unit of work is committed"]
pub struct UnitOfWork {
    store: Arc<dyn TournamentStore>,
    staged: Vec<StagedWrite>,
}

impl UnitOfWork {
    /// Start an empty unit against `store`.
    pub fn begin(store: Arc<dyn TournamentStore>) -> Self {
        Self {
            store,
            staged: Vec::new(),
        }
    }

    /// Queue a write; nothing reaches the store before commit.
    pub fn stage(&mut self, write: StagedWrite) {
        self.staged.push(write);
    }

    /// Writes staged so far.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Apply every staged write in order and return how many were applied.
    pub async fn commit(self) -> Result<usize, CommitError> {
        let total = self.staged.len();
        for (applied, write) in self.staged.into_iter().enumerate() {
            let label = write.label();
            if let Err(source) = write.apply(self.store.as_ref()).await {
                warn!(
                    write = label,
                    applied,
                    total,
                    error = %source,
                    "unit of work commit interrupted"
                );
                return Err(CommitError {
                    applied,
                    total,
                    source,
                });
            }
        }
        debug!(total, "unit of work committed");
        Ok(total)
    }

    /// Discard the staged writes and return how many were dropped.
    pub fn rollback(self) -> usize {
        let discarded = self.staged.len();
        debug!(discarded, "unit of work rolled back");
        discarded
    }
}

#[cfg(test)]
mod tests {
    use time::{OffsetDateTime, macros::date};

    use super::*;
    use crate::{
        dao::tournament_store::{MatchFilter, MemoryStore},
        tournament::RoundTag,
    };

    fn fixture(season_id: Uuid) -> MatchEntity {
        MatchEntity::scheduled(
            season_id,
            RoundTag::GroupStage,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            OffsetDateTime::UNIX_EPOCH,
            OffsetDateTime::UNIX_EPOCH,
        )
    }

    #[tokio::test]
    async fn commit_applies_in_order() {
        let store = MemoryStore::new();
        let season = SeasonEntity {
            id: Uuid::new_v4(),
            name: "Autumn".into(),
            starts_on: date!(2024 - 09 - 01),
            ends_on: date!(2024 - 12 - 01),
        };
        let mut unit = UnitOfWork::begin(Arc::new(store.clone()));
        unit.stage(StagedWrite::SaveSeason(season.clone()));
        unit.stage(StagedWrite::InsertMatch(fixture(season.id)));
        unit.stage(StagedWrite::InsertMatch(fixture(season.id)));
        assert_eq!(unit.len(), 3);

        assert_eq!(unit.commit().await.unwrap(), 3);
        assert_eq!(store.find_season(season.id).await.unwrap(), Some(season.clone()));
        let stored = store
            .list_matches(MatchFilter::season(season.id))
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn failed_write_keeps_earlier_ones() {
        let store = MemoryStore::new();
        store.fail_match_inserts_after(1);
        let season_id = Uuid::new_v4();

        let mut unit = UnitOfWork::begin(Arc::new(store.clone()));
        unit.stage(StagedWrite::InsertMatch(fixture(season_id)));
        unit.stage(StagedWrite::InsertMatch(fixture(season_id)));
        unit.stage(StagedWrite::InsertMatch(fixture(season_id)));

        let err = unit.commit().await.unwrap_err();
        assert_eq!((err.applied, err.total), (1, 3));
        let stored = store.list_matches(MatchFilter::season(season_id)).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_everything() {
        let store = MemoryStore::new();
        let season_id = Uuid::new_v4();
        let mut unit = UnitOfWork::begin(Arc::new(store.clone()));
        unit.stage(StagedWrite::InsertMatch(fixture(season_id)));
        unit.stage(StagedWrite::InsertMatch(fixture(season_id)));

        assert_eq!(unit.rollback(), 2);
        let stored = store.list_matches(MatchFilter::season(season_id)).await.unwrap();
        assert!(stored.is_empty());
    }
}
