//! Writes the reference data of the `seed` configuration section into the store.
//!
//! Records are matched by their natural key (venue and season name, goal type label, team name
//! within its season, player name within its team, permission key), so applying the same seed
//! twice creates nothing the second time.

use std::collections::HashMap;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::{SeedConfig, SeedSeason},
    dao::{
        models::{
            GoalTypeEntity, PermissionEntity, PlayerEntity, SeasonEntity, TeamEntity, VenueEntity,
        },
        tournament_store::TournamentStore,
        unit_of_work::{StagedWrite, UnitOfWork},
    },
    error::ServiceError,
    state::SharedState,
    tournament::calendar::parse_date,
};

/// Roster size used when a seeded team does not state one.
const DEFAULT_ROSTER_SIZE: u16 = 11;

/// Number of records created per kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    /// Venues created.
    pub venues: usize,
    /// Goal types created.
    pub goal_types: usize,
    /// Seasons created.
    pub seasons: usize,
    /// Teams created.
    pub teams: usize,
    /// Players created.
    pub players: usize,
    /// Permissions created.
    pub permissions: usize,
}

impl SeedReport {
    /// Records created across every kind.
    pub fn created(&self) -> usize {
        self.venues + self.goal_types + self.seasons + self.teams + self.players + self.permissions
    }
}

/// Apply the configured seed, if any, to the installed store.
pub async fn apply_seed(state: &SharedState) -> Result<SeedReport, ServiceError> {
    let Some(seed) = state.config().seed.as_ref() else {
        debug!("no seed configured");
        return Ok(SeedReport::default());
    };
    let store = state.require_store().await?;

    let mut unit = UnitOfWork::begin(store.clone());
    let report = stage_seed(store.as_ref(), seed, &mut unit).await?;
    unit.commit()
        .await
        .map_err(|err| ServiceError::from(err.source))?;
    Ok(report)
}

async fn stage_seed(
    store: &dyn TournamentStore,
    seed: &SeedConfig,
    unit: &mut UnitOfWork,
) -> Result<SeedReport, ServiceError> {
    let mut report = SeedReport::default();

    let mut venue_ids: HashMap<String, Uuid> = store
        .list_venues()
        .await?
        .into_iter()
        .map(|venue| (venue.name, venue.id))
        .collect();
    for venue in &seed.venues {
        if venue_ids.contains_key(&venue.name) {
            continue;
        }
        let entity = VenueEntity {
            id: Uuid::new_v4(),
            name: venue.name.clone(),
            location: venue.location.clone(),
        };
        venue_ids.insert(entity.name.clone(), entity.id);
        unit.stage(StagedWrite::SaveVenue(entity));
        report.venues += 1;
    }

    let mut labels: Vec<String> = store
        .list_goal_types()
        .await?
        .into_iter()
        .map(|goal_type| goal_type.label)
        .collect();
    for label in &seed.goal_types {
        if labels.contains(label) {
            continue;
        }
        labels.push(label.clone());
        unit.stage(StagedWrite::SaveGoalType(GoalTypeEntity {
            id: Uuid::new_v4(),
            label: label.clone(),
        }));
        report.goal_types += 1;
    }

    let seasons = store.list_seasons().await?;
    for season in &seed.seasons {
        let existing = seasons.iter().find(|known| known.name == season.name);
        let season_id = match existing {
            Some(known) => known.id,
            None => {
                let entity = season_entity(season)?;
                let id = entity.id;
                unit.stage(StagedWrite::SaveSeason(entity));
                report.seasons += 1;
                id
            }
        };
        stage_teams(store, season, season_id, &venue_ids, unit, &mut report).await?;
    }

    for permission in &seed.permissions {
        if store
            .find_permission_by_key(permission.key.clone())
            .await?
            .is_some()
        {
            continue;
        }
        unit.stage(StagedWrite::SavePermission(PermissionEntity {
            id: Uuid::new_v4(),
            key: permission.key.clone(),
            name: permission.name.clone(),
            module: permission.module.clone(),
            description: permission.description.clone(),
        }));
        report.permissions += 1;
    }

    Ok(report)
}

fn season_entity(season: &SeedSeason) -> Result<SeasonEntity, ServiceError> {
    let starts_on = parse_date(&season.starts_on).map_err(|err| {
        ServiceError::InvalidInput(format!(
            "season `{}` has an invalid start date `{}`: {err}",
            season.name, season.starts_on
        ))
    })?;
    let ends_on = parse_date(&season.ends_on).map_err(|err| {
        ServiceError::InvalidInput(format!(
            "season `{}` has an invalid end date `{}`: {err}",
            season.name, season.ends_on
        ))
    })?;
    if ends_on < starts_on {
        return Err(ServiceError::InvalidInput(format!(
            "season `{}` ends before it starts",
            season.name
        )));
    }

    Ok(SeasonEntity {
        id: Uuid::new_v4(),
        name: season.name.clone(),
        starts_on,
        ends_on,
    })
}

async fn stage_teams(
    store: &dyn TournamentStore,
    season: &SeedSeason,
    season_id: Uuid,
    venue_ids: &HashMap<String, Uuid>,
    unit: &mut UnitOfWork,
    report: &mut SeedReport,
) -> Result<(), ServiceError> {
    let teams = store.list_teams(season_id).await?;

    for team in &season.teams {
        let existing = teams.iter().find(|known| known.name == team.name);
        let (team_id, known_players): (Uuid, Vec<String>) = match existing {
            Some(known) => {
                let players = store.list_players(known.id).await?;
                (known.id, players.into_iter().map(|player| player.name).collect())
            }
            None => {
                let home_venue_id = team.home_venue.as_ref().and_then(|name| {
                    let id = venue_ids.get(name).copied();
                    if id.is_none() {
                        warn!(team = %team.name, venue = %name, "unknown home venue in seed");
                    }
                    id
                });
                let entity = TeamEntity {
                    id: Uuid::new_v4(),
                    season_id,
                    name: team.name.clone(),
                    home_venue_id,
                    roster_size: team.roster_size.unwrap_or(DEFAULT_ROSTER_SIZE),
                };
                let id = entity.id;
                unit.stage(StagedWrite::SaveTeam(entity));
                report.teams += 1;
                (id, Vec::new())
            }
        };

        for player in &team.players {
            if known_players.contains(&player.name) {
                continue;
            }
            let born_on = match player.born_on.as_deref() {
                Some(raw) => Some(parse_date(raw).map_err(|err| {
                    ServiceError::InvalidInput(format!(
                        "player `{}` has an invalid birth date `{raw}`: {err}",
                        player.name
                    ))
                })?),
                None => None,
            };
            unit.stage(StagedWrite::SavePlayer(PlayerEntity {
                id: Uuid::new_v4(),
                team_id,
                name: player.name.clone(),
                born_on,
                kind: player.kind.clone(),
                note: player.note.clone(),
            }));
            report.players += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::tournament_store::{MemoryStore, Page},
        state::AppState,
    };

    const SEED: &str = r#"{
        "seed": {
            "venues": [{ "name": "North Field", "location": "North" }, { "name": "Riverside" }],
            "goal_types": ["header", "penalty"],
            "seasons": [{
                "name": "Spring",
                "starts_on": "2025-04-01",
                "ends_on": "2025-06-30",
                "teams": [
                    { "name": "Rovers", "home_venue": "North Field",
                      "players": [{ "name": "Kim", "born_on": "2001-02-03" }, { "name": "Lee" }] },
                    { "name": "United", "roster_size": 15 }
                ]
            }],
            "permissions": [{ "key": "schedule.create", "name": "Create schedules" }]
        }
    }"#;

    #[tokio::test]
    async fn seeding_twice_creates_records_once() {
        let config = AppConfig::from_json(SEED).unwrap();
        let state = AppState::new(config);
        let store = MemoryStore::new();
        state.install_store(Arc::new(store.clone())).await;

        let first = apply_seed(&state).await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                venues: 2,
                goal_types: 2,
                seasons: 1,
                teams: 2,
                players: 2,
                permissions: 1,
            }
        );

        let second = apply_seed(&state).await.unwrap();
        assert_eq!(second.created(), 0);

        let seasons = store.list_seasons().await.unwrap();
        assert_eq!(seasons.len(), 1);
        let teams = store.list_teams(seasons[0].id).await.unwrap();
        assert_eq!(teams.len(), 2);
        assert!(teams[0].home_venue_id.is_some());
        assert_eq!(teams[1].roster_size, 15);
        assert_eq!(
            TournamentStore::list_permissions(&store, Page::default())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn invalid_season_dates_are_rejected() {
        let config = AppConfig::from_json(
            r#"{ "seed": { "seasons": [{ "name": "Bad", "starts_on": "2025-13-01", "ends_on": "2025-06-30" }] } }"#,
        )
        .unwrap();
        let state = AppState::new(config);
        state.install_store(Arc::new(MemoryStore::new())).await;

        let err = apply_seed(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
