//! Document shapes of the MongoDB collections and their entity conversions.

use std::fmt::Display;

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::{
    dao::models::{
        GoalEntity, GoalTypeEntity, MatchEntity, PermissionEntity, PlayerEntity, RoleEntity,
        SeasonEntity, TeamEntity, UserEntity, VenueEntity,
    },
    tournament::{
        RoundTag,
        calendar::{format_clock, format_date, parse_clock, parse_date},
    },
};

pub const TEAMS: &str = "teams";
pub const PLAYERS: &str = "players";
pub const VENUES: &str = "venues";
pub const SEASONS: &str = "seasons";
pub const GOAL_TYPES: &str = "goal_types";
pub const MATCHES: &str = "matches";
pub const GOALS: &str = "goals";
pub const PERMISSIONS: &str = "permissions";
pub const ROLES: &str = "roles";
pub const USERS: &str = "users";
/// Per-collection insertion counters.
pub const COUNTERS: &str = "counters";

/// Filter selecting a document by entity id.
pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

fn decode_error(collection: &'static str, id: &str, reason: impl Display) -> MongoDaoError {
    MongoDaoError::Decode {
        collection,
        id: id.to_owned(),
        reason: reason.to_string(),
    }
}

/// Reads the string references of one document, reporting failures against its id.
struct Decoder<'a> {
    collection: &'static str,
    id: &'a str,
}

impl Decoder<'_> {
    fn uuid(&self, raw: &str) -> MongoResult<Uuid> {
        Uuid::parse_str(raw).map_err(|err| decode_error(self.collection, self.id, err))
    }

    fn uuids(&self, raw: &[String]) -> MongoResult<Vec<Uuid>> {
        raw.iter().map(|value| self.uuid(value)).collect()
    }

    fn timestamp(&self, at: DateTime) -> MongoResult<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(at.timestamp_millis()) * 1_000_000)
            .map_err(|err| decode_error(self.collection, self.id, err))
    }
}

fn to_bson_time(at: OffsetDateTime) -> DateTime {
    DateTime::from_millis((at.unix_timestamp_nanos() / 1_000_000) as i64)
}

fn ids(values: &[Uuid]) -> Vec<String> {
    values.iter().map(Uuid::to_string).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: String,
    season_id: String,
    name: String,
    home_venue_id: Option<String>,
    roster_size: u16,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id.to_string(),
            season_id: value.season_id.to_string(),
            name: value.name,
            home_venue_id: value.home_venue_id.map(|id| id.to_string()),
            roster_size: value.roster_size,
        }
    }
}

impl TryFrom<MongoTeamDocument> for TeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTeamDocument) -> MongoResult<Self> {
        let decoder = Decoder {
            collection: TEAMS,
            id: &value.id,
        };
        Ok(Self {
            id: decoder.uuid(&value.id)?,
            season_id: decoder.uuid(&value.season_id)?,
            home_venue_id: value
                .home_venue_id
                .as_deref()
                .map(|id| decoder.uuid(id))
                .transpose()?,
            name: value.name,
            roster_size: value.roster_size,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    id: String,
    team_id: String,
    name: String,
    born_on: Option<String>,
    kind: String,
    note: String,
}

impl From<PlayerEntity> for MongoPlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id.to_string(),
            team_id: value.team_id.to_string(),
            name: value.name,
            born_on: value.born_on.map(format_date),
            kind: value.kind,
            note: value.note,
        }
    }
}

impl TryFrom<MongoPlayerDocument> for PlayerEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPlayerDocument) -> MongoResult<Self> {
        let decoder = Decoder {
            collection: PLAYERS,
            id: &value.id,
        };
        let born_on = value
            .born_on
            .as_deref()
            .map(parse_date)
            .transpose()
            .map_err(|err| decode_error(PLAYERS, &value.id, err))?;
        Ok(Self {
            id: decoder.uuid(&value.id)?,
            team_id: decoder.uuid(&value.team_id)?,
            born_on,
            name: value.name,
            kind: value.kind,
            note: value.note,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoVenueDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    location: String,
}

impl From<VenueEntity> for MongoVenueDocument {
    fn from(value: VenueEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            location: value.location,
        }
    }
}

impl TryFrom<MongoVenueDocument> for VenueEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoVenueDocument) -> MongoResult<Self> {
        let id = Decoder {
            collection: VENUES,
            id: &value.id,
        }
        .uuid(&value.id)?;
        Ok(Self {
            id,
            name: value.name,
            location: value.location,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSeasonDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    starts_on: String,
    ends_on: String,
}

impl From<SeasonEntity> for MongoSeasonDocument {
    fn from(value: SeasonEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            starts_on: format_date(value.starts_on),
            ends_on: format_date(value.ends_on),
        }
    }
}

impl TryFrom<MongoSeasonDocument> for SeasonEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSeasonDocument) -> MongoResult<Self> {
        let id = Decoder {
            collection: SEASONS,
            id: &value.id,
        }
        .uuid(&value.id)?;
        let date = |raw: &str| parse_date(raw).map_err(|err| decode_error(SEASONS, &value.id, err));
        Ok(Self {
            id,
            starts_on: date(&value.starts_on)?,
            ends_on: date(&value.ends_on)?,
            name: value.name,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGoalTypeDocument {
    #[serde(rename = "_id")]
    id: String,
    label: String,
}

impl From<GoalTypeEntity> for MongoGoalTypeDocument {
    fn from(value: GoalTypeEntity) -> Self {
        Self {
            id: value.id.to_string(),
            label: value.label,
        }
    }
}

impl TryFrom<MongoGoalTypeDocument> for GoalTypeEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGoalTypeDocument) -> MongoResult<Self> {
        let id = Decoder {
            collection: GOAL_TYPES,
            id: &value.id,
        }
        .uuid(&value.id)?;
        Ok(Self {
            id,
            label: value.label,
        })
    }
}

/// Stored form of a match; ids as strings, round by its wire name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: String,
    season_id: String,
    home_team_id: String,
    away_team_id: String,
    venue_id: String,
    round: String,
    kickoff_at: DateTime,
    score: String,
    created_at: DateTime,
    updated_at: DateTime,
    /// Insertion rank; breaks ties between matches of one round sharing `created_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seq: Option<i64>,
}

impl MongoMatchDocument {
    /// Attach the insertion rank assigned by the counter.
    pub fn with_seq(mut self, seq: i64) -> Self {
        self.seq = Some(seq);
        self
    }

    /// Fields rewritten by a save. `_id` and `seq` are left to the stored document.
    pub fn update_fields(&self) -> MongoResult<Document> {
        let mut fields =
            mongodb::bson::serialize_to_document(self).map_err(|err| decode_error(MATCHES, &self.id, err))?;
        fields.remove("_id");
        fields.remove("seq");
        Ok(fields)
    }
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id.to_string(),
            season_id: value.season_id.to_string(),
            home_team_id: value.home_team_id.to_string(),
            away_team_id: value.away_team_id.to_string(),
            venue_id: value.venue_id.to_string(),
            round: value.round.as_str().to_owned(),
            kickoff_at: to_bson_time(value.kickoff_at),
            score: value.score,
            created_at: to_bson_time(value.created_at),
            updated_at: to_bson_time(value.updated_at),
            seq: None,
        }
    }
}

impl TryFrom<MongoMatchDocument> for MatchEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMatchDocument) -> MongoResult<Self> {
        let decoder = Decoder {
            collection: MATCHES,
            id: &value.id,
        };
        let round = RoundTag::from_name(&value.round).ok_or_else(|| {
            decode_error(MATCHES, &value.id, format!("unknown round `{}`", value.round))
        })?;
        Ok(Self {
            id: decoder.uuid(&value.id)?,
            season_id: decoder.uuid(&value.season_id)?,
            home_team_id: decoder.uuid(&value.home_team_id)?,
            away_team_id: decoder.uuid(&value.away_team_id)?,
            venue_id: decoder.uuid(&value.venue_id)?,
            round,
            kickoff_at: decoder.timestamp(value.kickoff_at)?,
            created_at: decoder.timestamp(value.created_at)?,
            updated_at: decoder.timestamp(value.updated_at)?,
            score: value.score,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGoalDocument {
    #[serde(rename = "_id")]
    id: String,
    match_id: String,
    player_id: String,
    team_id: String,
    goal_type_id: String,
    scored_at: String,
}

impl From<GoalEntity> for MongoGoalDocument {
    fn from(value: GoalEntity) -> Self {
        Self {
            id: value.id.to_string(),
            match_id: value.match_id.to_string(),
            player_id: value.player_id.to_string(),
            team_id: value.team_id.to_string(),
            goal_type_id: value.goal_type_id.to_string(),
            scored_at: format_clock(value.scored_at),
        }
    }
}

impl TryFrom<MongoGoalDocument> for GoalEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGoalDocument) -> MongoResult<Self> {
        let decoder = Decoder {
            collection: GOALS,
            id: &value.id,
        };
        Ok(Self {
            id: decoder.uuid(&value.id)?,
            match_id: decoder.uuid(&value.match_id)?,
            player_id: decoder.uuid(&value.player_id)?,
            team_id: decoder.uuid(&value.team_id)?,
            goal_type_id: decoder.uuid(&value.goal_type_id)?,
            scored_at: parse_clock(&value.scored_at)
                .map_err(|err| decode_error(GOALS, &value.id, err))?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPermissionDocument {
    #[serde(rename = "_id")]
    id: String,
    key: String,
    name: String,
    module: String,
    description: String,
}

impl From<PermissionEntity> for MongoPermissionDocument {
    fn from(value: PermissionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            key: value.key,
            name: value.name,
            module: value.module,
            description: value.description,
        }
    }
}

impl TryFrom<MongoPermissionDocument> for PermissionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPermissionDocument) -> MongoResult<Self> {
        let id = Decoder {
            collection: PERMISSIONS,
            id: &value.id,
        }
        .uuid(&value.id)?;
        Ok(Self {
            id,
            key: value.key,
            name: value.name,
            module: value.module,
            description: value.description,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoleDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    description: String,
    permission_ids: Vec<String>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<RoleEntity> for MongoRoleDocument {
    fn from(value: RoleEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            description: value.description,
            permission_ids: ids(&value.permission_ids),
            created_at: to_bson_time(value.created_at),
            updated_at: to_bson_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoRoleDocument> for RoleEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoRoleDocument) -> MongoResult<Self> {
        let decoder = Decoder {
            collection: ROLES,
            id: &value.id,
        };
        Ok(Self {
            id: decoder.uuid(&value.id)?,
            permission_ids: decoder.uuids(&value.permission_ids)?,
            created_at: decoder.timestamp(value.created_at)?,
            updated_at: decoder.timestamp(value.updated_at)?,
            name: value.name,
            description: value.description,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    id: String,
    email: String,
    username: String,
    full_name: String,
    mobile: Option<String>,
    is_active: bool,
    role_ids: Vec<String>,
    permission_ids: Vec<String>,
    created_at: DateTime,
    updated_at: DateTime,
    last_login: Option<DateTime>,
}

impl From<UserEntity> for MongoUserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id.to_string(),
            email: value.email,
            username: value.username,
            full_name: value.full_name,
            mobile: value.mobile,
            is_active: value.is_active,
            role_ids: ids(&value.role_ids),
            permission_ids: ids(&value.permission_ids),
            created_at: to_bson_time(value.created_at),
            updated_at: to_bson_time(value.updated_at),
            last_login: value.last_login.map(to_bson_time),
        }
    }
}

impl TryFrom<MongoUserDocument> for UserEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoUserDocument) -> MongoResult<Self> {
        let decoder = Decoder {
            collection: USERS,
            id: &value.id,
        };
        Ok(Self {
            id: decoder.uuid(&value.id)?,
            role_ids: decoder.uuids(&value.role_ids)?,
            permission_ids: decoder.uuids(&value.permission_ids)?,
            created_at: decoder.timestamp(value.created_at)?,
            updated_at: decoder.timestamp(value.updated_at)?,
            last_login: value
                .last_login
                .map(|at| decoder.timestamp(at))
                .transpose()?,
            email: value.email,
            username: value.username,
            full_name: value.full_name,
            mobile: value.mobile,
            is_active: value.is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;

    #[test]
    fn match_document_keeps_round_and_kickoff() {
        let fixture = MatchEntity::scheduled(
            Uuid::new_v4(),
            RoundTag::Quarterfinal,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            datetime!(2024-04-12 15:00 UTC),
            datetime!(2024-04-01 08:30 UTC),
        );
        let document = MongoMatchDocument::from(fixture.clone());
        assert_eq!(document.round, "quarterfinal");
        assert_eq!(MatchEntity::try_from(document).unwrap(), fixture);
    }

    #[test]
    fn saves_leave_the_insertion_rank_alone() {
        let fixture = MatchEntity::scheduled(
            Uuid::new_v4(),
            RoundTag::GroupStage,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            datetime!(2024-04-12 15:00 UTC),
            datetime!(2024-04-01 08:30 UTC),
        );
        let document = MongoMatchDocument::from(fixture.clone()).with_seq(7);
        let stored = mongodb::bson::serialize_to_document(&document).unwrap();
        assert_eq!(stored.get_i64("seq").unwrap(), 7);

        let fields = document.update_fields().unwrap();
        assert!(!fields.contains_key("_id"));
        assert!(!fields.contains_key("seq"));
        assert_eq!(fields.get_str("score").unwrap(), "0");

        let reloaded: MongoMatchDocument = mongodb::bson::deserialize_from_document(stored).unwrap();
        assert_eq!(reloaded.seq, Some(7));
        assert_eq!(MatchEntity::try_from(reloaded).unwrap(), fixture);
    }

    #[test]
    fn season_dates_are_stored_as_text() {
        let season = SeasonEntity {
            id: Uuid::new_v4(),
            name: "Summer".into(),
            starts_on: date!(2024 - 06 - 01),
            ends_on: date!(2024 - 08 - 31),
        };
        let document = MongoSeasonDocument::from(season.clone());
        assert_eq!(document.starts_on, "2024-06-01");
        assert_eq!(SeasonEntity::try_from(document).unwrap(), season);
    }

    #[test]
    fn corrupted_reference_is_reported() {
        let document = MongoTeamDocument {
            id: Uuid::new_v4().to_string(),
            season_id: "not-a-uuid".into(),
            name: "Rovers".into(),
            home_venue_id: None,
            roster_size: 20,
        };
        assert!(matches!(
            TeamEntity::try_from(document),
            Err(MongoDaoError::Decode {
                collection: TEAMS,
                ..
            })
        ));
    }
}
