//! Match browsing, result entry, goals and season standings.

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{models::GoalEntity, tournament_store::MatchFilter},
    dto::{
        matches::{
            GoalView, MatchDetail, MatchListQuery, MatchUpdate, RecordGoalRequest, StandingView,
        },
        schedule::MatchView,
    },
    error::ServiceError,
    state::SharedState,
    tournament::{
        calendar::{parse_clock, parse_timestamp},
        compute_standings,
    },
};

/// Matches passing the season and round filters.
pub async fn list_matches(
    state: &SharedState,
    query: MatchListQuery,
) -> Result<Vec<MatchView>, ServiceError> {
    let store = state.require_store().await?;
    let filter = MatchFilter {
        season_id: query.season_id,
        round: query.round,
    };
    let matches = store.list_matches(filter).await?;
    Ok(matches.into_iter().map(MatchView::from).collect())
}

/// One match with its goals.
pub async fn get_match(state: &SharedState, id: Uuid) -> Result<MatchDetail, ServiceError> {
    let store = state.require_store().await?;
    let Some(fixture) = store.find_match(id).await? else {
        return Err(ServiceError::NotFound(format!("match `{id}` not found")));
    };
    let goals = store.list_goals(Some(id)).await?;

    Ok(MatchDetail {
        fixture: fixture.into(),
        goals: goals.into_iter().map(GoalView::from).collect(),
    })
}

/// Apply the provided fields to a match. Absent fields are left untouched.
pub async fn update_match(
    state: &SharedState,
    id: Uuid,
    update: MatchUpdate,
) -> Result<MatchView, ServiceError> {
    let store = state.require_store().await?;
    let Some(mut fixture) = store.find_match(id).await? else {
        return Err(ServiceError::NotFound(format!("match `{id}` not found")));
    };

    if let Some(venue_id) = update.venue_id {
        let venues = store.list_venues().await?;
        if !venues.iter().any(|venue| venue.id == venue_id) {
            return Err(ServiceError::InvalidInput(format!(
                "venue `{venue_id}` does not exist"
            )));
        }
        fixture.venue_id = venue_id;
    }
    if let Some(raw) = update.kickoff_at {
        fixture.kickoff_at = parse_timestamp(&raw)
            .map_err(|err| ServiceError::InvalidInput(format!("invalid kickoff `{raw}`: {err}")))?;
    }
    if let Some(score) = update.score {
        fixture.score = score;
    }
    fixture.updated_at = OffsetDateTime::now_utc();

    store.save_match(fixture.clone()).await?;
    info!(match_id = %id, score = %fixture.score, "match updated");
    Ok(fixture.into())
}

/// Goals of one match, or every goal.
pub async fn list_goals(
    state: &SharedState,
    match_id: Option<Uuid>,
) -> Result<Vec<GoalView>, ServiceError> {
    let store = state.require_store().await?;
    let goals = store.list_goals(match_id).await?;
    Ok(goals.into_iter().map(GoalView::from).collect())
}

/// Record a goal after checking that every referenced record exists and belongs together.
pub async fn record_goal(
    state: &SharedState,
    request: RecordGoalRequest,
) -> Result<GoalView, ServiceError> {
    let store = state.require_store().await?;

    let Some(fixture) = store.find_match(request.match_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "match `{}` not found",
            request.match_id
        )));
    };
    if !fixture.involves(request.team_id) {
        return Err(ServiceError::InvalidInput(format!(
            "team `{}` does not play match `{}`",
            request.team_id, request.match_id
        )));
    }

    let Some(player) = store.find_player(request.player_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "player `{}` not found",
            request.player_id
        )));
    };
    if player.team_id != request.team_id {
        return Err(ServiceError::InvalidInput(format!(
            "player `{}` is not on team `{}`",
            player.id, request.team_id
        )));
    }

    if store.find_goal_type(request.goal_type_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "goal type `{}` not found",
            request.goal_type_id
        )));
    }

    let scored_at = parse_clock(&request.scored_at).map_err(|err| {
        ServiceError::InvalidInput(format!("invalid clock `{}`: {err}", request.scored_at))
    })?;

    let goal = GoalEntity {
        id: Uuid::new_v4(),
        match_id: request.match_id,
        player_id: request.player_id,
        team_id: request.team_id,
        goal_type_id: request.goal_type_id,
        scored_at,
    };
    store.insert_goal(goal.clone()).await?;
    info!(match_id = %goal.match_id, player_id = %goal.player_id, "goal recorded");
    Ok(goal.into())
}

/// Season table built from the recorded scores.
pub async fn standings(
    state: &SharedState,
    season_id: Uuid,
) -> Result<Vec<StandingView>, ServiceError> {
    let store = state.require_store().await?;
    if store.find_season(season_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("season `{season_id}` not found")));
    }

    let teams = store.list_teams(season_id).await?;
    let matches = store.list_matches(MatchFilter::season(season_id)).await?;

    Ok(compute_standings(&teams, &matches)
        .into_iter()
        .enumerate()
        .map(|(index, row)| StandingView::ranked(index + 1, row))
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::{date, datetime};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{
                GoalTypeEntity, MatchEntity, PlayerEntity, SeasonEntity, TeamEntity, VenueEntity,
            },
            tournament_store::{MemoryStore, TournamentStore},
        },
        state::AppState,
        tournament::RoundTag,
    };

    struct Fixture {
        state: SharedState,
        season_id: Uuid,
        home: Uuid,
        away: Uuid,
        striker: Uuid,
        header: Uuid,
        match_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let season_id = Uuid::new_v4();
        store
            .save_season(SeasonEntity {
                id: season_id,
                name: "Spring".into(),
                starts_on: date!(2025 - 04 - 01),
                ends_on: date!(2025 - 06 - 30),
            })
            .await
            .unwrap();

        let mut team_ids = Vec::new();
        for name in ["Rovers", "United"] {
            let id = Uuid::new_v4();
            TournamentStore::save_team(
                &store,
                TeamEntity {
                    id,
                    season_id,
                    name: name.into(),
                    home_venue_id: None,
                    roster_size: 11,
                },
            )
            .await
            .unwrap();
            team_ids.push(id);
        }

        let striker = Uuid::new_v4();
        store
            .save_player(PlayerEntity {
                id: striker,
                team_id: team_ids[0],
                name: "Kim".into(),
                born_on: None,
                kind: "forward".into(),
                note: String::new(),
            })
            .await
            .unwrap();

        let header = Uuid::new_v4();
        store
            .save_goal_type(GoalTypeEntity {
                id: header,
                label: "header".into(),
            })
            .await
            .unwrap();

        let venue = Uuid::new_v4();
        store
            .save_venue(VenueEntity {
                id: venue,
                name: "North Field".into(),
                location: String::new(),
            })
            .await
            .unwrap();

        let at = datetime!(2025-04-12 15:00 UTC);
        let fixture = MatchEntity::scheduled(
            season_id,
            RoundTag::GroupStage,
            team_ids[0],
            team_ids[1],
            venue,
            at,
            at,
        );
        let match_id = fixture.id;
        TournamentStore::insert_match(&store, fixture).await.unwrap();

        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(store)).await;
        Fixture {
            state,
            season_id,
            home: team_ids[0],
            away: team_ids[1],
            striker,
            header,
            match_id,
        }
    }

    #[tokio::test]
    async fn score_update_feeds_standings() {
        let fx = fixture().await;
        let updated = update_match(
            &fx.state,
            fx.match_id,
            MatchUpdate {
                score: Some("2:1".into()),
                ..MatchUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.score, "2:1");

        let table = standings(&fx.state, fx.season_id).await.unwrap();
        assert_eq!(table[0].team_id, fx.home);
        assert_eq!(table[0].points, 3);
        assert_eq!(table[0].position, 1);
        assert_eq!(table[1].team_id, fx.away);
        assert_eq!(table[1].goal_difference, -1);
    }

    #[tokio::test]
    async fn unknown_venue_is_rejected() {
        let fx = fixture().await;
        let err = update_match(
            &fx.state,
            fx.match_id,
            MatchUpdate {
                venue_id: Some(Uuid::new_v4()),
                ..MatchUpdate::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn goals_are_listed_with_their_match() {
        let fx = fixture().await;
        record_goal(
            &fx.state,
            RecordGoalRequest {
                match_id: fx.match_id,
                player_id: fx.striker,
                team_id: fx.home,
                goal_type_id: fx.header,
                scored_at: "00:42:10".into(),
            },
        )
        .await
        .unwrap();

        let detail = get_match(&fx.state, fx.match_id).await.unwrap();
        assert_eq!(detail.goals.len(), 1);
        assert_eq!(detail.goals[0].scored_at, "00:42:10");
        assert_eq!(list_goals(&fx.state, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn goal_for_a_team_outside_the_match_is_rejected() {
        let fx = fixture().await;
        let err = record_goal(
            &fx.state,
            RecordGoalRequest {
                match_id: fx.match_id,
                player_id: fx.striker,
                team_id: fx.away,
                goal_type_id: fx.header,
                scored_at: "00:10:00".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
