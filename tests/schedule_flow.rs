use std::sync::Arc;

use axum::http::StatusCode;
use indexmap::IndexSet;
use rand::{SeedableRng, rngs::StdRng};
use time::macros::date;
use uuid::Uuid;

use tournament_back::{
    config::AppConfig,
    dao::{
        models::{SeasonEntity, TeamEntity, VenueEntity},
        tournament_store::{MatchFilter, MemoryStore, TournamentStore},
    },
    dto::{
        matches::MatchUpdate,
        schedule::{CreateScheduleRequest, MatchView},
    },
    error::{NOT_ENOUGH_TEAM, ScheduleFailure, ServiceError},
    services::{match_service, schedule_service},
    state::{AppState, SharedState},
    tournament::{RoundTag, ScheduleError},
};

struct League {
    state: SharedState,
    store: MemoryStore,
    season_id: Uuid,
    teams: Vec<Uuid>,
    venues: Vec<Uuid>,
}

/// A finished season, so every generated kickoff lies in the past.
async fn league(team_names: &[&str], seed: u64) -> League {
    let store = MemoryStore::new();
    let season = SeasonEntity {
        id: Uuid::new_v4(),
        name: "Spring Cup".into(),
        starts_on: date!(2024 - 04 - 01),
        ends_on: date!(2024 - 06 - 30),
    };
    store.save_season(season.clone()).await.unwrap();

    let mut venues = Vec::new();
    for name in ["V1", "V2"] {
        let venue = VenueEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            location: String::new(),
        };
        venues.push(venue.id);
        store.save_venue(venue).await.unwrap();
    }

    let mut teams = Vec::new();
    for name in team_names {
        let team = TeamEntity {
            id: Uuid::new_v4(),
            season_id: season.id,
            name: (*name).into(),
            home_venue_id: None,
            roster_size: 11,
        };
        teams.push(team.id);
        TournamentStore::save_team(&store, team).await.unwrap();
    }

    let state = AppState::with_rng(AppConfig::default(), StdRng::seed_from_u64(seed));
    state.install_store(Arc::new(store.clone())).await;

    League {
        state,
        store,
        season_id: season.id,
        teams,
        venues,
    }
}

async fn schedule(league: &League, round: RoundTag) -> Result<Vec<MatchView>, ServiceError> {
    let request = CreateScheduleRequest {
        season_id: league.season_id,
        round,
    };
    schedule_service::create_schedule(&league.state, request).await
}

#[tokio::test]
async fn group_stage_partitions_the_pool_across_venues() {
    let league = league(&["A", "B", "C", "D"], 11).await;

    let matches = schedule(&league, RoundTag::GroupStage).await.unwrap();
    assert_eq!(matches.len(), 2);

    let mut seen = IndexSet::new();
    for fixture in &matches {
        assert_ne!(fixture.home_team_id, fixture.away_team_id);
        assert!(seen.insert(fixture.home_team_id));
        assert!(seen.insert(fixture.away_team_id));
        assert!(league.venues.contains(&fixture.venue_id));
        assert_eq!(fixture.round, RoundTag::GroupStage);
        assert_eq!(fixture.score, "0");
    }
    let pool: IndexSet<Uuid> = league.teams.iter().copied().collect();
    assert_eq!(seen.len(), pool.len());
    assert!(seen.iter().all(|team| pool.contains(team)));
    assert_eq!(matches[0].kickoff_at, matches[1].kickoff_at);

    let stored = league
        .store
        .list_matches(MatchFilter::season(league.season_id).with_round(RoundTag::GroupStage))
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].id, matches[0].id);
    assert_eq!(stored[0].kickoff_at.minute(), 0);
    assert_eq!(stored[0].kickoff_at.second(), 0);
}

#[tokio::test]
async fn odd_pool_is_refused_without_persisting() {
    let league = league(&["A", "B", "C"], 3).await;

    let err = schedule(&league, RoundTag::GroupStage).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Schedule(ScheduleError::UnevenPool { count: 3 })
    ));

    let failure = ScheduleFailure::from(err);
    assert_eq!(failure.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(failure.result, NOT_ENOUGH_TEAM);

    assert!(
        league
            .store
            .list_matches(MatchFilter::season(league.season_id))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn winners_advance_once_into_the_quarterfinal() {
    let league = league(&["A", "B", "C", "D"], 42).await;

    let group = schedule(&league, RoundTag::GroupStage).await.unwrap();
    let (first, second) = (&group[0], &group[1]);

    for (fixture, score) in [(first, "3:1"), (second, "2:2")] {
        match_service::update_match(
            &league.state,
            fixture.id,
            MatchUpdate {
                score: Some(score.into()),
                ..MatchUpdate::default()
            },
        )
        .await
        .unwrap();
    }

    let quarter = schedule(&league, RoundTag::Quarterfinal).await.unwrap();
    assert_eq!(quarter.len(), 1);
    let advanced: IndexSet<Uuid> = [quarter[0].home_team_id, quarter[0].away_team_id]
        .into_iter()
        .collect();
    let expected: IndexSet<Uuid> = [first.home_team_id, second.away_team_id]
        .into_iter()
        .collect();
    assert_eq!(advanced, expected);

    // Both winners already play in the quarterfinal, so nothing is paired again.
    let again = schedule(&league, RoundTag::Quarterfinal).await.unwrap();
    assert!(again.is_empty());
    assert_eq!(
        league
            .store
            .list_matches(MatchFilter::season(league.season_id).with_round(RoundTag::Quarterfinal))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn malformed_score_fails_the_next_round() {
    let league = league(&["A", "B"], 5).await;

    let group = schedule(&league, RoundTag::GroupStage).await.unwrap();

    let mut fixture = league.store.find_match(group[0].id).await.unwrap().unwrap();
    fixture.score = "three:one".into();
    league.store.save_match(fixture).await.unwrap();

    let err = schedule(&league, RoundTag::Quarterfinal).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Schedule(ScheduleError::MalformedScore { .. })
    ));
    assert_eq!(ScheduleFailure::from(err).status, StatusCode::INTERNAL_SERVER_ERROR);
}
