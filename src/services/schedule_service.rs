//! Round generation: pool resolution, pairing and persistence of a round's matches.

use indexmap::IndexMap;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        tournament_store::MatchFilter,
        unit_of_work::{StagedWrite, UnitOfWork},
    },
    dto::schedule::{CreateScheduleRequest, MatchView, RoundSchedule, ScheduleOverview},
    error::ServiceError,
    state::SharedState,
    tournament::{RoundTag, ScheduleError, generate_round, winners_of_round},
};

/// Generate and persist the matches of one round.
///
/// The first round pairs every team of the season; later rounds pair the winners of the round
/// before. An odd pool fails before anything is staged. A failing insert leaves the matches
/// committed before it in place.
pub async fn create_schedule(
    state: &SharedState,
    request: CreateScheduleRequest,
) -> Result<Vec<MatchView>, ServiceError> {
    let store = state.require_store().await?;
    let CreateScheduleRequest { season_id, round } = request;

    let season = store
        .find_season(season_id)
        .await
        .map_err(ScheduleError::from)?
        .ok_or(ScheduleError::SeasonNotFound(season_id))?;

    let now = OffsetDateTime::now_utc();
    let pool = if round.is_first() {
        store
            .list_teams(season_id)
            .await
            .map_err(ScheduleError::from)?
            .into_iter()
            .map(|team| team.id)
            .collect()
    } else {
        let season_matches = store
            .list_matches(MatchFilter::season(season_id))
            .await
            .map_err(ScheduleError::from)?;
        winners_of_round(round, &season_matches, now, &state.config().advancement)?
    };
    let venues = store.list_venues().await.map_err(ScheduleError::from)?;

    let generated = {
        let mut rng = state.rng().await;
        generate_round(
            &season,
            round,
            pool,
            &venues,
            &state.config().scheduling,
            now,
            &mut *rng,
        )
    };
    let matches = generated.inspect_err(|err| {
        warn!(season_id = %season_id, round = %round, error = %err, "round generation refused");
    })?;

    let mut unit = UnitOfWork::begin(store);
    for fixture in &matches {
        unit.stage(StagedWrite::InsertMatch(fixture.clone()));
    }
    unit.commit().await.map_err(ScheduleError::from)?;

    info!(
        season_id = %season_id,
        round = %round,
        matches = matches.len(),
        "round scheduled"
    );
    Ok(matches.into_iter().map(MatchView::from).collect())
}

/// Match ids of a season grouped by round, in play order. Rounds without matches are omitted.
pub async fn schedule_overview(
    state: &SharedState,
    season_id: Uuid,
) -> Result<ScheduleOverview, ServiceError> {
    let store = state.require_store().await?;
    if store.find_season(season_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("season `{season_id}` not found")));
    }

    let mut by_round: IndexMap<RoundTag, Vec<Uuid>> = IndexMap::new();
    for fixture in store.list_matches(MatchFilter::season(season_id)).await? {
        by_round.entry(fixture.round).or_default().push(fixture.id);
    }

    let rounds = RoundTag::ALL
        .into_iter()
        .filter_map(|round| {
            by_round
                .swap_remove(&round)
                .map(|match_ids| RoundSchedule { round, match_ids })
        })
        .collect();

    Ok(ScheduleOverview { season_id, rounds })
}
