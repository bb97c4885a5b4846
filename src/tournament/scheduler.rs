use rand::{Rng, seq::IndexedRandom};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::models::{MatchEntity, SeasonEntity, VenueEntity},
    tournament::{KickoffRules, RoundTag, ScheduleError, random_kickoff},
};

/// Pair `pool` into the matches of `round`.
///
/// Home and away teams are drawn uniformly from what is left of the pool, each match gets a
/// uniformly drawn venue, and every match of the call shares one kickoff. Matches come back in
/// creation order. Nothing is written here; callers stage the result in a unit of work.
pub fn generate_round<R: Rng + ?Sized>(
    season: &SeasonEntity,
    round: RoundTag,
    mut pool: Vec<Uuid>,
    venues: &[VenueEntity],
    rules: &KickoffRules,
    now: OffsetDateTime,
    rng: &mut R,
) -> Result<Vec<MatchEntity>, ScheduleError> {
    if pool.len() % 2 != 0 {
        return Err(ScheduleError::UnevenPool { count: pool.len() });
    }
    if pool.is_empty() {
        return Ok(Vec::new());
    }
    if venues.is_empty() {
        return Err(ScheduleError::NoVenues);
    }

    let kickoff_at = random_kickoff(season.starts_on, season.ends_on, rules, rng);
    let mut matches = Vec::with_capacity(pool.len() / 2);

    while !pool.is_empty() {
        let home = pool.swap_remove(rng.random_range(0..pool.len()));
        let away = pool.swap_remove(rng.random_range(0..pool.len()));
        let Some(venue) = venues.choose(rng) else {
            return Err(ScheduleError::NoVenues);
        };

        matches.push(MatchEntity::scheduled(
            season.id, round, home, away, venue.id, kickoff_at, now,
        ));
    }

    debug!(
        season_id = %season.id,
        round = %round,
        matches = matches.len(),
        kickoff = %kickoff_at,
        "round paired"
    );
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};
    use time::macros::{date, datetime};

    use super::*;
    use crate::tournament::UNPLAYED_SCORE;

    fn season() -> SeasonEntity {
        SeasonEntity {
            id: Uuid::new_v4(),
            name: "Spring Cup".into(),
            starts_on: date!(2024 - 04 - 01),
            ends_on: date!(2024 - 09 - 30),
        }
    }

    fn venues() -> Vec<VenueEntity> {
        ["North Field", "River Park"]
            .into_iter()
            .map(|name| VenueEntity {
                id: Uuid::new_v4(),
                name: name.into(),
                location: "Town".into(),
            })
            .collect()
    }

    fn pool(size: usize) -> Vec<Uuid> {
        (0..size).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn even_pool_is_partitioned() {
        let mut rng = StdRng::seed_from_u64(42);
        let season = season();
        let venues = venues();
        let teams = pool(8);
        let now = datetime!(2024-03-20 10:00 UTC);

        let matches = generate_round(
            &season,
            RoundTag::GroupStage,
            teams.clone(),
            &venues,
            &KickoffRules::default(),
            now,
            &mut rng,
        )
        .unwrap();

        assert_eq!(matches.len(), 4);
        let mut seen = HashSet::new();
        for fixture in &matches {
            assert_ne!(fixture.home_team_id, fixture.away_team_id);
            assert!(seen.insert(fixture.home_team_id));
            assert!(seen.insert(fixture.away_team_id));
            assert!(venues.iter().any(|venue| venue.id == fixture.venue_id));
            assert_eq!(fixture.score, UNPLAYED_SCORE);
            assert_eq!(fixture.round, RoundTag::GroupStage);
            assert_eq!(fixture.season_id, season.id);
        }
        assert_eq!(seen, teams.into_iter().collect());
    }

    #[test]
    fn every_match_shares_the_kickoff() {
        let mut rng = StdRng::seed_from_u64(7);
        let matches = generate_round(
            &season(),
            RoundTag::Quarterfinal,
            pool(16),
            &venues(),
            &KickoffRules::default(),
            OffsetDateTime::UNIX_EPOCH,
            &mut rng,
        )
        .unwrap();

        let kickoff = matches[0].kickoff_at;
        assert!(matches.iter().all(|fixture| fixture.kickoff_at == kickoff));
        assert!((9..=19).contains(&kickoff.hour()));
        assert_eq!(kickoff.minute(), 0);
    }

    #[test]
    fn odd_pool_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_round(
            &season(),
            RoundTag::GroupStage,
            pool(5),
            &venues(),
            &KickoffRules::default(),
            OffsetDateTime::UNIX_EPOCH,
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::UnevenPool { count: 5 }));
    }

    #[test]
    fn empty_pool_yields_nothing_even_without_venues() {
        let mut rng = StdRng::seed_from_u64(1);
        let matches = generate_round(
            &season(),
            RoundTag::Final,
            Vec::new(),
            &[],
            &KickoffRules::default(),
            OffsetDateTime::UNIX_EPOCH,
            &mut rng,
        )
        .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn missing_venues_are_reported() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_round(
            &season(),
            RoundTag::GroupStage,
            pool(2),
            &[],
            &KickoffRules::default(),
            OffsetDateTime::UNIX_EPOCH,
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::NoVenues));
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let season = season();
        let venues = venues();
        let teams = pool(6);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            generate_round(
                &season,
                RoundTag::GroupStage,
                teams.clone(),
                &venues,
                &KickoffRules::default(),
                OffsetDateTime::UNIX_EPOCH,
                &mut rng,
            )
            .unwrap()
            .into_iter()
            .map(|m| (m.home_team_id, m.away_team_id, m.venue_id, m.kickoff_at))
            .collect::<Vec<_>>()
        };
        assert_eq!(run(99), run(99));
    }
}
