//! League table built from recorded results.

use std::cmp::Ordering;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::{MatchEntity, TeamEntity},
    tournament::{Outcome, Score, Side},
};

const POINTS_FOR_WIN: u32 = 3;
const POINTS_FOR_DRAW: u32 = 1;

/// Accumulated record of one team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingRow {
    /// Ranked team.
    pub team_id: Uuid,
    /// Team display name, last tie-breaker.
    pub team_name: String,
    /// Matches with a readable result.
    pub played: u32,
    /// Matches won.
    pub wins: u32,
    /// Matches drawn.
    pub draws: u32,
    /// Matches lost.
    pub losses: u32,
    /// Goals scored.
    pub goals_for: u32,
    /// Goals conceded.
    pub goals_against: u32,
    /// Points earned.
    pub points: u32,
}

impl StandingRow {
    fn new(team: &TeamEntity) -> Self {
        Self {
            team_id: team.id,
            team_name: team.name.clone(),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            points: 0,
        }
    }

    /// Goals scored minus goals conceded.
    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }

    fn record(&mut self, score: &Score, side: Side) {
        let (scored, conceded) = score.for_side(side);
        self.played = self.played.saturating_add(1);
        self.goals_for = self.goals_for.saturating_add(scored);
        self.goals_against = self.goals_against.saturating_add(conceded);

        match (score.outcome(), side) {
            (Outcome::Draw, _) => {
                self.draws = self.draws.saturating_add(1);
                self.points = self.points.saturating_add(POINTS_FOR_DRAW);
            }
            (Outcome::HomeWin, Side::Home) | (Outcome::AwayWin, Side::Away) => {
                self.wins = self.wins.saturating_add(1);
                self.points = self.points.saturating_add(POINTS_FOR_WIN);
            }
            _ => self.losses = self.losses.saturating_add(1),
        }
    }
}

/// Rank `teams` on the results of `matches`.
///
/// Matches without a readable score (unplayed placeholder included) are not counted. Rows are
/// ordered by points, goal difference, goals scored, then name.
pub fn compute_standings(teams: &[TeamEntity], matches: &[MatchEntity]) -> Vec<StandingRow> {
    let mut rows: IndexMap<Uuid, StandingRow> = teams
        .iter()
        .map(|team| (team.id, StandingRow::new(team)))
        .collect();

    for fixture in matches {
        let Ok(score) = fixture.score.parse::<Score>() else {
            continue;
        };
        if let Some(row) = rows.get_mut(&fixture.home_team_id) {
            row.record(&score, Side::Home);
        }
        if let Some(row) = rows.get_mut(&fixture.away_team_id) {
            row.record(&score, Side::Away);
        }
    }

    let mut table: Vec<StandingRow> = rows.into_values().collect();
    table.sort_by(compare_rows);
    table
}

fn compare_rows(a: &StandingRow, b: &StandingRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| a.team_name.cmp(&b.team_name))
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::tournament::{RoundTag, UNPLAYED_SCORE};

    fn team(name: &str) -> TeamEntity {
        TeamEntity {
            id: Uuid::new_v4(),
            season_id: Uuid::nil(),
            name: name.into(),
            home_venue_id: None,
            roster_size: 11,
        }
    }

    fn result(home: &TeamEntity, away: &TeamEntity, score: &str) -> MatchEntity {
        let mut fixture = MatchEntity::scheduled(
            Uuid::nil(),
            RoundTag::GroupStage,
            home.id,
            away.id,
            Uuid::nil(),
            OffsetDateTime::UNIX_EPOCH,
            OffsetDateTime::UNIX_EPOCH,
        );
        fixture.score = score.into();
        fixture
    }

    #[test]
    fn table_orders_by_points_then_goal_difference() {
        let lions = team("Lions");
        let hawks = team("Hawks");
        let bears = team("Bears");
        let teams = [lions.clone(), hawks.clone(), bears.clone()];
        let matches = [
            result(&lions, &hawks, "2:0"),
            result(&hawks, &bears, "1:1"),
            result(&bears, &lions, "3:1"),
            result(&lions, &bears, UNPLAYED_SCORE),
        ];

        let table = compute_standings(&teams, &matches);
        let names: Vec<_> = table.iter().map(|row| row.team_name.as_str()).collect();
        assert_eq!(names, ["Bears", "Lions", "Hawks"]);

        let bears_row = &table[0];
        assert_eq!(bears_row.points, 4);
        assert_eq!((bears_row.wins, bears_row.draws, bears_row.losses), (1, 1, 0));
        assert_eq!(bears_row.goal_difference(), 2);
        assert_eq!(table[1].played, 2);
    }

    #[test]
    fn oversized_results_are_left_out_of_the_table() {
        let lions = team("Lions");
        let hawks = team("Hawks");
        let teams = [lions.clone(), hawks.clone()];
        let matches = [
            result(&lions, &hawks, "4294967295:0"),
            result(&lions, &hawks, "4294967295:0"),
            result(&lions, &hawks, "65535:0"),
            result(&lions, &hawks, "65535:0"),
        ];

        let table = compute_standings(&teams, &matches);
        assert_eq!(table[0].team_name, "Lions");
        assert_eq!(table[0].played, 2);
        assert_eq!(table[0].goals_for, 131_070);
        assert_eq!(table[1].goals_against, 131_070);
    }

    #[test]
    fn teams_without_results_are_listed_by_name() {
        let table = compute_standings(&[team("Zebras"), team("Ants")], &[]);
        assert_eq!(table[0].team_name, "Ants");
        assert_eq!(table[1].points, 0);
    }
}
