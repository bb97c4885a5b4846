use rand::Rng;
use serde::Deserialize;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};

/// Bounds used when drawing the shared kickoff of a scheduling call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KickoffRules {
    /// Length of the window, starting on the season's first day, in which kickoffs fall.
    pub window_days: u16,
    /// Earliest kickoff hour (inclusive).
    pub earliest_hour: u8,
    /// Latest kickoff hour (inclusive).
    pub latest_hour: u8,
}

impl Default for KickoffRules {
    fn default() -> Self {
        Self {
            window_days: 30,
            earliest_hour: 9,
            latest_hour: 19,
        }
    }
}

impl KickoffRules {
    /// Clamp hours to a valid day and keep `earliest_hour <= latest_hour`.
    pub fn sanitized(self) -> Self {
        let latest_hour = self.latest_hour.min(23);
        let earliest_hour = self.earliest_hour.min(latest_hour);
        Self {
            window_days: self.window_days,
            earliest_hour,
            latest_hour,
        }
    }
}

/// Draw a kickoff (UTC) for a whole round.
///
/// The day is uniform over `[season_start, season_start + window_days)`, shortened to the season
/// end when the season is shorter than the window. The hour is uniform over the configured hours;
/// minutes and seconds are always zero.
pub fn random_kickoff<R: Rng + ?Sized>(
    season_start: Date,
    season_end: Date,
    rules: &KickoffRules,
    rng: &mut R,
) -> OffsetDateTime {
    let rules = rules.sanitized();
    let window = Duration::days(i64::from(rules.window_days));
    let span = (season_end - season_start).clamp(Duration::ZERO, window);

    let start = season_start.midnight();
    let offset = span * rng.random::<f64>();
    let day = (start + offset).date();

    let hour = rng.random_range(rules.earliest_hour..=rules.latest_hour);
    let time = Time::from_hms(hour, 0, 0).unwrap_or(Time::MIDNIGHT);

    PrimitiveDateTime::new(day, time).assume_utc()
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use time::macros::date;

    use super::*;

    #[test]
    fn kickoff_stays_inside_window_and_hours() {
        let mut rng = StdRng::seed_from_u64(11);
        let rules = KickoffRules::default();
        let start = date!(2024 - 03 - 01);
        let end = date!(2024 - 08 - 31);

        for _ in 0..500 {
            let kickoff = random_kickoff(start, end, &rules, &mut rng);
            assert!(kickoff.date() >= start);
            assert!(kickoff.date() < start + Duration::days(30));
            assert!((9..=19).contains(&kickoff.hour()));
            assert_eq!(kickoff.minute(), 0);
            assert_eq!(kickoff.second(), 0);
        }
    }

    #[test]
    fn short_season_clamps_the_window() {
        let mut rng = StdRng::seed_from_u64(3);
        let start = date!(2024 - 03 - 01);
        let end = date!(2024 - 03 - 04);

        for _ in 0..200 {
            let kickoff = random_kickoff(start, end, &KickoffRules::default(), &mut rng);
            assert!(kickoff.date() >= start && kickoff.date() <= end);
        }
    }

    #[test]
    fn inverted_hours_are_sanitized() {
        let rules = KickoffRules {
            window_days: 1,
            earliest_hour: 30,
            latest_hour: 40,
        }
        .sanitized();
        assert_eq!(rules.latest_hour, 23);
        assert_eq!(rules.earliest_hour, 23);
    }
}
