//! Mock weather reports.

use rand::Rng;
use time::{Date, Duration, OffsetDateTime};

use krishimitra_types::{CurrentConditions, ForecastDay, WeatherReport};

use crate::scanner::round1;

/// Location used when none is given.
pub const DEFAULT_LOCATION: &str = "New Delhi";

/// Number of forecast days, starting tomorrow.
pub const FORECAST_DAYS: i64 = 5;

/// Sky conditions a report can carry.
pub const CONDITIONS: [&str; 6] = [
    "Sunny",
    "Partly Cloudy",
    "Cloudy",
    "Rain",
    "Thunderstorm",
    "Clear",
];

/// Generate a report for `location` as of now.
pub fn generate(location: &str) -> WeatherReport {
    generate_with(location, OffsetDateTime::now_utc(), &mut rand::rng())
}

/// Generate a report for `location` as of `now` with a caller-supplied RNG.
///
/// ```
/// use krishimitra_core::weather;
/// use time::macros::datetime;
///
/// let report = weather::generate_with("Pune", datetime!(2024-01-30 08:00 UTC), &mut rand::rng());
/// assert_eq!(report.forecast.len(), 5);
/// assert_eq!(report.forecast[1].date, "2024-02-01");
/// ```
pub fn generate_with<R: Rng + ?Sized>(
    location: &str,
    now: OffsetDateTime,
    rng: &mut R,
) -> WeatherReport {
    let temperature = round1(rng.random_range(15.0..35.0));
    let current = CurrentConditions {
        temperature,
        humidity: round1(rng.random_range(40.0..90.0)),
        wind_speed: round1(rng.random_range(2.0..15.0)),
        condition: pick_condition(rng).to_string(),
        updated: now,
    };

    let today = now.date();
    let forecast = (1..=FORECAST_DAYS)
        .map(|offset| ForecastDay {
            date: iso_date(today.saturating_add(Duration::days(offset))),
            max_temp: round1(temperature + rng.random_range(-3.0..5.0)),
            min_temp: round1(temperature - rng.random_range(5.0..10.0)),
            humidity: round1(rng.random_range(40.0..90.0)),
            condition: pick_condition(rng).to_string(),
            precipitation_chance: round1(rng.random_range(0.0..100.0)),
        })
        .collect();

    WeatherReport {
        location: location.to_string(),
        current,
        forecast,
    }
}

fn pick_condition<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    CONDITIONS[rng.random_range(0..CONDITIONS.len())]
}

fn iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
