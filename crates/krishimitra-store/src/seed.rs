//! Built-in sample price data.

use krishimitra_types::{PriceRecord, Trend};

/// Date stamped on every built-in record.
pub const SEED_DATE: &str = "2023-12-01";

#[allow(clippy::too_many_arguments)]
fn record(
    id: u32,
    crop: &str,
    variety: &str,
    price: f64,
    market: &str,
    state: &str,
    trend: Trend,
    change: f64,
) -> PriceRecord {
    PriceRecord {
        id,
        crop: crop.to_string(),
        variety: variety.to_string(),
        price,
        unit: "quintal".to_string(),
        market: market.to_string(),
        state: state.to_string(),
        trend,
        change,
        last_updated: SEED_DATE.to_string(),
    }
}

/// The sample mandi prices served when no seed file is configured.
///
/// Returned in insertion order; ids are 1 through 10.
pub fn sample_records() -> Vec<PriceRecord> {
    vec![
        record(1, "Tomato", "Local", 1850.0, "Azadpur", "Delhi", Trend::Up, 5.2),
        record(2, "Tomato", "Hybrid", 2450.0, "Bengaluru", "Karnataka", Trend::Up, 8.7),
        record(3, "Potato", "Kufri Jyoti", 1250.0, "Agra", "Uttar Pradesh", Trend::Down, -3.1),
        record(4, "Potato", "Kufri Chandramukhi", 1380.0, "Jalandhar", "Punjab", Trend::Stable, 0.8),
        record(5, "Wheat", "Sharbati", 2250.0, "Indore", "Madhya Pradesh", Trend::Up, 3.5),
        record(6, "Wheat", "Lokwan", 2180.0, "Karnal", "Haryana", Trend::Up, 2.1),
        record(7, "Rice", "Basmati", 3800.0, "Karnal", "Haryana", Trend::Up, 4.5),
        record(8, "Onion", "Red", 1650.0, "Lasalgaon", "Maharashtra", Trend::Down, -6.2),
        record(9, "Tomato", "Local", 1780.0, "Kolkata", "West Bengal", Trend::Down, -2.8),
        record(10, "Potato", "Kufri Pukhraj", 1320.0, "Patna", "Bihar", Trend::Stable, 0.2),
    ]
}
