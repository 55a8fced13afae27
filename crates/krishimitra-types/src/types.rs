//! Core types for KrishiMitra data.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ParseError;

/// Price movement of a crop since the previous market update.
///
/// # Ordering
///
/// Comparisons between trends go through their wire names (`down < stable < up`),
/// which is the order a lexicographic column sort produces.
///
/// ```
/// use krishimitra_types::Trend;
///
/// assert_eq!("up".parse::<Trend>(), Ok(Trend::Up));
/// assert_eq!(Trend::Stable.as_str(), "stable");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Trend {
    /// Price rose.
    Up,
    /// Price fell.
    Down,
    /// Price roughly unchanged.
    Stable,
}

impl Trend {
    /// All trends in declaration order.
    pub const ALL: [Trend; 3] = [Trend::Up, Trend::Down, Trend::Stable];

    /// Wire name of the trend.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        }
    }
}

impl PartialOrd for Trend {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Trend {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl FromStr for Trend {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Trend::Up),
            "down" => Ok(Trend::Down),
            "stable" => Ok(Trend::Stable),
            _ => Err(ParseError::UnknownTrend(s.to_string())),
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display language for chat replies.
///
/// This enum is marked `#[non_exhaustive]` so that new languages can be added
/// without breaking downstream matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum Language {
    /// English.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "en"))]
    English,
    /// Hindi.
    #[cfg_attr(feature = "serde", serde(rename = "hi"))]
    Hindi,
}

impl Language {
    /// ISO 639-1 code of the language.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
        }
    }

    /// Parse a language code, falling back to English for anything unknown.
    ///
    /// ```
    /// use krishimitra_types::Language;
    ///
    /// assert_eq!(Language::from_code_or_default("hi"), Language::Hindi);
    /// assert_eq!(Language::from_code_or_default("fr"), Language::English);
    /// ```
    #[must_use]
    pub fn from_code_or_default(code: &str) -> Self {
        code.parse().unwrap_or_default()
    }
}

impl FromStr for Language {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "hi" | "hindi" => Ok(Language::Hindi),
            _ => Err(ParseError::UnknownLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Author of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Sender {
    /// Typed by the person using the assistant.
    User,
    /// Produced by the assistant.
    Bot,
}

impl FromStr for Sender {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            _ => Err(ParseError::UnknownSender(s.to_string())),
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => f.write_str("user"),
            Sender::Bot => f.write_str("bot"),
        }
    }
}

/// A single mandi price entry.
///
/// Records are immutable once seeded into a store; views over them are
/// derived by filtering and sorting, never by editing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PriceRecord {
    /// Unique identifier within a store.
    pub id: u32,
    /// Crop name (e.g. "Tomato").
    pub crop: String,
    /// Variety of the crop (e.g. "Hybrid").
    pub variety: String,
    /// Modal price in rupees per `unit`. Always positive.
    pub price: f64,
    /// Unit the price refers to (e.g. "quintal").
    pub unit: String,
    /// Market (mandi) name.
    pub market: String,
    /// Indian state of the market.
    pub state: String,
    /// Direction of the last price movement.
    pub trend: Trend,
    /// Signed percent change since the previous update.
    pub change: f64,
    /// Date of the last update, `YYYY-MM-DD`.
    pub last_updated: String,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChatTurn {
    /// Unique identifier of the turn.
    pub id: Uuid,
    /// Message text.
    pub content: String,
    /// Who wrote the turn.
    pub sender: Sender,
    /// When the turn was appended.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
}

impl ChatTurn {
    /// Create a turn stamped with the current time.
    pub fn new(content: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, Sender::User)
    }

    /// Create a bot turn.
    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(content, Sender::Bot)
    }
}

/// Result of analysing a crop photo.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectionResult {
    /// Name of the detected disease.
    pub disease: String,
    /// Confidence in percent, at most 99.9.
    pub confidence: f64,
    /// What the disease is.
    pub description: String,
    /// Recommended treatment.
    pub treatment: String,
}

/// Coarse confidence band used when presenting a [`DetectionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConfidenceBand {
    /// Below 70%.
    Low,
    /// 70% up to 90%.
    Medium,
    /// 90% and above.
    High,
}

impl DetectionResult {
    /// Band of this result's confidence.
    ///
    /// ```
    /// use krishimitra_types::{ConfidenceBand, DetectionResult};
    ///
    /// let result = DetectionResult {
    ///     disease: "Wheat Rust".into(),
    ///     confidence: 95.1,
    ///     description: String::new(),
    ///     treatment: String::new(),
    /// };
    /// assert_eq!(result.band(), ConfidenceBand::High);
    /// ```
    #[must_use]
    pub fn band(&self) -> ConfidenceBand {
        if self.confidence >= 90.0 {
            ConfidenceBand::High
        } else if self.confidence >= 70.0 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// Current weather at a location.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurrentConditions {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Wind speed in km/h.
    pub wind_speed: f64,
    /// Sky condition (e.g. "Partly Cloudy").
    pub condition: String,
    /// When the conditions were generated.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub updated: OffsetDateTime,
}

/// Forecast for a single day.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForecastDay {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Daily maximum in degrees Celsius.
    pub max_temp: f64,
    /// Daily minimum in degrees Celsius.
    pub min_temp: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Sky condition.
    pub condition: String,
    /// Chance of rain in percent.
    pub precipitation_chance: f64,
}

/// Current conditions plus a multi-day forecast.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeatherReport {
    /// Location the report was requested for.
    pub location: String,
    /// Conditions right now.
    pub current: CurrentConditions,
    /// Upcoming days, starting tomorrow.
    pub forecast: Vec<ForecastDay>,
}
