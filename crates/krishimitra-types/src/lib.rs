//! Shared data model for the KrishiMitra agricultural assistant.
//!
//! This crate provides the types passed between the price store, the chat
//! and scanner engines in `krishimitra-core`, and the HTTP service.
//!
//! # Features
//!
//! - Mandi price records and their trend
//! - Chat turns, senders and display languages
//! - Disease detection results and weather reports
//! - Error types for parsing these values from text
//!
//! # Example
//!
//! ```
//! use krishimitra_types::{ChatTurn, Language, Sender, Trend};
//!
//! let turn = ChatTurn::user("Best fertilizer for wheat?");
//! assert_eq!(turn.sender, Sender::User);
//! assert_eq!("hi".parse::<Language>(), Ok(Language::Hindi));
//! assert_eq!(Trend::Down.to_string(), "down");
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    ChatTurn, ConfidenceBand, CurrentConditions, DetectionResult, ForecastDay, Language,
    PriceRecord, Sender, Trend, WeatherReport,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn tomato() -> PriceRecord {
        PriceRecord {
            id: 1,
            crop: "Tomato".to_string(),
            variety: "Local".to_string(),
            price: 1850.0,
            unit: "quintal".to_string(),
            market: "Azadpur".to_string(),
            state: "Delhi".to_string(),
            trend: Trend::Up,
            change: 5.2,
            last_updated: "2023-12-01".to_string(),
        }
    }

    // --- Trend tests ---

    #[test]
    fn test_trend_from_str() {
        assert_eq!("up".parse::<Trend>(), Ok(Trend::Up));
        assert_eq!("DOWN".parse::<Trend>(), Ok(Trend::Down));
        assert_eq!(" stable ".parse::<Trend>(), Ok(Trend::Stable));
        assert_eq!(
            "sideways".parse::<Trend>(),
            Err(ParseError::UnknownTrend("sideways".to_string()))
        );
    }

    #[test]
    fn test_trend_orders_by_wire_name() {
        assert!(Trend::Down < Trend::Stable);
        assert!(Trend::Stable < Trend::Up);

        let mut trends = Trend::ALL.to_vec();
        trends.sort();
        assert_eq!(trends, vec![Trend::Down, Trend::Stable, Trend::Up]);
    }

    #[test]
    fn test_trend_display_matches_as_str() {
        for trend in Trend::ALL {
            assert_eq!(trend.to_string(), trend.as_str());
        }
    }

    // --- Language tests ---

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::English.code(), "en");
        assert_eq!(Language::Hindi.code(), "hi");
        assert_eq!(Language::default(), Language::English);
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("en".parse::<Language>(), Ok(Language::English));
        assert_eq!("Hindi".parse::<Language>(), Ok(Language::Hindi));
        assert!("ta".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_unknown_falls_back_to_english() {
        assert_eq!(Language::from_code_or_default("xx"), Language::English);
        assert_eq!(Language::from_code_or_default(""), Language::English);
        assert_eq!(Language::from_code_or_default("HI"), Language::Hindi);
    }

    // --- Sender tests ---

    #[test]
    fn test_sender_round_trip_through_text() {
        assert_eq!("user".parse::<Sender>(), Ok(Sender::User));
        assert_eq!("bot".parse::<Sender>(), Ok(Sender::Bot));
        assert_eq!(Sender::Bot.to_string(), "bot");
        assert!("system".parse::<Sender>().is_err());
    }

    // --- ChatTurn tests ---

    #[test]
    fn test_chat_turn_constructors() {
        let user = ChatTurn::user("hello");
        let bot = ChatTurn::bot("namaste");

        assert_eq!(user.sender, Sender::User);
        assert_eq!(bot.sender, Sender::Bot);
        assert_eq!(user.content, "hello");
        assert_ne!(user.id, bot.id);
    }

    // --- DetectionResult tests ---

    #[test]
    fn test_confidence_bands() {
        let mut result = DetectionResult {
            disease: "Rice Blast".to_string(),
            confidence: 88.3,
            description: String::new(),
            treatment: String::new(),
        };
        assert_eq!(result.band(), ConfidenceBand::Medium);

        result.confidence = 90.0;
        assert_eq!(result.band(), ConfidenceBand::High);

        result.confidence = 69.9;
        assert_eq!(result.band(), ConfidenceBand::Low);
    }

    // --- Serialization tests ---

    #[test]
    fn test_price_record_serializes_with_original_field_names() {
        let json = serde_json::to_value(tomato()).unwrap();

        assert_eq!(json["lastUpdated"], "2023-12-01");
        assert_eq!(json["trend"], "up");
        assert_eq!(json["change"], 5.2);
        assert!(json.get("last_updated").is_none());
    }

    #[test]
    fn test_price_record_deserialization() {
        let json = r#"{"id":7,"crop":"Rice","variety":"Basmati","price":3800,"unit":"quintal","market":"Karnal","state":"Haryana","trend":"up","change":4.5,"lastUpdated":"2023-12-01"}"#;

        let record: PriceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.price, 3800.0);
        assert_eq!(record.trend, Trend::Up);
    }

    #[test]
    fn test_language_serialization() {
        assert_eq!(serde_json::to_string(&Language::Hindi).unwrap(), "\"hi\"");
        let lang: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(lang, Language::English);
    }

    #[test]
    fn test_chat_turn_timestamp_is_rfc3339() {
        let turn = ChatTurn::bot("hi");
        let json = serde_json::to_value(&turn).unwrap();

        assert_eq!(json["sender"], "bot");
        let stamp = json["timestamp"].as_str().unwrap();
        assert!(stamp.contains('T'));
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::UnknownLanguage("fr".to_string());
        assert_eq!(err.to_string(), "Unsupported language: fr");
    }
}
