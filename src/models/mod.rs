use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

pub mod places;
pub mod preferences;
pub mod restaurant;

pub use places::{RawVenue, VenueDetails};
pub use preferences::{PreferenceProfile, RecommendationQuery, RecommendationRequest};
pub use restaurant::{
    AiRecommendations, NormalizedRestaurant, RecommendationResult, RecommendationSections,
    RestaurantList, ScoredRestaurant,
};

/// A point on the earth's surface in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Rejects non-finite and out-of-range coordinates
    pub fn validate(&self) -> AppResult<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::InvalidInput(format!(
                "latitude must be between -90 and 90, got {}",
                self.lat
            )));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(AppError::InvalidInput(format!(
                "longitude must be between -180 and 180, got {}",
                self.lng
            )));
        }
        Ok(())
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Where the user wants to eat: either coordinates or a free-text place name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Coordinates(Location),
    PlaceName(String),
}

/// Price tier as shown to users (`$` through `$$$$`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PriceRange {
    Inexpensive,
    Moderate,
    Expensive,
    VeryExpensive,
}

impl PriceRange {
    /// Maps a provider price level. Levels outside 1..=4 (including 0, "free") have no tier.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(PriceRange::Inexpensive),
            2 => Some(PriceRange::Moderate),
            3 => Some(PriceRange::Expensive),
            4 => Some(PriceRange::VeryExpensive),
            _ => None,
        }
    }

    /// Number of `$` characters, which is also the provider price level
    pub fn level(self) -> u8 {
        match self {
            PriceRange::Inexpensive => 1,
            PriceRange::Moderate => 2,
            PriceRange::Expensive => 3,
            PriceRange::VeryExpensive => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriceRange::Inexpensive => "$",
            PriceRange::Moderate => "$$",
            PriceRange::Expensive => "$$$",
            PriceRange::VeryExpensive => "$$$$",
        }
    }
}

impl Display for PriceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PriceRange {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c == '$') {
            if let Some(range) = u8::try_from(trimmed.len()).ok().and_then(PriceRange::from_level) {
                return Ok(range);
            }
        }
        Err(format!("invalid price range \"{}\", expected $ to $$$$", value))
    }
}

impl From<PriceRange> for String {
    fn from(range: PriceRange) -> Self {
        range.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_range_from_level() {
        assert_eq!(PriceRange::from_level(2), Some(PriceRange::Moderate));
        assert_eq!(PriceRange::from_level(2).unwrap().as_str(), "$$");
        assert_eq!(PriceRange::from_level(0), None);
        assert_eq!(PriceRange::from_level(5), None);
    }

    #[test]
    fn test_price_range_serde() {
        let json = serde_json::to_string(&PriceRange::Expensive).unwrap();
        assert_eq!(json, r#""$$$""#);

        let parsed: PriceRange = serde_json::from_str(r#""$$$$""#).unwrap();
        assert_eq!(parsed, PriceRange::VeryExpensive);

        assert!(serde_json::from_str::<PriceRange>(r#""$$$$$""#).is_err());
        assert!(serde_json::from_str::<PriceRange>(r#""cheap""#).is_err());

        // lengths past u8::MAX must not wrap around to a valid tier
        assert!(PriceRange::try_from("$".repeat(257)).is_err());
        assert!(PriceRange::try_from("$".repeat(258)).is_err());
    }

    #[test]
    fn test_location_input_untagged() {
        let coords: LocationInput = serde_json::from_str(r#"{"lat": 43.7, "lng": -72.29}"#).unwrap();
        assert_eq!(coords, LocationInput::Coordinates(Location::new(43.7, -72.29)));

        let name: LocationInput = serde_json::from_str(r#""Hanover, NH""#).unwrap();
        assert_eq!(name, LocationInput::PlaceName("Hanover, NH".to_string()));
    }

    #[test]
    fn test_location_validate() {
        assert!(Location::new(89.9, 179.9).validate().is_ok());
        assert!(Location::new(90.1, 0.0).validate().is_err());
        assert!(Location::new(0.0, -180.5).validate().is_err());
        assert!(Location::new(f64::NAN, 0.0).validate().is_err());
    }
}
