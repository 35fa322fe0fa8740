use serde::{Deserialize, Serialize};

use super::{LocationInput, PriceRange};
use crate::error::{AppError, AppResult};

const DEFAULT_MAX_DISTANCE_KM: f64 = 10.0;
const DEFAULT_MINIMUM_RATING: f64 = 3.5;
const DEFAULT_PEOPLE: u32 = 1;

/// Accepts either `"Italian"` or `["Italian", "Thai"]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Trimmed, non-empty values
    fn into_vec(self) -> Vec<String> {
        let values = match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        };
        values
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

fn list(value: Option<OneOrMany>) -> Vec<String> {
    value.map(OneOrMany::into_vec).unwrap_or_default()
}

fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Request payload as sent by clients. Every field except `location` is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub location: Option<LocationInput>,
    #[serde(default, alias = "maxDistanceKm")]
    pub max_distance: Option<f64>,
    #[serde(default, alias = "cuisinePreferences")]
    pub cuisine: Option<OneOrMany>,
    #[serde(default)]
    pub restaurant_type: Option<OneOrMany>,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    #[serde(default, alias = "priceRangePreference")]
    pub budget: Option<OneOrMany>,
    #[serde(default)]
    pub dietary_restrictions: Option<OneOrMany>,
    #[serde(default)]
    pub vibe_preferences: Option<OneOrMany>,
    #[serde(default)]
    pub minimum_rating: Option<f64>,
    #[serde(default)]
    pub people: Option<u32>,
    #[serde(default, alias = "type")]
    pub occasion: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub transport: Option<String>,
}

/// Fully populated user preferences; built once by [`RecommendationRequest::apply_defaults`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceProfile {
    pub cuisine_preferences: Vec<String>,
    pub restaurant_type: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub price_range_preference: Vec<PriceRange>,
    pub vibe_preferences: Vec<String>,
    pub max_distance_km: f64,
    pub minimum_rating: f64,
    pub people: u32,
    pub occasion: String,
    pub date: String,
    pub time: String,
    pub transport: String,
}

impl Default for PreferenceProfile {
    fn default() -> Self {
        Self {
            cuisine_preferences: Vec::new(),
            restaurant_type: Vec::new(),
            dietary_restrictions: Vec::new(),
            price_range_preference: Vec::new(),
            vibe_preferences: Vec::new(),
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            minimum_rating: DEFAULT_MINIMUM_RATING,
            people: DEFAULT_PEOPLE,
            occasion: String::new(),
            date: String::new(),
            time: String::new(),
            transport: String::new(),
        }
    }
}

/// A validated request ready for the recommendation pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationQuery {
    pub location: LocationInput,
    pub profile: PreferenceProfile,
    /// Free-text venue name; takes precedence over type and cuisine as search keyword
    pub restaurant_name: Option<String>,
}

impl RecommendationRequest {
    /// Validates the payload and fills every unset preference with its default
    pub fn apply_defaults(self) -> AppResult<RecommendationQuery> {
        let location = match self.location {
            Some(LocationInput::PlaceName(name)) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(AppError::InvalidInput(
                        "location must not be empty".to_string(),
                    ));
                }
                LocationInput::PlaceName(name)
            }
            Some(LocationInput::Coordinates(point)) => {
                point.validate()?;
                LocationInput::Coordinates(point)
            }
            None => {
                return Err(AppError::InvalidInput(
                    "location is required (place name or {lat, lng})".to_string(),
                ))
            }
        };

        let max_distance_km = match self.max_distance {
            Some(km) if !km.is_finite() || km <= 0.0 => {
                return Err(AppError::InvalidInput(format!(
                    "maxDistance must be a positive number of kilometers, got {}",
                    km
                )))
            }
            Some(km) => km,
            None => DEFAULT_MAX_DISTANCE_KM,
        };

        let price_range_preference = list(self.budget)
            .into_iter()
            .map(PriceRange::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(AppError::InvalidInput)?;

        let minimum_rating = match self.minimum_rating {
            Some(rating) if !(0.0..=5.0).contains(&rating) => {
                return Err(AppError::InvalidInput(format!(
                    "minimumRating must be between 0 and 5, got {}",
                    rating
                )))
            }
            Some(rating) => rating,
            None => DEFAULT_MINIMUM_RATING,
        };

        let profile = PreferenceProfile {
            cuisine_preferences: list(self.cuisine),
            restaurant_type: list(self.restaurant_type),
            dietary_restrictions: list(self.dietary_restrictions),
            price_range_preference,
            vibe_preferences: list(self.vibe_preferences),
            max_distance_km,
            minimum_rating,
            people: self.people.filter(|p| *p > 0).unwrap_or(DEFAULT_PEOPLE),
            occasion: text(self.occasion),
            date: text(self.date),
            time: text(self.time),
            transport: text(self.transport),
        };

        let restaurant_name = self
            .restaurant_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(RecommendationQuery {
            location,
            profile,
            restaurant_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> RecommendationRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults_fill_every_field() {
        let query = parse(json!({ "location": "Hanover, NH" }))
            .apply_defaults()
            .unwrap();

        assert_eq!(query.location, LocationInput::PlaceName("Hanover, NH".to_string()));
        assert_eq!(query.profile, PreferenceProfile::default());
        assert_eq!(query.profile.max_distance_km, 10.0);
        assert_eq!(query.profile.minimum_rating, 3.5);
        assert_eq!(query.profile.people, 1);
        assert!(query.restaurant_name.is_none());
    }

    #[test]
    fn test_single_values_and_lists_are_accepted() {
        let query = parse(json!({
            "location": { "lat": 43.70, "lng": -72.29 },
            "maxDistance": 5,
            "cuisine": "Italian",
            "restaurantType": ["Fast Food"],
            "budget": "$$",
            "dietaryRestrictions": ["Gluten-Free"],
            "vibePreferences": "Romantic",
            "people": 2,
            "type": "Date night",
            "restaurantName": "  "
        }))
        .apply_defaults()
        .unwrap();

        assert_eq!(query.location, LocationInput::Coordinates(Location::new(43.70, -72.29)));
        assert_eq!(query.profile.max_distance_km, 5.0);
        assert_eq!(query.profile.cuisine_preferences, vec!["Italian"]);
        assert_eq!(query.profile.restaurant_type, vec!["Fast Food"]);
        assert_eq!(query.profile.price_range_preference, vec![PriceRange::Moderate]);
        assert_eq!(query.profile.dietary_restrictions, vec!["Gluten-Free"]);
        assert_eq!(query.profile.vibe_preferences, vec!["Romantic"]);
        assert_eq!(query.profile.people, 2);
        assert_eq!(query.profile.occasion, "Date night");
        assert!(query.restaurant_name.is_none());
    }

    #[test]
    fn test_spec_style_field_names_are_aliases() {
        let query = parse(json!({
            "location": "Boston",
            "maxDistanceKm": 3.5,
            "cuisinePreferences": ["Thai", " "],
            "priceRangePreference": ["$", "$$"]
        }))
        .apply_defaults()
        .unwrap();

        assert_eq!(query.profile.max_distance_km, 3.5);
        assert_eq!(query.profile.cuisine_preferences, vec!["Thai"]);
        assert_eq!(
            query.profile.price_range_preference,
            vec![PriceRange::Inexpensive, PriceRange::Moderate]
        );
    }

    #[test]
    fn test_missing_location_rejected() {
        let err = parse(json!({ "maxDistance": 10 })).apply_defaults().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_blank_place_name_rejected() {
        let err = parse(json!({ "location": "   " })).apply_defaults().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        let err = parse(json!({ "location": { "lat": 91.0, "lng": 0.0 } }))
            .apply_defaults()
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_non_positive_distance_rejected() {
        let err = parse(json!({ "location": "Boston", "maxDistance": 0 }))
            .apply_defaults()
            .unwrap_err();
        assert!(err.to_string().contains("maxDistance"));
    }

    #[test]
    fn test_bad_budget_rejected() {
        let err = parse(json!({ "location": "Boston", "budget": "cheap" }))
            .apply_defaults()
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
