use serde::{Deserialize, Serialize};

use super::{PriceRange, VenueDetails};

/// Canonical restaurant shape produced from a provider record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRestaurant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    pub name: String,
    pub rating: Option<f64>,
    pub review_count: u32,
    pub price_range: Option<PriceRange>,
    pub address: String,
    pub photos: Vec<String>,
    pub distance_km: f64,
    pub is_open_now: bool,
    pub features: Vec<String>,
    pub cuisine_types: Vec<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<Vec<String>>,
}

impl NormalizedRestaurant {
    /// Copies the optional detail fields onto this restaurant
    pub fn apply_details(&mut self, details: VenueDetails) {
        self.phone = details.phone;
        self.website = details.website;
        self.opening_hours = details
            .opening_hours
            .map(|h| h.weekday_text)
            .filter(|days| !days.is_empty());
    }

    /// `"$$"`, or `"N/A"` when the provider gave no price level
    pub fn price_label(&self) -> &'static str {
        self.price_range.map(PriceRange::as_str).unwrap_or("N/A")
    }
}

/// A restaurant with its deterministic match score and the reasons behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRestaurant {
    #[serde(flatten)]
    pub restaurant: NormalizedRestaurant,
    pub match_score: f64,
    pub match_details: Vec<String>,
}

/// Three-section narrative: picks, why they match, and extra suggestions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSections {
    pub top_picks: Vec<String>,
    pub explanations: Vec<String>,
    pub additional_suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AiRecommendations {
    Sections(RecommendationSections),
    Message { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantList {
    pub count: usize,
    pub results: Vec<ScoredRestaurant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub restaurants: RestaurantList,
    pub ai_recommendations: AiRecommendations,
}

impl RecommendationResult {
    pub const NO_RESULTS_MESSAGE: &'static str = "No restaurants found for the given criteria.";

    /// The response returned when the venue search finds nothing
    pub fn empty() -> Self {
        Self {
            restaurants: RestaurantList {
                count: 0,
                results: Vec::new(),
            },
            ai_recommendations: AiRecommendations::Message {
                message: Self::NO_RESULTS_MESSAGE.to_string(),
            },
        }
    }
}
