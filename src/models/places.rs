use serde::{Deserialize, Serialize};

use super::Location;

// ============================================================================
// Google Places API Types
// ============================================================================

/// One result from the nearby search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVenue {
    #[serde(default)]
    pub place_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub price_level: Option<u8>,
    #[serde(default)]
    pub vicinity: Option<String>,
    pub geometry: PlaceGeometry,
    #[serde(default)]
    pub photos: Vec<PlacePhoto>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub opening_hours: Option<PlaceOpeningHours>,
}

impl RawVenue {
    pub fn location(&self) -> Location {
        self.geometry.location
    }

    pub fn is_open_now(&self) -> bool {
        self.opening_hours
            .as_ref()
            .and_then(|h| h.open_now)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceGeometry {
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacePhoto {
    pub photo_reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOpeningHours {
    #[serde(default)]
    pub open_now: Option<bool>,
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

/// Optional per-venue fields from the details endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueDetails {
    #[serde(default, rename = "formatted_phone_number")]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<PlaceOpeningHours>,
}

/// Envelope shared by the nearby search and details endpoints
#[derive(Debug, Deserialize)]
pub struct PlacesSearchResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<RawVenue>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceDetailsResponse {
    pub status: String,
    #[serde(default)]
    pub result: Option<VenueDetails>,
    #[serde(default)]
    pub error_message: Option<String>,
}

// ============================================================================
// Google Geocoding API Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub geometry: PlaceGeometry,
}
