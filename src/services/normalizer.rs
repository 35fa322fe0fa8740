use std::collections::HashMap;

use reqwest::Url;

use crate::{
    error::{AppError, AppResult},
    models::{Location, NormalizedRestaurant, PriceRange, RawVenue},
    services::distance::distance_km,
};

const FINE_DINING_MIN_LEVEL: u8 = 3;
const TOP_RATED_MIN: f64 = 4.5;
const WELL_RATED_MIN: f64 = 4.0;

/// Provider type tag → feature label
const TYPE_FEATURES: &[(&str, &str)] = &[
    ("family_restaurant", "Family-Friendly"),
    ("bar", "Bar Available"),
    ("night_club", "Nightlife"),
    ("cafe", "Café"),
    ("bakery", "Bakery"),
    ("meal_takeaway", "Takeout"),
    ("meal_delivery", "Delivery"),
    ("wine_bar", "Wine List"),
    ("vegetarian_restaurant", "Vegetarian Options"),
    ("vegan_restaurant", "Vegetarian Options"),
];

/// Provider type tag → cuisine label
const TYPE_CUISINES: &[(&str, &str)] = &[
    ("italian_restaurant", "Italian"),
    ("pizza", "Italian"),
    ("pizza_restaurant", "Italian"),
    ("mexican_restaurant", "Mexican"),
    ("chinese_restaurant", "Chinese"),
    ("japanese_restaurant", "Japanese"),
    ("sushi_restaurant", "Japanese"),
    ("ramen_restaurant", "Japanese"),
    ("korean_restaurant", "Korean"),
    ("thai_restaurant", "Thai"),
    ("vietnamese_restaurant", "Vietnamese"),
    ("indian_restaurant", "Indian"),
    ("french_restaurant", "French"),
    ("greek_restaurant", "Mediterranean"),
    ("mediterranean_restaurant", "Mediterranean"),
    ("middle_eastern_restaurant", "Middle Eastern"),
    ("american_restaurant", "American"),
    ("hamburger_restaurant", "American"),
    ("barbecue_restaurant", "American"),
    ("seafood_restaurant", "Seafood"),
    ("steak_house", "Steakhouse"),
    ("vegetarian_restaurant", "Vegetarian"),
    ("vegan_restaurant", "Vegetarian"),
    ("cafe", "Café"),
    ("coffee_shop", "Café"),
];

/// Lowercase name fragment → cuisine label, used when type tags are too generic
const NAME_CUISINES: &[(&str, &str)] = &[
    ("india", "Indian"),
    ("curry", "Indian"),
    ("tandoor", "Indian"),
    ("pizza", "Italian"),
    ("trattoria", "Italian"),
    ("osteria", "Italian"),
    ("sushi", "Japanese"),
    ("ramen", "Japanese"),
    ("taco", "Mexican"),
    ("taqueria", "Mexican"),
    ("cantina", "Mexican"),
    ("thai", "Thai"),
    ("bistro", "French"),
    ("brasserie", "French"),
    ("burger", "American"),
    ("noodle", "Asian"),
];

/// Data-driven lookup from provider tags and venue names to cuisine labels
///
/// Starts from the built-in entries; callers extend it with [`CuisineTable::with_type`]
/// and [`CuisineTable::with_name_hint`] or build one from scratch with
/// [`CuisineTable::from_entries`].
#[derive(Debug, Clone)]
pub struct CuisineTable {
    by_type: HashMap<String, String>,
    by_name: Vec<(String, String)>,
}

impl Default for CuisineTable {
    fn default() -> Self {
        Self::from_entries(TYPE_CUISINES.iter().copied(), NAME_CUISINES.iter().copied())
    }
}

impl CuisineTable {
    pub fn from_entries<'a>(
        types: impl IntoIterator<Item = (&'a str, &'a str)>,
        name_hints: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self {
            by_type: types
                .into_iter()
                .map(|(tag, label)| (tag.to_lowercase(), label.to_string()))
                .collect(),
            by_name: name_hints
                .into_iter()
                .map(|(hint, label)| (hint.to_lowercase(), label.to_string()))
                .collect(),
        }
    }

    /// Adds or replaces a type-tag mapping
    pub fn with_type(mut self, type_tag: &str, cuisine: &str) -> Self {
        self.by_type
            .insert(type_tag.to_lowercase(), cuisine.to_string());
        self
    }

    /// Adds a name-substring hint
    pub fn with_name_hint(mut self, fragment: &str, cuisine: &str) -> Self {
        self.by_name
            .push((fragment.to_lowercase(), cuisine.to_string()));
        self
    }

    /// Cuisine labels for a venue, type tags first, then name hints, without duplicates
    pub fn cuisines_for(&self, types: &[String], name: &str) -> Vec<String> {
        let mut cuisines: Vec<String> = Vec::new();
        let mut push = |label: &String| {
            if !cuisines.contains(label) {
                cuisines.push(label.clone());
            }
        };

        for tag in types {
            if let Some(label) = self.by_type.get(&tag.to_lowercase()) {
                push(label);
            }
        }

        let name = name.to_lowercase();
        for (fragment, label) in &self.by_name {
            if name.contains(fragment.as_str()) {
                push(label);
            }
        }

        cuisines
    }
}

/// Builds fully-qualified photo URLs from provider photo references
#[derive(Debug, Clone)]
pub struct PhotoUrlBuilder {
    base_url: Url,
    api_key: String,
    max_width: u32,
}

impl PhotoUrlBuilder {
    /// `places_url` is the Places API base; photos are served from `{places_url}/photo`
    pub fn new(places_url: &str, api_key: String, max_width: u32) -> AppResult<Self> {
        let base_url = Url::parse(&format!("{}/photo", places_url.trim_end_matches('/')))
            .map_err(|e| AppError::Internal(format!("invalid places url {}: {}", places_url, e)))?;

        Ok(Self {
            base_url,
            api_key,
            max_width,
        })
    }

    /// Query values are percent-encoded
    pub fn url(&self, photo_reference: &str) -> String {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("maxwidth", &self.max_width.to_string())
            .append_pair("photoreference", photo_reference)
            .append_pair("key", &self.api_key);
        url.to_string()
    }
}

/// Derived feature tags for a venue
///
/// Order: price, rating, open-now, then type-tag features.
pub fn extract_features(venue: &RawVenue) -> Vec<String> {
    let mut features: Vec<String> = Vec::new();

    if venue.price_level.is_some_and(|level| level >= FINE_DINING_MIN_LEVEL) {
        features.push("Fine Dining".to_string());
    }

    match venue.rating {
        Some(rating) if rating >= TOP_RATED_MIN => features.push("Top Rated".to_string()),
        Some(rating) if rating >= WELL_RATED_MIN => features.push("Well Rated".to_string()),
        _ => {}
    }

    if venue.is_open_now() {
        features.push("Open Now".to_string());
    }

    for tag in &venue.types {
        if let Some((_, label)) = TYPE_FEATURES.iter().find(|(t, _)| *t == tag.as_str()) {
            if !features.iter().any(|f| f == *label) {
                features.push(label.to_string());
            }
        }
    }

    features
}

/// Converts provider records into [`NormalizedRestaurant`]s
#[derive(Debug, Clone)]
pub struct Normalizer {
    cuisines: CuisineTable,
    photos: PhotoUrlBuilder,
}

impl Normalizer {
    pub fn new(cuisines: CuisineTable, photos: PhotoUrlBuilder) -> Self {
        Self { cuisines, photos }
    }

    pub fn normalize(&self, center: Location, venue: RawVenue) -> NormalizedRestaurant {
        let features = extract_features(&venue);
        let cuisine_types = self.cuisines.cuisines_for(&venue.types, &venue.name);
        let distance_km = distance_km(center, venue.location());
        let is_open_now = venue.is_open_now();
        let photos = venue
            .photos
            .iter()
            .map(|p| self.photos.url(&p.photo_reference))
            .collect();

        NormalizedRestaurant {
            place_id: venue.place_id,
            name: venue.name,
            // Google reports unrated places as 0 or omits the field
            rating: venue.rating.filter(|r| *r > 0.0),
            review_count: venue.user_ratings_total.unwrap_or(0),
            price_range: venue.price_level.and_then(PriceRange::from_level),
            address: venue.vicinity.unwrap_or_default(),
            photos,
            distance_km,
            is_open_now,
            features,
            cuisine_types,
            phone: None,
            website: None,
            opening_hours: None,
        }
    }

    pub fn normalize_all(&self, center: Location, venues: Vec<RawVenue>) -> Vec<NormalizedRestaurant> {
        venues
            .into_iter()
            .map(|venue| self.normalize(center, venue))
            .collect()
    }
}
