use std::sync::Arc;

use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    error::{AppError, AppResult},
    models::{Location, NormalizedRestaurant, PreferenceProfile, PriceRange, RawVenue},
    services::providers::{VenueSearchProvider, VenueSearchQuery},
};

/// Search constraints derived from the user's preferences
#[derive(Debug, Clone, PartialEq)]
pub struct VenueFilters {
    pub max_distance_km: f64,
    pub restaurant_name: Option<String>,
    pub cuisine_preferences: Vec<String>,
    pub restaurant_type: Vec<String>,
    /// Only the first budget preference is sent to the provider
    pub price_range: Option<PriceRange>,
    /// Carried for logging and prompting; the provider cannot filter on it
    pub dietary_restrictions: Vec<String>,
}

impl VenueFilters {
    pub fn from_profile(profile: &PreferenceProfile, restaurant_name: Option<&str>) -> Self {
        Self {
            max_distance_km: profile.max_distance_km,
            restaurant_name: restaurant_name.map(str::to_string),
            cuisine_preferences: profile.cuisine_preferences.clone(),
            restaurant_type: profile.restaurant_type.clone(),
            price_range: profile.price_range_preference.first().copied(),
            dietary_restrictions: profile.dietary_restrictions.clone(),
        }
    }

    /// Keyword precedence: venue name, then restaurant type, then cuisines
    pub fn keyword(&self) -> Option<String> {
        if let Some(name) = self.restaurant_name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name.trim().to_string())
        } else if !self.restaurant_type.is_empty() {
            Some(format!("{} restaurant", self.restaurant_type.join(" ")))
        } else if !self.cuisine_preferences.is_empty() {
            Some(self.cuisine_preferences.join(" "))
        } else {
            None
        }
    }

    /// The provider query centred on `center`
    ///
    /// A budget pins both price bounds to the same tier, so only venues at exactly that
    /// tier are returned.
    pub fn to_query(&self, center: Location) -> VenueSearchQuery {
        let level = self.price_range.map(PriceRange::level);
        VenueSearchQuery {
            center,
            radius_meters: (self.max_distance_km * 1000.0).round() as u32,
            keyword: self.keyword(),
            min_price: level,
            max_price: level,
        }
    }
}

/// Candidate venues near `center`; an empty list is a successful outcome
pub async fn fetch_nearby(
    provider: &dyn VenueSearchProvider,
    center: Location,
    filters: &VenueFilters,
) -> AppResult<Vec<RawVenue>> {
    let query = filters.to_query(center);

    tracing::info!(
        center = %center,
        radius_meters = query.radius_meters,
        keyword = ?query.keyword,
        price_level = ?query.min_price,
        dietary_restrictions = ?filters.dietary_restrictions,
        "Searching nearby venues"
    );

    let venues = provider.search_nearby(&query).await?;

    tracing::info!(found = venues.len(), "Venue search completed");

    Ok(venues)
}

/// Fills phone, website and opening hours with at most `concurrency` lookups in flight
///
/// A failed lookup leaves that restaurant's optional fields empty. Dropping the returned
/// future aborts any lookups still running.
pub async fn enrich_with_details(
    provider: Arc<dyn VenueSearchProvider>,
    mut restaurants: Vec<NormalizedRestaurant>,
    concurrency: usize,
) -> Vec<NormalizedRestaurant> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, restaurant) in restaurants.iter().enumerate() {
        let Some(place_id) = restaurant.place_id.clone() else {
            continue;
        };
        let provider = provider.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            (index, place_id.clone(), provider.get_details(&place_id).await)
        });
    }

    let mut failures = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, _, Ok(details))) => restaurants[index].apply_details(details),
            Ok((_, place_id, Err(e))) => {
                failures += 1;
                tracing::warn!(place_id = %place_id, error = %e, "Place details lookup failed");
            }
            Err(e) => {
                failures += 1;
                let error = AppError::Internal(e.to_string());
                tracing::error!(error = %error, "Place details task failed to complete");
            }
        }
    }

    if failures > 0 {
        tracing::warn!(
            total = restaurants.len(),
            failed = failures,
            "Partial place details failure"
        );
    }

    restaurants
}
