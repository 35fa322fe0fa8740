use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{
        AiRecommendations, RecommendationQuery, RecommendationResult, RestaurantList,
    },
    services::{
        ai_recommender::AiRecommender,
        geocoding,
        normalizer::Normalizer,
        providers::{GeocodingProvider, VenueSearchProvider},
        scoring,
        venue_search::{self, VenueFilters},
    },
};

/// Runs one request through geocode → search → normalize → rank → AI narrative
///
/// Holds no per-request state, so a single engine is shared by every handler.
#[derive(Clone)]
pub struct RecommendationEngine {
    geocoder: Arc<dyn GeocodingProvider>,
    venues: Arc<dyn VenueSearchProvider>,
    normalizer: Arc<Normalizer>,
    ai: AiRecommender,
    place_details_concurrency: Option<usize>,
}

impl RecommendationEngine {
    pub fn new(
        geocoder: Arc<dyn GeocodingProvider>,
        venues: Arc<dyn VenueSearchProvider>,
        normalizer: Normalizer,
        ai: AiRecommender,
    ) -> Self {
        Self {
            geocoder,
            venues,
            normalizer: Arc::new(normalizer),
            ai,
            place_details_concurrency: None,
        }
    }

    /// Enables per-venue detail lookups with at most `concurrency` in flight
    pub fn with_place_details(mut self, concurrency: usize) -> Self {
        self.place_details_concurrency = Some(concurrency.max(1));
        self
    }

    /// Personalized recommendations for one request
    ///
    /// Fails only when the location cannot be resolved or the venue search itself fails.
    /// An empty search is a successful result and the language model is not consulted.
    pub async fn get_recommendations(
        &self,
        query: RecommendationQuery,
    ) -> AppResult<RecommendationResult> {
        let RecommendationQuery {
            location,
            profile,
            restaurant_name,
        } = query;

        let center = geocoding::resolve_location(self.geocoder.as_ref(), &location).await?;

        let filters = VenueFilters::from_profile(&profile, restaurant_name.as_deref());
        let venues = venue_search::fetch_nearby(self.venues.as_ref(), center, &filters).await?;

        let mut restaurants = self.normalizer.normalize_all(center, venues);
        if restaurants.is_empty() {
            tracing::info!(center = %center, "No restaurants matched the search");
            return Ok(RecommendationResult::empty());
        }

        if let Some(concurrency) = self.place_details_concurrency {
            restaurants =
                venue_search::enrich_with_details(self.venues.clone(), restaurants, concurrency)
                    .await;
        }

        let narrative = self.ai.recommend(&restaurants, &profile).await;
        let results = scoring::rank(restaurants, &profile);

        tracing::info!(
            count = results.len(),
            top_score = results.first().map(|r| r.match_score),
            "Recommendations assembled"
        );

        Ok(RecommendationResult {
            restaurants: RestaurantList {
                count: results.len(),
                results,
            },
            ai_recommendations: AiRecommendations::Sections(narrative),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;

    use crate::error::{AppError, LlmError};
    use crate::models::{
        Location, LocationInput, PreferenceProfile, PriceRange, RawVenue, VenueDetails,
    };
    use crate::services::normalizer::{CuisineTable, PhotoUrlBuilder};
    use crate::services::providers::{
        MockGeocodingProvider, MockLanguageModelProvider, MockVenueSearchProvider,
        VenueSearchQuery,
    };

    const HANOVER: Location = Location {
        lat: 43.7022,
        lng: -72.2896,
    };

    fn venue(id: &str, name: &str, rating: f64, price_level: u8, types: &[&str], lat: f64) -> RawVenue {
        serde_json::from_value(json!({
            "place_id": id,
            "name": name,
            "rating": rating,
            "user_ratings_total": 120,
            "price_level": price_level,
            "vicinity": "Main St, Hanover",
            "geometry": { "location": { "lat": lat, "lng": HANOVER.lng } },
            "types": types,
        }))
        .unwrap()
    }

    fn hanover_venues() -> Vec<RawVenue> {
        vec![
            venue("p1", "Lou's Restaurant", 4.3, 1, &["restaurant"], 43.7025),
            venue("p2", "Ramunto's Pizza", 4.1, 2, &["pizza", "restaurant"], 43.7030),
            venue("p3", "Pine", 4.6, 3, &["restaurant", "bar"], 43.7040),
            venue("p4", "Tuk Tuk Thai", 4.4, 2, &["thai_restaurant"], 43.7000),
        ]
    }

    fn italian_query(location: LocationInput) -> RecommendationQuery {
        RecommendationQuery {
            location,
            profile: PreferenceProfile {
                max_distance_km: 10.0,
                cuisine_preferences: vec!["Italian".to_string()],
                price_range_preference: vec![PriceRange::Moderate],
                ..PreferenceProfile::default()
            },
            restaurant_name: None,
        }
    }

    fn engine(
        geocoder: MockGeocodingProvider,
        venues: MockVenueSearchProvider,
        llm: MockLanguageModelProvider,
    ) -> RecommendationEngine {
        RecommendationEngine::new(
            Arc::new(geocoder),
            Arc::new(venues),
            Normalizer::new(
                CuisineTable::default(),
                PhotoUrlBuilder::new("https://places.test", "k".to_string(), 400).unwrap(),
            ),
            AiRecommender::new(Arc::new(llm), Duration::from_secs(5)),
        )
    }

    fn hanover_geocoder() -> MockGeocodingProvider {
        let mut geocoder = MockGeocodingProvider::new();
        geocoder
            .expect_resolve()
            .withf(|q: &str| q == "Hanover, NH")
            .times(1)
            .returning(|_| Ok(Some(HANOVER)));
        geocoder
    }

    #[tokio::test]
    async fn test_happy_path_ranks_and_rewards_matches() {
        let mut venues = MockVenueSearchProvider::new();
        venues
            .expect_search_nearby()
            .withf(|q: &VenueSearchQuery| {
                q.center == HANOVER
                    && q.radius_meters == 10_000
                    && q.keyword.as_deref() == Some("Italian")
                    && q.min_price == Some(2)
                    && q.max_price == Some(2)
            })
            .times(1)
            .returning(|_| Ok(hanover_venues()));
        venues.expect_get_details().never();

        let mut llm = MockLanguageModelProvider::new();
        llm.expect_complete()
            .times(1)
            .returning(|_, _| Err(LlmError::Timeout(Duration::from_secs(5))));

        let result = engine(hanover_geocoder(), venues, llm)
            .get_recommendations(italian_query(LocationInput::PlaceName(
                "Hanover, NH".to_string(),
            )))
            .await
            .unwrap();

        assert_eq!(result.restaurants.count, 4);
        let results = &result.restaurants.results;
        assert!(results
            .windows(2)
            .all(|w| w[0].match_score >= w[1].match_score));

        let ramuntos = results
            .iter()
            .find(|r| r.restaurant.name == "Ramunto's Pizza")
            .unwrap();
        assert!(ramuntos
            .match_details
            .contains(&"💰 Fits your budget ($$)".to_string()));
        assert!(ramuntos.match_details.contains(&"🍝 Italian".to_string()));
        assert_eq!(results[0].restaurant.name, "Ramunto's Pizza");

        match result.ai_recommendations {
            AiRecommendations::Sections(sections) => assert_eq!(sections.top_picks.len(), 3),
            other => panic!("expected sections, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_search_short_circuits_without_ai() {
        let mut venues = MockVenueSearchProvider::new();
        venues.expect_search_nearby().times(1).returning(|_| Ok(vec![]));

        let mut llm = MockLanguageModelProvider::new();
        llm.expect_complete().never();

        let result = engine(hanover_geocoder(), venues, llm)
            .get_recommendations(italian_query(LocationInput::PlaceName(
                "Hanover, NH".to_string(),
            )))
            .await
            .unwrap();

        assert_eq!(result, RecommendationResult::empty());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "restaurants": { "count": 0, "results": [] },
                "aiRecommendations": { "message": "No restaurants found for the given criteria." }
            })
        );
    }

    #[tokio::test]
    async fn test_malformed_ai_response_degrades_to_scoring_fallback() {
        let mut venues = MockVenueSearchProvider::new();
        venues
            .expect_search_nearby()
            .times(1)
            .returning(|_| Ok(hanover_venues()));

        let mut llm = MockLanguageModelProvider::new();
        llm.expect_complete()
            .times(1)
            .returning(|_, _| Ok("Try Pine, it's great.".to_string()));

        let mut geocoder = MockGeocodingProvider::new();
        geocoder.expect_resolve().never();

        let result = engine(geocoder, venues, llm)
            .get_recommendations(italian_query(LocationInput::Coordinates(HANOVER)))
            .await
            .unwrap();

        let top_three: Vec<&str> = result.restaurants.results[..3]
            .iter()
            .map(|r| r.restaurant.name.as_str())
            .collect();
        let sections = match result.ai_recommendations {
            AiRecommendations::Sections(sections) => sections,
            other => panic!("expected sections, got {:?}", other),
        };

        assert_eq!(sections.top_picks.len(), 3);
        for (pick, name) in sections.top_picks.iter().zip(top_three) {
            assert!(pick.starts_with(&format!("- {} - ", name)), "{} vs {}", pick, name);
        }
    }

    #[tokio::test]
    async fn test_unresolvable_location_fails_before_search() {
        let mut geocoder = MockGeocodingProvider::new();
        geocoder.expect_resolve().times(1).returning(|_| Ok(None));

        let mut venues = MockVenueSearchProvider::new();
        venues.expect_search_nearby().never();

        let mut llm = MockLanguageModelProvider::new();
        llm.expect_complete().never();

        let err = engine(geocoder, venues, llm)
            .get_recommendations(italian_query(LocationInput::PlaceName(
                "Nonexistentplacexyz123".to_string(),
            )))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Geocode(_)));
    }

    #[tokio::test]
    async fn test_venue_search_failure_is_returned() {
        let mut venues = MockVenueSearchProvider::new();
        venues
            .expect_search_nearby()
            .times(1)
            .returning(|_| Err(AppError::VenueProvider("REQUEST_DENIED".to_string())));

        let mut llm = MockLanguageModelProvider::new();
        llm.expect_complete().never();

        let err = engine(MockGeocodingProvider::new(), venues, llm)
            .get_recommendations(italian_query(LocationInput::Coordinates(HANOVER)))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::VenueProvider(_)));
    }

    #[tokio::test]
    async fn test_place_details_enrich_results() {
        let mut venues = MockVenueSearchProvider::new();
        venues
            .expect_search_nearby()
            .times(1)
            .returning(|_| Ok(hanover_venues()));
        venues.expect_get_details().times(4).returning(|id| {
            if id == "p3" {
                Err(AppError::VenueProvider("NOT_FOUND".to_string()))
            } else {
                Ok(VenueDetails {
                    phone: Some(format!("603-555-{}", id)),
                    website: None,
                    opening_hours: None,
                })
            }
        });

        let mut llm = MockLanguageModelProvider::new();
        llm.expect_complete()
            .times(1)
            .returning(|_, _| Err(LlmError::EmptyContent));

        let result = engine(MockGeocodingProvider::new(), venues, llm)
            .with_place_details(2)
            .get_recommendations(italian_query(LocationInput::Coordinates(HANOVER)))
            .await
            .unwrap();

        for scored in &result.restaurants.results {
            let r = &scored.restaurant;
            if r.place_id.as_deref() == Some("p3") {
                assert_eq!(r.phone, None);
            } else {
                assert_eq!(
                    r.phone.as_deref(),
                    Some(format!("603-555-{}", r.place_id.as_deref().unwrap()).as_str())
                );
            }
        }
    }
}
