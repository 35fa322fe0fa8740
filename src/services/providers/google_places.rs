//! Google Maps Platform provider
//!
//! Implements both geocoding and venue search against the Google web service APIs:
//! 1. Geocoding: `geocode/json?address=...` → first result's coordinates
//! 2. Nearby search: `place/nearbysearch/json` → candidate restaurants
//! 3. Details: `place/details/json` → phone, website, opening hours
//!
//! Google reports most failures as HTTP 200 with a non-OK `status` field, so both the
//! HTTP status and the body status are checked.
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::{
        places::{GeocodeResponse, PlaceDetailsResponse, PlacesSearchResponse},
        Location, RawVenue, VenueDetails,
    },
    services::providers::{with_retry, GeocodingProvider, VenueSearchProvider, VenueSearchQuery},
};

const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";
const SEARCH_TYPE: &str = "restaurant";
const DETAIL_FIELDS: &str = "formatted_phone_number,website,opening_hours";

#[derive(Clone)]
pub struct GooglePlacesProvider {
    http_client: HttpClient,
    api_key: String,
    geocode_url: String,
    places_url: String,
    max_retries: u32,
}

impl GooglePlacesProvider {
    /// Creates a provider whose every request is bounded by `timeout`
    pub fn new(
        api_key: String,
        geocode_url: String,
        places_url: String,
        timeout: Duration,
        max_retries: u32,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            geocode_url,
            places_url: places_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    async fn geocode_once(&self, query: &str) -> AppResult<GeocodeResponse> {
        let response = self
            .http_client
            .get(&self.geocode_url)
            .query(&[("address", query), ("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn nearby_once(&self, query: &VenueSearchQuery) -> AppResult<PlacesSearchResponse> {
        let url = format!("{}/nearbysearch/json", self.places_url);

        let mut params: Vec<(&str, String)> = vec![
            ("location", query.center.to_string()),
            ("radius", query.radius_meters.to_string()),
            ("type", SEARCH_TYPE.to_string()),
        ];
        if let Some(keyword) = &query.keyword {
            params.push(("keyword", keyword.clone()));
        }
        if let Some(min_price) = query.min_price {
            params.push(("minprice", min_price.to_string()));
        }
        if let Some(max_price) = query.max_price {
            params.push(("maxprice", max_price.to_string()));
        }

        tracing::debug!(params = ?params, "Places nearby search");
        params.push(("key", self.api_key.clone()));

        let response = self
            .http_client
            .get(&url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn details_once(&self, place_id: &str) -> AppResult<PlaceDetailsResponse> {
        let url = format!("{}/details/json", self.places_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

/// Transport failures from the places endpoints surface as venue-provider errors
fn venue_error(e: AppError) -> AppError {
    match e {
        AppError::HttpClient(err) => AppError::VenueProvider(format!("Places request failed: {}", err)),
        other => other,
    }
}

#[async_trait::async_trait]
impl GeocodingProvider for GooglePlacesProvider {
    async fn resolve(&self, query: &str) -> AppResult<Option<Location>> {
        let response =
            with_retry("geocode", self.max_retries, move || self.geocode_once(query)).await?;

        match response.status.as_str() {
            STATUS_OK => Ok(response.results.first().map(|r| r.geometry.location)),
            STATUS_ZERO_RESULTS => Ok(None),
            status => Err(AppError::Geocode(format!(
                "\"{}\" returned status {}{}",
                query,
                status,
                response
                    .error_message
                    .map(|m| format!(" ({})", m))
                    .unwrap_or_default()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl VenueSearchProvider for GooglePlacesProvider {
    async fn search_nearby(&self, query: &VenueSearchQuery) -> AppResult<Vec<RawVenue>> {
        let response = with_retry("places_nearby", self.max_retries, move || {
            self.nearby_once(query)
        })
        .await
        .map_err(venue_error)?;

        match response.status.as_str() {
            STATUS_OK | STATUS_ZERO_RESULTS => {
                tracing::info!(
                    results = response.results.len(),
                    provider = "google_places",
                    "Nearby search completed"
                );
                Ok(response.results)
            }
            status => Err(AppError::VenueProvider(format!(
                "Places API returned status {}: {}",
                status,
                response.error_message.unwrap_or_default()
            ))),
        }
    }

    async fn get_details(&self, place_id: &str) -> AppResult<VenueDetails> {
        let response = with_retry("place_details", self.max_retries, move || {
            self.details_once(place_id)
        })
        .await
        .map_err(venue_error)?;

        if response.status != STATUS_OK {
            return Err(AppError::VenueProvider(format!(
                "Place details returned status {}: {}",
                response.status,
                response.error_message.unwrap_or_default()
            )));
        }

        Ok(response.result.unwrap_or_default())
    }
}
