use crate::{
    error::{AppError, AppResult},
    models::{Location, LocationInput},
    services::providers::GeocodingProvider,
};

/// Resolves a free-text place name to coordinates
///
/// The query is sent to the provider unchanged. A blank name is rejected and no match
/// is a [`AppError::Geocode`].
pub async fn geocode(provider: &dyn GeocodingProvider, place_name: &str) -> AppResult<Location> {
    if place_name.trim().is_empty() {
        return Err(AppError::InvalidInput("location must not be empty".to_string()));
    }

    match provider.resolve(place_name).await? {
        Some(location) => {
            tracing::info!(place = %place_name, location = %location, "Geocoded location");
            Ok(location)
        }
        None => {
            tracing::warn!(place = %place_name, "Geocoding found no match");
            Err(AppError::Geocode(format!(
                "could not resolve location '{}'",
                place_name
            )))
        }
    }
}

/// Coordinates pass through untouched; place names go through the geocoder
pub async fn resolve_location(
    provider: &dyn GeocodingProvider,
    input: &LocationInput,
) -> AppResult<Location> {
    match input {
        LocationInput::Coordinates(location) => {
            location.validate()?;
            Ok(*location)
        }
        LocationInput::PlaceName(name) => geocode(provider, name).await,
    }
}
