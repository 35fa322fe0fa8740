use std::cmp::Ordering;

use crate::models::{NormalizedRestaurant, PreferenceProfile, ScoredRestaurant};

/// Points awarded by each scoring component
///
/// A component whose preference list is empty awards its full weight to every
/// restaurant, so an unset preference never changes the relative order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    /// Scaled by `rating / 5`
    pub rating: f64,
    pub price: f64,
    /// Scaled by the share of cuisine preferences matched
    pub cuisine: f64,
    /// Scaled by the share of vibe preferences matched by feature tags
    pub vibe: f64,
    pub open_now: f64,
    /// Awarded at zero distance, reduced by `proximity_decay_per_km` per km, floored at 0
    pub proximity: f64,
    pub proximity_decay_per_km: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            rating: 30.0,
            price: 30.0,
            cuisine: 40.0,
            vibe: 10.0,
            open_now: 10.0,
            proximity: 20.0,
            proximity_decay_per_km: 2.0,
        }
    }
}

/// Scores a restaurant with the default weights
pub fn score(restaurant: &NormalizedRestaurant, prefs: &PreferenceProfile) -> (f64, Vec<String>) {
    score_with(restaurant, prefs, &ScoringWeights::default())
}

/// Weighted multi-criteria score plus a short reason for every component that fired
///
/// Pure: the same inputs always produce the same score and the same reasons in the
/// same order.
pub fn score_with(
    restaurant: &NormalizedRestaurant,
    prefs: &PreferenceProfile,
    weights: &ScoringWeights,
) -> (f64, Vec<String>) {
    let mut total = 0.0;
    let mut details = Vec::new();

    if let Some(rating) = restaurant.rating {
        total += (rating / 5.0) * weights.rating;
        details.push(rating_detail(rating));
    }

    if prefs.price_range_preference.is_empty() {
        total += weights.price;
    } else if let Some(price) = restaurant
        .price_range
        .filter(|p| prefs.price_range_preference.contains(p))
    {
        total += weights.price;
        details.push(format!("💰 Fits your budget ({})", price));
    }

    if prefs.cuisine_preferences.is_empty() {
        total += weights.cuisine;
    } else {
        let matched = matching(&prefs.cuisine_preferences, &restaurant.cuisine_types);
        if !matched.is_empty() {
            total += weights.cuisine * share(matched.len(), prefs.cuisine_preferences.len());
            details.push(format!("🍝 {}", matched.join(", ")));
        }
    }

    if prefs.vibe_preferences.is_empty() {
        total += weights.vibe;
    } else {
        let matched = matching(&prefs.vibe_preferences, &restaurant.features);
        if !matched.is_empty() {
            total += weights.vibe * share(matched.len(), prefs.vibe_preferences.len());
            details.push(format!("✨ {}", matched.join(", ")));
        }
    }

    if restaurant.is_open_now {
        total += weights.open_now;
        details.push("🕒 Open now".to_string());
    }

    let proximity =
        (weights.proximity - weights.proximity_decay_per_km * restaurant.distance_km).max(0.0);
    if proximity > 0.0 {
        total += proximity;
        details.push(distance_detail(restaurant.distance_km));
    }

    (total, details)
}

/// Scores every restaurant and sorts the result best-first
pub fn rank(restaurants: Vec<NormalizedRestaurant>, prefs: &PreferenceProfile) -> Vec<ScoredRestaurant> {
    let mut scored: Vec<ScoredRestaurant> = restaurants
        .into_iter()
        .map(|restaurant| {
            let (match_score, match_details) = score(&restaurant, prefs);
            ScoredRestaurant {
                restaurant,
                match_score,
                match_details,
            }
        })
        .collect();

    scored.sort_by(compare);
    scored
}

/// Descending score, then descending rating (unrated last), then ascending distance
pub fn compare(a: &ScoredRestaurant, b: &ScoredRestaurant) -> Ordering {
    b.match_score
        .total_cmp(&a.match_score)
        .then_with(|| rating_key(b).total_cmp(&rating_key(a)))
        .then_with(|| a.restaurant.distance_km.total_cmp(&b.restaurant.distance_km))
}

fn rating_key(scored: &ScoredRestaurant) -> f64 {
    scored.restaurant.rating.unwrap_or(f64::NEG_INFINITY)
}

/// Restaurant labels matching any preference, case-insensitively, one per matched preference
fn matching(preferences: &[String], labels: &[String]) -> Vec<String> {
    let mut matched: Vec<String> = Vec::new();
    for preference in preferences {
        let wanted = preference.to_lowercase();
        if let Some(label) = labels.iter().find(|l| l.to_lowercase() == wanted) {
            if !matched.contains(label) {
                matched.push(label.clone());
            }
        }
    }
    matched
}

fn share(matched: usize, wanted: usize) -> f64 {
    matched as f64 / wanted as f64
}

fn rating_detail(rating: f64) -> String {
    if rating >= 4.5 {
        format!("⭐ Highly rated {}/5", rating)
    } else if rating >= 4.0 {
        format!("⭐ Well rated {}/5", rating)
    } else {
        format!("⭐ Rated {}/5", rating)
    }
}

fn distance_detail(distance_km: f64) -> String {
    if distance_km < 1.0 {
        format!("📍 Very close ({:.1} km)", distance_km)
    } else if distance_km < 3.0 {
        format!("📍 Close by ({:.1} km)", distance_km)
    } else {
        format!("📍 {:.1} km away", distance_km)
    }
}
