//! LLM-assisted top-3 narrative with a deterministic fallback
//!
//! The model is asked for exactly three numbered sections of exactly three `-` bullets:
//!
//! ```text
//! 1. TOP RECOMMENDATIONS
//! - ...            (x3)
//! 2. MATCH EXPLANATIONS
//! - ...            (x3)
//! 3. ADDITIONAL SUGGESTIONS
//! - ...            (x3)
//! ```
//!
//! Anything else (provider error, timeout, wrong section order, wrong bullet count)
//! switches to [`fallback_recommendations`], which ranks with the scoring engine.
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::{
    error::LlmError,
    models::{NormalizedRestaurant, PreferenceProfile, RecommendationSections, ScoredRestaurant},
    services::{providers::LanguageModelProvider, scoring},
};

const SECTION_COUNT: usize = 3;
const BULLETS_PER_SECTION: usize = 3;
const ALTERNATIVE_MIN_RATING: f64 = 4.0;

pub const SYSTEM_PROMPT: &str = "You are an expert restaurant concierge who specializes in \
personalized recommendations. Consider atmosphere, price, location, and reviews. Follow the \
requested output format exactly.";

/// Why a model response was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiParseError {
    #[error("response contains no numbered sections")]
    NoSections,

    #[error("expected section {expected}, found section {found}")]
    UnexpectedSection { expected: usize, found: usize },

    #[error("section {0} is missing")]
    MissingSection(usize),

    #[error("unexpected extra section {0}")]
    ExtraSection(usize),

    #[error("section {section} has {found} bullet lines, expected 3")]
    BulletCount { section: usize, found: usize },
}

/// Splits a model response into its three sections
///
/// Grammar: optional preamble, then section headers `1.`, `2.`, `3.` in order (leading
/// `#`/`*` markdown is ignored), each followed by exactly three lines starting with `-`.
/// Other lines inside a section are ignored. Bullets keep their leading `-`.
pub fn try_parse_ai_response(text: &str) -> Result<RecommendationSections, AiParseError> {
    let mut sections: Vec<Vec<String>> = Vec::with_capacity(SECTION_COUNT);

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(number) = section_number(line) {
            if number > SECTION_COUNT {
                return Err(AiParseError::ExtraSection(number));
            }
            let expected = sections.len() + 1;
            if number != expected {
                return Err(AiParseError::UnexpectedSection {
                    expected,
                    found: number,
                });
            }
            sections.push(Vec::new());
            continue;
        }

        if line.starts_with('-') {
            if let Some(current) = sections.last_mut() {
                current.push(line.to_string());
            }
        }
    }

    if sections.is_empty() {
        return Err(AiParseError::NoSections);
    }
    if sections.len() < SECTION_COUNT {
        return Err(AiParseError::MissingSection(sections.len() + 1));
    }
    for (index, bullets) in sections.iter().enumerate() {
        if bullets.len() != BULLETS_PER_SECTION {
            return Err(AiParseError::BulletCount {
                section: index + 1,
                found: bullets.len(),
            });
        }
    }

    let mut sections = sections.into_iter();
    Ok(RecommendationSections {
        top_picks: sections.next().unwrap_or_default(),
        explanations: sections.next().unwrap_or_default(),
        additional_suggestions: sections.next().unwrap_or_default(),
    })
}

/// `Some(n)` when the line opens numbered section `n` (e.g. `"2. MATCH EXPLANATIONS"`)
fn section_number(line: &str) -> Option<usize> {
    let line = line.trim_start_matches(['#', '*', ' ']);
    let digits_end = line.find(|c: char| !c.is_ascii_digit())?;
    let rest = line[digits_end..].strip_prefix('.')?;
    if digits_end == 0 || !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        return None;
    }
    line[..digits_end].parse().ok()
}

/// Condensed restaurant view sent to the model
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptRestaurant<'a> {
    name: &'a str,
    rating: Option<f64>,
    review_count: u32,
    price_range: &'a str,
    features: &'a [String],
    cuisine_types: &'a [String],
    distance: String,
    is_open_now: bool,
}

fn or_any(values: &[String], separator: &str) -> String {
    if values.is_empty() {
        "Any".to_string()
    } else {
        values.join(separator)
    }
}

fn or_unspecified(value: &str) -> &str {
    if value.is_empty() {
        "Not specified"
    } else {
        value
    }
}

/// User prompt with the restaurant list and the preference summary
pub fn build_user_prompt(restaurants: &[NormalizedRestaurant], prefs: &PreferenceProfile) -> String {
    let condensed: Vec<PromptRestaurant> = restaurants
        .iter()
        .map(|r| PromptRestaurant {
            name: &r.name,
            rating: r.rating,
            review_count: r.review_count,
            price_range: r.price_label(),
            features: &r.features,
            cuisine_types: &r.cuisine_types,
            distance: format!("{:.2} km", r.distance_km),
            is_open_now: r.is_open_now,
        })
        .collect();
    let restaurants_json =
        serde_json::to_string_pretty(&condensed).unwrap_or_else(|_| "[]".to_string());

    let prices: Vec<String> = prefs
        .price_range_preference
        .iter()
        .map(|p| p.to_string())
        .collect();

    format!(
        "Analyze these restaurants and provide EXACTLY 3 recommendations in this format:

1. TOP RECOMMENDATIONS (exactly 3 lines starting with -)
- [Name] - [Price] - [Features] - [Distance]
- [Name] - [Price] - [Features] - [Distance]
- [Name] - [Price] - [Features] - [Distance]

2. MATCH EXPLANATIONS (exactly 3 lines starting with -)
- [First restaurant explanation]
- [Second restaurant explanation]
- [Third restaurant explanation]

3. ADDITIONAL SUGGESTIONS (exactly 3 lines starting with -)
- Best time to visit: [suggestion]
- Alternative options: [2-3 other restaurants]
- Special tips: [relevant advice]

Restaurants to analyze:
{restaurants_json}

User preferences:
- Cuisine: {cuisine}
- Restaurant type: {restaurant_type}
- Atmosphere: {vibe}
- Price: {price}
- Dietary needs: {dietary}
- Rating: {rating}+
- Distance: {distance}km max
- Party size: {people}
- Occasion: {occasion}
- Date and time: {date} {time}
- Transport: {transport}",
        cuisine = or_any(&prefs.cuisine_preferences, ", "),
        restaurant_type = or_any(&prefs.restaurant_type, ", "),
        vibe = or_any(&prefs.vibe_preferences, ", "),
        price = or_any(&prices, " to "),
        dietary = or_any(&prefs.dietary_restrictions, ", "),
        rating = prefs.minimum_rating,
        distance = prefs.max_distance_km,
        people = prefs.people,
        occasion = or_unspecified(&prefs.occasion),
        date = or_unspecified(&prefs.date),
        time = prefs.time,
        transport = or_unspecified(&prefs.transport),
    )
}

/// Deterministic three-section narrative built from the scoring engine's ranking
pub fn fallback_recommendations(
    restaurants: &[NormalizedRestaurant],
    prefs: &PreferenceProfile,
) -> RecommendationSections {
    let ranked = scoring::rank(restaurants.to_vec(), prefs);
    let top: Vec<&ScoredRestaurant> = ranked.iter().take(BULLETS_PER_SECTION).collect();

    let top_picks = top
        .iter()
        .map(|s| {
            let r = &s.restaurant;
            let features = if r.features.is_empty() {
                "No special features".to_string()
            } else {
                r.features.join(", ")
            };
            format!(
                "- {} - {} - {} - {:.2} km",
                r.name,
                r.price_label(),
                features,
                r.distance_km
            )
        })
        .collect();

    let explanations = top
        .iter()
        .map(|s| {
            let r = &s.restaurant;
            if s.match_details.is_empty() {
                format!(
                    "- {} matches with {} rating, {} price range, and {:.2} km distance",
                    r.name,
                    r.rating
                        .map(|x| format!("{}/5", x))
                        .unwrap_or_else(|| "no".to_string()),
                    r.price_label(),
                    r.distance_km
                )
            } else {
                format!("- {}: {}", r.name, s.match_details.join("; "))
            }
        })
        .collect();

    let additional_suggestions = match top.first() {
        Some(best) => vec![
            format!("- Best time to visit: {}", visit_time_suggestion(&best.restaurant)),
            format!("- Alternative options: {}", alternatives(&ranked)),
            format!("- Special tips: {}", special_tip(&best.restaurant)),
        ],
        None => Vec::new(),
    };

    RecommendationSections {
        top_picks,
        explanations,
        additional_suggestions,
    }
}

fn visit_time_suggestion(restaurant: &NormalizedRestaurant) -> &'static str {
    if restaurant.price_range.is_some_and(|p| p.level() >= 3) {
        "Dinner hours (6-9pm) for best atmosphere"
    } else {
        "Lunch hours (11:30am-2pm) for better value"
    }
}

fn alternatives(ranked: &[ScoredRestaurant]) -> String {
    let names: Vec<&str> = ranked
        .iter()
        .skip(BULLETS_PER_SECTION)
        .filter(|s| s.restaurant.rating.is_some_and(|r| r >= ALTERNATIVE_MIN_RATING))
        .take(2)
        .map(|s| s.restaurant.name.as_str())
        .collect();

    if names.is_empty() {
        "No similar alternatives found".to_string()
    } else {
        names.join(" or ")
    }
}

fn special_tip(restaurant: &NormalizedRestaurant) -> &'static str {
    let has = |feature: &str| restaurant.features.iter().any(|f| f == feature);
    if has("Fine Dining") {
        "Reservations recommended"
    } else if has("Top Rated") || has("Well Rated") {
        "Popular spot, might have wait times during peak hours"
    } else {
        "Call ahead to check current wait times"
    }
}

/// Asks the language model for a narrative ranking; never fails
#[derive(Clone)]
pub struct AiRecommender {
    provider: Arc<dyn LanguageModelProvider>,
    timeout: Duration,
}

impl AiRecommender {
    pub fn new(provider: Arc<dyn LanguageModelProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn recommend(
        &self,
        restaurants: &[NormalizedRestaurant],
        prefs: &PreferenceProfile,
    ) -> RecommendationSections {
        match self.try_recommend(restaurants, prefs).await {
            Ok(sections) => {
                tracing::info!(source = "llm", "AI recommendations parsed");
                sections
            }
            Err(reason) => {
                tracing::warn!(
                    reason = %reason,
                    candidates = restaurants.len(),
                    "AI recommendations unavailable, using scoring fallback"
                );
                fallback_recommendations(restaurants, prefs)
            }
        }
    }

    async fn try_recommend(
        &self,
        restaurants: &[NormalizedRestaurant],
        prefs: &PreferenceProfile,
    ) -> Result<RecommendationSections, AiFailure> {
        let user_prompt = build_user_prompt(restaurants, prefs);

        let text = tokio::time::timeout(self.timeout, self.provider.complete(SYSTEM_PROMPT, &user_prompt))
            .await
            .map_err(|_| AiFailure::Provider(LlmError::Timeout(self.timeout)))?
            .map_err(AiFailure::Provider)?;

        try_parse_ai_response(&text).map_err(AiFailure::Parse)
    }
}

#[derive(Debug, thiserror::Error)]
enum AiFailure {
    #[error("provider error: {0}")]
    Provider(LlmError),

    #[error("unparseable response: {0}")]
    Parse(AiParseError),
}
