pub mod ai_recommender;
pub mod distance;
pub mod geocoding;
pub mod normalizer;
pub mod providers;
pub mod recommendations;
pub mod scoring;
pub mod venue_search;

pub use ai_recommender::AiRecommender;
pub use normalizer::{CuisineTable, Normalizer, PhotoUrlBuilder};
pub use recommendations::RecommendationEngine;
