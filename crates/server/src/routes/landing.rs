//! Home page content handlers.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::models::{AboutSection, HeroSlide, InstagramPost};
use crate::state::AppState;

/// Carousel slides in display order.
pub async fn hero(State(state): State<AppState>) -> Result<Json<Vec<HeroSlide>>> {
    let slides = state.catalog().hero().await?;
    Ok(Json(slides.to_vec()))
}

/// The current "about" block, or `null` if none has been written yet.
pub async fn about(State(state): State<AppState>) -> Result<Json<Option<AboutSection>>> {
    let about = state.catalog().about().await?;
    Ok(Json(about.map(|a| AboutSection::clone(&a))))
}

/// Instagram grid posts in display order.
pub async fn instagram(State(state): State<AppState>) -> Result<Json<Vec<InstagramPost>>> {
    let posts = state.catalog().instagram().await?;
    Ok(Json(posts.to_vec()))
}
