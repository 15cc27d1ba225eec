use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::instrument;

use crate::{
    catalog::dto::{BreedQuery, ImageQuery},
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/breeds", get(get_breeds))
        .route("/breeds/search/:term", get(search_breeds))
        .route("/breeds/:breed_id", get(get_breed_by_id))
        .route("/images", get(get_images))
        .route("/images/bybreedid", get(get_images_by_breed_id))
        .route("/images/:image_id", get(get_image_by_id))
}

#[instrument(skip(state))]
pub async fn get_breeds(
    State(state): State<AppState>,
    Query(query): Query<BreedQuery>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.catalog.breeds(&query).await?))
}

#[instrument(skip(state))]
pub async fn get_breed_by_id(
    State(state): State<AppState>,
    Path(breed_id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.catalog.breed_by_id(&breed_id).await?))
}

#[instrument(skip(state))]
pub async fn search_breeds(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.catalog.search_breeds(&term).await?))
}

#[instrument(skip(state))]
pub async fn get_images(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.catalog.images(&query).await?))
}

#[instrument(skip(state))]
pub async fn get_images_by_breed_id(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> ApiResult<Json<Value>> {
    if query.breed_id.as_deref().map_or(true, str::is_empty) {
        return Err(ApiError::Validation("breed_id is required".into()));
    }
    let query = ImageQuery {
        breed_id: query.breed_id,
        page: query.page,
        limit: query.limit.or(Some(10)),
        size: query.size.or_else(|| Some("medium".into())),
        mime_types: query.mime_types,
    };
    Ok(Json(state.catalog.images(&query).await?))
}

#[instrument(skip(state))]
pub async fn get_image_by_id(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.catalog.image_by_id(&image_id).await?))
}
