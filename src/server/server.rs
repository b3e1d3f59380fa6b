use anyhow::Result;
use std::time::{Duration, Instant};

use tracing::error;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::state::{ServerState, SharedCatalogStore, SharedInteractionStore};
use crate::discovery_store::{MusicItem, StoreError};

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

/// Maps typed store failures to status codes; anything untyped is a storage
/// failure the caller cannot act on.
fn error_response(err: anyhow::Error) -> Response {
    match err.downcast_ref::<StoreError>() {
        Some(StoreError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, format!("{}", err)).into_response()
        }
        Some(StoreError::RatingConflict { .. }) | Some(StoreError::MusicConflict { .. }) => {
            (StatusCode::CONFLICT, format!("{}", err)).into_response()
        }
        None => {
            error!("Storage failure: {:?}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub music_count: usize,
    pub mention_count: usize,
    pub rating_count: usize,
    pub listen_click_count: usize,
}

async fn home(State(state): State<ServerState>) -> Response {
    match state.catalog.get_stats() {
        Ok(stats) => Json(ServerStats {
            uptime: format_uptime(state.start_time.elapsed()),
            music_count: stats.music_count,
            mention_count: stats.mention_count,
            rating_count: stats.rating_count,
            listen_click_count: stats.listen_click_count,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

// =============================================================================
// Music routes
// =============================================================================

/// A catalog item with its cross-signal discovery aggregates, as served by
/// the top-level listing.
#[derive(Serialize)]
struct MusicListing {
    #[serde(flatten)]
    item: MusicItem,
    rating_sum: i64,
    rating_count: usize,
    not_heard_before_count: usize,
    heard_not_rated_count: usize,
}

fn build_music_listings(state: &ServerState) -> Result<Vec<MusicListing>> {
    let mut listings = Vec::new();
    for item in state.catalog.get_all_music()? {
        let rating_sum = state.interactions.get_sum_total_rating_for_music(item.id)?;
        let rating_count = state.interactions.get_rating_count_for_music(item.id)?;
        let not_heard_before_count = state.interactions.get_not_heard_before_count(item.id)?;
        let heard_not_rated_count = state.interactions.get_heard_not_rated_count(item.id)?;
        listings.push(MusicListing {
            item,
            rating_sum,
            rating_count,
            not_heard_before_count,
            heard_not_rated_count,
        });
    }
    // Rating descending; ties go to the more widely heard item. The engine
    // itself imposes no order, the listing does.
    listings.sort_by(|a, b| {
        b.rating_sum
            .cmp(&a.rating_sum)
            .then(a.not_heard_before_count.cmp(&b.not_heard_before_count))
    });
    Ok(listings)
}

async fn get_all_music(State(state): State<ServerState>) -> Response {
    match build_music_listings(&state) {
        Ok(listings) => Json(listings).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
struct CreateMusicBody {
    pub title: String,
    pub album: String,
    pub artist: String,
    pub listen_link: String,
}

async fn create_music(
    State(catalog): State<SharedCatalogStore>,
    Json(body): Json<CreateMusicBody>,
) -> Response {
    match catalog.create_music(&body.title, &body.album, &body.artist, &body.listen_link) {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
struct MusicKeyQuery {
    pub title: String,
    pub artist: String,
}

#[derive(Serialize)]
struct ExistsResponse {
    exists: bool,
}

async fn check_music(
    State(catalog): State<SharedCatalogStore>,
    Query(query): Query<MusicKeyQuery>,
) -> Response {
    match catalog.find_by_title_and_artist(&query.title, &query.artist) {
        Ok(found) => Json(ExistsResponse {
            exists: found.is_some(),
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
struct TitleQuery {
    pub title: String,
}

async fn music_details(
    State(catalog): State<SharedCatalogStore>,
    Query(query): Query<TitleQuery>,
) -> Response {
    match catalog.get_by_title(&query.title) {
        Ok(Some(item)) => Json(item).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => error_response(err),
    }
}

// =============================================================================
// Mention routes
// =============================================================================

#[derive(Deserialize)]
struct PairQuery {
    pub user_id: i64,
    pub music_id: i64,
}

#[derive(Deserialize)]
struct MusicIdQuery {
    pub music_id: i64,
}

#[derive(Deserialize)]
struct RecordMentionBody {
    pub user_id: i64,
    pub music_id: i64,
    pub heard_before: bool,
}

async fn record_mention(
    State(interactions): State<SharedInteractionStore>,
    Json(body): Json<RecordMentionBody>,
) -> Response {
    match interactions.record_mention(body.user_id, body.music_id, body.heard_before) {
        Ok(mention) => (StatusCode::CREATED, Json(mention)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn check_mention(
    State(interactions): State<SharedInteractionStore>,
    Query(query): Query<PairQuery>,
) -> Response {
    match interactions.check_mention(query.user_id, query.music_id) {
        Ok(state) => Json(serde_json::json!({ "state": state })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn not_mentioned_music(
    State(interactions): State<SharedInteractionStore>,
    Path(user_id): Path<i64>,
) -> Response {
    match interactions.get_not_mentioned_music(user_id) {
        Ok(items) => Json(items).into_response(),
        Err(err) => error_response(err),
    }
}

async fn not_heard_before_music(
    State(interactions): State<SharedInteractionStore>,
    Path(user_id): Path<i64>,
) -> Response {
    match interactions.get_not_heard_before_music(user_id) {
        Ok(items) => Json(items).into_response(),
        Err(err) => error_response(err),
    }
}

async fn not_heard_before_count(
    State(interactions): State<SharedInteractionStore>,
    Query(query): Query<MusicIdQuery>,
) -> Response {
    match interactions.get_not_heard_before_count(query.music_id) {
        Ok(count) => Json(serde_json::json!({ "count": count })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn heard_not_rated_count(
    State(interactions): State<SharedInteractionStore>,
    Query(query): Query<MusicIdQuery>,
) -> Response {
    match interactions.get_heard_not_rated_count(query.music_id) {
        Ok(count) => Json(serde_json::json!({ "count": count })).into_response(),
        Err(err) => error_response(err),
    }
}

// =============================================================================
// Rating routes
// =============================================================================

#[derive(Deserialize)]
struct RatingBody {
    pub user_id: i64,
    pub music_id: i64,
    pub rating: i64,
}

async fn create_rating(
    State(interactions): State<SharedInteractionStore>,
    Json(body): Json<RatingBody>,
) -> Response {
    match interactions.create_rating(body.user_id, body.music_id, body.rating) {
        Ok(rating) => (StatusCode::CREATED, Json(rating)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn edit_rating(
    State(interactions): State<SharedInteractionStore>,
    Json(body): Json<RatingBody>,
) -> Response {
    match interactions.edit_rating(body.user_id, body.music_id, body.rating) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err),
    }
}

async fn check_rating(
    State(interactions): State<SharedInteractionStore>,
    Query(query): Query<PairQuery>,
) -> Response {
    match interactions.get_rating(query.user_id, query.music_id) {
        Ok(Some(rating)) => {
            Json(serde_json::json!({ "rated": true, "rating": rating.rating })).into_response()
        }
        Ok(None) => Json(serde_json::json!({ "rated": false })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn not_rated_music(
    State(interactions): State<SharedInteractionStore>,
    Path(user_id): Path<i64>,
) -> Response {
    match interactions.get_not_rated_music(user_id) {
        Ok(items) => Json(items).into_response(),
        Err(err) => error_response(err),
    }
}

async fn rating_count(
    State(interactions): State<SharedInteractionStore>,
    Query(query): Query<MusicIdQuery>,
) -> Response {
    match interactions.get_rating_count_for_music(query.music_id) {
        Ok(count) => Json(serde_json::json!({ "count": count })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn rating_sum(
    State(interactions): State<SharedInteractionStore>,
    Query(query): Query<MusicIdQuery>,
) -> Response {
    match interactions.get_sum_total_rating_for_music(query.music_id) {
        Ok(sum) => Json(serde_json::json!({ "sum_total": sum })).into_response(),
        Err(err) => error_response(err),
    }
}

// =============================================================================
// Listen click routes
// =============================================================================

#[derive(Deserialize)]
struct ListenClickBody {
    pub user_id: i64,
    pub music_id: i64,
}

async fn record_listen_click(
    State(interactions): State<SharedInteractionStore>,
    Json(body): Json<ListenClickBody>,
) -> Response {
    match interactions.record_listen_click(body.user_id, body.music_id) {
        Ok(click) => (StatusCode::CREATED, Json(click)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn purge_listen_clicks(
    State(interactions): State<SharedInteractionStore>,
    Path(user_id): Path<i64>,
) -> Response {
    match interactions.purge_listen_clicks(user_id) {
        Ok(deleted) => Json(serde_json::json!({ "deleted": deleted })).into_response(),
        Err(err) => error_response(err),
    }
}

fn make_app(catalog: SharedCatalogStore, interactions: SharedInteractionStore) -> Router {
    let state = ServerState {
        start_time: Instant::now(),
        catalog,
        interactions,
    };

    let music_routes: Router = Router::new()
        .route("/", get(get_all_music))
        .route("/", post(create_music))
        .route("/check", get(check_music))
        .route("/details", get(music_details))
        .with_state(state.clone());

    let mention_routes: Router = Router::new()
        .route("/", post(record_mention))
        .route("/check", get(check_mention))
        .route("/not-mentioned/{user_id}", get(not_mentioned_music))
        .route("/not-heard-before/{user_id}", get(not_heard_before_music))
        .route("/not-heard-before-count", get(not_heard_before_count))
        .route("/heard-not-rated-count", get(heard_not_rated_count))
        .with_state(state.clone());

    let rating_routes: Router = Router::new()
        .route("/", post(create_rating))
        .route("/edit", post(edit_rating))
        .route("/check", get(check_rating))
        .route("/not-rated/{user_id}", get(not_rated_music))
        .route("/count", get(rating_count))
        .route("/sum", get(rating_sum))
        .with_state(state.clone());

    let listen_routes: Router = Router::new()
        .route("/", post(record_listen_click))
        .route("/{user_id}", delete(purge_listen_clicks))
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .with_state(state)
        .nest("/v1/music", music_routes)
        .nest("/v1/mentions", mention_routes)
        .nest("/v1/ratings", rating_routes)
        .nest("/v1/listens", listen_routes)
}

pub async fn run_server(
    catalog: SharedCatalogStore,
    interactions: SharedInteractionStore,
    port: u16,
) -> Result<()> {
    let app = make_app(catalog, interactions);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
