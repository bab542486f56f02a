use crate::{
    api::{
        error::ApiError,
        response::{with_status, with_total_count, ApiResponse},
    },
    blockchain::IndexerError,
    state::AppState,
    validation::{validate_address_action, validate_solana_address},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

// POST /track query parameters
#[derive(Deserialize)]
pub struct TrackQuery {
    address: String,
    action: String,
}

// GET /swaps query parameters
#[derive(Deserialize)]
pub struct SwapsQuery {
    address: String,
    mint: String,
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/track", post(track_address))
        .route("/accounts/{address}", get(get_account))
        .route("/accounts/{address}/backfill", post(start_backfill))
        .route("/swaps", get(get_swaps))
        .with_state(app_state)
}

// POST /track handler
async fn track_address(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrackQuery>,
) -> Result<Response, ApiError> {
    let action = params.action.to_lowercase();
    info!("Processing track request for address: {}, action: {}", params.address, action);

    validate_address_action(&params.address, &action)?;

    if action == "add" {
        let watch = state.indexer.add_account_to_watch(&params.address).await?;
        info!("Added address {} to watch list", params.address);
        return Ok(with_status(StatusCode::CREATED, watch));
    }

    if state.store.remove_account(&params.address).await? {
        info!("Removed address {} from watch list", params.address);
        Ok((StatusCode::OK, "Address removed from watch list").into_response())
    } else {
        Ok((StatusCode::OK, "Address was not being watched").into_response())
    }
}

// GET /accounts/{address} handler
async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    validate_solana_address(&address)?;

    match state.store.get_account_cursors(&address).await? {
        Some(watch) => Ok(ApiResponse { data: watch }.into_response()),
        None => Err(ApiError::NotFound("Address is not being watched".to_string())),
    }
}

// POST /accounts/{address}/backfill handler
async fn start_backfill(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    validate_solana_address(&address)?;

    let watch = state
        .store
        .get_account_cursors(&address)
        .await?
        .ok_or_else(|| ApiError::NotFound("Address is not being watched".to_string()))?;

    if watch.backfill_complete {
        return Ok(with_status(StatusCode::OK, watch));
    }
    if state.indexer.is_backfilling(&address) {
        return Err(ApiError::Conflict(format!("Backfill already running for {}", address)));
    }

    let indexer = state.indexer.clone();
    let shutdown = state.shutdown.child_token();
    let task_address = address.clone();
    tokio::spawn(async move {
        match indexer.backfill_with_shutdown(&task_address, &shutdown).await {
            Ok(_) | Err(IndexerError::BackfillRunning(_)) => {}
            Err(e) => error!("Backfill failed for {}: {}", task_address, e),
        }
    });

    info!("Backfill started for {}", address);
    Ok(with_status(StatusCode::ACCEPTED, watch))
}

// GET /swaps handler
async fn get_swaps(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SwapsQuery>,
) -> Result<Response, ApiError> {
    validate_solana_address(&params.address)?;
    if params.mint.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing parameter: mint".to_string()));
    }

    let swaps = state.store.get_swap_history(&params.address, &params.mint).await?;
    let count = swaps.len();

    Ok(with_total_count(swaps, count))
}
