use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::jwt::AuthIdentity,
    domain::Ride,
    error::ApiError,
    state::AppState,
};

use super::dto::{
    EstimateFareBody, FareEstimateResponse, NearbyDriversResponse, RequestRideBody, RideResponse,
    UpdateStatusBody,
};
use super::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rides/request", post(request_ride))
        .route("/rides/estimate_fare", post(estimate_fare))
        .route("/rides/:ride_id", get(get_ride_details))
        .route("/rides/:ride_id/accept", post(accept_ride))
        .route("/rides/:ride_id/status", put(update_ride_status))
        .route("/drivers/nearby", get(get_nearby_drivers))
}

#[instrument(skip(state, body))]
pub async fn request_ride(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(body): Json<RequestRideBody>,
) -> Result<(StatusCode, Json<RideResponse>), ApiError> {
    let ride = services::request_ride(
        &state,
        identity,
        &body.pickup_location,
        &body.dropoff_location,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(RideResponse {
            message: "Ride requested successfully".into(),
            ride,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_ride_details(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(ride_id): Path<i64>,
) -> Result<Json<Ride>, ApiError> {
    let ride = services::ride_details(&state, identity, ride_id).await?;
    Ok(Json(ride))
}

#[instrument(skip(state))]
pub async fn accept_ride(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(ride_id): Path<i64>,
) -> Result<Json<RideResponse>, ApiError> {
    let ride = services::accept_ride(&state, identity, ride_id).await?;
    Ok(Json(RideResponse {
        message: "Ride accepted successfully".into(),
        ride,
    }))
}

#[instrument(skip(state, body))]
pub async fn update_ride_status(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(ride_id): Path<i64>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<RideResponse>, ApiError> {
    let ride = services::update_ride_status(&state, identity, ride_id, &body.status).await?;
    Ok(Json(RideResponse {
        message: format!("Ride status updated to {}", ride.status),
        ride,
    }))
}

#[instrument(skip(state))]
pub async fn get_nearby_drivers(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<NearbyDriversResponse>, ApiError> {
    let available_drivers = services::nearby_drivers(&state, identity).await?;
    Ok(Json(NearbyDriversResponse { available_drivers }))
}

#[instrument(skip(state, body))]
pub async fn estimate_fare(
    State(state): State<AppState>,
    AuthIdentity(_identity): AuthIdentity,
    Json(body): Json<EstimateFareBody>,
) -> Result<Json<FareEstimateResponse>, ApiError> {
    let estimate =
        services::estimate_fare(&state, &body.pickup_location, &body.dropoff_location)?;
    Ok(Json(FareEstimateResponse {
        pickup_location: body.pickup_location,
        dropoff_location: body.dropoff_location,
        estimated_fare_rand: format!("R{estimate:.2}"),
        currency: "ZAR".into(),
        note: "This is a mock estimation. Actual fare may vary.".into(),
    }))
}
