use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::jwt::AuthIdentity,
    domain::{DriverScore, IncidentReport},
    error::ApiError,
    state::AppState,
};

use super::dto::{
    DriverEventsResponse, EventFilter, EventResponse, IncidentFilter, IncidentResponse,
    IncidentsResponse, LogEventBody, LogIncidentBody, ScoreUpdateResponse, UpdateIncidentBody,
    UpdateScoreBody,
};
use super::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(log_driving_event))
        .route("/drivers/:driver_id/events", get(get_driver_events))
        .route(
            "/drivers/:driver_id/score",
            get(get_driver_score).put(update_driver_score),
        )
        .route("/incidents", post(log_incident_report).get(get_all_incidents))
        .route(
            "/incidents/:report_id",
            get(get_incident_report).put(update_incident_report),
        )
}

#[instrument(skip(state, body))]
pub async fn log_driving_event(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(body): Json<LogEventBody>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let event = services::log_driving_event(&state, identity, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(EventResponse {
            message: "Driving event logged successfully".into(),
            event,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_driver_events(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(driver_id): Path<i64>,
    Query(filter): Query<EventFilter>,
) -> Result<Json<DriverEventsResponse>, ApiError> {
    let events =
        services::list_driver_events(&state, identity, driver_id, filter.event_type.as_deref())
            .await?;
    Ok(Json(DriverEventsResponse { driver_id, events }))
}

#[instrument(skip(state))]
pub async fn get_driver_score(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(driver_id): Path<i64>,
) -> Result<Json<DriverScore>, ApiError> {
    let score = services::get_driver_score(&state, identity, driver_id).await?;
    Ok(Json(score))
}

#[instrument(skip(state, body))]
pub async fn update_driver_score(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(driver_id): Path<i64>,
    Json(body): Json<UpdateScoreBody>,
) -> Result<Json<ScoreUpdateResponse>, ApiError> {
    let score = services::update_driver_score(&state, identity, driver_id, body).await?;
    Ok(Json(ScoreUpdateResponse {
        message: "Driver score updated successfully".into(),
        score,
    }))
}

#[instrument(skip(state, body))]
pub async fn log_incident_report(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(body): Json<LogIncidentBody>,
) -> Result<(StatusCode, Json<IncidentResponse>), ApiError> {
    let report = services::log_incident(&state, identity, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(IncidentResponse {
            message: "Incident reported successfully".into(),
            report,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_all_incidents(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Query(filter): Query<IncidentFilter>,
) -> Result<Json<IncidentsResponse>, ApiError> {
    let incidents =
        services::list_incidents(&state, identity, filter.driver_id, filter.status.as_deref())
            .await?;
    Ok(Json(IncidentsResponse { incidents }))
}

#[instrument(skip(state))]
pub async fn get_incident_report(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(report_id): Path<i64>,
) -> Result<Json<IncidentReport>, ApiError> {
    let report = services::get_incident(&state, identity, report_id).await?;
    Ok(Json(report))
}

#[instrument(skip(state, body))]
pub async fn update_incident_report(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(report_id): Path<i64>,
    Json(body): Json<UpdateIncidentBody>,
) -> Result<Json<IncidentResponse>, ApiError> {
    let report = services::update_incident(&state, identity, report_id, body).await?;
    Ok(Json(IncidentResponse {
        message: "Incident report updated successfully".into(),
        report,
    }))
}
