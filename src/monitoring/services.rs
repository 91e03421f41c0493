//! Monitoring Engine: driving-event telemetry, driver score records and the
//! incident-report lifecycle. Authorization runs through `policy` before any
//! store access; score and incident mutations commit atomically.

use std::str::FromStr;

use time::OffsetDateTime;
use tracing::info;

use crate::domain::{
    DriverScore, DrivingEvent, Identity, IncidentReport, IncidentStatus, NewDrivingEvent,
    NewIncidentReport, Role,
};
use crate::error::ApiError;
use crate::monitoring::dto::{LogEventBody, LogIncidentBody, UpdateIncidentBody, UpdateScoreBody};
use crate::policy;
use crate::state::AppState;

const NO_SCORE_FEEDBACK: &str = "No score data available yet.";

async fn require_driver(state: &AppState, driver_id: i64) -> Result<(), ApiError> {
    match state.store.user_by_id(driver_id).await? {
        Some(user) if user.role == Role::Driver => Ok(()),
        _ => Err(ApiError::not_found(format!(
            "Driver with id {driver_id} not found."
        ))),
    }
}

pub async fn log_driving_event(
    state: &AppState,
    identity: Identity,
    body: LogEventBody,
) -> Result<DrivingEvent, ApiError> {
    // existence before authorization, unlike the read paths below
    require_driver(state, body.driver_id).await?;
    if !policy::can_act_on_driver(&identity, body.driver_id) {
        return Err(ApiError::forbidden(
            "Unauthorized to log event for this driver.",
        ));
    }

    let event = state
        .store
        .insert_event(NewDrivingEvent {
            driver_id: body.driver_id,
            ride_id: body.ride_id,
            event_type: body.event_type,
            timestamp: body.timestamp,
            location_lat: body.location_lat,
            location_lon: body.location_lon,
            details: body.details.unwrap_or_else(|| serde_json::json!({})),
            logged_at: OffsetDateTime::now_utc(),
        })
        .await?;
    info!(
        event_id = event.event_id,
        driver_id = event.driver_id,
        event_type = %event.event_type,
        "driving event logged"
    );
    Ok(event)
}

pub async fn list_driver_events(
    state: &AppState,
    identity: Identity,
    driver_id: i64,
    event_type_filter: Option<&str>,
) -> Result<Vec<DrivingEvent>, ApiError> {
    if !policy::can_act_on_driver(&identity, driver_id) {
        return Err(ApiError::forbidden(
            "Unauthorized. Admin access or viewing own data required.",
        ));
    }
    require_driver(state, driver_id).await?;

    let mut events = state.store.events_for_driver(driver_id).await?;
    if let Some(filter) = event_type_filter {
        events.retain(|e| e.event_type == filter);
    }
    // newest first; timestamps are ISO-8601 so lexicographic order works
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(events)
}

pub async fn get_driver_score(
    state: &AppState,
    identity: Identity,
    driver_id: i64,
) -> Result<DriverScore, ApiError> {
    if !policy::can_act_on_driver(&identity, driver_id) {
        return Err(ApiError::forbidden(
            "Unauthorized. Admin access or viewing own score required.",
        ));
    }
    require_driver(state, driver_id).await?;

    // "no data yet" is a well-defined answer, not an error
    Ok(state.store.driver_score(driver_id).await?.unwrap_or_else(|| {
        let mut placeholder = DriverScore::empty(driver_id);
        placeholder.feedback_summary = Some(NO_SCORE_FEEDBACK.into());
        placeholder
    }))
}

fn validate_score_field(name: &str, value: Option<f64>) -> Result<(), ApiError> {
    if let Some(v) = value {
        if !(0.0..=100.0).contains(&v) {
            return Err(ApiError::invalid_input(format!(
                "Invalid {name}. Must be a number between 0 and 100."
            )));
        }
    }
    Ok(())
}

pub async fn update_driver_score(
    state: &AppState,
    identity: Identity,
    driver_id: i64,
    body: UpdateScoreBody,
) -> Result<DriverScore, ApiError> {
    if !policy::is_admin(&identity) {
        return Err(ApiError::forbidden(
            "Unauthorized. Admin access required to update scores.",
        ));
    }
    require_driver(state, driver_id).await?;

    validate_score_field("overall_safety_score", body.overall_safety_score)?;
    validate_score_field("efficiency_score", body.efficiency_score)?;
    validate_score_field("punctuality_score", body.punctuality_score)?;

    let score = state
        .store
        .with_driver_score(
            driver_id,
            Box::new(move |score, existed| {
                if body.is_empty() && !existed {
                    return Err(ApiError::invalid_input(
                        "No valid score fields provided for update.",
                    ));
                }
                if let Some(v) = body.overall_safety_score {
                    score.overall_safety_score = Some(v);
                }
                if let Some(v) = body.efficiency_score {
                    score.efficiency_score = Some(v);
                }
                if let Some(v) = body.punctuality_score {
                    score.punctuality_score = Some(v);
                }
                if let Some(v) = body.feedback_summary {
                    score.feedback_summary = Some(v);
                }
                score.last_updated_timestamp = Some(OffsetDateTime::now_utc());
                Ok(())
            }),
        )
        .await?;
    info!(driver_id, "driver score updated");
    Ok(score)
}

pub async fn log_incident(
    state: &AppState,
    identity: Identity,
    body: LogIncidentBody,
) -> Result<IncidentReport, ApiError> {
    if !policy::is_admin(&identity) {
        return Err(ApiError::forbidden(
            "Unauthorized. Admin access required to log incidents.",
        ));
    }
    require_driver(state, body.driver_id).await?;

    let status = match body.status.as_deref() {
        None => IncidentStatus::Open,
        Some(raw) => IncidentStatus::from_str(raw).map_err(|_| {
            ApiError::invalid_input(
                "Invalid status. Must be one of: open, investigating, resolved, closed",
            )
        })?,
    };

    let report = state
        .store
        .insert_incident(NewIncidentReport {
            driver_id: body.driver_id,
            ride_id: body.ride_id,
            reported_by_user_id: identity.id,
            incident_type: body.incident_type,
            description: body.description,
            status,
            created_at: OffsetDateTime::now_utc(),
        })
        .await?;
    info!(
        report_id = report.report_id,
        driver_id = report.driver_id,
        reported_by = identity.id,
        "incident reported"
    );
    Ok(report)
}

pub async fn list_incidents(
    state: &AppState,
    identity: Identity,
    driver_id_filter: Option<i64>,
    status_filter: Option<&str>,
) -> Result<Vec<IncidentReport>, ApiError> {
    if !policy::is_admin(&identity) {
        return Err(ApiError::forbidden("Unauthorized. Admin access required."));
    }

    let mut incidents = state.store.list_incidents().await?;
    if let Some(driver_id) = driver_id_filter {
        incidents.retain(|r| r.driver_id == driver_id);
    }
    if let Some(status) = status_filter {
        incidents.retain(|r| r.status.to_string() == status);
    }
    incidents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(incidents)
}

pub async fn get_incident(
    state: &AppState,
    identity: Identity,
    report_id: i64,
) -> Result<IncidentReport, ApiError> {
    if !policy::is_admin(&identity) {
        return Err(ApiError::forbidden("Unauthorized. Admin access required."));
    }
    state.store.incident(report_id).await?.ok_or_else(|| {
        ApiError::not_found(format!("Incident report with id {report_id} not found."))
    })
}

pub async fn update_incident(
    state: &AppState,
    identity: Identity,
    report_id: i64,
    body: UpdateIncidentBody,
) -> Result<IncidentReport, ApiError> {
    if !policy::is_admin(&identity) {
        return Err(ApiError::forbidden(
            "Unauthorized. Admin access required to update incidents.",
        ));
    }

    let report = state
        .store
        .with_incident(
            report_id,
            Box::new(move |report| {
                let mut updated = false;
                if let Some(raw) = body.status.as_deref() {
                    report.status = IncidentStatus::from_str(raw).map_err(|_| {
                        ApiError::invalid_input(
                            "Invalid status. Must be one of: open, investigating, resolved, closed",
                        )
                    })?;
                    updated = true;
                }
                if let Some(description) = body.description {
                    report.description = description;
                    updated = true;
                }
                if let Some(notes) = body.resolution_notes {
                    report.resolution_notes = notes;
                    updated = true;
                }
                if !updated {
                    return Err(ApiError::invalid_input(
                        "No valid fields provided for update.",
                    ));
                }
                report.updated_at = OffsetDateTime::now_utc();
                Ok(())
            }),
        )
        .await?;
    info!(report_id, status = %report.status, "incident updated");
    Ok(report)
}
