use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{DriverScore, DrivingEvent, IncidentReport};

#[derive(Debug, Deserialize)]
pub struct LogEventBody {
    pub driver_id: i64,
    pub event_type: String,
    pub timestamp: String,
    pub location_lat: f64,
    pub location_lon: f64,
    pub ride_id: Option<i64>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub message: String,
    pub event: DrivingEvent,
}

#[derive(Debug, Deserialize)]
pub struct EventFilter {
    pub event_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DriverEventsResponse {
    pub driver_id: i64,
    pub events: Vec<DrivingEvent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateScoreBody {
    pub overall_safety_score: Option<f64>,
    pub efficiency_score: Option<f64>,
    pub punctuality_score: Option<f64>,
    pub feedback_summary: Option<String>,
}

impl UpdateScoreBody {
    pub fn is_empty(&self) -> bool {
        self.overall_safety_score.is_none()
            && self.efficiency_score.is_none()
            && self.punctuality_score.is_none()
            && self.feedback_summary.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct ScoreUpdateResponse {
    pub message: String,
    pub score: DriverScore,
}

#[derive(Debug, Deserialize)]
pub struct LogIncidentBody {
    pub driver_id: i64,
    pub incident_type: String,
    pub description: String,
    pub ride_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IncidentResponse {
    pub message: String,
    pub report: IncidentReport,
}

#[derive(Debug, Deserialize)]
pub struct IncidentFilter {
    pub driver_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IncidentsResponse {
    pub incidents: Vec<IncidentReport>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateIncidentBody {
    pub status: Option<String>,
    pub description: Option<String>,
    /// Absent means "leave alone"; an explicit null clears the notes.
    #[serde(default, deserialize_with = "double_option")]
    pub resolution_notes: Option<Option<String>>,
}

fn double_option<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}
