use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Authenticated caller context. Built by the auth extractor from verified
/// JWT claims; every core operation consumes it read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub role: Role,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Passenger,
    Driver,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passenger" => Ok(Role::Passenger),
            "driver" => Ok(Role::Driver),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Passenger => write!(f, "passenger"),
            Role::Driver => write!(f, "driver"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(rename = "user_type")]
    pub role: Role,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_on: OffsetDateTime,
}

/// User fields before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_admin: bool,
    pub registered_on: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Pending,
    Accepted,
    EnRoutePickup,
    ArrivedPickup,
    Started,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }
}

impl FromStr for RideStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RideStatus::Pending),
            "accepted" => Ok(RideStatus::Accepted),
            "en_route_pickup" => Ok(RideStatus::EnRoutePickup),
            "arrived_pickup" => Ok(RideStatus::ArrivedPickup),
            "started" => Ok(RideStatus::Started),
            "completed" => Ok(RideStatus::Completed),
            "cancelled" => Ok(RideStatus::Cancelled),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RideStatus::Pending => "pending",
            RideStatus::Accepted => "accepted",
            RideStatus::EnRoutePickup => "en_route_pickup",
            RideStatus::ArrivedPickup => "arrived_pickup",
            RideStatus::Started => "started",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Ride {
    pub id: i64,
    pub passenger_id: i64,
    pub driver_id: Option<i64>,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub status: RideStatus,
    pub fare: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub requested_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewRide {
    pub passenger_id: i64,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub requested_at: OffsetDateTime,
}

/// Append-only telemetry record. `timestamp` is caller-supplied and opaque
/// (ISO-8601 expected); ordering on it is lexicographic.
#[derive(Debug, Clone, Serialize)]
pub struct DrivingEvent {
    pub event_id: i64,
    pub driver_id: i64,
    pub ride_id: Option<i64>,
    pub event_type: String,
    pub timestamp: String,
    pub location_lat: f64,
    pub location_lon: f64,
    pub details: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub logged_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewDrivingEvent {
    pub driver_id: i64,
    pub ride_id: Option<i64>,
    pub event_type: String,
    pub timestamp: String,
    pub location_lat: f64,
    pub location_lon: f64,
    pub details: serde_json::Value,
    pub logged_at: OffsetDateTime,
}

/// One mutable record per driver, created lazily on first score update.
#[derive(Debug, Clone, Serialize)]
pub struct DriverScore {
    pub driver_id: i64,
    pub overall_safety_score: Option<f64>,
    pub efficiency_score: Option<f64>,
    pub punctuality_score: Option<f64>,
    pub feedback_summary: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated_timestamp: Option<OffsetDateTime>,
}

impl DriverScore {
    pub fn empty(driver_id: i64) -> Self {
        Self {
            driver_id,
            overall_safety_score: None,
            efficiency_score: None,
            punctuality_score: None,
            feedback_summary: None,
            last_updated_timestamp: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Investigating,
    Resolved,
    Closed,
}

impl FromStr for IncidentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(IncidentStatus::Open),
            "investigating" => Ok(IncidentStatus::Investigating),
            "resolved" => Ok(IncidentStatus::Resolved),
            "closed" => Ok(IncidentStatus::Closed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IncidentStatus::Open => "open",
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentReport {
    pub report_id: i64,
    pub driver_id: i64,
    pub ride_id: Option<i64>,
    pub reported_by_user_id: i64,
    pub incident_type: String,
    pub description: String,
    pub status: IncidentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub resolution_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewIncidentReport {
    pub driver_id: i64,
    pub ride_id: Option<i64>,
    pub reported_by_user_id: i64,
    pub incident_type: String,
    pub description: String,
    pub status: IncidentStatus,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ride_status_round_trips_through_strings() {
        for s in [
            "pending",
            "accepted",
            "en_route_pickup",
            "arrived_pickup",
            "started",
            "completed",
            "cancelled",
        ] {
            let status: RideStatus = s.parse().expect("known status");
            assert_eq!(status.to_string(), s);
        }
        assert!("en-route".parse::<RideStatus>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(RideStatus::Completed.is_terminal());
        assert!(RideStatus::Cancelled.is_terminal());
        assert!(!RideStatus::Started.is_terminal());
        assert!(!RideStatus::Pending.is_terminal());
    }

    #[test]
    fn ride_serializes_snake_case_status_and_hides_nothing_else() {
        let ride = Ride {
            id: 1,
            passenger_id: 2,
            driver_id: None,
            pickup_location: "1 Main St".into(),
            dropoff_location: "10 End Rd".into(),
            status: RideStatus::EnRoutePickup,
            fare: None,
            requested_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&ride).expect("serialize");
        assert_eq!(json["status"], "en_route_pickup");
        assert!(json["driver_id"].is_null());
        assert!(json["fare"].is_null());
    }

    #[test]
    fn user_never_serializes_password_hash() {
        let user = User {
            id: 1,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "secret-hash".into(),
            role: Role::Driver,
            is_admin: false,
            registered_on: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"user_type\":\"driver\""));
    }
}
