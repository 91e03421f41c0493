use serde::{Deserialize, Serialize};

use crate::domain::Ride;

#[derive(Debug, Deserialize)]
pub struct RequestRideBody {
    pub pickup_location: String,
    pub dropoff_location: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub message: String,
    pub ride: Ride,
}

#[derive(Debug, Serialize)]
pub struct NearbyDriver {
    pub id: i64,
    pub name: String,
    pub mock_location: String,
    pub vehicle_type: String,
    pub current_status: String,
}

#[derive(Debug, Serialize)]
pub struct NearbyDriversResponse {
    pub available_drivers: Vec<NearbyDriver>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateFareBody {
    pub pickup_location: String,
    pub dropoff_location: String,
}

#[derive(Debug, Serialize)]
pub struct FareEstimateResponse {
    pub pickup_location: String,
    pub dropoff_location: String,
    pub estimated_fare_rand: String,
    pub currency: String,
    pub note: String,
}
