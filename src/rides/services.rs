//! Ride Lifecycle Engine. Every mutation goes through the store's atomic
//! `with_ride` commit, so acceptance and status transitions are exclusive
//! per ride id.

use rand::Rng;
use time::OffsetDateTime;
use tracing::info;

use crate::domain::{Identity, NewRide, Ride, RideStatus, Role};
use crate::error::ApiError;
use crate::policy;
use crate::rides::dto::NearbyDriver;
use crate::state::AppState;

pub async fn request_ride(
    state: &AppState,
    identity: Identity,
    pickup_location: &str,
    dropoff_location: &str,
) -> Result<Ride, ApiError> {
    if identity.role != Role::Passenger {
        return Err(ApiError::forbidden("Only passengers can request rides"));
    }
    if pickup_location.trim().is_empty() || dropoff_location.trim().is_empty() {
        return Err(ApiError::invalid_input(
            "Missing pickup_location or dropoff_location",
        ));
    }

    let ride = state
        .store
        .insert_ride(NewRide {
            passenger_id: identity.id,
            pickup_location: pickup_location.to_string(),
            dropoff_location: dropoff_location.to_string(),
            requested_at: OffsetDateTime::now_utc(),
        })
        .await?;
    info!(ride_id = ride.id, passenger_id = identity.id, "ride requested");
    Ok(ride)
}

pub async fn accept_ride(
    state: &AppState,
    identity: Identity,
    ride_id: i64,
) -> Result<Ride, ApiError> {
    let ride = state
        .store
        .with_ride(
            ride_id,
            Box::new(move |ride| {
                if identity.role != Role::Driver {
                    return Err(ApiError::forbidden("Only drivers can accept rides"));
                }
                // Conflict before the state check: a second acceptance must
                // read as a lost race, not a bad state.
                if ride.driver_id.is_some() {
                    return Err(ApiError::conflict("Ride already accepted by another driver"));
                }
                if ride.status != RideStatus::Pending {
                    return Err(ApiError::invalid_state(format!(
                        "Ride cannot be accepted, current status: {}",
                        ride.status
                    )));
                }
                ride.driver_id = Some(identity.id);
                ride.status = RideStatus::Accepted;
                ride.updated_at = OffsetDateTime::now_utc();
                Ok(())
            }),
        )
        .await?;
    info!(ride_id, driver_id = identity.id, "ride accepted");
    Ok(ride)
}

pub async fn ride_details(
    state: &AppState,
    identity: Identity,
    ride_id: i64,
) -> Result<Ride, ApiError> {
    let ride = state
        .store
        .ride(ride_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ride not found"))?;
    if !policy::can_access_ride(&identity, &ride) {
        return Err(ApiError::forbidden(
            "Access forbidden: You are not part of this ride",
        ));
    }
    Ok(ride)
}

pub async fn update_ride_status(
    state: &AppState,
    identity: Identity,
    ride_id: i64,
    new_status: &str,
) -> Result<Ride, ApiError> {
    let requested = new_status.to_string();
    let fares = state.fares.clone();
    let ride = state
        .store
        .with_ride(
            ride_id,
            Box::new(move |ride| {
                let target: RideStatus = requested
                    .parse()
                    .ok()
                    .filter(|s| *s != RideStatus::Pending)
                    .ok_or_else(|| {
                        ApiError::invalid_input(format!("Invalid status: {requested}"))
                    })?;

                if !transition_allowed(&identity, ride, target) {
                    // deliberately one signal for "not your ride" and
                    // "illegal transition"
                    return Err(ApiError::forbidden(format!(
                        "Cannot transition from '{}' to '{}' or not authorized",
                        ride.status, target
                    )));
                }

                if target == RideStatus::Completed {
                    ride.fare = Some(fares.completion_fare());
                }
                ride.status = target;
                ride.updated_at = OffsetDateTime::now_utc();
                Ok(())
            }),
        )
        .await?;
    info!(ride_id, user_id = identity.id, status = %ride.status, "ride status updated");
    Ok(ride)
}

/// Joint actor/transition legality table from the lifecycle design. The
/// assigned driver walks the ride forward and may cancel before the trip
/// starts; the requesting passenger may cancel up to en_route_pickup.
fn transition_allowed(identity: &Identity, ride: &Ride, target: RideStatus) -> bool {
    use RideStatus::*;
    if identity.role == Role::Driver && ride.driver_id == Some(identity.id) {
        match (ride.status, target) {
            (Accepted, EnRoutePickup)
            | (EnRoutePickup, ArrivedPickup)
            | (ArrivedPickup, Started)
            | (Started, Completed) => true,
            (Accepted | EnRoutePickup | ArrivedPickup, Cancelled) => true,
            _ => false,
        }
    } else if identity.role == Role::Passenger && ride.passenger_id == identity.id {
        matches!(
            (ride.status, target),
            (Pending | Accepted | EnRoutePickup, Cancelled)
        )
    } else {
        false
    }
}

/// Mocked driver discovery: every driver without an active ride, with
/// made-up location and vehicle data.
pub async fn nearby_drivers(
    state: &AppState,
    identity: Identity,
) -> Result<Vec<NearbyDriver>, ApiError> {
    if identity.role != Role::Passenger {
        return Err(ApiError::forbidden(
            "Only passengers can search for nearby drivers",
        ));
    }

    let rides = state.store.list_rides().await?;
    let mut available = Vec::new();
    for user in state.store.list_users().await? {
        if user.role != Role::Driver {
            continue;
        }
        let on_active_ride = rides
            .iter()
            .any(|r| r.driver_id == Some(user.id) && !r.status.is_terminal());
        if !on_active_ride {
            available.push(NearbyDriver {
                id: user.id,
                name: user.name.clone(),
                mock_location: format!(
                    "Nearby Location {}",
                    rand::thread_rng().gen_range(1..=100)
                ),
                vehicle_type: "Sedan".into(),
                current_status: "available".into(),
            });
        }
    }
    Ok(available)
}

pub fn estimate_fare(state: &AppState, pickup: &str, dropoff: &str) -> Result<f64, ApiError> {
    if pickup.is_empty() || dropoff.is_empty() {
        return Err(ApiError::invalid_input(
            "pickup_location and dropoff_location required",
        ));
    }
    Ok(state.fares.estimate(pickup, dropoff))
}
