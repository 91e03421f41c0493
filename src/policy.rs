//! Pure authorization decisions. No side effects, no state beyond the
//! inputs; both engines call through here before touching the store.

use crate::domain::{Identity, Ride, Role};

/// A ride is visible only to the passenger who requested it and the driver
/// assigned to it.
pub fn can_access_ride(identity: &Identity, ride: &Ride) -> bool {
    ride.passenger_id == identity.id || ride.driver_id == Some(identity.id)
}

/// Admins may act on any driver; a driver may act on themselves.
pub fn can_act_on_driver(identity: &Identity, driver_id: i64) -> bool {
    identity.is_admin || (identity.role == Role::Driver && identity.id == driver_id)
}

pub fn is_admin(identity: &Identity) -> bool {
    identity.is_admin
}
