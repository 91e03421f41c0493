use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::{
    DriverScore, DrivingEvent, IncidentReport, NewDrivingEvent, NewIncidentReport, NewRide,
    NewUser, Ride, User,
};
use crate::error::ApiError;

use super::{EntityStore, IncidentMutation, RideMutation, ScoreMutation};

/// In-memory `EntityStore`. Mutations take the entity-type write lock for
/// the duration of the read-modify-write, which upholds the per-entity
/// atomicity the engines rely on; critical sections never await.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<i64, User>>,
    rides: RwLock<HashMap<i64, Ride>>,
    events: RwLock<Vec<DrivingEvent>>,
    scores: RwLock<HashMap<i64, DriverScore>>,
    incidents: RwLock<HashMap<i64, IncidentReport>>,
    user_seq: AtomicI64,
    ride_seq: AtomicI64,
    event_seq: AtomicI64,
    report_seq: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, ApiError> {
    lock.read()
        .map_err(|_| ApiError::unavailable("store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, ApiError> {
    lock.write()
        .map_err(|_| ApiError::unavailable("store lock poisoned"))
}

fn next_id(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, Ordering::SeqCst) + 1
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn insert_user(&self, new: NewUser) -> Result<User, ApiError> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.email == new.email) {
            return Err(ApiError::conflict("Email already registered"));
        }
        let user = User {
            id: next_id(&self.user_seq),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            is_admin: new.is_admin,
            registered_on: new.registered_on,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, ApiError> {
        Ok(read(&self.users)?.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(read(&self.users)?.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(read(&self.users)?.values().cloned().collect())
    }

    async fn insert_ride(&self, new: NewRide) -> Result<Ride, ApiError> {
        let ride = Ride {
            id: next_id(&self.ride_seq),
            passenger_id: new.passenger_id,
            driver_id: None,
            pickup_location: new.pickup_location,
            dropoff_location: new.dropoff_location,
            status: crate::domain::RideStatus::Pending,
            fare: None,
            requested_at: new.requested_at,
            updated_at: new.requested_at,
        };
        write(&self.rides)?.insert(ride.id, ride.clone());
        Ok(ride)
    }

    async fn ride(&self, id: i64) -> Result<Option<Ride>, ApiError> {
        Ok(read(&self.rides)?.get(&id).cloned())
    }

    async fn with_ride(&self, id: i64, apply: RideMutation) -> Result<Ride, ApiError> {
        let mut rides = write(&self.rides)?;
        let entry = rides
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found("Ride not found"))?;
        let mut candidate = entry.clone();
        apply(&mut candidate)?;
        *entry = candidate.clone();
        Ok(candidate)
    }

    async fn list_rides(&self) -> Result<Vec<Ride>, ApiError> {
        Ok(read(&self.rides)?.values().cloned().collect())
    }

    async fn insert_event(&self, new: NewDrivingEvent) -> Result<DrivingEvent, ApiError> {
        let event = DrivingEvent {
            event_id: next_id(&self.event_seq),
            driver_id: new.driver_id,
            ride_id: new.ride_id,
            event_type: new.event_type,
            timestamp: new.timestamp,
            location_lat: new.location_lat,
            location_lon: new.location_lon,
            details: new.details,
            logged_at: new.logged_at,
        };
        write(&self.events)?.push(event.clone());
        Ok(event)
    }

    async fn events_for_driver(&self, driver_id: i64) -> Result<Vec<DrivingEvent>, ApiError> {
        Ok(read(&self.events)?
            .iter()
            .filter(|e| e.driver_id == driver_id)
            .cloned()
            .collect())
    }

    async fn driver_score(&self, driver_id: i64) -> Result<Option<DriverScore>, ApiError> {
        Ok(read(&self.scores)?.get(&driver_id).cloned())
    }

    async fn with_driver_score(
        &self,
        driver_id: i64,
        apply: ScoreMutation,
    ) -> Result<DriverScore, ApiError> {
        let mut scores = write(&self.scores)?;
        let existed = scores.contains_key(&driver_id);
        let mut candidate = scores
            .get(&driver_id)
            .cloned()
            .unwrap_or_else(|| DriverScore::empty(driver_id));
        apply(&mut candidate, existed)?;
        scores.insert(driver_id, candidate.clone());
        Ok(candidate)
    }

    async fn insert_incident(&self, new: NewIncidentReport) -> Result<IncidentReport, ApiError> {
        let report = IncidentReport {
            report_id: next_id(&self.report_seq),
            driver_id: new.driver_id,
            ride_id: new.ride_id,
            reported_by_user_id: new.reported_by_user_id,
            incident_type: new.incident_type,
            description: new.description,
            status: new.status,
            created_at: new.created_at,
            updated_at: new.created_at,
            resolution_notes: None,
        };
        write(&self.incidents)?.insert(report.report_id, report.clone());
        Ok(report)
    }

    async fn incident(&self, report_id: i64) -> Result<Option<IncidentReport>, ApiError> {
        Ok(read(&self.incidents)?.get(&report_id).cloned())
    }

    async fn with_incident(
        &self,
        report_id: i64,
        apply: IncidentMutation,
    ) -> Result<IncidentReport, ApiError> {
        let mut incidents = write(&self.incidents)?;
        let entry = incidents.get_mut(&report_id).ok_or_else(|| {
            ApiError::not_found(format!("Incident report with id {report_id} not found."))
        })?;
        let mut candidate = entry.clone();
        apply(&mut candidate)?;
        *entry = candidate.clone();
        Ok(candidate)
    }

    async fn list_incidents(&self) -> Result<Vec<IncidentReport>, ApiError> {
        Ok(read(&self.incidents)?.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RideStatus, Role};
    use crate::error::ApiError;
    use std::sync::Arc;
    use time::OffsetDateTime;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: "Test".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role,
            is_admin: false,
            registered_on: OffsetDateTime::now_utc(),
        }
    }

    fn new_ride(passenger_id: i64) -> NewRide {
        NewRide {
            passenger_id,
            pickup_location: "A".into(),
            dropoff_location: "B".into(),
            requested_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn ids_are_monotonic_per_type_starting_at_one() {
        let store = MemoryStore::new();
        let u1 = store.insert_user(new_user("a@x.com", Role::Passenger)).await.unwrap();
        let u2 = store.insert_user(new_user("b@x.com", Role::Driver)).await.unwrap();
        assert_eq!((u1.id, u2.id), (1, 2));

        // ride counter is independent of the user counter
        let r1 = store.insert_ride(new_ride(u1.id)).await.unwrap();
        assert_eq!(r1.id, 1);
        let r2 = store.insert_ride(new_ride(u1.id)).await.unwrap();
        assert_eq!(r2.id, 2);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@x.com", Role::Passenger)).await.unwrap();
        let err = store
            .insert_user(new_user("a@x.com", Role::Driver))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn with_ride_commits_only_on_ok() {
        let store = MemoryStore::new();
        let ride = store.insert_ride(new_ride(1)).await.unwrap();

        // failing mutation leaves the ride untouched even though the closure
        // wrote into its argument before erroring
        let err = store
            .with_ride(
                ride.id,
                Box::new(|r| {
                    r.driver_id = Some(99);
                    r.status = RideStatus::Accepted;
                    Err(ApiError::forbidden("nope"))
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let stored = store.ride(ride.id).await.unwrap().unwrap();
        assert_eq!(stored.driver_id, None);
        assert_eq!(stored.status, RideStatus::Pending);

        let updated = store
            .with_ride(
                ride.id,
                Box::new(|r| {
                    r.driver_id = Some(7);
                    r.status = RideStatus::Accepted;
                    Ok(())
                }),
            )
            .await
            .unwrap();
        assert_eq!(updated.driver_id, Some(7));
    }

    #[tokio::test]
    async fn with_ride_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .with_ride(42, Box::new(|_| Ok(())))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_score_mutation_creates_no_record() {
        let store = MemoryStore::new();
        let err = store
            .with_driver_score(
                5,
                Box::new(|s, existed| {
                    assert!(!existed);
                    s.overall_safety_score = Some(101.0);
                    Err(ApiError::invalid_input("out of range"))
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(store.driver_score(5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn score_mutation_sees_existing_record() {
        let store = MemoryStore::new();
        store
            .with_driver_score(
                5,
                Box::new(|s, _| {
                    s.efficiency_score = Some(80.0);
                    Ok(())
                }),
            )
            .await
            .unwrap();
        let merged = store
            .with_driver_score(
                5,
                Box::new(|s, existed| {
                    assert!(existed);
                    assert_eq!(s.efficiency_score, Some(80.0));
                    s.punctuality_score = Some(60.0);
                    Ok(())
                }),
            )
            .await
            .unwrap();
        assert_eq!(merged.efficiency_score, Some(80.0));
        assert_eq!(merged.punctuality_score, Some(60.0));
    }

    #[tokio::test]
    async fn concurrent_ride_creation_never_reuses_ids() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert_ride(new_ride(1)).await.unwrap().id
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 32);
    }

    #[tokio::test]
    async fn events_filtered_by_driver() {
        let store = MemoryStore::new();
        for driver_id in [1, 2, 1] {
            store
                .insert_event(NewDrivingEvent {
                    driver_id,
                    ride_id: None,
                    event_type: "speeding".into(),
                    timestamp: "2026-01-01T00:00:00Z".into(),
                    location_lat: 0.0,
                    location_lon: 0.0,
                    details: serde_json::Value::Null,
                    logged_at: OffsetDateTime::now_utc(),
                })
                .await
                .unwrap();
        }
        assert_eq!(store.events_for_driver(1).await.unwrap().len(), 2);
        assert_eq!(store.events_for_driver(3).await.unwrap().len(), 0);
    }
}
