//! Persistence boundary. The engines only ever see this trait; the concrete
//! store is injected through `AppState`, one fresh instance per process (or
//! per test). Ids are per-entity-type, monotonic, starting at 1, and never
//! reused.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::domain::{
    DriverScore, DrivingEvent, IncidentReport, NewDrivingEvent, NewIncidentReport, NewRide,
    NewUser, Ride, User,
};
use crate::error::ApiError;

/// Mutation applied to a ride under that ride's exclusive commit. The store
/// commits the result only when the closure returns `Ok`; on `Err` the
/// stored entity is left exactly as it was.
pub type RideMutation = Box<dyn FnOnce(&mut Ride) -> Result<(), ApiError> + Send>;

/// Mutation applied to a driver's score record. The second argument is
/// whether a record already existed before this call; a fresh empty record
/// is supplied otherwise.
pub type ScoreMutation = Box<dyn FnOnce(&mut DriverScore, bool) -> Result<(), ApiError> + Send>;

pub type IncidentMutation = Box<dyn FnOnce(&mut IncidentReport) -> Result<(), ApiError> + Send>;

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Assigns the next user id and inserts. Fails with `Conflict` when the
    /// email is already registered; the uniqueness check and the insert are
    /// a single atomic step.
    async fn insert_user(&self, new: NewUser) -> Result<User, ApiError>;
    async fn user_by_id(&self, id: i64) -> Result<Option<User>, ApiError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;

    async fn insert_ride(&self, new: NewRide) -> Result<Ride, ApiError>;
    async fn ride(&self, id: i64) -> Result<Option<Ride>, ApiError>;
    /// Atomic read-modify-write on one ride; `NotFound` when the id is
    /// unknown. Returns the committed state.
    async fn with_ride(&self, id: i64, apply: RideMutation) -> Result<Ride, ApiError>;
    async fn list_rides(&self) -> Result<Vec<Ride>, ApiError>;

    async fn insert_event(&self, new: NewDrivingEvent) -> Result<DrivingEvent, ApiError>;
    async fn events_for_driver(&self, driver_id: i64) -> Result<Vec<DrivingEvent>, ApiError>;

    async fn driver_score(&self, driver_id: i64) -> Result<Option<DriverScore>, ApiError>;
    /// Atomic merge into the driver's score record, creating it lazily. A
    /// failing mutation creates/changes nothing.
    async fn with_driver_score(
        &self,
        driver_id: i64,
        apply: ScoreMutation,
    ) -> Result<DriverScore, ApiError>;

    async fn insert_incident(&self, new: NewIncidentReport) -> Result<IncidentReport, ApiError>;
    async fn incident(&self, report_id: i64) -> Result<Option<IncidentReport>, ApiError>;
    async fn with_incident(
        &self,
        report_id: i64,
        apply: IncidentMutation,
    ) -> Result<IncidentReport, ApiError>;
    async fn list_incidents(&self) -> Result<Vec<IncidentReport>, ApiError>;
}
