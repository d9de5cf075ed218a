//! Core domain logic for the event service.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::event::{Event, EventId};
pub use model::logistics::{Logistics, LogisticsId};
pub use model::participant::{Participant, ParticipantId, Role};
pub use model::ValidationError;
pub use repo::event_repo::{EventRepository, SqliteEventRepository};
pub use repo::logistics_repo::{LogisticsRepository, SqliteLogisticsRepository};
pub use repo::participant_repo::{ParticipantRepository, SqliteParticipantRepository};
pub use repo::{RepoError, RepoResult};
pub use service::event_service::{
    EventCost, EventService, EventServiceError, ParticipantFilter, ServiceResult,
    COST_REPORT_FILTER,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
