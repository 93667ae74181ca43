//! Generic entity registry for a multi-tenant cooperative back office.
//!
//! Typed CRUD, dynamic filters, relation preloading, DTO projection and
//! change-topic dispatch for every reference entity, plus the tenant
//! onboarding seeder built on top of them.

pub mod app;
pub mod config;
pub mod context;
pub mod db;
pub mod entities;
pub mod logging;
pub mod model;
pub mod query;
pub mod registry;
pub mod seeder;
pub mod topic;

pub use app::Core;
pub use config::CoreConfig;
pub use context::Context;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{Entity, Record, RecordResponse, TenantScope, TenantScoped};
pub use query::{
    FilterClause, FilterOp, FilterValue, Page, PageRequest, SchemaError, SortClause,
    SortDirection,
};
pub use registry::{
    DeleteMode, Descriptor, QueryHandle, Registry, RegistryCache, RegistryError,
    RegistryErrorKind, RegistryResult, Relation,
};
pub use seeder::{
    default_steps, OrganizationSeeder, SagaPhase, SeedError, SeedReport, SeedScope, SeedStep,
};
pub use topic::{Action, Broker, DispatchError, LogBroker, MemoryBroker, TopicDispatcher};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
