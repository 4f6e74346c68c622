pub mod auth;
pub mod consistency;
pub mod fixtures;
pub mod idempotency;
pub mod lifecycle_service;
pub mod linker;
pub mod pairing;
pub mod qr_service;
pub mod registry;
pub mod seed_planner;

pub use consistency::{ConsistencyReport, ConsistencyReporter};
pub use idempotency::IdempotencyGuard;
pub use linker::PolymorphicLinker;
pub use registry::EntityRegistry;
pub use seed_planner::SeedPlanner;
