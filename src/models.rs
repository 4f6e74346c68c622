pub mod admin;
pub mod botanical;
pub mod distribution;
pub mod organization;
pub mod production;
pub mod quality;
pub mod table;
pub mod traceability;

pub use table::Table;
