//! Data-source resolution for forest-watch.
//!
//! Given a logical request for a category of environmental data, this crate
//! decides which source to consult, in which order, with what timeout, with
//! what caching, and with what fallback, presenting callers one stable
//! contract regardless of which source actually answered.

pub mod cache;
pub mod capability;
pub mod chain;
pub mod facade;

pub use cache::{category_ttl, TtlCache};
pub use capability::{CapabilityManager, Capability, ExecutionContext, Settings};
pub use chain::{build_chain, run_chain, Attempt, Resolution};
pub use facade::{Fetched, ForestDataService, RequestOptions};
