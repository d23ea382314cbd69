// ============================================================================
// lexgate - Public regulation data gateway
// ============================================================================
//
// A stateless, read-only HTTP gateway serving EU AI Act content (articles,
// recitals, definitions, chapters, implementing acts) to third parties.
//
// Structure:
// - config.rs: environment-driven configuration
// - context.rs: shared application state (pool + config)
// - db.rs: connection pool and projection-driven content queries
// - error.rs: error taxonomy and HTTP rendering
// - rate_limit.rs: persisted sliding-window rate limiter
// - resources.rs: declarative whitelist of public resources
// - serialize.rs: JSON envelope and CSV rendering
// - validate.rs: query-parameter validation
// - routes/: router assembly, gateway handler, middleware
//
// ============================================================================

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod rate_limit;
pub mod resources;
pub mod routes;
pub mod serialize;
pub mod utils;
pub mod validate;
