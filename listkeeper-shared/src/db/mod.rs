/// Database layer for Listkeeper
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Embedded migration runner
///
/// Models live in the crate-level `models` module.

pub mod migrations;
pub mod pool;
