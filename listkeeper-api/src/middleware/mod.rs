/// Middleware for the API server
///
/// Identity resolution lives in `listkeeper_shared::auth::middleware`.

pub mod security;
