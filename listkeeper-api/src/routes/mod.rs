/// API route handlers
///
/// - `health`: Health check endpoint
/// - `users`: Registration and profile
/// - `tokens`: Login and logout
/// - `lists`: List CRUD

pub mod health;
pub mod lists;
pub mod tokens;
pub mod users;
