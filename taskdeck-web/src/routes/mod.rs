/// Route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `home`: Landing page
/// - `auth`: Registration, login, logout
/// - `tasks`: Task CRUD with search/filter/sort

pub mod auth;
pub mod health;
pub mod home;
pub mod tasks;
