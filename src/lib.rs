pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
