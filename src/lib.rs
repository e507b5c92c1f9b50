pub mod configuration;
pub mod db;
pub mod forms;
pub mod helpers;
pub mod indexer;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod routes;
pub mod services;
pub mod startup;
pub mod telemetry;
