// Library for tests to access modules

pub mod aggregation;
pub mod config;
pub mod error;
pub mod generator;
pub mod labels;
pub mod loader;
pub mod models;
pub mod readings_repo;
pub mod refresh_worker;
pub mod routes;
pub mod version;
