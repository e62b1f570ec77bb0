// Library for tests to access modules

pub mod collector;
pub mod config;
pub mod counter_store;
pub mod delta;
pub mod docker_repo;
pub mod error;
pub mod event_builder;
pub mod models;
pub mod runtime;
pub mod scheduler;
pub mod sink;
pub mod version;
