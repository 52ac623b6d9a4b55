pub mod app;
pub mod classify;
pub mod config;
pub mod counts;
pub mod domain;
pub mod error;
pub mod matrix;
pub mod mutation;
pub mod output;
pub mod repository;
pub mod scope;
pub mod store;
