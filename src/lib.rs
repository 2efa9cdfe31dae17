pub mod app;
pub mod auth;
pub mod cli;
pub mod context;
pub mod ledger;
pub mod rest;
pub mod seed;
pub mod storage;
pub mod tracing;
pub mod types;
