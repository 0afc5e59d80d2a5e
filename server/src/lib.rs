//! RT/RW administration library
//!
//! This library exposes the core functionality of the neighborhood
//! administration server for testing and for the `rtrw` binary.

pub mod api;
pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod period;
pub mod services;
