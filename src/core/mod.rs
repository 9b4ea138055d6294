//! Core business logic module

pub mod connector;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod service;
pub mod status;
pub mod types;
