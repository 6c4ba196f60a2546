//! Library crate for quiz-arena-back, exposing modules for binaries and integration tests.

mod config;
mod dto;
pub mod engine;
mod error;
pub mod rounds;
pub mod routes;
pub mod services;
pub mod state;
