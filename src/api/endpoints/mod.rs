//! API endpoint handlers.
//!
//! Handlers stay thin: they open a connection, call into the screening rules
//! or the workflow, and return JSON.

pub mod alerts;
pub mod clients;
pub mod duty;
pub mod health;
pub mod screening;
pub mod substances;
pub mod technicians;
