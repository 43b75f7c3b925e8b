//! Route Handlers

pub mod alerts;
pub mod diagnose;
pub mod history;
