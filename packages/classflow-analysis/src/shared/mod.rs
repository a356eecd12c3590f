//! Shared models and graph types consumed by every analysis feature

pub mod graphs;
pub mod models;
