//! Application-facing result views

pub mod result;
