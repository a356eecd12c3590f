//! Dataflow domain types: the abstract value lattice and fact maps

pub mod fact;
pub mod result;
pub mod value;
