//! Boundaries between the import pipeline and the outside world.

pub mod ports;
