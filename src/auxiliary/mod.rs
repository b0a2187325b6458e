//! Auxiliary physical data.

pub mod rare_earth;
