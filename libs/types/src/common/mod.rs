//! Common value types shared by every relay crate

pub mod errors;
pub mod identifiers;
pub mod quantity;
