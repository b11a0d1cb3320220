//! SeaORM entities.

pub mod tenant;
