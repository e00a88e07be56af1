//! SeaORM entities mirroring the tables created by the migration crate.

pub mod group;
pub mod post;
pub mod user;
