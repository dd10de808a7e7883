//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260301_000001_create_event_tables;
mod m20260301_000002_create_activity_option_table;
mod m20260301_000003_create_voting_tables;
mod m20260301_000004_create_presentation_tables;
mod m20260301_000005_create_rating_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_event_tables::Migration),
            Box::new(m20260301_000002_create_activity_option_table::Migration),
            Box::new(m20260301_000003_create_voting_tables::Migration),
            Box::new(m20260301_000004_create_presentation_tables::Migration),
            Box::new(m20260301_000005_create_rating_table::Migration),
        ]
    }
}
