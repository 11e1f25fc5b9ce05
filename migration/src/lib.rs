pub use sea_orm_migration::prelude::*;

mod m20260110_090000_create_schema;
mod m20260110_090100_create_channel_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_090000_create_schema::Migration),
            Box::new(m20260110_090100_create_channel_tables::Migration),
        ]
    }
}
