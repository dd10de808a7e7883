//! Create activity option table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivityOption::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityOption::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ActivityOption::Category)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityOption::Variant)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityOption::Label)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ActivityOption::Description).text())
                    .col(
                        ColumnDef::new(ActivityOption::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ActivityOption::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ActivityOption::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (category, variant)
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_option_category_variant")
                    .table(ActivityOption::Table)
                    .col(ActivityOption::Category)
                    .col(ActivityOption::Variant)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (category, sort_order) for ordered listing
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_option_category_sort")
                    .table(ActivityOption::Table)
                    .col(ActivityOption::Category)
                    .col(ActivityOption::SortOrder)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityOption::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ActivityOption {
    Table,
    Id,
    Category,
    Variant,
    Label,
    Description,
    IsActive,
    SortOrder,
    CreatedAt,
}
