//! Create rating table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rating::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rating::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rating::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(Rating::PresenterId).string_len(64).not_null())
                    .col(ColumnDef::new(Rating::RaterId).string_len(64).not_null())
                    .col(ColumnDef::new(Rating::Value).integer().not_null())
                    .col(
                        ColumnDef::new(Rating::RatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Rating::Value).between(1, 5))
                    .check(Expr::col(Rating::RaterId).ne(Expr::col(Rating::PresenterId)))
                    .to_owned(),
            )
            .await?;

        // Unique index: (event_id, presenter_id, rater_id) - one rating per rater
        manager
            .create_index(
                Index::create()
                    .name("idx_rating_event_presenter_rater")
                    .table(Rating::Table)
                    .col(Rating::EventId)
                    .col(Rating::PresenterId)
                    .col(Rating::RaterId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rating::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Rating {
    Table,
    Id,
    EventId,
    PresenterId,
    RaterId,
    Value,
    RatedAt,
}
