//! Create presentation queue and entry tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PresentationQueue::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PresentationQueue::EventId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PresentationQueue::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PresentationQueue::TotalCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PresentationQueue::SeededAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_presentation_queue_event")
                            .from(PresentationQueue::Table, PresentationQueue::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PresentationEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PresentationEntry::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PresentationEntry::EventId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PresentationEntry::PresenterId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PresentationEntry::Position)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PresentationEntry::State)
                            .string_len(16)
                            .not_null()
                            .default("waiting"),
                    )
                    .col(ColumnDef::new(PresentationEntry::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PresentationEntry::CompletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_presentation_entry_queue")
                            .from(PresentationEntry::Table, PresentationEntry::EventId)
                            .to(PresentationQueue::Table, PresentationQueue::EventId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (event_id, presenter_id) - one slot per attendee
        manager
            .create_index(
                Index::create()
                    .name("idx_presentation_entry_event_presenter")
                    .table(PresentationEntry::Table)
                    .col(PresentationEntry::EventId)
                    .col(PresentationEntry::PresenterId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: (event_id, position) - dense unique order
        manager
            .create_index(
                Index::create()
                    .name("idx_presentation_entry_event_position")
                    .table(PresentationEntry::Table)
                    .col(PresentationEntry::EventId)
                    .col(PresentationEntry::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // At most one presenting entry per event, enforced by the database as well
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_presentation_entry_single_presenter
                ON presentation_entry (event_id)
                WHERE state = 'presenting';
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PresentationEntry::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PresentationQueue::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PresentationQueue {
    Table,
    EventId,
    Version,
    TotalCount,
    SeededAt,
}

#[derive(Iden)]
enum PresentationEntry {
    Table,
    Id,
    EventId,
    PresenterId,
    Position,
    State,
    StartedAt,
    CompletedAt,
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
}
