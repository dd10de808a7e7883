//! Create event and event attendee tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Event::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Event::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Event::CoachId).string_len(64).not_null())
                    .col(ColumnDef::new(Event::ScheduledAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Event::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_coach_id")
                    .table(Event::Table)
                    .col(Event::CoachId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventAttendee::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventAttendee::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EventAttendee::EventId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventAttendee::UserId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventAttendee::DisplayName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventAttendee::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(EventAttendee::RegisteredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_attendee_event")
                            .from(EventAttendee::Table, EventAttendee::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (event_id, user_id) - one registration per user per event
        manager
            .create_index(
                Index::create()
                    .name("idx_event_attendee_event_user")
                    .table(EventAttendee::Table)
                    .col(EventAttendee::EventId)
                    .col(EventAttendee::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventAttendee::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Event::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
    Title,
    CoachId,
    ScheduledAt,
    CreatedAt,
}

#[derive(Iden)]
enum EventAttendee {
    Table,
    Id,
    EventId,
    UserId,
    DisplayName,
    Status,
    RegisteredAt,
}
