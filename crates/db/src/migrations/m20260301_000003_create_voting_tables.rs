//! Create voting window and vote tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VotingWindow::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VotingWindow::EventId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VotingWindow::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingWindow::EndsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingWindow::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(VotingWindow::TotalCompleteVoters)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(VotingWindow::PresentationWinnerId).string_len(32))
                    .col(ColumnDef::new(VotingWindow::TwistWinnerId).string_len(32))
                    .col(ColumnDef::new(VotingWindow::ResolvedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(VotingWindow::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_voting_window_event")
                            .from(VotingWindow::Table, VotingWindow::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vote::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::VoterId).string_len(64).not_null())
                    .col(ColumnDef::new(Vote::Category).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::OptionId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Vote::CastAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_voting_window")
                            .from(Vote::Table, Vote::EventId)
                            .to(VotingWindow::Table, VotingWindow::EventId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_activity_option")
                            .from(Vote::Table, Vote::OptionId)
                            .to(ActivityOption::Table, ActivityOption::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (event_id, voter_id, category) - one vote per category per voter
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_event_voter_category")
                    .table(Vote::Table)
                    .col(Vote::EventId)
                    .col(Vote::VoterId)
                    .col(Vote::Category)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (event_id, category) for tallies
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_event_category")
                    .table(Vote::Table)
                    .col(Vote::EventId)
                    .col(Vote::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VotingWindow::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum VotingWindow {
    Table,
    EventId,
    StartsAt,
    EndsAt,
    IsActive,
    TotalCompleteVoters,
    PresentationWinnerId,
    TwistWinnerId,
    ResolvedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
    EventId,
    VoterId,
    Category,
    OptionId,
    CastAt,
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
}

#[derive(Iden)]
enum ActivityOption {
    Table,
    Id,
}
