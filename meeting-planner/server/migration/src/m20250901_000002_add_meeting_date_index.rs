use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const IDX_MEETING_DATE_UNIQUE: &str = "idx_meeting_meeting_date_unique";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Two meetings can never share the same normalized instant.
        manager
            .create_index(
                Index::create()
                    .name(IDX_MEETING_DATE_UNIQUE)
                    .table(Meeting::Table)
                    .col(Meeting::MeetingDate)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_MEETING_DATE_UNIQUE)
                    .table(Meeting::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Meeting {
    Table,
    MeetingDate,
}
