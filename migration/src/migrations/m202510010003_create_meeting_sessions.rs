use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010003_create_meeting_sessions"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("meeting_sessions"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("meeting_date")).date().not_null())
                    // sorted, comma separated group ids
                    .col(ColumnDef::new(Alias::new("group_ids")).string().not_null())
                    .col(ColumnDef::new(Alias::new("active")).boolean().not_null().default(false))
                    .col(ColumnDef::new(Alias::new("secret")).string_len(64).not_null())
                    .col(ColumnDef::new(Alias::new("token_scheme")).string_len(16).not_null().default("derived"))
                    .col(ColumnDef::new(Alias::new("rotation_seconds")).integer().not_null().default(45))
                    .col(ColumnDef::new(Alias::new("start_bucket")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("activated_by")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("activated_at")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("deactivated_at")).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_meeting_sessions_user")
                            .from(Alias::new("meeting_sessions"), Alias::new("activated_by"))
                            .to(Alias::new("users"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one active session per calendar date. sea-query has no partial
        // index builder, so this one is raw SQL.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_meeting_sessions_one_active_per_day \
                 ON meeting_sessions (meeting_date) WHERE active = 1",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS idx_meeting_sessions_one_active_per_day")
            .await?;
        manager
            .drop_table(Table::drop().table(Alias::new("meeting_sessions")).to_owned())
            .await
    }
}
