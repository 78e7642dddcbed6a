use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010005_create_attendance_records"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("attendance_records"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("user_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("meeting_date")).date().not_null())
                    .col(ColumnDef::new(Alias::new("group_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("session_id")).big_integer().null())
                    .col(ColumnDef::new(Alias::new("ledger_id")).big_integer().null())
                    .col(ColumnDef::new(Alias::new("status")).string_len(16).not_null().default("present"))
                    .col(ColumnDef::new(Alias::new("scanned_at")).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_user")
                            .from(Alias::new("attendance_records"), Alias::new("user_id"))
                            .to(Alias::new("users"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_group")
                            .from(Alias::new("attendance_records"), Alias::new("group_id"))
                            .to(Alias::new("groups"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_session")
                            .from(Alias::new("attendance_records"), Alias::new("session_id"))
                            .to(Alias::new("meeting_sessions"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_ledger")
                            .from(Alias::new("attendance_records"), Alias::new("ledger_id"))
                            .to(Alias::new("rotation_ledger"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The at-most-once guarantee lives here, not in application code.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendance_user_date")
                    .table(Alias::new("attendance_records"))
                    .col(Alias::new("user_id"))
                    .col(Alias::new("meeting_date"))
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("attendance_records")).to_owned())
            .await
    }
}
