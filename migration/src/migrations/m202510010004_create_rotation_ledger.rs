use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010004_create_rotation_ledger"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("rotation_ledger"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("token")).string().not_null().unique_key())
                    .col(ColumnDef::new(Alias::new("session_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("meeting_date")).date().not_null())
                    .col(ColumnDef::new(Alias::new("time_bucket")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("rotation_sequence")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("generated_at")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("expires_at")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("consumed")).boolean().not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rotation_ledger_session")
                            .from(Alias::new("rotation_ledger"), Alias::new("session_id"))
                            .to(Alias::new("meeting_sessions"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_rotation_ledger_session_sequence")
                    .table(Alias::new("rotation_ledger"))
                    .col(Alias::new("session_id"))
                    .col(Alias::new("rotation_sequence"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("rotation_ledger")).to_owned())
            .await
    }
}
