use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010002_create_groups"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("groups"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("name")).string().not_null().unique_key())
                    // comma separated lowercase weekday abbreviations, e.g. "mon,thu"
                    .col(ColumnDef::new(Alias::new("meeting_days")).string().not_null())
                    // "HH:MM" in the service timezone
                    .col(ColumnDef::new(Alias::new("meeting_time")).string_len(5).not_null())
                    .col(ColumnDef::new(Alias::new("duration_minutes")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("facilitator_id")).big_integer().null())
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_groups_facilitator")
                            .from(Alias::new("groups"), Alias::new("facilitator_id"))
                            .to(Alias::new("users"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Alias::new("group_members"))
                    .if_not_exists()
                    // one group per user
                    .col(ColumnDef::new(Alias::new("user_id")).big_integer().not_null().primary_key())
                    .col(ColumnDef::new(Alias::new("group_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("joined_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_members_user")
                            .from(Alias::new("group_members"), Alias::new("user_id"))
                            .to(Alias::new("users"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_members_group")
                            .from(Alias::new("group_members"), Alias::new("group_id"))
                            .to(Alias::new("groups"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("group_members")).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Alias::new("groups")).to_owned())
            .await
    }
}
