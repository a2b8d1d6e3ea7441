use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::TenantId).string().not_null())
                    .col(ColumnDef::new(Expenses::Name).string().not_null())
                    .col(ColumnDef::new(Expenses::MonthlyCost).double().not_null())
                    .col(ColumnDef::new(Expenses::DailyMinutes).double().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Expenses {
    Table,
    Id,
    TenantId,
    Name,
    MonthlyCost,
    DailyMinutes,
}
