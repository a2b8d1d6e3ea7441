use sea_orm_migration::prelude::*;

use super::m20260612_090000_ingredients::Ingredients;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Prices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prices::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prices::IngredientId).string().not_null())
                    .col(ColumnDef::new(Prices::UnitCost).double().not_null())
                    .col(
                        ColumnDef::new(Prices::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-prices-ingredient_id")
                            .from(Prices::Table, Prices::IngredientId)
                            .to(Ingredients::Table, Ingredients::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Prices::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Prices {
    Table,
    Id,
    IngredientId,
    UnitCost,
    RecordedAt,
}
