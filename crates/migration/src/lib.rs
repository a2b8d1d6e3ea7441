pub use sea_orm_migration::prelude::*;

mod m20260612_090000_ingredients;
mod m20260612_091500_prices;
mod m20260613_100000_recipes;
mod m20260613_101500_recipe_ingredients;
mod m20260614_080000_expenses;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260612_090000_ingredients::Migration),
            Box::new(m20260612_091500_prices::Migration),
            Box::new(m20260613_100000_recipes::Migration),
            Box::new(m20260613_101500_recipe_ingredients::Migration),
            Box::new(m20260614_080000_expenses::Migration),
        ]
    }
}
