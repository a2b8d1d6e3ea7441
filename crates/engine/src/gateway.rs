//! Boundary between the engine and the relational store.
//!
//! The orchestrator is written against [`PriceGateway`]; the surrounding
//! application decides what stands behind it. [`DbGateway`] is the stock
//! sea-orm implementation used in production and in the integration tests.

use sea_orm::{
    ActiveValue, DatabaseConnection, JoinType, QueryFilter, QuerySelect, Statement, prelude::*,
};
use uuid::Uuid;

use crate::{
    ResultEngine,
    expenses::{self, Expense},
    ingredient_cost::IngredientUsage,
    recipe_ingredients,
    recipes::{self, RecipeRef},
    units::Unit,
    util,
};

/// Everything the engine needs from the store of record.
///
/// All reads return plain rows; the single write is the derived recipe cost.
/// Implementations map their own failures into
/// [`EngineError`](crate::EngineError); the engine never swallows them.
#[allow(async_fn_in_trait)]
pub trait PriceGateway {
    /// The recipe's usage rows, each joined with its ingredient's current
    /// unit cost.
    async fn fetch_recipe_ingredients(
        &self,
        recipe_id: Uuid,
    ) -> ResultEngine<Vec<IngredientUsage>>;

    /// The tenant's operating expense rows.
    async fn fetch_expenses(&self, tenant_id: Uuid) -> ResultEngine<Vec<Expense>>;

    /// Writes the derived total cost onto the recipe record.
    async fn persist_recipe_cost(&self, recipe_id: Uuid, total_cost: f64) -> ResultEngine<()>;

    /// Every recipe that uses the ingredient, across tenants.
    async fn fetch_recipes_by_ingredient(
        &self,
        ingredient_id: Uuid,
    ) -> ResultEngine<Vec<RecipeRef>>;

    /// Every recipe the tenant owns.
    async fn fetch_recipes_by_tenant(&self, tenant_id: Uuid) -> ResultEngine<Vec<RecipeRef>>;

    /// Every tenant owning at least one recipe.
    async fn fetch_tenant_ids_with_recipes(&self) -> ResultEngine<Vec<Uuid>>;

    /// Rewrites an expense row (the tenant id is never moved).
    async fn update_expense(&self, expense: &Expense) -> ResultEngine<()>;
}

/// [`PriceGateway`] over the relational store.
#[derive(Clone, Debug)]
pub struct DbGateway {
    database: DatabaseConnection,
}

impl DbGateway {
    #[must_use]
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

impl PriceGateway for DbGateway {
    async fn fetch_recipe_ingredients(
        &self,
        recipe_id: Uuid,
    ) -> ResultEngine<Vec<IngredientUsage>> {
        let backend = self.database.get_database_backend();
        // The effective unit cost is the newest price row per ingredient.
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT ri.quantity, ri.unit AS usage_unit, \
                    i.id AS ingredient_id, i.name, i.waste_pct, i.cost_unit, \
                    p.unit_cost \
             FROM recipe_ingredients ri \
             JOIN ingredients i ON i.id = ri.ingredient_id \
             JOIN ( \
                 SELECT p1.ingredient_id, p1.unit_cost \
                 FROM prices p1 \
                 INNER JOIN ( \
                     SELECT ingredient_id, MAX(id) AS max_id \
                     FROM prices \
                     GROUP BY ingredient_id \
                 ) p2 ON p1.id = p2.max_id \
             ) p ON p.ingredient_id = i.id \
             WHERE ri.recipe_id = ?",
            vec![recipe_id.to_string().into()],
        );

        let rows = self.database.query_all(stmt).await?;
        let mut usages = Vec::with_capacity(rows.len());
        for row in rows {
            let ingredient_id: String = row.try_get("", "ingredient_id")?;
            let usage_unit: String = row.try_get("", "usage_unit")?;
            let cost_unit: String = row.try_get("", "cost_unit")?;
            let waste_pct: f64 = row.try_get("", "waste_pct")?;
            usages.push(IngredientUsage {
                ingredient_id: util::parse_uuid(&ingredient_id, "ingredient")?,
                ingredient_name: row.try_get("", "name")?,
                quantity_used: row.try_get("", "quantity")?,
                usage_unit: Unit::parse(&usage_unit),
                // The waste index is never negative; clamp whatever the
                // collaborator managed to store.
                waste_pct: waste_pct.max(0.0),
                cost_unit: Unit::parse(&cost_unit),
                unit_cost: row.try_get("", "unit_cost")?,
            });
        }
        Ok(usages)
    }

    async fn fetch_expenses(&self, tenant_id: Uuid) -> ResultEngine<Vec<Expense>> {
        let models = expenses::Entity::find()
            .filter(expenses::Column::TenantId.eq(tenant_id.to_string()))
            .all(&self.database)
            .await?;
        models.into_iter().map(Expense::try_from).collect()
    }

    async fn persist_recipe_cost(&self, recipe_id: Uuid, total_cost: f64) -> ResultEngine<()> {
        let recipe = recipes::ActiveModel {
            id: ActiveValue::Set(recipe_id.to_string()),
            total_cost: ActiveValue::Set(Some(total_cost)),
            ..Default::default()
        };
        recipe.update(&self.database).await?;
        Ok(())
    }

    async fn fetch_recipes_by_ingredient(
        &self,
        ingredient_id: Uuid,
    ) -> ResultEngine<Vec<RecipeRef>> {
        let models = recipes::Entity::find()
            .join(
                JoinType::InnerJoin,
                recipes::Relation::RecipeIngredients.def(),
            )
            .filter(recipe_ingredients::Column::IngredientId.eq(ingredient_id.to_string()))
            .all(&self.database)
            .await?;
        models.into_iter().map(RecipeRef::try_from).collect()
    }

    async fn fetch_recipes_by_tenant(&self, tenant_id: Uuid) -> ResultEngine<Vec<RecipeRef>> {
        let models = recipes::Entity::find()
            .filter(recipes::Column::TenantId.eq(tenant_id.to_string()))
            .all(&self.database)
            .await?;
        models.into_iter().map(RecipeRef::try_from).collect()
    }

    async fn fetch_tenant_ids_with_recipes(&self) -> ResultEngine<Vec<Uuid>> {
        let backend = self.database.get_database_backend();
        let stmt = Statement::from_string(backend, "SELECT DISTINCT tenant_id FROM recipes");
        let rows = self.database.query_all(stmt).await?;
        let mut tenants = Vec::with_capacity(rows.len());
        for row in rows {
            let tenant_id: String = row.try_get("", "tenant_id")?;
            tenants.push(util::parse_uuid(&tenant_id, "tenant")?);
        }
        Ok(tenants)
    }

    async fn update_expense(&self, expense: &Expense) -> ResultEngine<()> {
        let model = expenses::ActiveModel {
            id: ActiveValue::Set(expense.id.to_string()),
            name: ActiveValue::Set(expense.name.clone()),
            monthly_cost: ActiveValue::Set(expense.monthly_cost),
            daily_minutes: ActiveValue::Set(expense.daily_minutes),
            ..Default::default()
        };
        model.update(&self.database).await?;
        Ok(())
    }
}
