//! Recipe pricing engine.
//!
//! The engine turns a recipe's ingredient usages and its tenant's operating
//! expenses into a persisted total cost and a sale price. It owns no state
//! of record: every computation is a pure function of the current store
//! contents plus the per-tenant expense cache, reached through a
//! [`PriceGateway`].
//!
//! ```rust,no_run
//! use engine::{DbGateway, Engine};
//! use sea_orm::Database;
//! use uuid::Uuid;
//!
//! # async fn run() -> Result<(), engine::EngineError> {
//! # let (recipe_id, tenant_id) = (Uuid::new_v4(), Uuid::new_v4());
//! let db = Database::connect("sqlite::memory:").await?;
//! let engine = Engine::builder(DbGateway::new(db)).build();
//!
//! let price = engine
//!     .compute_recipe_price(recipe_id, tenant_id, 50.0, 20.0)
//!     .await?;
//! println!("sell at {}", price.final_price);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::EngineError;
pub use expense_cache::ExpenseCache;
pub use expenses::Expense;
pub use gateway::{DbGateway, PriceGateway};
pub use ingredient_cost::{CountWeightRule, IngredientUsage};
pub use recipes::RecipeRef;
pub use units::{Unit, UnitCategory, convert};

mod error;
mod expense_cache;
pub mod expenses;
mod gateway;
mod ingredient_cost;
pub mod ingredients;
mod overhead;
pub mod prices;
pub mod recipe_ingredients;
pub mod recipes;
mod units;
mod util;

type ResultEngine<T> = Result<T, EngineError>;

/// The priced breakdown of one recipe, rounded for the caller.
///
/// Internal arithmetic runs at full precision; every field here is rounded
/// to two decimals, the money precision of the API and the store.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub ingredient_cost: f64,
    pub operational_cost: f64,
    pub total_cost: f64,
    pub final_price: f64,
    pub cost_per_minute: f64,
}

/// One recipe a batch recomputation could not update.
#[derive(Debug, PartialEq)]
pub struct RecipeFailure {
    pub recipe_id: Uuid,
    pub error: EngineError,
}

/// Outcome of a batch recomputation.
///
/// Batches are best-effort: recipes that fail are reported here while the
/// rest of the batch proceeds, and updates already persisted stay persisted.
#[derive(Debug, Default, PartialEq)]
pub struct BatchReport {
    pub updated: usize,
    pub failed: Vec<RecipeFailure>,
}

impl BatchReport {
    fn absorb(&mut self, other: BatchReport) {
        self.updated += other.updated;
        self.failed.extend(other.failed);
    }
}

/// Prices recipes and cascades recomputation when their inputs change.
#[derive(Debug)]
pub struct Engine<G> {
    gateway: G,
    expenses: ExpenseCache,
    count_weight_rule: CountWeightRule,
}

impl<G: PriceGateway> Engine<G> {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder(gateway: G) -> EngineBuilder<G> {
        EngineBuilder {
            gateway,
            count_weight_rule: CountWeightRule::default(),
        }
    }

    /// Computes and persists one recipe's cost, returning the breakdown.
    ///
    /// Arguments are validated before the gateway is touched. The total cost
    /// (ingredients plus allocated overhead, without the margin) is written
    /// onto the recipe; the margin only shapes the returned `final_price`.
    pub async fn compute_recipe_price(
        &self,
        recipe_id: Uuid,
        tenant_id: Uuid,
        profit_margin_pct: f64,
        prep_minutes: f64,
    ) -> ResultEngine<PriceBreakdown> {
        util::require_id(recipe_id, "recipe")?;
        util::require_id(tenant_id, "tenant")?;
        util::validate_margin(profit_margin_pct)?;
        util::validate_prep_minutes(prep_minutes)?;

        let usages = self.gateway.fetch_recipe_ingredients(recipe_id).await?;
        let ingredient_cost =
            util::to_internal(ingredient_cost::recipe_cost(&usages, &self.count_weight_rule)?);

        let expenses = self
            .expenses
            .get_or_load(tenant_id, || self.gateway.fetch_expenses(tenant_id))
            .await?;
        let cost_per_minute = overhead::per_minute_rate(&expenses);
        let operational_cost = util::to_internal(overhead::allocate(cost_per_minute, prep_minutes));

        let total_cost = ingredient_cost + operational_cost;
        let final_price = total_cost * (1.0 + profit_margin_pct / 100.0);

        self.gateway
            .persist_recipe_cost(recipe_id, util::to_display(total_cost))
            .await?;

        tracing::debug!(
            "recipe {recipe_id}: ingredients {ingredient_cost:.3}, overhead {operational_cost:.3}, \
             total {total_cost:.3}, margin {profit_margin_pct}% -> {final_price:.3}"
        );

        Ok(PriceBreakdown {
            ingredient_cost: util::to_display(ingredient_cost),
            operational_cost: util::to_display(operational_cost),
            total_cost: util::to_display(total_cost),
            final_price: util::to_display(final_price),
            cost_per_minute: util::to_display(cost_per_minute),
        })
    }

    /// Reprices every recipe that uses the ingredient.
    ///
    /// Recipes are walked one at a time to bound the load on the store and
    /// to let one tenant's expense fetch serve its whole run of recipes.
    pub async fn recalculate_for_ingredient(
        &self,
        ingredient_id: Uuid,
    ) -> ResultEngine<BatchReport> {
        util::require_id(ingredient_id, "ingredient")?;
        let recipes = self.gateway.fetch_recipes_by_ingredient(ingredient_id).await?;
        let report = self.recalculate(recipes).await;
        tracing::info!(
            "repriced {} recipes using ingredient {ingredient_id}, {} failed",
            report.updated,
            report.failed.len()
        );
        Ok(report)
    }

    /// Drops the tenant's expense snapshot and reprices every recipe the
    /// tenant owns.
    pub async fn recalculate_for_tenant(&self, tenant_id: Uuid) -> ResultEngine<BatchReport> {
        util::require_id(tenant_id, "tenant")?;
        self.expenses.invalidate(tenant_id);
        let recipes = self.gateway.fetch_recipes_by_tenant(tenant_id).await?;
        let report = self.recalculate(recipes).await;
        tracing::info!(
            "repriced {} recipes for tenant {tenant_id}, {} failed",
            report.updated,
            report.failed.len()
        );
        Ok(report)
    }

    /// Reprices every tenant's catalog, tenant by tenant.
    ///
    /// Administrative operation for cost factors that moved under every
    /// tenant at once; nothing in the engine triggers it implicitly.
    pub async fn recalculate_all_tenants(&self) -> ResultEngine<BatchReport> {
        let tenants = self.gateway.fetch_tenant_ids_with_recipes().await?;
        let mut report = BatchReport::default();
        for tenant_id in tenants {
            report.absorb(self.recalculate_for_tenant(tenant_id).await?);
        }
        Ok(report)
    }

    /// Rewrites an operating expense, then reprices the tenant's catalog
    /// against the fresh expense rows.
    pub async fn update_expense(&self, expense: &Expense) -> ResultEngine<BatchReport> {
        util::require_id(expense.id, "expense")?;
        util::require_id(expense.tenant_id, "tenant")?;
        if !(expense.monthly_cost > 0.0) || !(expense.daily_minutes > 0.0) {
            return Err(EngineError::Validation(
                "monthly cost and daily minutes must be positive".to_string(),
            ));
        }

        self.gateway.update_expense(expense).await?;
        self.recalculate_for_tenant(expense.tenant_id).await
    }

    /// Drops a tenant's cached expense rows.
    ///
    /// Must be called after any expense mutation that bypasses
    /// [`update_expense`](Self::update_expense); the cache never refreshes
    /// itself.
    pub fn invalidate_expense_cache(&self, tenant_id: Uuid) {
        self.expenses.invalidate(tenant_id);
    }

    /// Sequential, best-effort walk over a batch of recipes.
    async fn recalculate(&self, recipes: Vec<RecipeRef>) -> BatchReport {
        let mut report = BatchReport::default();
        for recipe in recipes {
            match self
                .compute_recipe_price(
                    recipe.recipe_id,
                    recipe.tenant_id,
                    recipe.profit_margin_pct,
                    recipe.prep_minutes,
                )
                .await
            {
                Ok(_) => report.updated += 1,
                Err(error) => {
                    tracing::error!("failed to reprice recipe {}: {error}", recipe.recipe_id);
                    report.failed.push(RecipeFailure {
                        recipe_id: recipe.recipe_id,
                        error,
                    });
                }
            }
        }
        report
    }
}

/// The builder for `Engine`
pub struct EngineBuilder<G> {
    gateway: G,
    count_weight_rule: CountWeightRule,
}

impl<G: PriceGateway> EngineBuilder<G> {
    /// Replace the default count-based weight correction.
    pub fn count_weight_rule(mut self, rule: CountWeightRule) -> Self {
        self.count_weight_rule = rule;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine<G> {
        Engine {
            gateway: self.gateway,
            expenses: ExpenseCache::new(),
            count_weight_rule: self.count_weight_rule,
        }
    }
}
