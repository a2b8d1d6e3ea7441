use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use uuid::Uuid;

use engine::{
    CountWeightRule, Engine, EngineError, Expense, IngredientUsage, PriceGateway, RecipeRef, Unit,
};

/// In-memory gateway so the orchestrator can be exercised without a store.
/// Counters record how often the engine actually reaches out.
#[derive(Clone, Default)]
struct FakeGateway {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    usages: HashMap<Uuid, Vec<IngredientUsage>>,
    expenses: HashMap<Uuid, Vec<Expense>>,
    recipes: Vec<RecipeRef>,
    usages_by_ingredient: HashMap<Uuid, Vec<Uuid>>,
    persisted: HashMap<Uuid, Vec<f64>>,
    expense_fetches: usize,
    ingredient_fetches: usize,
}

impl FakeGateway {
    fn add_recipe(&self, recipe: RecipeRef, usages: Vec<IngredientUsage>) {
        let mut state = self.state.lock().unwrap();
        for usage in &usages {
            state
                .usages_by_ingredient
                .entry(usage.ingredient_id)
                .or_default()
                .push(recipe.recipe_id);
        }
        state.usages.insert(recipe.recipe_id, usages);
        state.recipes.push(recipe);
    }

    fn set_expenses(&self, tenant_id: Uuid, expenses: Vec<Expense>) {
        self.state.lock().unwrap().expenses.insert(tenant_id, expenses);
    }

    fn expense_fetches(&self) -> usize {
        self.state.lock().unwrap().expense_fetches
    }

    fn ingredient_fetches(&self) -> usize {
        self.state.lock().unwrap().ingredient_fetches
    }

    fn persisted(&self, recipe_id: Uuid) -> Vec<f64> {
        self.state
            .lock()
            .unwrap()
            .persisted
            .get(&recipe_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl PriceGateway for FakeGateway {
    async fn fetch_recipe_ingredients(
        &self,
        recipe_id: Uuid,
    ) -> Result<Vec<IngredientUsage>, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.ingredient_fetches += 1;
        Ok(state.usages.get(&recipe_id).cloned().unwrap_or_default())
    }

    async fn fetch_expenses(&self, tenant_id: Uuid) -> Result<Vec<Expense>, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.expense_fetches += 1;
        Ok(state.expenses.get(&tenant_id).cloned().unwrap_or_default())
    }

    async fn persist_recipe_cost(
        &self,
        recipe_id: Uuid,
        total_cost: f64,
    ) -> Result<(), EngineError> {
        self.state
            .lock()
            .unwrap()
            .persisted
            .entry(recipe_id)
            .or_default()
            .push(total_cost);
        Ok(())
    }

    async fn fetch_recipes_by_ingredient(
        &self,
        ingredient_id: Uuid,
    ) -> Result<Vec<RecipeRef>, EngineError> {
        let state = self.state.lock().unwrap();
        let ids = state
            .usages_by_ingredient
            .get(&ingredient_id)
            .cloned()
            .unwrap_or_default();
        Ok(state
            .recipes
            .iter()
            .filter(|recipe| ids.contains(&recipe.recipe_id))
            .copied()
            .collect())
    }

    async fn fetch_recipes_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<RecipeRef>, EngineError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .recipes
            .iter()
            .filter(|recipe| recipe.tenant_id == tenant_id)
            .copied()
            .collect())
    }

    async fn fetch_tenant_ids_with_recipes(&self) -> Result<Vec<Uuid>, EngineError> {
        let state = self.state.lock().unwrap();
        let mut tenants: Vec<Uuid> = state.recipes.iter().map(|r| r.tenant_id).collect();
        tenants.sort();
        tenants.dedup();
        Ok(tenants)
    }

    async fn update_expense(&self, expense: &Expense) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let rows = state
            .expenses
            .get_mut(&expense.tenant_id)
            .ok_or_else(|| EngineError::KeyNotFound("expense".to_string()))?;
        let row = rows
            .iter_mut()
            .find(|row| row.id == expense.id)
            .ok_or_else(|| EngineError::KeyNotFound("expense".to_string()))?;
        *row = expense.clone();
        Ok(())
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn milk_usage() -> IngredientUsage {
    IngredientUsage {
        ingredient_id: Uuid::new_v4(),
        ingredient_name: "Leite".to_string(),
        quantity_used: 500.0,
        usage_unit: Unit::Milliliter,
        waste_pct: 10.0,
        cost_unit: Unit::Liter,
        unit_cost: 10.0,
    }
}

fn rent(tenant_id: Uuid) -> Expense {
    Expense {
        id: Uuid::new_v4(),
        tenant_id,
        name: "Aluguel".to_string(),
        monthly_cost: 3000.0,
        daily_minutes: 480.0,
    }
}

fn recipe(tenant_id: Uuid, profit_margin_pct: f64, prep_minutes: f64) -> RecipeRef {
    RecipeRef {
        recipe_id: Uuid::new_v4(),
        tenant_id,
        profit_margin_pct,
        prep_minutes,
    }
}

#[tokio::test]
async fn egg_correction_end_to_end() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let bolo = recipe(tenant, 0.0, 0.0);
    gateway.add_recipe(
        bolo,
        vec![IngredientUsage {
            ingredient_id: Uuid::new_v4(),
            ingredient_name: "Ovo".to_string(),
            quantity_used: 30.0,
            usage_unit: Unit::Piece,
            waste_pct: 0.0,
            cost_unit: Unit::Kilogram,
            unit_cost: 10.0,
        }],
    );

    let engine = Engine::builder(gateway.clone()).build();
    let price = engine
        .compute_recipe_price(bolo.recipe_id, tenant, 0.0, 0.0)
        .await
        .unwrap();

    assert_close(price.ingredient_cost, 0.01);
    assert_close(price.total_cost, 0.01);
    assert_eq!(gateway.persisted(bolo.recipe_id), vec![0.01]);
}

#[tokio::test]
async fn composition_of_ingredients_margin_and_overhead() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let bolo = recipe(tenant, 50.0, 20.0);
    gateway.add_recipe(bolo, vec![milk_usage()]);
    gateway.set_expenses(tenant, vec![rent(tenant)]);

    let engine = Engine::builder(gateway.clone()).build();
    let price = engine
        .compute_recipe_price(bolo.recipe_id, tenant, 50.0, 20.0)
        .await
        .unwrap();

    assert_close(price.ingredient_cost, 5.5);
    assert_close(price.operational_cost, 0.07);
    assert_close(price.total_cost, 5.57);
    assert_close(price.final_price, 8.35);
    // The per-minute rate is far below a cent; the boundary rounding keeps it
    // at two decimals regardless.
    assert_close(price.cost_per_minute, 0.0);
    assert_eq!(gateway.persisted(bolo.recipe_id), vec![5.57]);
}

#[tokio::test]
async fn zero_margin_price_equals_total_cost() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let bolo = recipe(tenant, 0.0, 20.0);
    gateway.add_recipe(bolo, vec![milk_usage()]);
    gateway.set_expenses(tenant, vec![rent(tenant)]);

    let engine = Engine::builder(gateway.clone()).build();
    let price = engine
        .compute_recipe_price(bolo.recipe_id, tenant, 0.0, 20.0)
        .await
        .unwrap();

    assert_eq!(price.final_price, price.total_cost);
}

#[tokio::test]
async fn repeated_computation_persists_identical_values() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let bolo = recipe(tenant, 50.0, 20.0);
    gateway.add_recipe(bolo, vec![milk_usage()]);
    gateway.set_expenses(tenant, vec![rent(tenant)]);

    let engine = Engine::builder(gateway.clone()).build();
    let first = engine
        .compute_recipe_price(bolo.recipe_id, tenant, 50.0, 20.0)
        .await
        .unwrap();
    let second = engine
        .compute_recipe_price(bolo.recipe_id, tenant, 50.0, 20.0)
        .await
        .unwrap();

    assert_eq!(first, second);
    let persisted = gateway.persisted(bolo.recipe_id);
    assert_eq!(persisted.len(), 2);
    assert_eq!(persisted[0].to_bits(), persisted[1].to_bits());
}

#[tokio::test]
async fn validation_never_reaches_the_gateway() {
    let gateway = FakeGateway::default();
    let engine = Engine::builder(gateway.clone()).build();
    let (recipe_id, tenant_id) = (Uuid::new_v4(), Uuid::new_v4());

    let err = engine
        .compute_recipe_price(Uuid::nil(), tenant_id, 0.0, 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .compute_recipe_price(recipe_id, Uuid::nil(), 0.0, 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .compute_recipe_price(recipe_id, tenant_id, 1000.1, 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .compute_recipe_price(recipe_id, tenant_id, 50.0, -1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    assert_eq!(gateway.ingredient_fetches(), 0);
    assert_eq!(gateway.expense_fetches(), 0);
}

#[tokio::test]
async fn recipe_without_ingredients_cannot_be_priced() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let empty = recipe(tenant, 0.0, 0.0);
    gateway.add_recipe(empty, Vec::new());

    let engine = Engine::builder(gateway.clone()).build();
    let err = engine
        .compute_recipe_price(empty.recipe_id, tenant, 0.0, 0.0)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::Computation("no ingredients for recipe".to_string())
    );
    assert!(gateway.persisted(empty.recipe_id).is_empty());
}

#[tokio::test]
async fn expenses_are_fetched_once_until_invalidated() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let bolo = recipe(tenant, 0.0, 20.0);
    gateway.add_recipe(bolo, vec![milk_usage()]);
    gateway.set_expenses(tenant, vec![rent(tenant)]);

    let engine = Engine::builder(gateway.clone()).build();
    for _ in 0..3 {
        engine
            .compute_recipe_price(bolo.recipe_id, tenant, 0.0, 20.0)
            .await
            .unwrap();
    }
    assert_eq!(gateway.expense_fetches(), 1);

    engine.invalidate_expense_cache(tenant);
    engine
        .compute_recipe_price(bolo.recipe_id, tenant, 0.0, 20.0)
        .await
        .unwrap();
    assert_eq!(gateway.expense_fetches(), 2);
}

#[tokio::test]
async fn stale_expenses_are_used_until_someone_invalidates() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let bolo = recipe(tenant, 0.0, 20.0);
    gateway.add_recipe(bolo, vec![milk_usage()]);
    gateway.set_expenses(tenant, vec![rent(tenant)]);

    let engine = Engine::builder(gateway.clone()).build();
    let before = engine
        .compute_recipe_price(bolo.recipe_id, tenant, 0.0, 20.0)
        .await
        .unwrap();

    // Mutating the rows behind the engine's back changes nothing until the
    // cache is dropped; that is the documented contract.
    let mut doubled = rent(tenant);
    doubled.monthly_cost = 6000.0;
    gateway.set_expenses(tenant, vec![doubled]);

    let stale = engine
        .compute_recipe_price(bolo.recipe_id, tenant, 0.0, 20.0)
        .await
        .unwrap();
    assert_eq!(stale, before);

    engine.invalidate_expense_cache(tenant);
    let fresh = engine
        .compute_recipe_price(bolo.recipe_id, tenant, 0.0, 20.0)
        .await
        .unwrap();
    assert_close(fresh.operational_cost, 0.14);
}

#[tokio::test]
async fn batch_reports_failures_without_aborting() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let first = recipe(tenant, 10.0, 10.0);
    let broken = recipe(tenant, 10.0, 10.0);
    let third = recipe(tenant, 10.0, 10.0);
    gateway.add_recipe(first, vec![milk_usage()]);
    gateway.add_recipe(broken, Vec::new());
    gateway.add_recipe(third, vec![milk_usage()]);
    gateway.set_expenses(tenant, vec![rent(tenant)]);

    let engine = Engine::builder(gateway.clone()).build();
    let report = engine.recalculate_for_tenant(tenant).await.unwrap();

    assert_eq!(report.updated, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].recipe_id, broken.recipe_id);
    assert_eq!(
        report.failed[0].error,
        EngineError::Computation("no ingredients for recipe".to_string())
    );

    assert_eq!(gateway.persisted(first.recipe_id).len(), 1);
    assert!(gateway.persisted(broken.recipe_id).is_empty());
    assert_eq!(gateway.persisted(third.recipe_id).len(), 1);
}

#[tokio::test]
async fn ingredient_change_reprices_every_dependent_recipe() {
    let gateway = FakeGateway::default();
    let (tenant_a, tenant_b) = (Uuid::new_v4(), Uuid::new_v4());
    let shared = milk_usage();

    let cake = recipe(tenant_a, 0.0, 0.0);
    let pudding = recipe(tenant_b, 0.0, 0.0);
    gateway.add_recipe(cake, vec![shared.clone()]);
    gateway.add_recipe(pudding, vec![shared.clone()]);

    let engine = Engine::builder(gateway.clone()).build();
    let report = engine
        .recalculate_for_ingredient(shared.ingredient_id)
        .await
        .unwrap();

    assert_eq!(report.updated, 2);
    assert!(report.failed.is_empty());
    assert_eq!(gateway.persisted(cake.recipe_id), vec![5.5]);
    assert_eq!(gateway.persisted(pudding.recipe_id), vec![5.5]);
}

#[tokio::test]
async fn tenant_recalculation_refetches_expenses() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let bolo = recipe(tenant, 0.0, 20.0);
    gateway.add_recipe(bolo, vec![milk_usage()]);
    gateway.set_expenses(tenant, vec![rent(tenant)]);

    let engine = Engine::builder(gateway.clone()).build();
    engine
        .compute_recipe_price(bolo.recipe_id, tenant, 0.0, 20.0)
        .await
        .unwrap();
    assert_eq!(gateway.expense_fetches(), 1);

    let report = engine.recalculate_for_tenant(tenant).await.unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(gateway.expense_fetches(), 2);
}

#[tokio::test]
async fn all_tenants_recalculation_walks_every_catalog() {
    let gateway = FakeGateway::default();
    let (tenant_a, tenant_b) = (Uuid::new_v4(), Uuid::new_v4());
    let cake = recipe(tenant_a, 0.0, 0.0);
    let pudding = recipe(tenant_b, 0.0, 0.0);
    gateway.add_recipe(cake, vec![milk_usage()]);
    gateway.add_recipe(pudding, vec![milk_usage()]);

    let engine = Engine::builder(gateway.clone()).build();
    let report = engine.recalculate_all_tenants().await.unwrap();

    assert_eq!(report.updated, 2);
    assert!(report.failed.is_empty());
    assert_eq!(gateway.expense_fetches(), 2);
}

#[tokio::test]
async fn update_expense_cascades_once_over_the_tenant() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let bolo = recipe(tenant, 0.0, 20.0);
    gateway.add_recipe(bolo, vec![milk_usage()]);
    let expense = rent(tenant);
    gateway.set_expenses(tenant, vec![expense.clone()]);

    let engine = Engine::builder(gateway.clone()).build();
    engine
        .compute_recipe_price(bolo.recipe_id, tenant, 0.0, 20.0)
        .await
        .unwrap();

    let mut updated = expense;
    updated.monthly_cost = 6000.0;
    let report = engine.update_expense(&updated).await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(gateway.expense_fetches(), 2);
    let persisted = gateway.persisted(bolo.recipe_id);
    // 5.5 ingredients + 0.14 of doubled overhead.
    assert_close(persisted[1], 5.64);
}

#[tokio::test]
async fn update_expense_validates_the_row() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let mut expense = rent(tenant);
    expense.monthly_cost = 0.0;

    let engine = Engine::builder(gateway.clone()).build();
    let err = engine.update_expense(&expense).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn breakdown_serializes_for_the_api_layer() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let bolo = recipe(tenant, 50.0, 20.0);
    gateway.add_recipe(bolo, vec![milk_usage()]);
    gateway.set_expenses(tenant, vec![rent(tenant)]);

    let engine = Engine::builder(gateway.clone()).build();
    let price = engine
        .compute_recipe_price(bolo.recipe_id, tenant, 50.0, 20.0)
        .await
        .unwrap();

    let json = serde_json::to_value(price).unwrap();
    assert_eq!(json["final_price"], 8.35);
    assert_eq!(json["total_cost"], 5.57);
}

#[tokio::test]
async fn count_weight_rule_override_is_honored() {
    let gateway = FakeGateway::default();
    let tenant = Uuid::new_v4();
    let bolo = recipe(tenant, 0.0, 0.0);
    gateway.add_recipe(
        bolo,
        vec![IngredientUsage {
            ingredient_id: Uuid::new_v4(),
            ingredient_name: "Codorna".to_string(),
            quantity_used: 12.0,
            usage_unit: Unit::Piece,
            waste_pct: 0.0,
            cost_unit: Unit::Kilogram,
            unit_cost: 10.0,
        }],
    );

    let engine = Engine::builder(gateway.clone())
        .count_weight_rule(CountWeightRule::new(["codorna".to_string()], 12.0))
        .build();
    let price = engine
        .compute_recipe_price(bolo.recipe_id, tenant, 0.0, 0.0)
        .await
        .unwrap();

    // 12 g -> /12 -> 1 g at 0.01 per gram.
    assert_close(price.ingredient_cost, 0.01);
}
