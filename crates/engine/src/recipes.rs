//! Recipes table and the reference rows cascade recomputation walks.
//!
//! The engine mutates exactly one column here, `total_cost`; everything else
//! belongs to the recipe-management side of the application.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ResultEngine, util};

/// The slice of a recipe the orchestrator needs to reprice it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipeRef {
    pub recipe_id: Uuid,
    pub tenant_id: Uuid,
    pub profit_margin_pct: f64,
    pub prep_minutes: f64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub profit_margin_pct: f64,
    pub prep_minutes: f64,
    /// Derived and persisted by the pricing engine.
    pub total_cost: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_ingredients::Entity")]
    RecipeIngredients,
}

impl Related<super::recipe_ingredients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeIngredients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for RecipeRef {
    type Error = crate::EngineError;

    fn try_from(model: Model) -> ResultEngine<RecipeRef> {
        Ok(RecipeRef {
            recipe_id: util::parse_uuid(&model.id, "recipe")?,
            tenant_id: util::parse_uuid(&model.tenant_id, "tenant")?,
            profit_margin_pct: model.profit_margin_pct,
            prep_minutes: model.prep_minutes,
        })
    }
}
