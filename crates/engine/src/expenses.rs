//! Operating expenses table.
//!
//! An expense is a monthly cost stream (rent, electricity, labor) amortized
//! over the minutes the business operates per day. Rows with a non-positive
//! monthly cost or non-positive daily minutes exist in the store but
//! contribute nothing to the per-minute rate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ResultEngine, util};

/// One operating expense of a tenant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub monthly_cost: f64,
    pub daily_minutes: f64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub monthly_cost: f64,
    pub daily_minutes: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Expense {
    type Error = crate::EngineError;

    fn try_from(model: Model) -> ResultEngine<Expense> {
        Ok(Expense {
            id: util::parse_uuid(&model.id, "expense")?,
            tenant_id: util::parse_uuid(&model.tenant_id, "tenant")?,
            name: model.name,
            monthly_cost: model.monthly_cost,
            daily_minutes: model.daily_minutes,
        })
    }
}
