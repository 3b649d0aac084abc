//! Server-side authoritative price table.
//!
//! Order amounts are never derived from client input; they are looked up
//! here by an opaque plan identifier. The table is supplied as external
//! configuration and validated at startup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Price and description for one purchasable plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPrice {
    pub amount_cents: i64,
    pub description: String,
}

/// Immutable plan-id to price mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(HashMap<String, PlanPrice>);

impl PriceTable {
    /// Builds a table, rejecting empty tables and non-positive prices.
    pub fn new(plans: HashMap<String, PlanPrice>) -> Result<Self, DomainError> {
        if plans.is_empty() {
            return Err(DomainError::EmptyPriceTable);
        }
        for (plan_id, price) in &plans {
            if price.amount_cents <= 0 {
                return Err(DomainError::InvalidPrice {
                    plan_id: plan_id.clone(),
                    amount_cents: price.amount_cents,
                });
            }
        }
        Ok(Self(plans))
    }

    /// Looks up a plan, rejecting unknown identifiers.
    pub fn lookup(&self, plan_id: &str) -> Result<&PlanPrice, DomainError> {
        self.0
            .get(plan_id)
            .ok_or_else(|| DomainError::UnknownPlan(plan_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
