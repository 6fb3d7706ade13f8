//! Player stockpile and the ledger interface production cycles report to

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::catalog::{ObjectKey, ResourceKind, ResourceVector, RESOURCE_COUNT};

/// Receives one call per completed production cycle.
pub trait Ledger {
    fn apply_cycle(&mut self, object: ObjectKey, cost: &ResourceVector, output: &ResourceVector);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient {resource}: need {needed}, have {available}")]
    Insufficient {
        resource: &'static str,
        needed: u64,
        available: u64,
    },
}

/// Global resource totals. Amounts never drop below zero; a cycle whose cost
/// exceeds the stock drains that resource to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stockpile {
    amounts: [u64; RESOURCE_COUNT],
    cycles_applied: u64,
}

impl Stockpile {
    pub fn new(initial: ResourceVector) -> Self {
        let mut amounts = [0_u64; RESOURCE_COUNT];
        for (kind, amount) in initial.iter() {
            amounts[kind.index()] = u64::from(amount);
        }
        Self {
            amounts,
            cycles_applied: 0,
        }
    }

    pub fn get(&self, kind: ResourceKind) -> u64 {
        self.amounts[kind.index()]
    }

    pub fn cycles_applied(&self) -> u64 {
        self.cycles_applied
    }

    pub fn can_afford(&self, cost: &ResourceVector) -> Result<(), LedgerError> {
        for (kind, needed) in cost.iter() {
            let available = self.amounts[kind.index()];
            if available < u64::from(needed) {
                return Err(LedgerError::Insufficient {
                    resource: kind.name(),
                    needed: u64::from(needed),
                    available,
                });
            }
        }
        Ok(())
    }

    /// Charges a one-time cost, all or nothing.
    pub fn charge(&mut self, cost: &ResourceVector) -> Result<(), LedgerError> {
        self.can_afford(cost)?;
        for (kind, amount) in cost.iter() {
            self.amounts[kind.index()] -= u64::from(amount);
        }
        Ok(())
    }

    pub fn deposit(&mut self, amounts: &ResourceVector) {
        for (kind, amount) in amounts.iter() {
            let slot = &mut self.amounts[kind.index()];
            *slot = slot.saturating_add(u64::from(amount));
        }
    }
}

impl Ledger for Stockpile {
    fn apply_cycle(&mut self, object: ObjectKey, cost: &ResourceVector, output: &ResourceVector) {
        for (kind, amount) in cost.iter() {
            let slot = &mut self.amounts[kind.index()];
            let amount = u64::from(amount);
            if *slot < amount {
                warn!(
                    %object,
                    resource = kind.name(),
                    needed = amount,
                    available = *slot,
                    "cycle upkeep exceeds stockpile"
                );
            }
            *slot = slot.saturating_sub(amount);
        }
        self.deposit(output);
        self.cycles_applied += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_is_all_or_nothing() {
        let mut stock = Stockpile::new(ResourceVector::ZERO.with(ResourceKind::Gold, 10));
        let cost = ResourceVector::ZERO
            .with(ResourceKind::Gold, 5)
            .with(ResourceKind::Wood, 1);
        let err = stock.charge(&cost).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Insufficient {
                resource: "wood",
                needed: 1,
                available: 0
            }
        );
        assert_eq!(stock.get(ResourceKind::Gold), 10);

        stock.charge(&ResourceVector::ZERO.with(ResourceKind::Gold, 4)).unwrap();
        assert_eq!(stock.get(ResourceKind::Gold), 6);
    }

    #[test]
    fn apply_cycle_subtracts_cost_and_adds_output() {
        let mut stock = Stockpile::new(ResourceVector::ZERO.with(ResourceKind::Energy, 3));
        let cost = ResourceVector::ZERO.with(ResourceKind::Energy, 1);
        let output = ResourceVector::ZERO.with(ResourceKind::Wood, 5);
        stock.apply_cycle(ObjectKey::building(1), &cost, &output);
        assert_eq!(stock.get(ResourceKind::Energy), 2);
        assert_eq!(stock.get(ResourceKind::Wood), 5);
        assert_eq!(stock.cycles_applied(), 1);
    }

    #[test]
    fn apply_cycle_never_goes_negative() {
        let mut stock = Stockpile::default();
        let cost = ResourceVector::ZERO.with(ResourceKind::Food, 2);
        stock.apply_cycle(ObjectKey::building(2), &cost, &ResourceVector::ZERO);
        assert_eq!(stock.get(ResourceKind::Food), 0);
        assert_eq!(stock.cycles_applied(), 1);
    }
}
