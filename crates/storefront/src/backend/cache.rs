//! Cache types for catalog reads.

use std::sync::Arc;

use ironhouse_core::{ChangeKind, PlanId, ProductId, TrainerId};

use super::types::{MembershipPlan, Product, Resource, Trainer};

/// Cache key for catalog and content reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Product(ProductId),
    Plans,
    Plan(PlanId),
    Trainers,
    Trainer(TrainerId),
    Resources,
    Resource(String),
}

impl CacheKey {
    /// Whether a realtime change of `kind` makes this entry stale.
    #[must_use]
    pub const fn affected_by(&self, kind: ChangeKind) -> bool {
        match kind {
            ChangeKind::ProductChanges => matches!(self, Self::Products | Self::Product(_)),
            ChangeKind::MembershipPlanChanges => matches!(self, Self::Plans | Self::Plan(_)),
            // Carts are never cached.
            ChangeKind::CartUpdates => false,
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
    Plans(Arc<Vec<MembershipPlan>>),
    Plan(Box<MembershipPlan>),
    Trainers(Arc<Vec<Trainer>>),
    Trainer(Box<Trainer>),
    Resources(Arc<Vec<Resource>>),
    Resource(Box<Resource>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_kinds_only_touch_their_entries() {
        let product = CacheKey::Product(ProductId::new("p1"));
        let plan = CacheKey::Plan(PlanId::new("gold"));

        assert!(product.affected_by(ChangeKind::ProductChanges));
        assert!(CacheKey::Products.affected_by(ChangeKind::ProductChanges));
        assert!(!plan.affected_by(ChangeKind::ProductChanges));

        assert!(plan.affected_by(ChangeKind::MembershipPlanChanges));
        assert!(!CacheKey::Resources.affected_by(ChangeKind::MembershipPlanChanges));

        assert!(!product.affected_by(ChangeKind::CartUpdates));
        assert!(!CacheKey::Trainers.affected_by(ChangeKind::CartUpdates));
    }
}
