//! Faction resource accessor port.

use std::collections::{BTreeMap, HashMap};

use crate::domain::models::{FactionId, ResourcePool};

/// Port for reading and mutating a faction's live resources
///
/// The assignment loop checks upfront costs against the pool returned here
/// and deducts admitted costs from it in place. Implementations are owned by
/// the surrounding simulation; the scheduler only borrows them for one pass.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use castellan::domain::models::{FactionId, ResourcePool};
/// use castellan::domain::ports::FactionLedger;
///
/// let mut ledger = HashMap::new();
/// ledger.insert(FactionId::from("stark"), ResourcePool::new(0, 100, 50));
///
/// let pool = ledger.pool_mut(&FactionId::from("stark")).unwrap();
/// pool.wood -= 10;
/// assert_eq!(ledger.pool(&FactionId::from("stark")).unwrap().wood, 40);
/// ```
pub trait FactionLedger {
    /// Current resources of `faction`, or `None` if the ledger does not track it
    fn pool(&self, faction: &FactionId) -> Option<&ResourcePool>;

    /// Mutable access to the resources of `faction`
    fn pool_mut(&mut self, faction: &FactionId) -> Option<&mut ResourcePool>;
}

impl FactionLedger for HashMap<FactionId, ResourcePool> {
    fn pool(&self, faction: &FactionId) -> Option<&ResourcePool> {
        self.get(faction)
    }

    fn pool_mut(&mut self, faction: &FactionId) -> Option<&mut ResourcePool> {
        self.get_mut(faction)
    }
}

impl FactionLedger for BTreeMap<FactionId, ResourcePool> {
    fn pool(&self, faction: &FactionId) -> Option<&ResourcePool> {
        self.get(faction)
    }

    fn pool_mut(&mut self, faction: &FactionId) -> Option<&mut ResourcePool> {
        self.get_mut(faction)
    }
}

/// Ledger that tracks no factions; every task is admitted uncharged.
#[derive(Debug, Clone, Copy, Default)]
pub struct UntrackedLedger;

impl FactionLedger for UntrackedLedger {
    fn pool(&self, _faction: &FactionId) -> Option<&ResourcePool> {
        None
    }

    fn pool_mut(&mut self, _faction: &FactionId) -> Option<&mut ResourcePool> {
        None
    }
}
