//! Port trait definitions (Hexagonal Architecture)
//!
//! Interfaces the scheduler consumes from the surrounding simulation:
//! - FactionLedger: read/write access to each faction's live resources
//!
//! These traits keep the scheduling core independent of how the world
//! stores its factions.

pub mod faction_ledger;

pub use faction_ledger::{FactionLedger, UntrackedLedger};
