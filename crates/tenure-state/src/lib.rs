//! tenure-state
//!
//! The stateful half of Tenure: a sled-backed `StateDb`, the two custody
//! engines (`StakingLedger` and `ThresholdGate`), and the host-side
//! collaborators they debit and credit (`TokenLedger`, `Registry`).
//!
//! Every public transition on an engine is one atomic step: a per-instance
//! reentrancy guard is taken before the first state read, internal records
//! commit before the external asset call, and a failed collaborator call
//! restores the pre-transition records before the error propagates.

pub mod db;
pub mod gate;
pub mod guard;
pub mod ledger;
pub mod registry;
pub mod token;

pub use db::StateDb;
pub use gate::ThresholdGate;
pub use ledger::StakingLedger;
pub use registry::Registry;
pub use token::TokenLedger;
