//! Run ledger storage
//!
//! [`RunStore`] is the persistence contract behind the run ledger. Two
//! implementations exist: PostgreSQL ([`crate::adapters::postgresql`]) for
//! deployments and [`MemoryRunStore`] for local runs and tests.

pub mod factory;
pub mod memory;
pub mod traits;

pub use factory::create_run_store;
pub use memory::MemoryRunStore;
pub use traits::RunStore;
