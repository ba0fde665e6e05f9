pub mod engine;
pub mod ledger;
pub mod pricing;
pub mod types;

#[cfg(test)]
mod tests;

pub use engine::*;
pub use ledger::*;
pub use pricing::*;
pub use types::*;
