pub mod manager;
pub mod provider;
pub mod store;
pub mod types;


pub use manager::*;
pub use provider::*;
pub use store::*;
pub use types::*;
