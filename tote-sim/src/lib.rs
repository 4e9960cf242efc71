pub mod error;
pub mod state;
pub mod runner;

pub use error::{SimError, SimResult};
pub use runner::{RunSummary, SeedSummary};
pub use state::SimState;
