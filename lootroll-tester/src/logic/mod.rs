pub mod assets;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod tester;

pub use assets::TesterAssets;
pub use scenarios::{get_scenario, list_scenarios, scenario_keys};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
