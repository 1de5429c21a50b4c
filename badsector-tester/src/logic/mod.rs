pub mod game_tester;
pub mod invariants;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use game_tester::{
    GameTester, RunEnding, RunMetrics, SimulationExpectation, SimulationPlan, SimulationSummary,
    detect_ending,
};
pub use invariants::InvariantTracker;
pub use policy::{GameplayStrategy, PlayerPolicy, PolicyDecision};
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use simulation::{SimulationConfig, SimulationSession, TurnOutcome};
pub use tester::*;
