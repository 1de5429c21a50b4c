use anyhow::{Result, ensure};

use crate::logic::{GameplayStrategy, SimulationPlan, SimulationSummary};

pub mod focus;
pub mod full_run;
pub mod smoke;

/// A named simulation plan.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// Every run must at least make a move.
fn played_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.metrics.steps > 0, "run never took a step");
    Ok(())
}

fn random_walk_scenario() -> TestScenario {
    TestScenario::simulation(
        "Random Walk",
        SimulationPlan::new(GameplayStrategy::Random)
            .with_max_steps(1_500)
            .with_expectation(played_expectation),
    )
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke::smoke_scenario()),
        "salvage-sweep" | "salvage" => Some(focus::salvage_sweep_scenario()),
        "combat-focus" | "combat" => Some(focus::combat_focus_scenario()),
        "escape-focus" | "escape" => Some(focus::escape_focus_scenario()),
        "full-run" | "full" => Some(full_run::full_run_scenario()),
        "random-walk" | "random" => Some(random_walk_scenario()),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("salvage-sweep", "Salvage Sweep - Cautious Strategy"),
        ("combat-focus", "Combat Focus - Aggressive Strategy"),
        ("escape-focus", "Escape Focus - Balanced Strategy"),
        ("full-run", "Full Run - Balanced Strategy"),
        ("random-walk", "Random Walk"),
    ]
}
