use anyhow::{Result, ensure};

use super::TestScenario;
use crate::logic::{GameplayStrategy, RunEnding, SimulationPlan, SimulationSummary};

const FULL_RUN_STEPS: usize = 4_000;

pub fn full_run_scenario() -> TestScenario {
    TestScenario::simulation(
        "Full Run",
        SimulationPlan::new(GameplayStrategy::Balanced)
            .with_max_steps(FULL_RUN_STEPS)
            .with_expectation(assembly_expectation)
            .with_expectation(lore_expectation),
    )
}

fn assembly_expectation(summary: &SimulationSummary) -> Result<()> {
    let metrics = &summary.metrics;
    let expected = u8::try_from((metrics.parts_installed * 25).min(100))?;
    ensure!(
        metrics.integrity == expected,
        "integrity {}% after {} installs",
        metrics.integrity,
        metrics.parts_installed
    );
    ensure!(
        metrics.parts_installed <= metrics.parts_found,
        "installed {} parts but found {}",
        metrics.parts_installed,
        metrics.parts_found
    );
    if summary.ending == RunEnding::Assembled {
        ensure!(metrics.integrity == 100, "assembled at {}%", metrics.integrity);
    }
    Ok(())
}

/// Each purge leaves exactly one lore entry behind.
fn lore_expectation(summary: &SimulationSummary) -> Result<()> {
    let purges = usize::try_from(summary.metrics.purges)?;
    ensure!(
        summary.metrics.lore_entries == purges,
        "{} lore entries for {} purges",
        summary.metrics.lore_entries,
        purges
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::GameTester;

    #[test]
    fn full_run_expectations_hold() {
        let tester = GameTester::with_default_catalog(false);
        let scenario = full_run_scenario();
        for seed in [1, 2] {
            let summary = tester.run_plan(&scenario.plan, seed);
            for expectation in &scenario.plan.expectations {
                expectation.evaluate(&summary).unwrap();
            }
        }
    }
}
