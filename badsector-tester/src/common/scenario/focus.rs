//! Scenarios that push one subsystem hard.
use anyhow::{Result, ensure};
use badsector_game::GameSession;

use super::TestScenario;
use crate::logic::{GameplayStrategy, RunEnding, SimulationPlan, SimulationSummary};

pub fn salvage_sweep_scenario() -> TestScenario {
    TestScenario::simulation(
        "Salvage Sweep",
        SimulationPlan::new(GameplayStrategy::Cautious)
            .with_max_steps(1_500)
            .with_expectation(salvage_sweep_expectation),
    )
}

/// Hiding from everything means no blood is ever drawn.
fn salvage_sweep_expectation(summary: &SimulationSummary) -> Result<()> {
    let metrics = &summary.metrics;
    ensure!(
        metrics.salvages >= 5,
        "only {} salvages in {} steps",
        metrics.salvages,
        metrics.steps
    );
    ensure!(
        metrics.fights == 0 && metrics.escapes_started == 0,
        "cautious run engaged: {} fights, {} escapes",
        metrics.fights,
        metrics.escapes_started
    );
    ensure!(
        metrics.damage_taken == 0,
        "cautious run took {} damage",
        metrics.damage_taken
    );
    ensure!(
        summary.ending != RunEnding::Flatlined,
        "cautious run flatlined"
    );
    Ok(())
}

fn arm_with_soldering_iron(session: &mut GameSession) {
    if let Some(iron) = session.catalog().item("soldering-iron").cloned() {
        session.state_mut().stats.inventory.push(iron);
    }
}

pub fn combat_focus_scenario() -> TestScenario {
    TestScenario::simulation(
        "Combat Focus",
        SimulationPlan::new(GameplayStrategy::Aggressive)
            .with_setup(arm_with_soldering_iron)
            .with_expectation(combat_focus_expectation),
    )
}

fn combat_focus_expectation(summary: &SimulationSummary) -> Result<()> {
    let metrics = &summary.metrics;
    let weapon = summary
        .final_session
        .state()
        .stats
        .equipped_weapon
        .as_ref()
        .map(|item| item.id.as_str());
    ensure!(
        weapon == Some("soldering-iron"),
        "expected the soldering iron equipped, got {weapon:?}"
    );
    ensure!(metrics.fights >= 1, "no fight in {} steps", metrics.steps);
    ensure!(
        metrics.fights + 1 >= metrics.encounters,
        "{} encounters but only {} fights",
        metrics.encounters,
        metrics.fights
    );
    ensure!(
        metrics.escapes_started == 0,
        "aggressive run tried to escape"
    );
    Ok(())
}

fn agitate_every_sector(session: &mut GameSession) {
    for sector in &mut session.state_mut().sectors {
        sector.aggression = 100;
    }
}

pub fn escape_focus_scenario() -> TestScenario {
    TestScenario::simulation(
        "Escape Focus",
        SimulationPlan::new(GameplayStrategy::Balanced)
            .with_setup(agitate_every_sector)
            .with_expectation(escape_focus_expectation),
    )
}

/// Balanced only runs with stamina to spare, so no escape may fail.
fn escape_focus_expectation(summary: &SimulationSummary) -> Result<()> {
    let metrics = &summary.metrics;
    ensure!(
        metrics.escapes_started >= 1,
        "no escape started in {} steps",
        metrics.steps
    );
    ensure!(
        metrics.escapes_failed == 0,
        "{} escapes ran out of stamina",
        metrics.escapes_failed
    );
    ensure!(
        metrics.escapes_succeeded >= 1,
        "started {} escapes, none finished",
        metrics.escapes_started
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::GameTester;

    fn run(scenario: &TestScenario, seed: u64) -> SimulationSummary {
        GameTester::with_default_catalog(false).run_plan(&scenario.plan, seed)
    }

    #[test]
    fn salvage_sweep_never_bleeds() {
        let scenario = salvage_sweep_scenario();
        for seed in [3, 17] {
            let summary = run(&scenario, seed);
            salvage_sweep_expectation(&summary).unwrap();
        }
    }

    #[test]
    fn combat_focus_equips_before_salvaging() {
        let summary = run(&combat_focus_scenario(), 8);
        assert_eq!(summary.turns[0].decision.action, Some("use_item"));
        combat_focus_expectation(&summary).unwrap();
    }

    #[test]
    fn escape_focus_runs_clean() {
        let summary = run(&escape_focus_scenario(), 5);
        escape_focus_expectation(&summary).unwrap();
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
    }
}
