use anyhow::{Result, ensure};
use badsector_game::GamePhase;

use super::TestScenario;
use crate::logic::{GameplayStrategy, SimulationPlan, SimulationSummary};

pub fn smoke_scenario() -> TestScenario {
    TestScenario::simulation(
        "Smoke Test",
        SimulationPlan::new(GameplayStrategy::Balanced)
            .with_max_steps(40)
            .with_expectation(smoke_expectation),
    )
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    let session = &summary.final_session;
    let stats = &session.state().stats;

    ensure!(
        session.phase() != GamePhase::Menu,
        "session should have connected"
    );
    ensure!(
        summary.metrics.salvages >= 1,
        "expected at least one salvage, got {}",
        summary.metrics.salvages
    );
    ensure!(
        (stats.max_hp - 100.0).abs() < f32::EPSILON
            && (stats.max_stamina - 100.0).abs() < f32::EPSILON,
        "gauge maxima moved: {}/{}",
        stats.max_hp,
        stats.max_stamina
    );
    ensure!(
        session.state().sectors.len() == session.catalog().locations.len(),
        "one sector per location"
    );
    ensure!(
        summary.metrics.clock_ms > 0,
        "virtual clock never advanced"
    );
    Ok(())
}
