//! Real-time runs: the same policies, but the session is pumped by tokio
//! tasks and lore comes from a real flavor backend.
use std::sync::Arc;
use std::time::Duration;

use badsector_game::{
    Action, Catalog, FlavorTextSource, GameSession, LiveSession, SessionEvent,
};
use colored::Colorize;
use tokio::time::Instant;

use crate::common::scenario::TestScenario;
use crate::logic::game_tester::log_turn;
use crate::logic::simulation::DecisionRecord;
use crate::logic::{
    InvariantTracker, RunEnding, ScenarioResult, SimulationPlan, SimulationSummary, TurnOutcome,
    describe_failure, detect_ending, evaluate_expectations,
};

const FLAVOR_POLL: Duration = Duration::from_millis(20);

/// Drives one [`LiveSession`] per plan until the wall-clock budget runs out.
pub struct LiveRunner {
    catalog: Arc<Catalog>,
    source: Arc<dyn FlavorTextSource>,
    flavor_timeout: Duration,
    budget: Duration,
    verbose: bool,
}

impl LiveRunner {
    pub fn new(
        catalog: Arc<Catalog>,
        source: Arc<dyn FlavorTextSource>,
        flavor_timeout: Duration,
        budget: Duration,
        verbose: bool,
    ) -> Self {
        Self {
            catalog,
            source,
            flavor_timeout,
            budget,
            verbose,
        }
    }

    pub async fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let session = GameSession::with_catalog(Arc::clone(&self.catalog), seed);
        let mut live = LiveSession::new(session, Arc::clone(&self.source), self.flavor_timeout);
        if let Err(err) = live.apply(Action::Connect).await {
            log::warn!("live session for seed {seed} failed to connect: {err}");
        }
        let shared = live.shared();
        if let Some(setup) = plan.setup {
            setup(&mut *shared.lock().await);
        }

        let mut policy = plan.strategy.create_policy(seed);
        let mut invariants = InvariantTracker::default();
        let mut turns = Vec::new();
        let deadline = Instant::now() + self.budget;

        let ending = loop {
            let (decision, record, notice_mark) = {
                let guard = shared.lock().await;
                if let Some(ending) = detect_ending(&guard) {
                    break ending;
                }
                if turns.len() >= plan.max_steps {
                    break RunEnding::StepLimit;
                }
                if Instant::now() >= deadline {
                    break RunEnding::TimeLimit;
                }
                let decision = policy.decide(&guard);
                let record = DecisionRecord {
                    step: turns.len(),
                    clock_ms: u64::try_from(guard.clock().as_millis()).unwrap_or(u64::MAX),
                    action: decision.action.as_ref().map(Action::name),
                    policy_name: policy.name().to_string(),
                    rationale: decision.rationale.clone(),
                };
                (decision, record, guard.notices().last_id())
            };

            let result = match decision.action {
                Some(action) => Some(live.apply(action).await),
                None => None,
            };
            tokio::time::sleep(decision.wait).await;

            let turn = {
                let mut guard = shared.lock().await;
                let violation = invariants
                    .check(&guard)
                    .err()
                    .map(|err| format!("step {}: {err}", record.step));
                TurnOutcome {
                    decision: record,
                    result,
                    events: guard.drain_events(),
                    notices: guard.notices().raised_after(notice_mark).into_vec(),
                    phase: guard.phase(),
                    violation,
                }
            };
            if self.verbose {
                log_turn(&turn);
            }
            turns.push(turn);
        };

        let purges = turns
            .iter()
            .flat_map(|turn| &turn.events)
            .filter(|event| matches!(event, SessionEvent::MonsterPurged { .. }))
            .count();
        self.settle_flavor(&live, purges).await;

        if self.verbose {
            println!(
                "  🏁 live seed {seed} {} ended ({ending}) after {} steps",
                plan.strategy,
                turns.len()
            );
        }
        let final_session = live.shutdown().await;
        SimulationSummary::from_turns(seed, plan.strategy, turns, ending, final_session)
    }

    /// Give in-flight lore requests up to one flavor timeout to land.
    async fn settle_flavor(&self, live: &LiveSession, expected: usize) {
        let give_up = Instant::now() + self.flavor_timeout + FLAVOR_POLL;
        while Instant::now() < give_up {
            if live.snapshot().await.lore.len() >= expected {
                return;
            }
            tokio::time::sleep(FLAVOR_POLL).await;
        }
        log::warn!("lore still pending after {:?}", self.flavor_timeout);
    }
}

/// Live counterpart of the logic tester.
pub struct LiveTester {
    runner: LiveRunner,
}

impl LiveTester {
    pub const fn new(runner: LiveRunner) -> Self {
        Self { runner }
    }

    pub async fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();
        for &seed in seeds {
            if self.runner.verbose {
                println!(
                    "📡 Live scenario: {} (strategy: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.strategy,
                    seed
                );
            }
            let mut failures = Vec::new();
            let mut performance_data = Vec::new();
            for i in 0..iterations {
                let started = std::time::Instant::now();
                let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
                let summary = self.runner.run_plan(&scenario.plan, iteration_seed).await;
                match evaluate_expectations(&scenario.plan, &summary) {
                    Some(err) => failures.push(describe_failure(i + 1, &summary, &err)),
                    None => performance_data.push(started.elapsed()),
                }
            }
            results.push(ScenarioResult::from_iterations(
                &scenario.name,
                "live",
                iterations,
                failures,
                performance_data,
            ));
        }
        results
    }
}
