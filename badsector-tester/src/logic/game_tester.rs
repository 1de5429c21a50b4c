use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use badsector_game::{
    ActionOutcome, Catalog, EscapeResolution, GamePhase, GameSession, RunOutcome, SessionEvent,
    catalog,
};
use serde::Serialize;

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{SimulationConfig, SimulationSession, TurnOutcome};

/// Step budget for plans that do not set one.
pub const DEFAULT_MAX_STEPS: usize = 2_000;

/// Declarative plan for running a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub max_steps: usize,
    pub setup: Option<fn(&mut GameSession)>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            max_steps: DEFAULT_MAX_STEPS,
            setup: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut GameSession)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// How a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunEnding {
    /// HP reached zero.
    Flatlined,
    /// Every part installed.
    Assembled,
    /// Nothing left to salvage or install.
    SectorsExhausted,
    StepLimit,
    /// Live runs stop when their wall-clock budget is spent.
    TimeLimit,
}

impl RunEnding {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Flatlined => "flatlined",
            Self::Assembled => "assembled",
            Self::SectorsExhausted => "sectors exhausted",
            Self::StepLimit => "step limit",
            Self::TimeLimit => "time limit",
        }
    }
}

impl fmt::Display for RunEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Terminal condition reached by `session`, if any.
#[must_use]
pub fn detect_ending(session: &GameSession) -> Option<RunEnding> {
    if session.phase() == GamePhase::GameOver {
        return Some(RunEnding::Flatlined);
    }
    if session.system_integrity() == 100 {
        return Some(RunEnding::Assembled);
    }
    let state = session.state();
    let drained = state.sectors.iter().all(|s| s.salvage_left == 0);
    if drained && state.confrontation.is_none() && session.found_parts().is_empty() {
        return Some(RunEnding::SectorsExhausted);
    }
    None
}

/// Counters gathered while a run plays out.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMetrics {
    pub steps: usize,
    pub clock_ms: u64,
    pub salvages: u32,
    pub hauls: u32,
    pub encounters: u32,
    pub fights: u32,
    pub purges: u32,
    pub hits_taken: u32,
    pub damage_taken: u32,
    pub hides: u32,
    pub escapes_started: u32,
    pub escapes_succeeded: u32,
    pub escapes_failed: u32,
    pub items_used: u32,
    pub items_found: u32,
    pub parts_found: u32,
    pub parts_installed: u32,
    pub rejected_actions: u32,
    pub final_hp: f32,
    pub final_stamina: f32,
    pub final_scrap: u32,
    pub integrity: u8,
    pub lore_entries: usize,
    pub rng_draws: u64,
}

impl RunMetrics {
    pub fn record_turn(&mut self, turn: &TurnOutcome) {
        self.steps += 1;
        match &turn.result {
            Some(Ok(ActionOutcome::Salvaged(outcome))) => {
                self.salvages += 1;
                if !outcome.is_encounter() {
                    self.hauls += 1;
                }
            }
            Some(Ok(ActionOutcome::Hidden { .. })) => self.hides += 1,
            Some(Ok(ActionOutcome::Ran(RunOutcome::Started))) => self.escapes_started += 1,
            Some(Ok(ActionOutcome::ItemUsed(_))) => self.items_used += 1,
            Some(Err(_)) => self.rejected_actions += 1,
            _ => {}
        }
        for event in &turn.events {
            match event {
                SessionEvent::EncounterSpawned { .. } => self.encounters += 1,
                SessionEvent::CombatStarted { .. } => self.fights += 1,
                SessionEvent::MonsterPurged { .. } => self.purges += 1,
                SessionEvent::PlayerHit { damage, .. } => {
                    self.hits_taken += 1;
                    self.damage_taken += damage;
                }
                SessionEvent::EscapeResolved { resolution } => match resolution {
                    EscapeResolution::Escaped => self.escapes_succeeded += 1,
                    EscapeResolution::Exhausted => self.escapes_failed += 1,
                },
                SessionEvent::PartFound { .. } => self.parts_found += 1,
                SessionEvent::PartInstalled { .. } => self.parts_installed += 1,
                SessionEvent::ItemFound { .. } => self.items_found += 1,
                SessionEvent::PhaseChanged { .. } | SessionEvent::FlavorDiscarded { .. } => {}
            }
        }
    }

    pub fn finalize(&mut self, session: &GameSession) {
        let stats = &session.state().stats;
        self.clock_ms = u64::try_from(session.clock().as_millis()).unwrap_or(u64::MAX);
        self.final_hp = stats.hp;
        self.final_stamina = stats.stamina;
        self.final_scrap = stats.scrap;
        self.integrity = session.system_integrity();
        self.lore_entries = session.lore().len();
        self.rng_draws = session.rng().total_draws();
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub turns: Vec<TurnOutcome>,
    pub metrics: RunMetrics,
    pub ending: RunEnding,
    pub violations: Vec<String>,
    pub final_session: GameSession,
}

impl SimulationSummary {
    /// Fold recorded turns and the final session into a summary.
    #[must_use]
    pub fn from_turns(
        seed: u64,
        strategy: GameplayStrategy,
        turns: Vec<TurnOutcome>,
        ending: RunEnding,
        final_session: GameSession,
    ) -> Self {
        let mut metrics = RunMetrics::default();
        for turn in &turns {
            metrics.record_turn(turn);
        }
        metrics.finalize(&final_session);
        let violations = turns.iter().filter_map(|t| t.violation.clone()).collect();
        Self {
            seed,
            strategy,
            turns,
            metrics,
            ending,
            violations,
            final_session,
        }
    }
}

/// Headless deterministic runner for the core game logic.
#[derive(Clone)]
pub struct GameTester {
    verbose: bool,
    catalog: Arc<Catalog>,
}

impl GameTester {
    pub const fn new(catalog: Arc<Catalog>, verbose: bool) -> Self {
        Self { verbose, catalog }
    }

    /// Tester on the catalog embedded in the game crate.
    #[must_use]
    pub fn with_default_catalog(verbose: bool) -> Self {
        Self::new(Arc::new(catalog().clone()), verbose)
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let config = SimulationConfig::new(plan.strategy, seed).with_max_steps(plan.max_steps);
        let mut sim = SimulationSession::new(config, Arc::clone(&self.catalog));
        if let Some(setup) = plan.setup {
            setup(sim.session_mut());
        }

        let mut policy = plan.strategy.create_policy(seed);
        let mut turns = Vec::new();
        let ending = loop {
            if let Some(ending) = detect_ending(sim.session()) {
                break ending;
            }
            if sim.out_of_steps() {
                break RunEnding::StepLimit;
            }
            let turn = sim.advance(policy.as_mut());
            if self.verbose {
                log_turn(&turn);
            }
            turns.push(turn);
        };

        if self.verbose {
            println!(
                "  🏁 seed {seed} {} ended ({ending}) after {} steps",
                plan.strategy,
                sim.steps()
            );
        }
        SimulationSummary::from_turns(seed, plan.strategy, turns, ending, sim.into_session())
    }
}

pub(crate) fn log_turn(turn: &TurnOutcome) {
    let action = turn.decision.action.unwrap_or("wait");
    let rationale = turn.decision.rationale.as_deref().unwrap_or("-");
    println!(
        "    [{:>6} ms] {action:<14} {rationale}",
        turn.decision.clock_ms
    );
    for notice in &turn.notices {
        println!("               » {}", notice.message);
    }
    if let Some(violation) = &turn.violation {
        println!("               ⚠️  {violation}");
    }
}
