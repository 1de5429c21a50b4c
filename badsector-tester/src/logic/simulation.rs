use std::sync::Arc;
use std::time::Duration;

use badsector_game::{
    Action, ActionError, ActionOutcome, Catalog, GamePhase, GameSession, Notice, SessionEvent,
};

use crate::common::lore::canned_line;
use crate::logic::invariants::InvariantTracker;
use crate::logic::policy::{GameplayStrategy, PlayerPolicy};

/// Configuration for a simulation session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub max_steps: usize,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            max_steps: 2_000,
        }
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// What the policy chose on one step.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub step: usize,
    pub clock_ms: u64,
    pub action: Option<&'static str>,
    pub policy_name: String,
    pub rationale: Option<String>,
}

/// Result of advancing the simulation by one policy step.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub decision: DecisionRecord,
    pub result: Option<Result<ActionOutcome, ActionError>>,
    pub events: Vec<SessionEvent>,
    pub notices: Vec<Notice>,
    pub phase: GamePhase,
    /// First invariant broken by this step, if any.
    pub violation: Option<String>,
}

/// Core deterministic simulation harness used by the tester.
///
/// Time only moves when the policy waits, so a run is a pure function of
/// seed and strategy.
pub struct SimulationSession {
    session: GameSession,
    invariants: InvariantTracker,
    max_steps: usize,
    steps: usize,
    lore_answered: usize,
}

impl SimulationSession {
    /// Boot a session on `catalog` and connect it.
    pub fn new(config: SimulationConfig, catalog: Arc<Catalog>) -> Self {
        let mut session = GameSession::with_catalog(catalog, config.seed);
        if let Err(err) = session.apply(Action::Connect) {
            log::warn!("session for seed {} failed to connect: {err}", config.seed);
        }
        Self {
            session,
            invariants: InvariantTracker::default(),
            max_steps: config.max_steps,
            steps: 0,
            lore_answered: 0,
        }
    }

    #[must_use]
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut GameSession {
        &mut self.session
    }

    #[must_use]
    pub fn into_session(self) -> GameSession {
        self.session
    }

    #[must_use]
    pub const fn steps(&self) -> usize {
        self.steps
    }

    #[must_use]
    pub const fn out_of_steps(&self) -> bool {
        self.steps >= self.max_steps
    }

    /// Ask the policy for a move, apply it, then let the virtual clock run
    /// for as long as the policy waits.
    pub fn advance(&mut self, policy: &mut dyn PlayerPolicy) -> TurnOutcome {
        let decision = policy.decide(&self.session);
        let notice_mark = self.session.notices().last_id();
        let record = DecisionRecord {
            step: self.steps,
            clock_ms: clock_ms(self.session.clock()),
            action: decision.action.as_ref().map(Action::name),
            policy_name: policy.name().to_string(),
            rationale: decision.rationale.clone(),
        };

        let result = decision.action.map(|action| self.session.apply(action));
        self.session.advance(decision.wait);
        self.answer_flavor();
        self.steps += 1;

        let violation = self
            .invariants
            .check(&self.session)
            .err()
            .map(|err| format!("step {}: {err}", record.step));
        TurnOutcome {
            decision: record,
            result,
            events: self.session.drain_events(),
            notices: self.session.notices().raised_after(notice_mark).into_vec(),
            phase: self.session.phase(),
            violation,
        }
    }

    /// Logic runs answer lore prompts on the spot with offline text.
    fn answer_flavor(&mut self) {
        for request in self.session.take_flavor_requests() {
            let response = request.answer(canned_line(self.lore_answered));
            self.lore_answered += 1;
            self.session.record_flavor(response);
        }
    }
}

fn clock_ms(clock: Duration) -> u64 {
    u64::try_from(clock.as_millis()).unwrap_or(u64::MAX)
}
