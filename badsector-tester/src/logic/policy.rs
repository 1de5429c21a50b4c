use std::fmt;
use std::time::Duration;

use badsector_game::{
    Action, Confrontation, GamePhase, GameSession, ItemKind, PartStatus, SectorView,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Pause after an ordinary action.
pub const ACTION_WAIT: Duration = Duration::from_millis(100);
/// Pause while waiting for stamina to come back.
pub const RECOVERY_WAIT: Duration = Duration::from_millis(500);
/// Pause after a salvage call so the next one is accepted.
pub const SALVAGE_WAIT: Duration = Duration::from_millis(800);
/// Default spacing between escape clicks.
pub const CLICK_INTERVAL: Duration = Duration::from_millis(40);

/// Stamina a salvage call costs.
const SALVAGE_COST: f32 = 15.0;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub action: Option<Action>,
    /// How long the player waits after acting.
    pub wait: Duration,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn act(action: Action, wait: Duration, rationale: impl Into<String>) -> Self {
        Self {
            action: Some(action),
            wait,
            rationale: Some(rationale.into()),
        }
    }

    #[must_use]
    pub fn idle(wait: Duration, rationale: impl Into<String>) -> Self {
        Self {
            action: None,
            wait,
            rationale: Some(rationale.into()),
        }
    }
}

/// Policy interface for automated play strategies.
///
/// Implementors supply the temperament; [`PlayerPolicy::decide`] turns it
/// into a concrete action for the current session.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Response to a freshly detected monster.
    fn answer_encounter(&mut self, session: &GameSession) -> Action;

    /// Sector to salvage next, out of the ones with something left.
    fn pick_sector<'a>(&mut self, sectors: &'a [SectorView]) -> Option<&'a SectorView>;

    /// Disconnect from combat below this much HP.
    fn flee_below(&self) -> f32 {
        0.0
    }

    /// Eat below this much HP when food is at hand.
    fn heal_below(&self) -> f32 {
        40.0
    }

    /// Stamina to keep in reserve before salvaging.
    fn stamina_reserve(&self) -> f32 {
        SALVAGE_COST
    }

    fn click_interval(&mut self) -> Duration {
        CLICK_INTERVAL
    }

    /// Next move for `session`.
    fn decide(&mut self, session: &GameSession) -> PolicyDecision {
        match session.phase() {
            GamePhase::Menu => return PolicyDecision::act(Action::Connect, ACTION_WAIT, "boot"),
            GamePhase::GameOver => return PolicyDecision::idle(ACTION_WAIT, "flatlined"),
            GamePhase::Playing => {}
        }

        let stats = &session.state().stats;
        match &session.state().confrontation {
            Some(Confrontation::Escape { progress, .. }) => PolicyDecision::act(
                Action::EscapeClick,
                self.click_interval(),
                format!("progress {progress:.1}"),
            ),
            Some(Confrontation::Combat { monster_hp, .. }) => {
                if stats.hp < self.flee_below() {
                    PolicyDecision::act(Action::Flee, ACTION_WAIT, format!("hp {:.0}", stats.hp))
                } else if stats.hp < self.heal_below()
                    && let Some(index) = item_index(session, ItemKind::Food)
                {
                    PolicyDecision::act(
                        Action::UseItem { index },
                        ACTION_WAIT,
                        format!("patching at hp {:.0}", stats.hp),
                    )
                } else {
                    PolicyDecision::act(
                        Action::Attack,
                        ACTION_WAIT,
                        format!("monster hp {monster_hp}"),
                    )
                }
            }
            Some(Confrontation::Pending { sector }) => {
                let action = self.answer_encounter(session);
                PolicyDecision::act(action, ACTION_WAIT, format!("encounter in {sector}"))
            }
            None => upkeep(session, self.heal_below())
                .unwrap_or_else(|| self.salvage_or_rest(session)),
        }
    }

    fn salvage_or_rest(&mut self, session: &GameSession) -> PolicyDecision {
        if session.salvage_settling() {
            return PolicyDecision::idle(SALVAGE_WAIT, "settling");
        }
        let stamina = session.state().stats.stamina;
        if stamina < self.stamina_reserve().max(SALVAGE_COST) {
            if let Some(index) = item_index(session, ItemKind::Drink) {
                return PolicyDecision::act(
                    Action::UseItem { index },
                    ACTION_WAIT,
                    format!("stamina {stamina:.1}"),
                );
            }
            return PolicyDecision::idle(RECOVERY_WAIT, format!("recharging at {stamina:.1}"));
        }

        let sectors: Vec<SectorView> = session
            .sector_views()
            .into_iter()
            .filter(|sector| sector.salvage_left > 0)
            .collect();
        match self.pick_sector(&sectors) {
            Some(sector) => PolicyDecision::act(
                Action::salvage(sector.id.clone()),
                SALVAGE_WAIT,
                format!("risk {}%", sector.risk_percent),
            ),
            None => PolicyDecision::idle(RECOVERY_WAIT, "nothing left to salvage"),
        }
    }
}

/// Assembly and equipment chores that take priority over salvaging.
fn upkeep(session: &GameSession, heal_below: f32) -> Option<PolicyDecision> {
    let state = session.state();
    if let Some(part) = state.selected_part
        && state.part(part).is_some_and(|p| p.status == PartStatus::Found)
    {
        return Some(PolicyDecision::act(
            Action::InstallPart { part },
            ACTION_WAIT,
            format!("installing {part}"),
        ));
    }
    if let Some(&part) = session.found_parts().first() {
        return Some(PolicyDecision::act(
            Action::SelectPart { part },
            ACTION_WAIT,
            format!("selecting {part}"),
        ));
    }

    let equipped = state
        .stats
        .equipped_weapon
        .as_ref()
        .map_or(0, |weapon| weapon.value);
    let upgrade = state
        .stats
        .inventory
        .iter()
        .enumerate()
        .filter(|(_, item)| item.kind == ItemKind::Weapon && item.value > equipped)
        .max_by_key(|(_, item)| item.value);
    if let Some((index, item)) = upgrade {
        return Some(PolicyDecision::act(
            Action::UseItem { index },
            ACTION_WAIT,
            format!("equipping {}", item.name),
        ));
    }

    if state.stats.hp < heal_below
        && let Some(index) = item_index(session, ItemKind::Food)
    {
        return Some(PolicyDecision::act(
            Action::UseItem { index },
            ACTION_WAIT,
            format!("healing at {:.0}", state.stats.hp),
        ));
    }
    None
}

fn item_index(session: &GameSession, kind: ItemKind) -> Option<usize> {
    session
        .state()
        .stats
        .inventory
        .iter()
        .position(|item| item.kind == kind)
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum GameplayStrategy {
    Cautious,
    Aggressive,
    Balanced,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Cautious, Self::Aggressive, Self::Balanced, Self::Random];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Cautious => "Cautious",
            GameplayStrategy::Aggressive => "Aggressive",
            GameplayStrategy::Balanced => "Balanced",
            GameplayStrategy::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            GameplayStrategy::Cautious => Box::new(CautiousPolicy),
            GameplayStrategy::Aggressive => Box::new(AggressivePolicy),
            GameplayStrategy::Balanced => Box::new(BalancedPolicy),
            GameplayStrategy::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CautiousPolicy;
struct AggressivePolicy;
struct BalancedPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn answer_encounter(&mut self, _session: &GameSession) -> Action {
        Action::Hide
    }

    fn pick_sector<'a>(&mut self, sectors: &'a [SectorView]) -> Option<&'a SectorView> {
        sectors.iter().min_by_key(|sector| sector.risk_percent)
    }

    fn flee_below(&self) -> f32 {
        35.0
    }

    fn heal_below(&self) -> f32 {
        60.0
    }

    fn stamina_reserve(&self) -> f32 {
        40.0
    }
}

impl PlayerPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "Aggressive"
    }

    fn answer_encounter(&mut self, _session: &GameSession) -> Action {
        Action::Fight
    }

    fn pick_sector<'a>(&mut self, sectors: &'a [SectorView]) -> Option<&'a SectorView> {
        sectors.iter().max_by_key(|sector| sector.horror_level)
    }

    fn heal_below(&self) -> f32 {
        30.0
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn answer_encounter(&mut self, session: &GameSession) -> Action {
        let stats = &session.state().stats;
        if stats.equipped_weapon.is_some() && stats.hp > 50.0 {
            Action::Fight
        } else if stats.stamina >= 40.0 {
            Action::Run
        } else {
            Action::Hide
        }
    }

    fn pick_sector<'a>(&mut self, sectors: &'a [SectorView]) -> Option<&'a SectorView> {
        sectors.iter().max_by_key(|sector| balanced_score(sector))
    }

    fn flee_below(&self) -> f32 {
        25.0
    }

    fn heal_below(&self) -> f32 {
        50.0
    }

    fn stamina_reserve(&self) -> f32 {
        40.0
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn answer_encounter(&mut self, _session: &GameSession) -> Action {
        match self.rng.gen_range(0..3) {
            0 => Action::Fight,
            1 => Action::Hide,
            _ => Action::Run,
        }
    }

    fn pick_sector<'a>(&mut self, sectors: &'a [SectorView]) -> Option<&'a SectorView> {
        if sectors.is_empty() {
            return None;
        }
        sectors.get(self.rng.gen_range(0..sectors.len()))
    }

    fn flee_below(&self) -> f32 {
        20.0
    }

    fn click_interval(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(30..=60))
    }
}

/// Deeper sectors score higher, stirred-up ones lower.
fn balanced_score(sector: &SectorView) -> i64 {
    i64::from(sector.horror_level) * 10 - i64::from(sector.risk_percent)
}
