//! The game session controller: owns the world, the phase machine, the
//! timers and every user-facing action.
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::assembly::{self, DiagnosticMetric, SlotClick};
use crate::combat::{self, AttackOutcome};
use crate::constants::{
    AGGRESSION_DECAY_PER_TICK, NOTICE_ENTER_COMBAT, NOTICE_ESCAPED, NOTICE_EXHAUSTED,
    NOTICE_INSUFFICIENT_STAMINA, NOTICE_MASKED, NOTICE_MONSTER_DETECTED, NOTICE_NEURAL_LAG,
    NOTICE_PURGED, SALVAGE_SETTLE_WINDOW, SALVAGE_STAMINA_COST, STAMINA_REGEN_PER_TICK,
};
use crate::data::{Catalog, GameLocation, PartId, catalog};
use crate::error::ActionError;
use crate::escape::{self, EscapeResolution, RunOutcome};
use crate::flavor::{FlavorRequest, FlavorResponse, LoreEntry, LoreLog};
use crate::inventory::{self, InventoryEntry, InventoryFilter, ItemEffect};
use crate::notice::{Notice, NoticeFeed, NoticeKind};
use crate::rng::RngBundle;
use crate::salvage::{self, SalvageContext, SalvageOutcome, SalvageResult};
use crate::state::{Confrontation, GamePhase, GameState, PartStatus, PcPart};
use crate::timers::{PhaseTimers, TimerKind};

/// Every user-facing action the session accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Start a run from the menu.
    Connect,
    Salvage { sector: String },
    /// Answer a pending encounter with combat.
    Fight,
    Attack,
    /// Forced disconnect from combat.
    Flee,
    /// Answer a pending encounter by masking the signal.
    Hide,
    /// Answer a pending encounter by running.
    Run,
    EscapeClick,
    UseItem { index: usize },
    /// Toggle a holding-bay part.
    SelectPart { part: PartId },
    /// Click an assembly slot.
    InstallPart { part: PartId },
    SetInventoryFilter { filter: InventoryFilter },
    Restart,
    ReturnToMenu,
}

impl Action {
    #[must_use]
    pub fn salvage(sector: impl Into<String>) -> Self {
        Self::Salvage {
            sector: sector.into(),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Salvage { .. } => "salvage",
            Self::Fight => "fight",
            Self::Attack => "attack",
            Self::Flee => "flee",
            Self::Hide => "hide",
            Self::Run => "run",
            Self::EscapeClick => "escape_click",
            Self::UseItem { .. } => "use_item",
            Self::SelectPart { .. } => "select_part",
            Self::InstallPart { .. } => "install_part",
            Self::SetInventoryFilter { .. } => "set_inventory_filter",
            Self::Restart => "restart",
            Self::ReturnToMenu => "return_to_menu",
        }
    }

    /// Whether `phase` accepts this action at all.
    #[must_use]
    pub const fn allowed_in(&self, phase: GamePhase) -> bool {
        match phase {
            GamePhase::Menu => matches!(self, Self::Connect),
            GamePhase::Playing => {
                !matches!(self, Self::Connect | Self::Restart | Self::ReturnToMenu)
            }
            GamePhase::GameOver => matches!(self, Self::Restart | Self::ReturnToMenu),
        }
    }
}

/// What an accepted action did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    Connected,
    Salvaged(SalvageOutcome),
    CombatStarted { monster_hp: u32 },
    Attacked(AttackOutcome),
    Fled { sector: String },
    Hidden { sector: String },
    Ran(RunOutcome),
    EscapeClicked { progress: f32 },
    ItemUsed(ItemEffect),
    PartSelected { selected: Option<PartId> },
    SlotClicked(SlotClick),
    FilterSet { filter: InventoryFilter },
    Restarted,
    ReturnedToMenu,
}

/// Notable things that happened, in order, for hosts and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    EncounterSpawned { sector: String },
    CombatStarted { sector: String, monster_hp: u32 },
    MonsterPurged { sector: String },
    PlayerHit { damage: u32, hp: f32 },
    EscapeResolved { resolution: EscapeResolution },
    PartFound { part: PartId },
    PartInstalled { part: PartId },
    ItemFound { item: String },
    FlavorDiscarded { epoch: u64 },
}

/// A sector as the player sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectorView {
    pub id: String,
    pub name: String,
    pub horror_level: u32,
    pub salvage_left: u8,
    pub aggression: u32,
    pub risk_percent: u32,
}

/// Serializable read model of a whole session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: GamePhase,
    pub epoch: u64,
    pub seed: u64,
    pub clock_ms: u64,
    pub hp: f32,
    pub max_hp: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    pub scrap: u32,
    pub equipped_weapon: Option<String>,
    pub inventory_filter: InventoryFilter,
    pub inventory: Vec<InventoryEntry>,
    pub parts: Vec<PcPart>,
    pub holding_bay: Vec<PartId>,
    pub selected_part: Option<PartId>,
    pub system_integrity: u8,
    pub diagnostics: [DiagnosticMetric; 4],
    pub sectors: Vec<SectorView>,
    pub confrontation: Option<Confrontation>,
    pub active_tip: Option<String>,
    pub lore: Vec<LoreEntry>,
    pub notices: Vec<Notice>,
    pub pending_flavor: usize,
}

/// Owns one player's game from menu to game over, any number of times.
#[derive(Debug, Clone)]
pub struct GameSession {
    catalog: Arc<Catalog>,
    state: GameState,
    phase: GamePhase,
    epoch: u64,
    clock: Duration,
    timers: PhaseTimers,
    notices: NoticeFeed,
    rng: RngBundle,
    lore: LoreLog,
    pending_flavor: Vec<FlavorRequest>,
    events: Vec<SessionEvent>,
    tip_index: usize,
    inventory_filter: InventoryFilter,
    salvage_ready_at: Duration,
}

impl GameSession {
    /// Session on the built-in catalog, sitting at the menu.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_catalog(Arc::new(catalog().clone()), seed)
    }

    #[must_use]
    pub fn with_catalog(catalog: Arc<Catalog>, seed: u64) -> Self {
        let state = GameState::initial(&catalog);
        Self {
            catalog,
            state,
            phase: GamePhase::Menu,
            epoch: 0,
            clock: Duration::ZERO,
            timers: PhaseTimers::default(),
            notices: NoticeFeed::default(),
            rng: RngBundle::from_user_seed(seed),
            lore: LoreLog::default(),
            pending_flavor: Vec::new(),
            events: Vec::new(),
            tip_index: 0,
            inventory_filter: InventoryFilter::All,
            salvage_ready_at: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable access to the world, bypassing action validation.
    /// Callers must restore the invariants themselves.
    pub const fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Incremented by every reset; stale flavor responses carry an older value.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Session clock, advanced only by [`Self::advance`].
    #[must_use]
    pub const fn clock(&self) -> Duration {
        self.clock
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    #[must_use]
    pub const fn timers(&self) -> &PhaseTimers {
        &self.timers
    }

    #[must_use]
    pub const fn notices(&self) -> &NoticeFeed {
        &self.notices
    }

    #[must_use]
    pub const fn lore(&self) -> &LoreLog {
        &self.lore
    }

    #[must_use]
    pub const fn inventory_filter(&self) -> InventoryFilter {
        self.inventory_filter
    }

    #[must_use]
    pub const fn tip_index(&self) -> usize {
        self.tip_index
    }

    #[must_use]
    pub fn active_tip(&self) -> Option<&str> {
        self.catalog.tips.get(self.tip_index).map(String::as_str)
    }

    /// True while the previous salvage call is still settling.
    #[must_use]
    pub fn salvage_settling(&self) -> bool {
        self.clock < self.salvage_ready_at
    }

    #[must_use]
    pub fn risk_percent(&self, sector_id: &str) -> Option<u32> {
        let location = self.catalog.location(sector_id)?;
        let sector = self.state.sector(sector_id)?;
        Some(salvage::risk_percent(location, sector))
    }

    #[must_use]
    pub fn system_integrity(&self) -> u8 {
        assembly::system_integrity(&self.state.parts)
    }

    #[must_use]
    pub fn diagnostics(&self) -> [DiagnosticMetric; 4] {
        assembly::diagnostics(&self.state.parts)
    }

    /// Inventory under the current filter, tagged with full-inventory indices.
    #[must_use]
    pub fn filtered_inventory(&self) -> Vec<InventoryEntry> {
        inventory::filtered_inventory(&self.state.stats, self.inventory_filter)
    }

    /// Parts waiting in the holding bay.
    #[must_use]
    pub fn found_parts(&self) -> Vec<PartId> {
        self.state
            .parts_with_status(PartStatus::Found)
            .into_iter()
            .map(PcPart::id)
            .collect()
    }

    /// Drain the flavor prompts raised since the last call.
    pub fn take_flavor_requests(&mut self) -> Vec<FlavorRequest> {
        std::mem::take(&mut self.pending_flavor)
    }

    /// Number of flavor prompts waiting to be drained.
    #[must_use]
    pub fn pending_flavor(&self) -> usize {
        self.pending_flavor.len()
    }

    /// Append generated lore. Responses from an earlier epoch are dropped.
    pub fn record_flavor(&mut self, response: FlavorResponse) -> bool {
        if response.epoch != self.epoch {
            log::debug!(
                "discarding flavor `{}` from epoch {} (current {})",
                response.title,
                response.epoch,
                self.epoch
            );
            self.events.push(SessionEvent::FlavorDiscarded {
                epoch: response.epoch,
            });
            return false;
        }
        self.lore.push(response);
        true
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Apply one user action.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] when the action is rejected; game state is
    /// left untouched. Loud rejections also raise a critical notice.
    pub fn apply(&mut self, action: Action) -> Result<ActionOutcome, ActionError> {
        let result = self.dispatch(&action);
        match &result {
            Ok(_) => self.settle(),
            Err(err) => {
                log::debug!("rejected `{}`: {err}", action.name());
                if !err.is_silent() {
                    self.notify(NoticeKind::Critical, rejection_notice(err));
                }
            }
        }
        result
    }

    /// Move the session clock forward, firing every timer that falls due
    /// on the way in schedule order. Returns the number of ticks fired.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let target = self.clock.saturating_add(dt);
        let mut fired_total = 0;

        while let Some(step) = self.timers.until_next()
            && self.clock.saturating_add(step) <= target
        {
            self.clock += step;
            let fired = self.timers.elapse(step);
            for kind in fired {
                if self.phase != GamePhase::Playing {
                    break;
                }
                self.on_timer(kind);
                self.settle();
                fired_total += 1;
            }
        }

        let rest = target.saturating_sub(self.clock);
        if !rest.is_zero() {
            let _ = self.timers.elapse(rest);
        }
        self.clock = target;
        self.notices.expire(self.clock);
        fired_total
    }

    /// Move the clock by `dt` without firing any timer.
    ///
    /// For hosts that drive ticks through [`Self::fire_timer`]: the salvage
    /// settle window and notice lifetimes are measured on this clock.
    pub fn tick_clock(&mut self, dt: Duration) {
        self.clock = self.clock.saturating_add(dt);
        self.notices.expire(self.clock);
    }

    /// Fire one tick of `kind` immediately, without moving the clock.
    ///
    /// Returns `false` when the timer is not armed.
    pub fn fire_timer(&mut self, kind: TimerKind) -> bool {
        if self.phase != GamePhase::Playing || !self.timers.is_armed(kind) {
            return false;
        }
        self.on_timer(kind);
        self.settle();
        true
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let stats = &self.state.stats;
        SessionSnapshot {
            phase: self.phase,
            epoch: self.epoch,
            seed: self.seed(),
            clock_ms: u64::try_from(self.clock.as_millis()).unwrap_or(u64::MAX),
            hp: stats.hp,
            max_hp: stats.max_hp,
            stamina: stats.stamina,
            max_stamina: stats.max_stamina,
            scrap: stats.scrap,
            equipped_weapon: stats.equipped_weapon.as_ref().map(|w| w.name.clone()),
            inventory_filter: self.inventory_filter,
            inventory: self.filtered_inventory(),
            parts: self.state.parts.clone(),
            holding_bay: self.found_parts(),
            selected_part: self.state.selected_part,
            system_integrity: self.system_integrity(),
            diagnostics: self.diagnostics(),
            sectors: self.sector_views(),
            confrontation: self.state.confrontation.clone(),
            active_tip: self.active_tip().map(str::to_string),
            lore: self.lore.iter().cloned().collect(),
            notices: self.notices.live().iter().cloned().collect(),
            pending_flavor: self.pending_flavor.len(),
        }
    }

    /// Every sector with its live pool, aggression and risk.
    #[must_use]
    pub fn sector_views(&self) -> Vec<SectorView> {
        self.catalog
            .locations
            .iter()
            .filter_map(|loc| {
                let sector = self.state.sector(&loc.id)?;
                Some(SectorView {
                    id: loc.id.clone(),
                    name: loc.name.clone(),
                    horror_level: loc.horror_level,
                    salvage_left: sector.salvage_left,
                    aggression: sector.aggression,
                    risk_percent: salvage::risk_percent(loc, sector),
                })
            })
            .collect()
    }

    fn dispatch(&mut self, action: &Action) -> Result<ActionOutcome, ActionError> {
        if !action.allowed_in(self.phase) {
            return Err(ActionError::WrongPhase {
                action: action.name(),
                phase: self.phase,
            });
        }

        match action {
            Action::Connect => {
                self.reset(GamePhase::Playing);
                Ok(ActionOutcome::Connected)
            }
            Action::Restart => {
                self.reset(GamePhase::Playing);
                Ok(ActionOutcome::Restarted)
            }
            Action::ReturnToMenu => {
                self.reset(GamePhase::Menu);
                Ok(ActionOutcome::ReturnedToMenu)
            }
            Action::Salvage { sector } => self.salvage(sector),
            Action::Fight => self.fight(),
            Action::Attack => self.attack(),
            Action::Flee => {
                let sector = combat::disconnect(&mut self.state)?;
                log::info!("forced disconnect from `{sector}`");
                Ok(ActionOutcome::Fled { sector })
            }
            Action::Hide => self.hide(),
            Action::Run => self.run(),
            Action::EscapeClick => {
                let progress = escape::click(&mut self.state)?;
                Ok(ActionOutcome::EscapeClicked { progress })
            }
            Action::UseItem { index } => {
                let effect = inventory::use_item(&mut self.state.stats, *index)?;
                let message = match &effect {
                    ItemEffect::Healed { item, .. } => format!("Vitals improved: {item}."),
                    ItemEffect::Energized { item, .. } => format!("Neurons firing: {item}."),
                    ItemEffect::Equipped { item } => format!("Weapon online: {item}."),
                    ItemEffect::Spent { item } => format!("Discarded: {item}."),
                };
                self.notify(NoticeKind::Info, message);
                Ok(ActionOutcome::ItemUsed(effect))
            }
            Action::SelectPart { part } => {
                let selected = assembly::select_part(&mut self.state, *part)?;
                Ok(ActionOutcome::PartSelected { selected })
            }
            Action::InstallPart { part } => self.install(*part),
            Action::SetInventoryFilter { filter } => {
                self.inventory_filter = *filter;
                Ok(ActionOutcome::FilterSet { filter: *filter })
            }
        }
    }

    fn salvage(&mut self, sector_id: &str) -> Result<ActionOutcome, ActionError> {
        if self.state.confrontation.is_some() {
            return Err(ActionError::EncounterInProgress);
        }
        if self.salvage_settling() {
            return Err(ActionError::SalvageSettling);
        }
        let catalog = Arc::clone(&self.catalog);
        let (Some(location), Some(sector)) =
            (catalog.location(sector_id), self.state.sector(sector_id))
        else {
            return Err(ActionError::UnknownSector(sector_id.to_string()));
        };
        if self.state.stats.stamina < SALVAGE_STAMINA_COST {
            return Err(ActionError::InsufficientStamina {
                required: SALVAGE_STAMINA_COST,
                available: self.state.stats.stamina,
            });
        }
        if sector.is_depleted() {
            return Err(ActionError::SectorDepleted(sector_id.to_string()));
        }

        self.salvage_ready_at = self.clock + SALVAGE_SETTLE_WINDOW;
        self.notify(
            NoticeKind::Info,
            format!("Probing sector: {}...", location.name),
        );
        self.state.stats.spend_stamina(SALVAGE_STAMINA_COST);

        let missing: Vec<PartId> = self
            .state
            .parts_with_status(PartStatus::Missing)
            .into_iter()
            .map(PcPart::id)
            .collect();
        let outcome = {
            let Some(sector) = self.state.sector(sector_id) else {
                return Err(ActionError::UnknownSector(sector_id.to_string()));
            };
            let ctx = SalvageContext {
                location,
                sector,
                missing_parts: &missing,
                items: &catalog.items,
            };
            salvage::roll_salvage(ctx, self.rng.salvage())
        };

        match &outcome.result {
            SalvageResult::Encounter { sector } => {
                log::info!(
                    "encounter in `{sector}` (roll {:.1} < risk {})",
                    outcome.roll,
                    outcome.risk
                );
                self.state.confrontation = Some(Confrontation::Pending {
                    sector: sector.clone(),
                });
                self.events.push(SessionEvent::EncounterSpawned {
                    sector: sector.clone(),
                });
                self.notify(NoticeKind::Critical, NOTICE_MONSTER_DETECTED);
            }
            SalvageResult::Haul(haul) => {
                salvage::apply_haul(&mut self.state, haul);
                if let Some(part) = haul.part {
                    self.events.push(SessionEvent::PartFound { part });
                    let name = catalog
                        .part(part)
                        .map_or_else(|| part.to_string(), |def| def.name.clone());
                    self.notify(
                        NoticeKind::Info,
                        format!("HARDWARE RECOVERED: {}", name.to_uppercase()),
                    );
                }
                if let Some(item) = &haul.item {
                    self.events.push(SessionEvent::ItemFound {
                        item: item.id.clone(),
                    });
                    self.notify(NoticeKind::Info, format!("EXTRACTED: {}", item.name));
                }
                if haul.part.is_none() {
                    self.notify(
                        NoticeKind::Info,
                        format!("Salvaged {}u. Aggression peaked.", haul.scrap),
                    );
                }
            }
        }
        Ok(ActionOutcome::Salvaged(outcome))
    }

    /// Location of the encounter waiting for a response.
    fn pending_location<'c>(&self, catalog: &'c Catalog) -> Result<&'c GameLocation, ActionError> {
        match &self.state.confrontation {
            Some(Confrontation::Pending { sector }) => catalog
                .location(sector)
                .ok_or_else(|| ActionError::UnknownSector(sector.clone())),
            _ => Err(ActionError::NoPendingEncounter),
        }
    }

    fn fight(&mut self) -> Result<ActionOutcome, ActionError> {
        let catalog = Arc::clone(&self.catalog);
        let location = self.pending_location(&catalog)?;
        let monster_hp = combat::start_combat(&mut self.state, location)?;
        self.on_combat_started(&location.id, monster_hp);
        Ok(ActionOutcome::CombatStarted { monster_hp })
    }

    fn on_combat_started(&mut self, sector: &str, monster_hp: u32) {
        log::info!("combat in `{sector}` against {monster_hp} hp");
        self.events.push(SessionEvent::CombatStarted {
            sector: sector.to_string(),
            monster_hp,
        });
        self.notify(NoticeKind::Critical, NOTICE_ENTER_COMBAT);
    }

    fn attack(&mut self) -> Result<ActionOutcome, ActionError> {
        let sector = self
            .state
            .active_encounter()
            .map(str::to_string)
            .unwrap_or_default();
        let outcome = combat::attack(&mut self.state, self.rng.combat())?;
        self.notify(
            NoticeKind::Info,
            format!("HIT: {} DMG", outcome.damage_dealt),
        );
        match outcome.retaliation {
            None => {
                log::info!("purged monster in `{sector}`");
                self.events.push(SessionEvent::MonsterPurged { sector });
                self.notify(NoticeKind::Info, NOTICE_PURGED);
                self.pending_flavor.push(FlavorRequest::purge(self.epoch));
            }
            Some(damage) => {
                self.events.push(SessionEvent::PlayerHit {
                    damage,
                    hp: self.state.stats.hp,
                });
                self.notify(
                    NoticeKind::Critical,
                    format!("SYSTEM BREACH: {damage} DMG TAKEN"),
                );
            }
        }
        Ok(ActionOutcome::Attacked(outcome))
    }

    fn hide(&mut self) -> Result<ActionOutcome, ActionError> {
        match self.state.confrontation.take() {
            Some(Confrontation::Pending { sector }) => {
                self.notify(NoticeKind::Info, NOTICE_MASKED);
                Ok(ActionOutcome::Hidden { sector })
            }
            other => {
                self.state.confrontation = other;
                Err(ActionError::NoPendingEncounter)
            }
        }
    }

    fn run(&mut self) -> Result<ActionOutcome, ActionError> {
        let catalog = Arc::clone(&self.catalog);
        let location = self.pending_location(&catalog)?;
        let outcome = escape::attempt_run(&mut self.state, location, self.rng.escape())?;
        match outcome {
            RunOutcome::Lagged { monster_hp } => {
                self.notify(NoticeKind::Critical, NOTICE_NEURAL_LAG);
                self.on_combat_started(&location.id, monster_hp);
            }
            RunOutcome::Started => {
                log::debug!("escape started from `{}`", location.id);
            }
        }
        Ok(ActionOutcome::Ran(outcome))
    }

    fn install(&mut self, part: PartId) -> Result<ActionOutcome, ActionError> {
        let click = assembly::click_slot(&mut self.state, part)?;
        let name = self
            .catalog
            .part(part)
            .map_or_else(|| part.to_string(), |def| def.name.to_uppercase());
        match click {
            SlotClick::Installed { .. } => {
                self.events.push(SessionEvent::PartInstalled { part });
                self.notify(NoticeKind::Info, format!("HARDWARE INTEGRATED: {name}"));
            }
            SlotClick::NeedsSelection { .. } => {
                self.notify(
                    NoticeKind::Info,
                    format!("SELECT {name} FROM HOLDING BAY"),
                );
            }
        }
        Ok(ActionOutcome::SlotClicked(click))
    }

    fn on_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::EscapeTick => {
                escape::tick(&mut self.state);
            }
            TimerKind::Vitals => {
                if !self.state.in_combat() && !self.state.escaping() {
                    self.state.stats.restore_stamina(STAMINA_REGEN_PER_TICK);
                }
            }
            TimerKind::AggressionDecay => {
                for sector in &mut self.state.sectors {
                    sector.calm(AGGRESSION_DECAY_PER_TICK);
                }
            }
            TimerKind::TipRotation => {
                let count = self.catalog.tips.len();
                if count > 0 {
                    self.tip_index = (self.tip_index + 1) % count;
                }
            }
        }
    }

    /// Resolve derived transitions after any mutation: escape end (success
    /// first), gauge clamp, then the death check.
    fn settle(&mut self) {
        if let Some(resolution) = escape::resolve(&mut self.state) {
            log::debug!("escape resolved: {resolution:?}");
            self.events.push(SessionEvent::EscapeResolved { resolution });
            match resolution {
                EscapeResolution::Escaped => self.notify(NoticeKind::Info, NOTICE_ESCAPED),
                EscapeResolution::Exhausted => self.notify(NoticeKind::Critical, NOTICE_EXHAUSTED),
            }
        }

        if self.phase == GamePhase::Playing {
            let escaping = self.state.escaping();
            if escaping && !self.timers.is_armed(TimerKind::EscapeTick) {
                self.timers.arm(TimerKind::EscapeTick);
            } else if !escaping && self.timers.is_armed(TimerKind::EscapeTick) {
                self.timers.disarm(TimerKind::EscapeTick);
            }
        }

        self.state.stats.clamp();
        if self.phase == GamePhase::Playing && self.state.stats.is_dead() {
            self.enter_phase(GamePhase::GameOver);
        }
    }

    /// Fresh world in `phase`. Randomness continues from where it was.
    fn reset(&mut self, phase: GamePhase) {
        self.epoch = self.epoch.wrapping_add(1);
        self.state = GameState::initial(&self.catalog);
        self.lore.clear();
        self.pending_flavor.clear();
        self.salvage_ready_at = self.clock;
        self.enter_phase(phase);
    }

    fn enter_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        self.phase = to;
        self.timers.disarm_all();
        if to == GamePhase::Playing {
            self.timers.arm(TimerKind::Vitals);
            self.timers.arm(TimerKind::AggressionDecay);
            self.timers.arm(TimerKind::TipRotation);
        }
        if from != to {
            log::info!("phase {from} -> {to} (epoch {})", self.epoch);
            self.events.push(SessionEvent::PhaseChanged { from, to });
        }
    }

    fn notify(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notices.raise(kind, message, self.clock);
    }
}

fn rejection_notice(err: &ActionError) -> String {
    match err {
        ActionError::InsufficientStamina { .. } => NOTICE_INSUFFICIENT_STAMINA.to_string(),
        other => other.to_string(),
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(0)
    }
}
