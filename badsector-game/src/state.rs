use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    AGGRESSION_CAP, INITIAL_HP, INITIAL_SCRAP, INITIAL_STAMINA, SALVAGE_POOL_FULL,
};
use crate::data::{Catalog, Item, PartDef, PartId};

/// Top-level phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    #[default]
    Menu,
    Playing,
    #[serde(rename = "gameover")]
    GameOver,
}

impl GamePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Playing => "playing",
            Self::GameOver => "gameover",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GamePhase {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "menu" => Ok(Self::Menu),
            "playing" => Ok(Self::Playing),
            "gameover" => Ok(Self::GameOver),
            _ => Err(()),
        }
    }
}

/// Player vitals, currency and gear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub hp: f32,
    pub max_hp: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    pub scrap: u32,
    pub inventory: Vec<Item>,
    pub equipped_weapon: Option<Item>,
}

impl PlayerStats {
    /// Fresh stats for a new session.
    #[must_use]
    pub fn initial(catalog: &Catalog) -> Self {
        Self {
            hp: INITIAL_HP,
            max_hp: INITIAL_HP,
            stamina: INITIAL_STAMINA,
            max_stamina: INITIAL_STAMINA,
            scrap: INITIAL_SCRAP,
            inventory: catalog.starter_item().cloned().into_iter().collect(),
            equipped_weapon: None,
        }
    }

    /// Keep both gauges inside `[0, max]`.
    pub fn clamp(&mut self) {
        self.hp = self.hp.clamp(0.0, self.max_hp);
        self.stamina = self.stamina.clamp(0.0, self.max_stamina);
    }

    pub fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Apply damage, returning whether the player is down.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.hp = (self.hp - amount).max(0.0);
        self.is_dead()
    }

    pub fn restore_stamina(&mut self, amount: f32) {
        self.stamina = (self.stamina + amount).min(self.max_stamina);
    }

    pub fn spend_stamina(&mut self, amount: f32) {
        self.stamina = (self.stamina - amount).max(0.0);
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.stamina <= 0.0
    }
}

/// Lifecycle of a hardware part. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartStatus {
    Missing,
    Found,
    Installed,
}

impl PartStatus {
    /// Next status in the lifecycle, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Missing => Some(Self::Found),
            Self::Found => Some(Self::Installed),
            Self::Installed => None,
        }
    }
}

/// A catalog part paired with its live status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcPart {
    pub def: PartDef,
    pub status: PartStatus,
}

impl PcPart {
    #[must_use]
    pub const fn new(def: PartDef) -> Self {
        Self {
            def,
            status: PartStatus::Missing,
        }
    }

    #[must_use]
    pub const fn id(&self) -> PartId {
        self.def.id
    }

    /// Step to the next status if it is exactly `target`.
    ///
    /// Returns `false` (and leaves the part untouched) for skips and regressions.
    pub fn advance_to(&mut self, target: PartStatus) -> bool {
        if self.status.next() == Some(target) {
            self.status = target;
            true
        } else {
            false
        }
    }
}

/// Dynamic state of one sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorStatus {
    pub id: String,
    /// Remaining salvage pool, 0-100. Never regenerates.
    pub salvage_left: u8,
    /// Risk accelerator, 0-100.
    pub aggression: u32,
}

impl SectorStatus {
    #[must_use]
    pub fn fresh(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            salvage_left: SALVAGE_POOL_FULL,
            aggression: 0,
        }
    }

    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.salvage_left == 0
    }

    pub fn deplete(&mut self, amount: u8) {
        self.salvage_left = self.salvage_left.saturating_sub(amount);
    }

    pub fn agitate(&mut self, amount: u32) {
        self.aggression = self.aggression.saturating_add(amount).min(AGGRESSION_CAP);
    }

    pub fn calm(&mut self, amount: u32) {
        self.aggression = self.aggression.saturating_sub(amount);
    }
}

/// The blocking monster confrontation, if any.
///
/// Encounter, combat and escape are mutually exclusive, so a single
/// optional value models all three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Confrontation {
    /// Monster detected; the player has not chosen a response yet.
    Pending { sector: String },
    Combat { sector: String, monster_hp: u32 },
    Escape { sector: String, progress: f32 },
}

impl Confrontation {
    #[must_use]
    pub fn sector(&self) -> &str {
        match self {
            Self::Pending { sector } | Self::Combat { sector, .. } | Self::Escape { sector, .. } => {
                sector
            }
        }
    }

    #[must_use]
    pub const fn is_combat(&self) -> bool {
        matches!(self, Self::Combat { .. })
    }

    #[must_use]
    pub const fn is_escape(&self) -> bool {
        matches!(self, Self::Escape { .. })
    }

    #[must_use]
    pub const fn monster_hp(&self) -> Option<u32> {
        match self {
            Self::Combat { monster_hp, .. } => Some(*monster_hp),
            _ => None,
        }
    }

    #[must_use]
    pub const fn escape_progress(&self) -> Option<f32> {
        match self {
            Self::Escape { progress, .. } => Some(*progress),
            _ => None,
        }
    }
}

/// Mutable game world owned by a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub stats: PlayerStats,
    pub parts: Vec<PcPart>,
    pub sectors: Vec<SectorStatus>,
    pub confrontation: Option<Confrontation>,
    pub selected_part: Option<PartId>,
}

impl GameState {
    /// Fresh world for a new session.
    #[must_use]
    pub fn initial(catalog: &Catalog) -> Self {
        Self {
            stats: PlayerStats::initial(catalog),
            parts: catalog.parts.iter().cloned().map(PcPart::new).collect(),
            sectors: catalog
                .locations
                .iter()
                .map(|loc| SectorStatus::fresh(loc.id.clone()))
                .collect(),
            confrontation: None,
            selected_part: None,
        }
    }

    #[must_use]
    pub fn sector(&self, id: &str) -> Option<&SectorStatus> {
        self.sectors.iter().find(|s| s.id == id)
    }

    pub fn sector_mut(&mut self, id: &str) -> Option<&mut SectorStatus> {
        self.sectors.iter_mut().find(|s| s.id == id)
    }

    #[must_use]
    pub fn part(&self, id: PartId) -> Option<&PcPart> {
        self.parts.iter().find(|p| p.id() == id)
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut PcPart> {
        self.parts.iter_mut().find(|p| p.id() == id)
    }

    #[must_use]
    pub fn parts_with_status(&self, status: PartStatus) -> Vec<&PcPart> {
        self.parts.iter().filter(|p| p.status == status).collect()
    }

    #[must_use]
    pub fn in_combat(&self) -> bool {
        self.confrontation.as_ref().is_some_and(Confrontation::is_combat)
    }

    #[must_use]
    pub fn escaping(&self) -> bool {
        self.confrontation.as_ref().is_some_and(Confrontation::is_escape)
    }

    /// Sector id of the active encounter, whatever its stage.
    #[must_use]
    pub fn active_encounter(&self) -> Option<&str> {
        self.confrontation.as_ref().map(Confrontation::sector)
    }
}
