//! Encounter resolver: what a salvage run in a sector turns up.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ITEM_FIND_CHANCE, PART_FIND_CHANCE, RISK_PER_HORROR_LEVEL, RISK_PERCENT_CAP,
    SALVAGE_AGGRESSION_GAIN, SALVAGE_DEPLETION, SCRAP_FLOOR, SCRAP_ROLL_SCALE,
};
use crate::data::{GameLocation, Item, PartId};
use crate::numbers::floor_f64_to_u32;
use crate::state::{GameState, PartStatus, SectorStatus};

/// Inputs to a single salvage roll.
#[derive(Debug, Clone, Copy)]
pub struct SalvageContext<'a> {
    pub location: &'a GameLocation,
    pub sector: &'a SectorStatus,
    /// Parts still MISSING, in slot order.
    pub missing_parts: &'a [PartId],
    /// Item catalog drops are drawn from.
    pub items: &'a [Item],
}

/// Loot from a salvage run that did not wake anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalvageHaul {
    pub sector: String,
    pub part: Option<PartId>,
    pub scrap: u32,
    pub item: Option<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SalvageResult {
    Encounter { sector: String },
    Haul(SalvageHaul),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalvageOutcome {
    pub result: SalvageResult,
    /// Encounter threshold the roll was compared against.
    pub risk: u32,
    /// Uniform roll in `[0, 100)`.
    pub roll: f64,
}

impl SalvageOutcome {
    #[must_use]
    pub const fn is_encounter(&self) -> bool {
        matches!(self.result, SalvageResult::Encounter { .. })
    }

    #[must_use]
    pub const fn haul(&self) -> Option<&SalvageHaul> {
        match &self.result {
            SalvageResult::Haul(haul) => Some(haul),
            SalvageResult::Encounter { .. } => None,
        }
    }
}

/// Raw encounter threshold: `horror_level × 7 + aggression`.
#[must_use]
pub const fn risk_score(location: &GameLocation, sector: &SectorStatus) -> u32 {
    location
        .horror_level
        .saturating_mul(RISK_PER_HORROR_LEVEL)
        .saturating_add(sector.aggression)
}

/// Risk as displayed to the player, capped at 100%.
#[must_use]
pub fn risk_percent(location: &GameLocation, sector: &SectorStatus) -> u32 {
    risk_score(location, sector).min(RISK_PERCENT_CAP)
}

/// Scrap for a haul given a uniform `[0, 1)` draw.
#[must_use]
pub fn scrap_yield(horror_level: u32, draw: f64) -> u32 {
    let scaled = draw * SCRAP_ROLL_SCALE * (f64::from(horror_level) / 2.0);
    floor_f64_to_u32(scaled).saturating_add(SCRAP_FLOOR)
}

/// Roll one salvage attempt. Draw order: encounter roll, then (only on a
/// quiet run) part chance, part pick, scrap, item chance, item pick.
pub fn roll_salvage<R: Rng + ?Sized>(ctx: SalvageContext<'_>, rng: &mut R) -> SalvageOutcome {
    let risk = risk_score(ctx.location, ctx.sector);
    let roll = rng.r#gen::<f64>() * 100.0;

    if roll < f64::from(risk) {
        return SalvageOutcome {
            result: SalvageResult::Encounter {
                sector: ctx.sector.id.clone(),
            },
            risk,
            roll,
        };
    }

    let part = if !ctx.missing_parts.is_empty() && rng.r#gen::<f64>() < PART_FIND_CHANCE {
        let idx = rng.gen_range(0..ctx.missing_parts.len());
        ctx.missing_parts.get(idx).copied()
    } else {
        None
    };

    let scrap = scrap_yield(ctx.location.horror_level, rng.r#gen::<f64>());

    let item = if !ctx.items.is_empty() && rng.r#gen::<f64>() < ITEM_FIND_CHANCE {
        let idx = rng.gen_range(0..ctx.items.len());
        ctx.items.get(idx).cloned()
    } else {
        None
    };

    SalvageOutcome {
        result: SalvageResult::Haul(SalvageHaul {
            sector: ctx.sector.id.clone(),
            part,
            scrap,
            item,
        }),
        risk,
        roll,
    }
}

/// Bank a haul: part found, scrap and item credited, sector worked over.
pub fn apply_haul(state: &mut GameState, haul: &SalvageHaul) {
    if let Some(part_id) = haul.part
        && let Some(part) = state.part_mut(part_id)
    {
        part.advance_to(PartStatus::Found);
    }
    state.stats.scrap = state.stats.scrap.saturating_add(haul.scrap);
    if let Some(item) = &haul.item {
        state.stats.inventory.push(item.clone());
    }
    if let Some(sector) = state.sector_mut(&haul.sector) {
        sector.deplete(SALVAGE_DEPLETION);
        sector.agitate(SALVAGE_AGGRESSION_GAIN);
    }
}
