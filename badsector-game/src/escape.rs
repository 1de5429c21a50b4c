//! Escape quick-time event: a click-driven race between progress and stamina.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::start_combat;
use crate::constants::{
    ESCAPE_CLICK_COST, ESCAPE_CLICK_PROGRESS, ESCAPE_DECAY_PER_TICK, ESCAPE_DRAIN_PER_TICK,
    ESCAPE_FAILURE_DAMAGE, ESCAPE_GOAL, ESCAPE_LAG_FAILURE_CHANCE, ESCAPE_LAG_THRESHOLD,
};
use crate::data::GameLocation;
use crate::error::ActionError;
use crate::state::{Confrontation, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "run", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The escape started from zero progress.
    Started,
    /// Low stamina and a failed coin flip: combat was forced instead.
    Lagged { monster_hp: u32 },
}

/// How a running escape ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeResolution {
    Escaped,
    Exhausted,
}

/// Respond to a pending encounter by running.
///
/// The coin flip is drawn only when stamina is under the lag threshold.
///
/// # Errors
///
/// [`ActionError::NoPendingEncounter`] when nothing is waiting for a response.
pub fn attempt_run<R: Rng + ?Sized>(
    state: &mut GameState,
    location: &GameLocation,
    rng: &mut R,
) -> Result<RunOutcome, ActionError> {
    match &state.confrontation {
        Some(Confrontation::Pending { sector }) if *sector == location.id => {}
        _ => return Err(ActionError::NoPendingEncounter),
    }

    if state.stats.stamina < ESCAPE_LAG_THRESHOLD
        && rng.r#gen::<f64>() < ESCAPE_LAG_FAILURE_CHANCE
    {
        let monster_hp = start_combat(state, location)?;
        return Ok(RunOutcome::Lagged { monster_hp });
    }

    state.confrontation = Some(Confrontation::Escape {
        sector: location.id.clone(),
        progress: 0.0,
    });
    Ok(RunOutcome::Started)
}

/// One 50 ms escape tick: progress decays and stamina drains.
///
/// Returns `false` when no escape is running.
pub fn tick(state: &mut GameState) -> bool {
    let Some(Confrontation::Escape { progress, .. }) = &mut state.confrontation else {
        return false;
    };
    *progress = (*progress - ESCAPE_DECAY_PER_TICK).max(0.0);
    state.stats.spend_stamina(ESCAPE_DRAIN_PER_TICK);
    true
}

/// One escape click. Returns the new progress.
///
/// # Errors
///
/// [`ActionError::NotEscaping`] without a running escape, and
/// [`ActionError::EscapeExhausted`] once stamina is gone.
pub fn click(state: &mut GameState) -> Result<f32, ActionError> {
    let Some(Confrontation::Escape { progress, .. }) = &mut state.confrontation else {
        return Err(ActionError::NotEscaping);
    };
    if state.stats.is_exhausted() {
        return Err(ActionError::EscapeExhausted);
    }
    *progress = (*progress + ESCAPE_CLICK_PROGRESS).min(ESCAPE_GOAL);
    let now = *progress;
    state.stats.spend_stamina(ESCAPE_CLICK_COST);
    Ok(now)
}

/// Check a running escape for a terminal condition. Success wins when
/// both hold in the same instant.
pub fn resolve(state: &mut GameState) -> Option<EscapeResolution> {
    let progress = state.confrontation.as_ref()?.escape_progress()?;
    if progress >= ESCAPE_GOAL {
        state.confrontation = None;
        return Some(EscapeResolution::Escaped);
    }
    if state.stats.is_exhausted() {
        state.confrontation = None;
        state.stats.take_damage(ESCAPE_FAILURE_DAMAGE);
        return Some(EscapeResolution::Exhausted);
    }
    None
}
