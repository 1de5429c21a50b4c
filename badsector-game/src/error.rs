use thiserror::Error;

use crate::data::PartId;
use crate::state::GamePhase;

/// Why an action was rejected. A rejected action never changes game state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("`{action}` is not available while {phase}")]
    WrongPhase {
        action: &'static str,
        phase: GamePhase,
    },
    #[error("insufficient neural charge: {required:.1} needed, {available:.1} available")]
    InsufficientStamina { required: f32, available: f32 },
    #[error("unknown sector `{0}`")]
    UnknownSector(String),
    #[error("sector `{0}` has nothing left to salvage")]
    SectorDepleted(String),
    #[error("previous salvage is still settling")]
    SalvageSettling,
    #[error("an encounter is already in progress")]
    EncounterInProgress,
    #[error("no encounter is waiting for a response")]
    NoPendingEncounter,
    #[error("combat is not active")]
    NotInCombat,
    #[error("no escape is running")]
    NotEscaping,
    #[error("escape input ignored: stamina exhausted")]
    EscapeExhausted,
    #[error("no inventory item at index {0}")]
    NoItemAt(usize),
    #[error("part `{0}` is not waiting in the holding bay")]
    PartNotInBay(PartId),
    #[error("part `{0}` is already installed")]
    PartAlreadyInstalled(PartId),
}

impl ActionError {
    /// Silent rejections are plain no-ops; the rest surface a notice.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        !matches!(self, Self::InsufficientStamina { .. })
    }
}
