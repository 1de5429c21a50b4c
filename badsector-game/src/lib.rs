//! Bad Sector Game Engine
//!
//! Platform-agnostic core game logic for the Bad Sector salvage-and-survival game.
//! This crate provides all game mechanics without UI or platform-specific dependencies.

pub mod assembly;
pub mod combat;
pub mod constants;
pub mod data;
pub mod error;
pub mod escape;
pub mod flavor;
pub mod inventory;
pub mod notice;
pub mod numbers;
pub mod rng;
#[cfg(feature = "async")]
pub mod runtime;
pub mod salvage;
pub mod session;
pub mod state;
pub mod timers;

use std::sync::Arc;

// Re-export commonly used types
pub use assembly::{
    DiagnosticMetric, DiagnosticStatus, SlotClick, diagnostics, select_part, system_integrity,
};
pub use combat::{AttackOutcome, monster_hp_for};
pub use constants::AGGRESSION_CAP;
pub use data::{Catalog, CatalogError, GameLocation, Item, ItemKind, PartDef, PartId, catalog};
pub use error::ActionError;
pub use escape::{EscapeResolution, RunOutcome};
pub use flavor::{
    EMPTY_LORE, FALLBACK_LORE, FlavorRequest, FlavorResponse, LoreCategory, LoreEntry, LoreLog,
};
pub use inventory::{InventoryEntry, InventoryFilter, ItemEffect, filtered_inventory};
pub use notice::{Notice, NoticeFeed, NoticeKind, NoticeSet};
pub use rng::{CountingRng, RngBundle};
#[cfg(feature = "async")]
pub use runtime::{FlavorTextSource, LiveSession, SharedSession, generate_or_fallback};
pub use salvage::{SalvageHaul, SalvageOutcome, SalvageResult, risk_percent};
pub use session::{
    Action, ActionOutcome, GameSession, SectorView, SessionEvent, SessionSnapshot,
};
pub use state::{Confrontation, GamePhase, GameState, PartStatus, PcPart, PlayerStats, SectorStatus};
pub use timers::{PhaseTimers, TimerKind};

/// Trait for abstracting catalog loading.
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the content catalog from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or fails validation.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;
}

/// Loader for the catalog embedded in the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCatalog;

impl CatalogLoader for EmbeddedCatalog {
    type Error = std::convert::Infallible;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Ok(catalog().clone())
    }
}

/// Loader parsing catalog JSON supplied at runtime.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    json: String,
}

impl JsonCatalog {
    #[must_use]
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

impl CatalogLoader for JsonCatalog {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Catalog::from_json(&self.json)
    }
}

/// Main game engine for creating sessions on one catalog.
pub struct GameEngine<L>
where
    L: CatalogLoader,
{
    loader: L,
}

impl<L> GameEngine<L>
where
    L: CatalogLoader,
{
    /// Create a new game engine with the provided catalog loader
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Create a session at the menu with the specified seed
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn create_session(&self, seed: u64) -> Result<GameSession, L::Error> {
        let catalog = self.loader.load_catalog()?;
        Ok(GameSession::with_catalog(Arc::new(catalog), seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_creates_sessions_from_embedded_catalog() {
        let engine = GameEngine::new(EmbeddedCatalog);
        let mut session = engine.create_session(0xABCD).unwrap();
        assert_eq!(session.phase(), GamePhase::Menu);
        assert_eq!(session.seed(), 0xABCD);
        session.apply(Action::Connect).unwrap();
        assert_eq!(session.state().sectors.len(), 4);
    }

    #[test]
    fn json_loader_reports_invalid_content() {
        let engine = GameEngine::new(JsonCatalog::new("{ not json"));
        assert!(matches!(
            engine.create_session(1),
            Err(CatalogError::Parse(_))
        ));

        let json = serde_json::to_string(catalog()).unwrap();
        let engine = GameEngine::new(JsonCatalog::new(json));
        let session = engine.create_session(2).unwrap();
        assert_eq!(session.catalog().items.len(), 4);
    }
}
