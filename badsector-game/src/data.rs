//! Static content catalog: hardware parts, sectors, items and combat tips.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_CATALOG_DATA: &str = include_str!("../../assets/data/catalog.json");

/// The four hardware slots of the rig being rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PartId {
    #[serde(rename = "motherboard")]
    Motherboard,
    #[serde(rename = "cpu-ram")]
    CpuRam,
    #[serde(rename = "gpu")]
    Gpu,
    #[serde(rename = "psu")]
    Psu,
}

impl PartId {
    /// Slot order used by the assembly bay.
    pub const ALL: [Self; 4] = [Self::Motherboard, Self::CpuRam, Self::Gpu, Self::Psu];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Motherboard => "motherboard",
            Self::CpuRam => "cpu-ram",
            Self::Gpu => "gpu",
            Self::Psu => "psu",
        }
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "motherboard" => Ok(Self::Motherboard),
            "cpu-ram" => Ok(Self::CpuRam),
            "gpu" => Ok(Self::Gpu),
            "psu" => Ok(Self::Psu),
            _ => Err(()),
        }
    }
}

/// Catalog entry for a hardware part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartDef {
    pub id: PartId,
    pub name: String,
    pub description: String,
    /// Name of the sector the part is rumoured to be in.
    pub location: String,
    pub order: u8,
}

/// An explorable sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLocation {
    pub id: String,
    pub name: String,
    pub horror_level: u32,
    pub description: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Food,
    Drink,
    Weapon,
    Utility,
}

impl ItemKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Drink => "drink",
            Self::Weapon => "weapon",
            Self::Utility => "utility",
        }
    }

    /// Food and drink restore a gauge when used.
    #[must_use]
    pub const fn is_recovery(self) -> bool {
        matches!(self, Self::Food | Self::Drink)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inventory item. `value` is heal amount, stamina restore or damage
/// depending on `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub value: u32,
    pub description: String,
}

/// Errors raised when catalog content violates its invariants.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("part `{0}` is missing from the catalog")]
    MissingPart(PartId),
    #[error("part `{0}` is listed more than once")]
    DuplicatePart(PartId),
    #[error("location id `{0}` is listed more than once")]
    DuplicateLocation(String),
    #[error("location `{id}` has horror level {level}; it must be at least 1")]
    HorrorLevel { id: String, level: u32 },
    #[error("catalog must define at least one {0}")]
    Empty(&'static str),
}

/// Container for all static content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub parts: Vec<PartDef>,
    pub locations: Vec<GameLocation>,
    pub items: Vec<Item>,
    #[serde(default)]
    pub tips: Vec<String>,
}

impl Catalog {
    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the content is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut catalog: Self = serde_json::from_str(json)?;
        catalog.parts.sort_by_key(|part| part.order);
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load the catalog embedded in the crate, falling back to the
    /// built-in content if the asset is broken.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CATALOG_DATA).unwrap_or_else(|err| {
            log::warn!("embedded catalog rejected, using built-in content: {err}");
            Self::builtin()
        })
    }

    /// Check the invariants every session relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen_parts = HashSet::new();
        for part in &self.parts {
            if !seen_parts.insert(part.id) {
                return Err(CatalogError::DuplicatePart(part.id));
            }
        }
        if let Some(missing) = PartId::ALL.iter().find(|id| !seen_parts.contains(*id)) {
            return Err(CatalogError::MissingPart(*missing));
        }

        if self.locations.is_empty() {
            return Err(CatalogError::Empty("location"));
        }
        let mut seen_locations = HashSet::new();
        for location in &self.locations {
            if !seen_locations.insert(location.id.as_str()) {
                return Err(CatalogError::DuplicateLocation(location.id.clone()));
            }
            if location.horror_level == 0 {
                return Err(CatalogError::HorrorLevel {
                    id: location.id.clone(),
                    level: location.horror_level,
                });
            }
        }

        if self.items.is_empty() {
            return Err(CatalogError::Empty("item"));
        }
        if self.tips.is_empty() {
            return Err(CatalogError::Empty("combat tip"));
        }
        Ok(())
    }

    #[must_use]
    pub fn location(&self, id: &str) -> Option<&GameLocation> {
        self.locations.iter().find(|loc| loc.id == id)
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn part(&self, id: PartId) -> Option<&PartDef> {
        self.parts.iter().find(|part| part.id == id)
    }

    /// First food item, handed to the player at session start.
    #[must_use]
    pub fn starter_item(&self) -> Option<&Item> {
        self.items.iter().find(|item| item.kind == ItemKind::Food)
    }

    fn builtin() -> Self {
        let part = |id: PartId, name: &str, description: &str, location: &str, order: u8| {
            PartDef {
                id,
                name: name.to_string(),
                description: description.to_string(),
                location: location.to_string(),
                order,
            }
        };
        let location = |id: &str, name: &str, horror_level: u32, description: &str| GameLocation {
            id: id.to_string(),
            name: name.to_string(),
            horror_level,
            description: description.to_string(),
            image_url: String::new(),
        };
        let item = |id: &str, name: &str, kind: ItemKind, value: u32, description: &str| Item {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            value,
            description: description.to_string(),
        };

        Self {
            parts: vec![
                part(PartId::Motherboard, "Motherboard", "Connects all other components.", "Main Office", 1),
                part(PartId::CpuRam, "CPU & RAM", "Processing and short-term memory.", "High-End Lab", 2),
                part(PartId::Gpu, "GPU", "Handles high-fidelity rendering.", "Graphic Design Wing", 3),
                part(PartId::Psu, "PSU", "Distributes electricity.", "Boiler / Server Room", 4),
            ],
            locations: vec![
                location("main-office", "Main Office", 2, "Faint typing sounds."),
                location("lab", "High-End Lab", 5, "Rows of glowing towers."),
                location("design-wing", "Graphic Design Wing", 7, "Plotters that move without power."),
                location("server-room", "Boiler / Server Room", 9, "Something clicks in the dark."),
            ],
            items: vec![
                item("protein-bar", "Compressed Bar", ItemKind::Food, 25, "Restores 25 HP."),
                item("energy-drink", "Neon Volt", ItemKind::Drink, 50, "Restores 50 Stamina."),
                item("lead-pipe", "Heavy Pipe", ItemKind::Weapon, 15, "15 Damage."),
                item("soldering-iron", "High-Temp Iron", ItemKind::Weapon, 30, "30 Damage."),
            ],
            tips: vec![String::from(
                "SALVAGING CONSUMES 15 NEURAL CHARGE (STM) PER EXTRACTION.",
            )],
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::load_from_static()
    }
}

/// Process-wide read-only catalog.
#[must_use]
pub fn catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(Catalog::load_from_static)
}
