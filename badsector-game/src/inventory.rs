//! Consumables, weapon equip and the filtered inventory view.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::data::{Item, ItemKind};
use crate::error::ActionError;
use crate::numbers::u32_to_f32;
use crate::state::PlayerStats;

/// Inventory panel filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum InventoryFilter {
    #[default]
    All,
    /// Food and drink.
    Recovery,
    Weapon,
}

impl InventoryFilter {
    pub const ALL: [Self; 3] = [Self::All, Self::Recovery, Self::Weapon];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Recovery => "RECOVERY",
            Self::Weapon => "WEAPON",
        }
    }

    #[must_use]
    pub const fn admits(self, kind: ItemKind) -> bool {
        match self {
            Self::All => true,
            Self::Recovery => kind.is_recovery(),
            Self::Weapon => matches!(kind, ItemKind::Weapon),
        }
    }
}

impl fmt::Display for InventoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InventoryFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "RECOVERY" => Ok(Self::Recovery),
            "WEAPON" => Ok(Self::Weapon),
            _ => Err(()),
        }
    }
}

/// An inventory item together with its index in the full inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub index: usize,
    pub item: Item,
}

/// Items admitted by `filter`, in inventory order, tagged with the index
/// that [`use_item`] expects.
#[must_use]
pub fn filtered_inventory(stats: &PlayerStats, filter: InventoryFilter) -> Vec<InventoryEntry> {
    stats
        .inventory
        .iter()
        .enumerate()
        .filter(|(_, item)| filter.admits(item.kind))
        .map(|(index, item)| InventoryEntry {
            index,
            item: item.clone(),
        })
        .collect()
}

/// What using an item did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ItemEffect {
    Healed { item: String, amount: f32 },
    Energized { item: String, amount: f32 },
    Equipped { item: String },
    /// Utility items carry no stat effect and are simply used up.
    Spent { item: String },
}

/// Use the item at `index` of the full inventory.
///
/// Food and drink restore their gauge and are removed. Weapons are
/// equipped and stay in the inventory.
///
/// # Errors
///
/// [`ActionError::NoItemAt`] for an out-of-range index.
pub fn use_item(stats: &mut PlayerStats, index: usize) -> Result<ItemEffect, ActionError> {
    let item = stats
        .inventory
        .get(index)
        .cloned()
        .ok_or(ActionError::NoItemAt(index))?;
    let amount = u32_to_f32(item.value);

    let effect = match item.kind {
        ItemKind::Food => {
            let before = stats.hp;
            stats.heal(amount);
            ItemEffect::Healed {
                item: item.name.clone(),
                amount: stats.hp - before,
            }
        }
        ItemKind::Drink => {
            let before = stats.stamina;
            stats.restore_stamina(amount);
            ItemEffect::Energized {
                item: item.name.clone(),
                amount: stats.stamina - before,
            }
        }
        ItemKind::Weapon => {
            let name = item.name.clone();
            stats.equipped_weapon = Some(item);
            return Ok(ItemEffect::Equipped { item: name });
        }
        ItemKind::Utility => ItemEffect::Spent {
            item: item.name.clone(),
        },
    };

    stats.inventory.remove(index);
    Ok(effect)
}
