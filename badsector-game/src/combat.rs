//! Turn-based HP exchange against a spawned monster.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    MONSTER_BASE_DAMAGE, MONSTER_BASE_HP, MONSTER_DAMAGE_SPREAD, MONSTER_HP_PER_HORROR_LEVEL,
    PLAYER_DAMAGE_SPREAD, PURGE_SCRAP_REWARD, UNARMED_DAMAGE,
};
use crate::data::{GameLocation, Item};
use crate::error::ActionError;
use crate::numbers::u32_to_f32;
use crate::state::{Confrontation, GameState};

/// Monster HP at spawn for a sector.
#[must_use]
pub const fn monster_hp_for(location: &GameLocation) -> u32 {
    MONSTER_BASE_HP.saturating_add(
        location
            .horror_level
            .saturating_mul(MONSTER_HP_PER_HORROR_LEVEL),
    )
}

/// Damage dealt by one player strike: weapon value (or bare hands) plus spread.
pub fn roll_player_damage<R: Rng + ?Sized>(weapon: Option<&Item>, rng: &mut R) -> u32 {
    let base = weapon.map_or(UNARMED_DAMAGE, |item| item.value);
    base.saturating_add(rng.gen_range(0..PLAYER_DAMAGE_SPREAD))
}

/// Damage dealt by a monster counter-attack.
pub fn roll_monster_damage<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    MONSTER_BASE_DAMAGE.saturating_add(rng.gen_range(0..MONSTER_DAMAGE_SPREAD))
}

/// Result of a single attack exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub damage_dealt: u32,
    pub monster_hp: u32,
    /// Counter-attack damage; `None` when the strike purged the monster.
    pub retaliation: Option<u32>,
}

impl AttackOutcome {
    #[must_use]
    pub const fn purged(&self) -> bool {
        self.retaliation.is_none()
    }
}

/// Turn a pending encounter into active combat.
///
/// # Errors
///
/// [`ActionError::NoPendingEncounter`] when nothing is waiting for a response.
pub fn start_combat(state: &mut GameState, location: &GameLocation) -> Result<u32, ActionError> {
    match &state.confrontation {
        Some(Confrontation::Pending { sector }) if *sector == location.id => {}
        _ => return Err(ActionError::NoPendingEncounter),
    }
    let monster_hp = monster_hp_for(location);
    state.confrontation = Some(Confrontation::Combat {
        sector: location.id.clone(),
        monster_hp,
    });
    Ok(monster_hp)
}

/// Strike the monster. On a purge the confrontation ends and the bounty is
/// paid; otherwise the monster hits back.
///
/// # Errors
///
/// [`ActionError::NotInCombat`] when combat is not active.
pub fn attack<R: Rng + ?Sized>(
    state: &mut GameState,
    rng: &mut R,
) -> Result<AttackOutcome, ActionError> {
    let Some(Confrontation::Combat { monster_hp, .. }) = &state.confrontation else {
        return Err(ActionError::NotInCombat);
    };
    let current = *monster_hp;

    let damage_dealt = roll_player_damage(state.stats.equipped_weapon.as_ref(), rng);
    let remaining = current.saturating_sub(damage_dealt);

    if remaining == 0 {
        state.confrontation = None;
        state.stats.scrap = state.stats.scrap.saturating_add(PURGE_SCRAP_REWARD);
        return Ok(AttackOutcome {
            damage_dealt,
            monster_hp: 0,
            retaliation: None,
        });
    }

    if let Some(Confrontation::Combat { monster_hp, .. }) = &mut state.confrontation {
        *monster_hp = remaining;
    }
    let retaliation = roll_monster_damage(rng);
    state.stats.take_damage(u32_to_f32(retaliation));

    Ok(AttackOutcome {
        damage_dealt,
        monster_hp: remaining,
        retaliation: Some(retaliation),
    })
}

/// Forced disconnect: abandon combat with no penalty beyond damage taken.
///
/// # Errors
///
/// [`ActionError::NotInCombat`] when combat is not active.
pub fn disconnect(state: &mut GameState) -> Result<String, ActionError> {
    match state.confrontation.take() {
        Some(Confrontation::Combat { sector, .. }) => Ok(sector),
        other => {
            state.confrontation = other;
            Err(ActionError::NotInCombat)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn combat_state(sector: &str, monster_hp: u32) -> GameState {
        let mut state = GameState::initial(catalog());
        state.confrontation = Some(Confrontation::Combat {
            sector: sector.into(),
            monster_hp,
        });
        state
    }

    #[test]
    fn monster_hp_scales_with_horror() {
        let server = catalog().location("server-room").unwrap();
        assert_eq!(monster_hp_for(server), 240);
        let office = catalog().location("main-office").unwrap();
        assert_eq!(monster_hp_for(office), 100);
    }

    #[test]
    fn unarmed_damage_stays_in_range() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..5_000 {
            let dmg = roll_player_damage(None, &mut rng);
            assert!((5..=16).contains(&dmg), "damage {dmg}");
            seen_low |= dmg == 5;
            seen_high |= dmg == 16;
        }
        assert!(seen_low && seen_high);
    }

    #[test]
    fn monster_damage_stays_in_range() {
        let mut rng = SmallRng::seed_from_u64(8);
        for _ in 0..2_000 {
            assert!((12..=29).contains(&roll_monster_damage(&mut rng)));
        }
    }

    #[test]
    fn weapon_value_replaces_bare_hands() {
        let pipe = catalog().item("soldering-iron").unwrap();
        let mut rng = SmallRng::seed_from_u64(4);
        for _ in 0..500 {
            assert!((30..=41).contains(&roll_player_damage(Some(pipe), &mut rng)));
        }
    }

    #[test]
    fn fight_requires_matching_pending_encounter() {
        let lab = catalog().location("lab").unwrap();
        let mut state = GameState::initial(catalog());
        assert_eq!(
            start_combat(&mut state, lab),
            Err(ActionError::NoPendingEncounter)
        );
        state.confrontation = Some(Confrontation::Pending {
            sector: "lab".into(),
        });
        assert_eq!(start_combat(&mut state, lab), Ok(160));
        assert_eq!(
            state.confrontation.as_ref().and_then(Confrontation::monster_hp),
            Some(160)
        );
    }

    #[test]
    fn lethal_strike_purges_and_pays_bounty() {
        let mut state = combat_state("lab", 1);
        let mut rng = SmallRng::seed_from_u64(1);
        let outcome = attack(&mut state, &mut rng).unwrap();
        assert!(outcome.purged());
        assert_eq!(outcome.monster_hp, 0);
        assert!(state.confrontation.is_none());
        assert_eq!(state.stats.scrap, 45 + 150);
        assert!((state.stats.hp - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn surviving_monster_retaliates() {
        let mut state = combat_state("server-room", 240);
        let mut rng = SmallRng::seed_from_u64(2);
        let outcome = attack(&mut state, &mut rng).unwrap();
        let retaliation = outcome.retaliation.unwrap();
        assert_eq!(outcome.monster_hp, 240 - outcome.damage_dealt);
        assert!((state.stats.hp - (100.0 - u32_to_f32(retaliation))).abs() < f32::EPSILON);
        assert_eq!(
            state.confrontation.as_ref().and_then(Confrontation::monster_hp),
            Some(outcome.monster_hp)
        );
    }

    #[test]
    fn disconnect_only_leaves_combat() {
        let mut state = GameState::initial(catalog());
        state.confrontation = Some(Confrontation::Pending {
            sector: "lab".into(),
        });
        assert_eq!(disconnect(&mut state), Err(ActionError::NotInCombat));
        assert!(state.confrontation.is_some());

        let mut state = combat_state("lab", 90);
        state.stats.hp = 40.0;
        assert_eq!(disconnect(&mut state).as_deref(), Ok("lab"));
        assert!(state.confrontation.is_none());
        assert!((state.stats.hp - 40.0).abs() < f32::EPSILON);
    }
}
