//! Balance and tuning constants for the Bad Sector simulation.
//!
//! Content (names, horror levels, item values) lives in the catalog; the
//! rules that act on it live here.

use std::time::Duration;

// Player defaults ----------------------------------------------------------
pub(crate) const INITIAL_HP: f32 = 100.0;
pub(crate) const INITIAL_STAMINA: f32 = 100.0;
pub(crate) const INITIAL_SCRAP: u32 = 45;

// Timers -------------------------------------------------------------------
pub(crate) const ESCAPE_TICK_PERIOD: Duration = Duration::from_millis(50);
pub(crate) const VITALS_PERIOD: Duration = Duration::from_millis(500);
pub(crate) const AGGRESSION_DECAY_PERIOD: Duration = Duration::from_millis(4_000);
pub(crate) const TIP_ROTATION_PERIOD: Duration = Duration::from_millis(10_000);
pub(crate) const NOTICE_LIFETIME: Duration = Duration::from_millis(5_000);
pub(crate) const SALVAGE_SETTLE_WINDOW: Duration = Duration::from_millis(800);

// Vitals -------------------------------------------------------------------
pub(crate) const STAMINA_REGEN_PER_TICK: f32 = 2.5;
pub(crate) const AGGRESSION_DECAY_PER_TICK: u32 = 1;

// Salvage ------------------------------------------------------------------
pub(crate) const SALVAGE_STAMINA_COST: f32 = 15.0;
pub(crate) const SALVAGE_POOL_FULL: u8 = 100;
pub(crate) const SALVAGE_DEPLETION: u8 = 20;
pub(crate) const SALVAGE_AGGRESSION_GAIN: u32 = 12;
pub const AGGRESSION_CAP: u32 = 100;
pub(crate) const RISK_PER_HORROR_LEVEL: u32 = 7;
pub(crate) const RISK_PERCENT_CAP: u32 = 100;
pub(crate) const PART_FIND_CHANCE: f64 = 0.15;
pub(crate) const ITEM_FIND_CHANCE: f64 = 0.20;
pub(crate) const SCRAP_ROLL_SCALE: f64 = 20.0;
pub(crate) const SCRAP_FLOOR: u32 = 10;

// Combat -------------------------------------------------------------------
pub(crate) const MONSTER_BASE_HP: u32 = 60;
pub(crate) const MONSTER_HP_PER_HORROR_LEVEL: u32 = 20;
pub(crate) const UNARMED_DAMAGE: u32 = 5;
pub(crate) const PLAYER_DAMAGE_SPREAD: u32 = 12;
pub(crate) const MONSTER_BASE_DAMAGE: u32 = 12;
pub(crate) const MONSTER_DAMAGE_SPREAD: u32 = 18;
pub(crate) const PURGE_SCRAP_REWARD: u32 = 150;

// Escape -------------------------------------------------------------------
pub(crate) const ESCAPE_LAG_THRESHOLD: f32 = 25.0;
pub(crate) const ESCAPE_LAG_FAILURE_CHANCE: f64 = 0.5;
pub(crate) const ESCAPE_DECAY_PER_TICK: f32 = 1.5;
pub(crate) const ESCAPE_DRAIN_PER_TICK: f32 = 0.5;
pub(crate) const ESCAPE_CLICK_PROGRESS: f32 = 12.0;
pub(crate) const ESCAPE_CLICK_COST: f32 = 2.5;
pub(crate) const ESCAPE_GOAL: f32 = 100.0;
pub(crate) const ESCAPE_FAILURE_DAMAGE: f32 = 45.0;

// Flavor text --------------------------------------------------------------
pub(crate) const PURGE_LORE_TITLE: &str = "COMBAT LOG: PURGE";
pub(crate) const PURGE_LORE_PROMPT: &str = "The Abomination has been physically dismantled. \
Describe the leaking black fluid that looks like oil and liquid mercury.";

// Notice copy --------------------------------------------------------------
pub(crate) const NOTICE_INSUFFICIENT_STAMINA: &str = "INSUFFICIENT NEURAL CHARGE: RECOVERY REQUIRED";
pub(crate) const NOTICE_MONSTER_DETECTED: &str = "SIGNAL INTERFERENCE: MONSTER DETECTED";
pub(crate) const NOTICE_ENTER_COMBAT: &str = "ENTERING COMBAT PROTOCOL";
pub(crate) const NOTICE_PURGED: &str = "ENTITY PURGED.";
pub(crate) const NOTICE_MASKED: &str = "Signal masked. Undetected.";
pub(crate) const NOTICE_NEURAL_LAG: &str = "NEURAL LAG: ESCAPE ATTEMPT FAILED";
pub(crate) const NOTICE_ESCAPED: &str = "DIVE SUCCESSFUL. CONNECTION SEVERED.";
pub(crate) const NOTICE_EXHAUSTED: &str = "FEEDBACK LOOP: STAMINA EXHAUSTED.";
