//! Periodic timers scoped to the PLAYING phase.
//!
//! The session owns a [`PhaseTimers`] and drives it from a virtual clock,
//! so the order in which overlapping ticks land is fully determined by
//! their periods rather than by whatever a host event loop happens to
//! schedule first.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::time::Duration;

use crate::constants::{
    AGGRESSION_DECAY_PERIOD, ESCAPE_TICK_PERIOD, TIP_ROTATION_PERIOD, VITALS_PERIOD,
};

/// Timers fired in the same instant, in firing order.
pub type FiredTimers = SmallVec<[TimerKind; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Escape progress decay and stamina drain while an escape runs.
    EscapeTick,
    /// Passive stamina regeneration.
    Vitals,
    /// Per-sector aggression decay.
    AggressionDecay,
    /// Combat tip rotation.
    TipRotation,
}

impl TimerKind {
    /// Firing order for ticks that fall due in the same instant.
    pub const ALL: [Self; 4] = [
        Self::EscapeTick,
        Self::Vitals,
        Self::AggressionDecay,
        Self::TipRotation,
    ];

    #[must_use]
    pub const fn period(self) -> Duration {
        match self {
            Self::EscapeTick => ESCAPE_TICK_PERIOD,
            Self::Vitals => VITALS_PERIOD,
            Self::AggressionDecay => AGGRESSION_DECAY_PERIOD,
            Self::TipRotation => TIP_ROTATION_PERIOD,
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::EscapeTick => 0,
            Self::Vitals => 1,
            Self::AggressionDecay => 2,
            Self::TipRotation => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EscapeTick => "escape_tick",
            Self::Vitals => "vitals",
            Self::AggressionDecay => "aggression_decay",
            Self::TipRotation => "tip_rotation",
        }
    }
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TimerSlot {
    armed: bool,
    elapsed: Duration,
}

/// Arm/disarm bookkeeping for the periodic timers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseTimers {
    slots: [TimerSlot; 4],
}

impl PhaseTimers {
    /// Start (or restart) a timer from zero.
    pub fn arm(&mut self, kind: TimerKind) {
        self.slots[kind.slot()] = TimerSlot {
            armed: true,
            elapsed: Duration::ZERO,
        };
    }

    pub fn disarm(&mut self, kind: TimerKind) {
        self.slots[kind.slot()] = TimerSlot::default();
    }

    pub fn disarm_all(&mut self) {
        self.slots = [TimerSlot::default(); 4];
    }

    #[must_use]
    pub const fn is_armed(&self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].armed
    }

    #[must_use]
    pub fn armed(&self) -> impl Iterator<Item = TimerKind> + '_ {
        TimerKind::ALL
            .into_iter()
            .filter(|kind| self.is_armed(*kind))
    }

    /// Time until the next armed timer falls due.
    #[must_use]
    pub fn until_next(&self) -> Option<Duration> {
        self.armed()
            .map(|kind| kind.period().saturating_sub(self.slots[kind.slot()].elapsed))
            .min()
    }

    /// Move every armed timer forward by `step`, returning the ones that
    /// came due. Callers step at most [`Self::until_next`] at a time so a
    /// timer never owes more than one tick.
    pub fn elapse(&mut self, step: Duration) -> FiredTimers {
        let mut fired = FiredTimers::new();
        for kind in TimerKind::ALL {
            let slot = &mut self.slots[kind.slot()];
            if !slot.armed {
                continue;
            }
            slot.elapsed += step;
            if slot.elapsed >= kind.period() {
                slot.elapsed -= kind.period();
                fired.push(kind);
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disarmed_timers_never_fire() {
        let mut timers = PhaseTimers::default();
        assert!(timers.until_next().is_none());
        assert!(timers.elapse(Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn next_due_tracks_shortest_armed_period() {
        let mut timers = PhaseTimers::default();
        timers.arm(TimerKind::Vitals);
        timers.arm(TimerKind::AggressionDecay);
        assert_eq!(timers.until_next(), Some(Duration::from_millis(500)));

        let fired = timers.elapse(Duration::from_millis(500));
        assert_eq!(fired.as_slice(), &[TimerKind::Vitals]);
        assert_eq!(timers.until_next(), Some(Duration::from_millis(500)));

        timers.arm(TimerKind::EscapeTick);
        assert_eq!(timers.until_next(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn coinciding_ticks_fire_in_declared_order() {
        let mut timers = PhaseTimers::default();
        for kind in TimerKind::ALL {
            timers.arm(kind);
        }
        let mut ticks = Vec::new();
        let mut clock = Duration::ZERO;
        while clock < Duration::from_millis(4_000) {
            let step = timers.until_next().unwrap();
            clock += step;
            ticks.extend(timers.elapse(step).into_iter().map(|k| (clock, k)));
        }
        let at_four_seconds: Vec<TimerKind> = ticks
            .iter()
            .filter(|(at, _)| *at == Duration::from_millis(4_000))
            .map(|(_, kind)| *kind)
            .collect();
        assert_eq!(
            at_four_seconds,
            vec![
                TimerKind::EscapeTick,
                TimerKind::Vitals,
                TimerKind::AggressionDecay
            ]
        );
        let vitals = ticks.iter().filter(|(_, k)| *k == TimerKind::Vitals).count();
        assert_eq!(vitals, 8);
    }

    #[test]
    fn rearming_restarts_from_zero() {
        let mut timers = PhaseTimers::default();
        timers.arm(TimerKind::EscapeTick);
        let _ = timers.elapse(Duration::from_millis(30));
        timers.arm(TimerKind::EscapeTick);
        assert_eq!(timers.until_next(), Some(Duration::from_millis(50)));
        timers.disarm_all();
        assert!(!timers.is_armed(TimerKind::EscapeTick));
    }
}
