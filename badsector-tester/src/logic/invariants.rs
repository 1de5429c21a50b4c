use anyhow::{Result, ensure};
use badsector_game::{AGGRESSION_CAP, GamePhase, GameSession, PartStatus, TimerKind};

/// Step-to-step checks that must hold for every session, whatever the
/// player does. Monotonicity is tracked per epoch since a reset starts a
/// fresh world.
#[derive(Debug, Clone, Default)]
pub struct InvariantTracker {
    epoch: Option<u64>,
    salvage: Vec<u8>,
    parts: Vec<PartStatus>,
}

impl InvariantTracker {
    /// Check `session` against the previous observation and remember it.
    ///
    /// # Errors
    ///
    /// Describes the first invariant that does not hold.
    pub fn check(&mut self, session: &GameSession) -> Result<()> {
        let state = session.state();
        let stats = &state.stats;

        ensure!(
            (0.0..=stats.max_hp).contains(&stats.hp),
            "hp {} outside [0, {}]",
            stats.hp,
            stats.max_hp
        );
        ensure!(
            (0.0..=stats.max_stamina).contains(&stats.stamina),
            "stamina {} outside [0, {}]",
            stats.stamina,
            stats.max_stamina
        );
        if session.phase() != GamePhase::Menu {
            ensure!(
                (session.phase() == GamePhase::GameOver) == stats.is_dead(),
                "phase {} with hp {}",
                session.phase(),
                stats.hp
            );
        }
        if session.phase() == GamePhase::Playing {
            ensure!(
                session.timers().is_armed(TimerKind::EscapeTick) == state.escaping(),
                "escape tick armed without a running escape (or the reverse)"
            );
        }

        for sector in &state.sectors {
            ensure!(
                sector.salvage_left <= 100,
                "sector {} salvage {} above 100",
                sector.id,
                sector.salvage_left
            );
            ensure!(
                sector.aggression <= AGGRESSION_CAP,
                "sector {} aggression {} above cap",
                sector.id,
                sector.aggression
            );
        }

        let salvage: Vec<u8> = state.sectors.iter().map(|s| s.salvage_left).collect();
        let parts: Vec<PartStatus> = state.parts.iter().map(|p| p.status).collect();
        if self.epoch == Some(session.epoch()) {
            for (sector, (before, now)) in state
                .sectors
                .iter()
                .zip(self.salvage.iter().zip(&salvage))
            {
                ensure!(
                    now <= before,
                    "sector {} salvage rose from {before} to {now}",
                    sector.id
                );
            }
            for (part, (before, now)) in state.parts.iter().zip(self.parts.iter().zip(&parts)) {
                ensure!(
                    now >= before,
                    "part {} went back from {before:?} to {now:?}",
                    part.id()
                );
            }
        }

        self.epoch = Some(session.epoch());
        self.salvage = salvage;
        self.parts = parts;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use badsector_game::Action;

    #[test]
    fn accepts_fresh_and_reset_sessions() {
        let mut tracker = InvariantTracker::default();
        let mut session = GameSession::new(1);
        tracker.check(&session).unwrap();
        session.apply(Action::Connect).unwrap();
        session.state_mut().sectors[0].salvage_left = 40;
        tracker.check(&session).unwrap();
        session.state_mut().stats.hp = 0.0;
        session.fire_timer(TimerKind::Vitals);
        tracker.check(&session).unwrap();
        session.apply(Action::Restart).unwrap();
        tracker.check(&session).unwrap();
    }

    #[test]
    fn flags_salvage_growing_back() {
        let mut tracker = InvariantTracker::default();
        let mut session = GameSession::new(2);
        session.apply(Action::Connect).unwrap();
        session.state_mut().sectors[1].salvage_left = 60;
        tracker.check(&session).unwrap();
        session.state_mut().sectors[1].salvage_left = 80;
        let err = tracker.check(&session).unwrap_err();
        assert!(err.to_string().contains("salvage rose"));
    }

    #[test]
    fn flags_aggression_past_the_core_cap() {
        let mut tracker = InvariantTracker::default();
        let mut session = GameSession::new(4);
        session.apply(Action::Connect).unwrap();
        session.state_mut().sectors[0].aggression = AGGRESSION_CAP;
        tracker.check(&session).unwrap();
        session.state_mut().sectors[0].aggression = AGGRESSION_CAP + 1;
        assert!(tracker.check(&session).is_err());
    }

    #[test]
    fn flags_parts_going_backwards() {
        let mut tracker = InvariantTracker::default();
        let mut session = GameSession::new(3);
        session.apply(Action::Connect).unwrap();
        session.state_mut().parts[0].status = PartStatus::Installed;
        tracker.check(&session).unwrap();
        session.state_mut().parts[0].status = PartStatus::Found;
        assert!(tracker.check(&session).is_err());
    }

    #[test]
    fn flags_a_dead_player_still_playing() {
        let mut tracker = InvariantTracker::default();
        let mut session = GameSession::new(4);
        session.apply(Action::Connect).unwrap();
        session.state_mut().stats.hp = 0.0;
        assert!(tracker.check(&session).is_err());
    }
}
