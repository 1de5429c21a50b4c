use badsector_game::{
    Action, ActionError, ActionOutcome, Confrontation, EscapeResolution, GamePhase, GameSession,
    InventoryFilter, ItemEffect, PartId, PartStatus, RunOutcome, SessionEvent, SlotClick,
    TimerKind, catalog,
};
use std::time::Duration;

fn playing(seed: u64) -> GameSession {
    let mut session = GameSession::new(seed);
    session.apply(Action::Connect).unwrap();
    session
}

/// Salvage with saturated aggression so the roll always wakes something.
fn force_encounter(session: &mut GameSession, sector: &str) {
    session.advance(Duration::from_secs(1));
    session
        .state_mut()
        .sectors
        .iter_mut()
        .find(|s| s.id == sector)
        .unwrap()
        .aggression = 100;
    let outcome = session.apply(Action::salvage(sector)).unwrap();
    let ActionOutcome::Salvaged(salvage) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert!(salvage.is_encounter());
    assert_eq!(session.state().active_encounter(), Some(sector));
}

fn kill(session: &mut GameSession) {
    session.state_mut().stats.hp = 0.0;
    assert!(session.fire_timer(TimerKind::AggressionDecay));
}

#[test]
fn phase_machine_round_trip() {
    let mut session = GameSession::new(11);
    assert_eq!(session.phase(), GamePhase::Menu);
    assert!(session.timers().armed().next().is_none());

    session.apply(Action::Connect).unwrap();
    assert_eq!(session.phase(), GamePhase::Playing);
    session.apply(Action::salvage("lab")).unwrap();

    kill(&mut session);
    assert_eq!(session.phase(), GamePhase::GameOver);
    assert!(session.timers().armed().next().is_none());

    let frozen = session.state().clone();
    for action in [
        Action::Connect,
        Action::salvage("lab"),
        Action::Attack,
        Action::EscapeClick,
        Action::UseItem { index: 0 },
        Action::SetInventoryFilter {
            filter: InventoryFilter::Weapon,
        },
    ] {
        let err = session.apply(action).unwrap_err();
        assert!(matches!(
            err,
            ActionError::WrongPhase {
                phase: GamePhase::GameOver,
                ..
            }
        ));
    }
    assert_eq!(session.advance(Duration::from_secs(30)), 0);
    assert_eq!(session.state(), &frozen);

    assert_eq!(
        session.apply(Action::ReturnToMenu),
        Ok(ActionOutcome::ReturnedToMenu)
    );
    assert_eq!(session.phase(), GamePhase::Menu);
    assert!((session.state().stats.hp - 100.0).abs() < f32::EPSILON);
    assert!(session.state().sectors.iter().all(|s| s.salvage_left == 100));

    session.apply(Action::Connect).unwrap();
    assert_eq!(session.epoch(), 3);

    let phases: Vec<(GamePhase, GamePhase)> = session
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            SessionEvent::PhaseChanged { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            (GamePhase::Menu, GamePhase::Playing),
            (GamePhase::Playing, GamePhase::GameOver),
            (GamePhase::GameOver, GamePhase::Menu),
            (GamePhase::Menu, GamePhase::Playing),
        ]
    );
}

#[test]
fn restart_leaves_game_over_with_fresh_state() {
    let mut session = playing(12);
    session.state_mut().stats.scrap = 999;
    kill(&mut session);
    assert_eq!(session.apply(Action::Restart), Ok(ActionOutcome::Restarted));
    assert_eq!(session.phase(), GamePhase::Playing);
    assert_eq!(session.state().stats.scrap, 45);
    assert!(session.timers().is_armed(TimerKind::Vitals));
}

#[test]
fn five_quiet_salvages_drain_a_sector() {
    let mut session = playing(13);
    let mut hauls = 0;
    let mut previous = 100;
    for _ in 0..500 {
        if hauls == 5 {
            break;
        }
        session.advance(Duration::from_secs(8));
        match session.apply(Action::salvage("main-office")) {
            Ok(ActionOutcome::Salvaged(outcome)) if outcome.is_encounter() => {
                session.apply(Action::Hide).unwrap();
            }
            Ok(ActionOutcome::Salvaged(_)) => {
                hauls += 1;
                let left = session.state().sector("main-office").unwrap().salvage_left;
                assert_eq!(left, previous - 20);
                previous = left;
            }
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(hauls, 5);
    assert_eq!(previous, 0);

    session.advance(Duration::from_secs(8));
    let before = session.state().clone();
    let err = session.apply(Action::salvage("main-office")).unwrap_err();
    assert_eq!(err, ActionError::SectorDepleted("main-office".into()));
    assert!(err.is_silent());
    assert_eq!(session.state(), &before);
}

#[test]
fn unknown_sector_is_a_silent_no_op() {
    let mut session = playing(14);
    let before = session.state().clone();
    let err = session.apply(Action::salvage("roof")).unwrap_err();
    assert!(err.is_silent());
    assert_eq!(session.state(), &before);
}

#[test]
fn encounter_blocks_salvage_until_answered() {
    let mut session = playing(15);
    force_encounter(&mut session, "lab");
    session.advance(Duration::from_secs(1));
    assert_eq!(
        session.apply(Action::salvage("main-office")),
        Err(ActionError::EncounterInProgress)
    );
    assert_eq!(
        session.apply(Action::Hide),
        Ok(ActionOutcome::Hidden {
            sector: "lab".into()
        })
    );
    assert_eq!(
        session.notices().latest().map(|n| n.message.as_str()),
        Some("Signal masked. Undetected.")
    );
    assert_eq!(session.apply(Action::Hide), Err(ActionError::NoPendingEncounter));
}

#[test]
fn server_room_monster_has_240_hp() {
    let mut session = playing(16);
    force_encounter(&mut session, "server-room");
    assert_eq!(
        session.apply(Action::Fight),
        Ok(ActionOutcome::CombatStarted { monster_hp: 240 })
    );
    assert!(session.state().in_combat());
}

#[test]
fn unarmed_hits_stay_between_five_and_sixteen() {
    for seed in 0..40 {
        let mut session = playing(seed);
        force_encounter(&mut session, "server-room");
        session.apply(Action::Fight).unwrap();
        while session.state().in_combat() && session.phase() == GamePhase::Playing {
            let before = session
                .state()
                .confrontation
                .as_ref()
                .and_then(Confrontation::monster_hp)
                .unwrap();
            let Ok(ActionOutcome::Attacked(hit)) = session.apply(Action::Attack) else {
                panic!("attack rejected");
            };
            assert!((5..=16).contains(&hit.damage_dealt));
            assert_eq!(hit.monster_hp, before.saturating_sub(hit.damage_dealt));
        }
    }
}

#[test]
fn purge_pays_out_and_queues_lore() {
    let mut session = playing(17);
    force_encounter(&mut session, "design-wing");
    session.apply(Action::Fight).unwrap();
    if let Some(Confrontation::Combat { monster_hp, .. }) = &mut session.state_mut().confrontation
    {
        *monster_hp = 5;
    }
    let Ok(ActionOutcome::Attacked(hit)) = session.apply(Action::Attack) else {
        panic!("attack rejected");
    };
    assert!(hit.purged());
    assert!(session.state().confrontation.is_none());
    assert_eq!(session.state().stats.scrap, 45 + 150);

    let requests = session.take_flavor_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].epoch, session.epoch());
    assert!(session.take_flavor_requests().is_empty());
    assert!(session.record_flavor(requests[0].answer("Mercury pools under the desk.")));
    let lore: Vec<_> = session.lore().iter().collect();
    assert_eq!(lore[0].title, "COMBAT LOG: PURGE");
    assert!(
        session
            .drain_events()
            .contains(&SessionEvent::MonsterPurged {
                sector: "design-wing".into()
            })
    );
}

#[test]
fn flee_keeps_damage_already_taken() {
    let mut session = playing(18);
    force_encounter(&mut session, "server-room");
    session.apply(Action::Fight).unwrap();
    session.apply(Action::Attack).unwrap();
    let hp = session.state().stats.hp;
    assert!(hp < 100.0);
    assert_eq!(
        session.apply(Action::Flee),
        Ok(ActionOutcome::Fled {
            sector: "server-room".into()
        })
    );
    assert!(session.state().confrontation.is_none());
    assert!((session.state().stats.hp - hp).abs() < f32::EPSILON);
}

#[test]
fn nine_clicks_escape_before_any_tick() {
    let mut session = playing(19);
    force_encounter(&mut session, "lab");
    assert_eq!(session.apply(Action::Run), Ok(ActionOutcome::Ran(RunOutcome::Started)));
    assert!(session.timers().is_armed(TimerKind::EscapeTick));
    for _ in 0..9 {
        session.apply(Action::EscapeClick).unwrap();
    }
    assert!(session.state().confrontation.is_none());
    assert!(!session.timers().is_armed(TimerKind::EscapeTick));
    assert!(session.drain_events().contains(&SessionEvent::EscapeResolved {
        resolution: EscapeResolution::Escaped
    }));
    assert_eq!(session.apply(Action::EscapeClick), Err(ActionError::NotEscaping));
}

#[test]
fn idle_escape_drains_into_feedback_damage() {
    let mut session = playing(20);
    force_encounter(&mut session, "lab");
    session.apply(Action::Run).unwrap();
    let stamina = session.state().stats.stamina;
    // 0.5 stamina per 50 ms tick.
    let ticks_needed = (stamina / 0.5).ceil() as u64;
    session.advance(Duration::from_millis(50 * ticks_needed));
    assert!(session.state().confrontation.is_none());
    assert!((session.state().stats.hp - 55.0).abs() < f32::EPSILON);
    assert!(!session.timers().is_armed(TimerKind::EscapeTick));
    assert!(session.drain_events().contains(&SessionEvent::EscapeResolved {
        resolution: EscapeResolution::Exhausted
    }));
    assert_eq!(
        session.notices().latest().map(|n| n.message.as_str()),
        Some("FEEDBACK LOOP: STAMINA EXHAUSTED.")
    );
}

#[test]
fn tired_runs_either_lag_or_escape() {
    let mut lagged = 0;
    for seed in 0..60 {
        let mut session = playing(seed);
        force_encounter(&mut session, "lab");
        session.state_mut().stats.stamina = 20.0;
        match session.apply(Action::Run).unwrap() {
            ActionOutcome::Ran(RunOutcome::Lagged { monster_hp }) => {
                lagged += 1;
                assert_eq!(monster_hp, 160);
                assert!(session.state().in_combat());
            }
            ActionOutcome::Ran(RunOutcome::Started) => assert!(session.state().escaping()),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert!(lagged > 10 && lagged < 50, "lagged {lagged}");
}

#[test]
fn weapons_stay_in_inventory_when_equipped() {
    let mut session = playing(21);
    let iron = catalog().item("soldering-iron").unwrap().clone();
    session.state_mut().stats.inventory.push(iron);
    session
        .apply(Action::SetInventoryFilter {
            filter: InventoryFilter::Weapon,
        })
        .unwrap();
    let view = session.filtered_inventory();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].index, 1);

    let outcome = session.apply(Action::UseItem {
        index: view[0].index,
    });
    assert!(matches!(
        outcome,
        Ok(ActionOutcome::ItemUsed(ItemEffect::Equipped { .. }))
    ));
    assert_eq!(session.state().stats.inventory.len(), 2);

    session.state_mut().stats.hp = 50.0;
    session.apply(Action::UseItem { index: 0 }).unwrap();
    assert!((session.state().stats.hp - 75.0).abs() < f32::EPSILON);
    assert_eq!(session.state().stats.inventory.len(), 1);
    assert_eq!(session.state().stats.inventory[0].id, "soldering-iron");
}

#[test]
fn assembly_flow_updates_integrity() {
    let mut session = playing(22);
    for id in [PartId::Motherboard, PartId::Gpu] {
        let part = session.state_mut().part_mut(id).unwrap();
        part.status = PartStatus::Found;
    }
    assert_eq!(session.found_parts(), vec![PartId::Motherboard, PartId::Gpu]);

    assert_eq!(
        session.apply(Action::InstallPart {
            part: PartId::Motherboard
        }),
        Ok(ActionOutcome::SlotClicked(SlotClick::NeedsSelection {
            part: PartId::Motherboard
        }))
    );
    assert_eq!(
        session.notices().latest().map(|n| n.message.as_str()),
        Some("SELECT MOTHERBOARD FROM HOLDING BAY")
    );

    for id in [PartId::Motherboard, PartId::Gpu] {
        session.apply(Action::SelectPart { part: id }).unwrap();
        session.apply(Action::InstallPart { part: id }).unwrap();
    }
    assert_eq!(session.system_integrity(), 50);
    let logic = session.diagnostics()[0];
    assert_eq!((logic.id, logic.value), ("logic", 45));
    assert_eq!(session.diagnostics()[2].value, 40);
    assert!(session.found_parts().is_empty());
    assert_eq!(
        session.apply(Action::InstallPart { part: PartId::Gpu }),
        Err(ActionError::PartAlreadyInstalled(PartId::Gpu))
    );
}

#[test]
fn timers_interleave_deterministically() {
    let mut session = playing(23);
    session.state_mut().stats.stamina = 10.0;
    session.state_mut().sectors[0].aggression = 10;
    assert_eq!(session.active_tip(), catalog().tips.first().map(String::as_str));

    // 10 s: 20 vitals ticks, 2 decay ticks, 1 tip rotation.
    assert_eq!(session.advance(Duration::from_secs(10)), 23);
    assert!((session.state().stats.stamina - 60.0).abs() < f32::EPSILON);
    assert_eq!(session.state().sectors[0].aggression, 8);
    assert_eq!(session.tip_index(), 1);
    assert_eq!(session.clock(), Duration::from_secs(10));
}

#[test]
fn notices_expire_with_session_time() {
    let mut session = playing(24);
    session.state_mut().stats.stamina = 0.0;
    let _ = session.apply(Action::salvage("lab"));
    assert_eq!(session.notices().live().len(), 1);
    session.advance(Duration::from_millis(4_999));
    assert_eq!(session.notices().live().len(), 1);
    session.advance(Duration::from_millis(1));
    assert!(session.notices().live().is_empty());
}

#[test]
fn same_seed_same_game() {
    let script = |seed: u64| {
        let mut session = playing(seed);
        for step in 0..40 {
            session.advance(Duration::from_millis(900));
            let action = match &session.state().confrontation {
                Some(Confrontation::Pending { .. }) if step % 2 == 0 => Action::Fight,
                Some(Confrontation::Pending { .. }) => Action::Run,
                Some(Confrontation::Combat { .. }) => Action::Attack,
                Some(Confrontation::Escape { .. }) => Action::EscapeClick,
                None => Action::salvage(["lab", "design-wing"][step % 2]),
            };
            let _ = session.apply(action);
            if session.phase() == GamePhase::GameOver {
                break;
            }
        }
        serde_json::to_string(&session.snapshot()).unwrap()
    };
    assert_eq!(script(77), script(77));
    assert_ne!(script(77), script(78));
}
