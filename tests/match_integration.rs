//! End-to-end scenarios driven through the round orchestrator with
//! scripted unit programs.
//!
//! Initial placements spawn in order, so the first placement is unit 0.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::rc::Rc;

use brine::{
    DominationFactor, GameError, Loc, MapBuilder, Match, MatchState, Message, NullReplay,
    ScriptedControl, SharedRecording, Team, UnitKind,
};

fn basic_builder(round_limit: u32) -> MapBuilder {
    let mut builder = MapBuilder::new("integration", 12, 12, 7);
    builder.set_round_limit(round_limit);
    builder
}

#[test]
fn test_scenario_build_without_soup() {
    // Team A has 0 soup; building a 10-soup prospector must fail with
    // NotEnoughResource, spawn nothing, and leave the balance at 0.
    let mut builder = basic_builder(50);
    builder.set_starting_soup(0);
    builder.place(Team::A, UnitKind::Depot, 1, 5).unwrap();
    builder.place(Team::B, UnitKind::Depot, 10, 5).unwrap();
    let map = builder.build().unwrap();

    let observed: Rc<RefCell<Option<(bool, GameError)>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&observed);

    let mut control = ScriptedControl::new();
    control.set_script(
        0,
        Box::new(move |ctl| {
            if ctl.round() == 1 {
                let predicate = ctl.can_build(UnitKind::Prospector, Loc::new(2, 5));
                let err = ctl
                    .build(UnitKind::Prospector, Loc::new(2, 5))
                    .expect_err("build with an empty ledger must fail");
                *sink.borrow_mut() = Some((predicate, err));
            }
            Ok(())
        }),
    );

    let mut game = Match::new(&map, Box::new(control), Box::new(NullReplay)).unwrap();
    game.run_round();

    let (predicate, err) = observed.borrow_mut().take().unwrap();
    assert!(!predicate);
    assert_eq!(
        err,
        GameError::NotEnoughResource {
            needed: 10,
            available: 0
        }
    );
    assert_eq!(game.world().occupant(Loc::new(2, 5)), None);
    assert_eq!(game.world().team_soup(Team::A), 0);
    assert_eq!(game.world().team_count(Team::A), 1);
}

#[test]
fn test_scenario_elimination_same_round() {
    // Two depots at distance 1; wiping out team A decides the match for
    // team B within the same round's end-of-round processing.
    let mut builder = basic_builder(100);
    builder.place(Team::A, UnitKind::Depot, 5, 5).unwrap();
    builder.place(Team::B, UnitKind::Depot, 6, 5).unwrap();
    let map = builder.build().unwrap();

    let mut control = ScriptedControl::new();
    control.mark_terminated(0);

    let mut game = Match::new(&map, Box::new(control), Box::new(NullReplay)).unwrap();
    let state = game.run_round();

    assert_eq!(state, MatchState::Done);
    assert_eq!(game.world().winner(), Some(Team::B));
    assert_eq!(
        game.world().domination_factor(),
        Some(DominationFactor::Eliminated)
    );
    assert_eq!(game.world().round(), 1);
}

#[test]
fn test_scenario_paid_message_lifecycle() {
    // A cost-5 message on a balance of 5 empties the ledger, broadcasts
    // at the end of its own round, and becomes readable the round after.
    let mut builder = basic_builder(50);
    builder.set_starting_soup(5);
    builder.place(Team::A, UnitKind::Depot, 1, 5).unwrap();
    builder.place(Team::B, UnitKind::Depot, 10, 5).unwrap();
    let map = builder.build().unwrap();

    #[derive(Default)]
    struct Observed {
        balance_after_send: Option<u32>,
        same_round_query: Option<GameError>,
        current_round_query: Option<GameError>,
        negative_round_query: Option<GameError>,
        read_back: Option<Vec<Message>>,
    }

    let observed: Rc<RefCell<Observed>> = Rc::default();
    let sink = Rc::clone(&observed);

    let mut control = ScriptedControl::new();
    control.set_script(
        0,
        Box::new(move |ctl| {
            let mut obs = sink.borrow_mut();
            match ctl.round() {
                1 => {
                    ctl.send_message(vec![21, 22], 5)?;
                    obs.balance_after_send = Some(ctl.team_soup());
                    // Round 1 is not readable while it is still running.
                    obs.same_round_query = ctl.round_messages(1).err();
                }
                2 => {
                    obs.read_back = ctl.round_messages(1).ok();
                    obs.current_round_query = ctl.round_messages(2).err();
                    obs.negative_round_query = ctl.round_messages(-1).err();
                }
                _ => {}
            }
            Ok(())
        }),
    );

    let shared = SharedRecording::new();
    let mut game = Match::new(&map, Box::new(control), Box::new(shared.clone())).unwrap();
    game.run_round();
    game.run_round();

    let obs = observed.borrow();
    assert_eq!(obs.balance_after_send, Some(0));
    assert!(matches!(
        obs.same_round_query,
        Some(GameError::RoundOutOfRange {
            round: 1,
            current: 1
        })
    ));
    assert!(matches!(
        obs.current_round_query,
        Some(GameError::RoundOutOfRange { round: 2, .. })
    ));
    assert!(matches!(
        obs.negative_round_query,
        Some(GameError::RoundOutOfRange { round: -1, .. })
    ));

    let read_back = obs.read_back.as_ref().unwrap();
    assert_eq!(read_back.len(), 1);
    assert_eq!(read_back[0].cost, 5);
    assert_eq!(read_back[0].payload, vec![21, 22]);

    // The recording saw the message both enqueued and broadcast in
    // round 1's block.
    let recording = shared.snapshot();
    let round1 = recording.round_events(1).unwrap();
    assert!(round1
        .iter()
        .any(|e| matches!(e, brine::Event::MessageEnqueued { .. })));
    assert!(round1
        .iter()
        .any(|e| matches!(e, brine::Event::MessageBroadcast { .. })));
    assert_eq!(game.world().team_soup(Team::A), 0);
}

#[test]
fn test_scenario_carrier_moves_passenger() {
    // A courier picks up an adjacent prospector and flies off; the
    // passenger's recorded location follows the carrier in the same
    // round and it never re-enters grid occupancy while held.
    let mut builder = basic_builder(50);
    builder.place(Team::A, UnitKind::Courier, 5, 5).unwrap();
    builder.place(Team::A, UnitKind::Prospector, 6, 5).unwrap();
    builder.place(Team::B, UnitKind::Depot, 10, 5).unwrap();
    let map = builder.build().unwrap();

    let mut control = ScriptedControl::new();
    control.set_script(
        0,
        Box::new(|ctl| {
            match ctl.round() {
                1 => ctl.pick_up_unit(1)?,
                2 => ctl.move_to(Loc::new(5, 6))?,
                _ => {}
            }
            Ok(())
        }),
    );

    let mut game = Match::new(&map, Box::new(control), Box::new(NullReplay)).unwrap();
    game.run_round();

    // Held: no cell anywhere, location pinned to the carrier.
    assert_eq!(game.world().occupant(Loc::new(6, 5)), None);
    assert_eq!(game.world().unit(1).unwrap().loc, Loc::new(5, 5));

    game.run_round();
    assert_eq!(game.world().unit(0).unwrap().loc, Loc::new(5, 6));
    assert_eq!(game.world().unit(1).unwrap().loc, Loc::new(5, 6));
    assert_eq!(game.world().occupant(Loc::new(5, 6)), Some(0));
    assert_eq!(game.world().occupant(Loc::new(5, 5)), None);
    assert!(game.world().contains(1));
}

#[test]
fn test_mining_boundary_through_orchestrator() {
    // A cell holding exactly 1 soup ends at 0, never negative, and a
    // second attempt fails cleanly.
    let mut builder = basic_builder(50);
    builder.set_soup(2, 5, 1);
    builder.place(Team::A, UnitKind::Prospector, 1, 5).unwrap();
    builder.place(Team::B, UnitKind::Depot, 10, 5).unwrap();
    let map = builder.build().unwrap();

    let observed: Rc<RefCell<Vec<Result<(), GameError>>>> = Rc::default();
    let sink = Rc::clone(&observed);

    let mut control = ScriptedControl::new();
    control.set_script(
        0,
        Box::new(move |ctl| {
            // Mine cooldown is 5, so retry only once it clears.
            if ctl.is_ready() {
                sink.borrow_mut().push(ctl.mine(Loc::new(2, 5)));
            }
            Ok(())
        }),
    );

    let mut game = Match::new(&map, Box::new(control), Box::new(NullReplay)).unwrap();
    for _ in 0..8 {
        game.run_round();
    }

    let results = observed.borrow();
    assert!(results[0].is_ok());
    assert!(results[1..]
        .iter()
        .all(|r| matches!(r, Err(GameError::CantDoThat { .. }))));
    assert_eq!(game.world().terrain().soup(Loc::new(2, 5)), 0);
    assert_eq!(game.world().unit(0).unwrap().soup, 1);
}

#[test]
fn test_cooldowns_never_negative_across_rounds() {
    let mut builder = basic_builder(20);
    builder.place(Team::A, UnitKind::Prospector, 1, 5).unwrap();
    builder.place(Team::B, UnitKind::Depot, 10, 5).unwrap();
    let map = builder.build().unwrap();

    let violations: Rc<RefCell<u32>> = Rc::default();
    let sink = Rc::clone(&violations);

    let mut control = ScriptedControl::new();
    control.set_script(
        0,
        Box::new(move |ctl| {
            if ctl.cooldown()? < 0.0 {
                *sink.borrow_mut() += 1;
            }
            // Keep resetting the cooldown by wandering.
            if ctl.can_move(Loc::new(2, 5)) {
                ctl.move_to(Loc::new(2, 5))?;
            } else if ctl.can_move(Loc::new(1, 5)) {
                ctl.move_to(Loc::new(1, 5))?;
            }
            Ok(())
        }),
    );

    let mut game = Match::new(&map, Box::new(control), Box::new(NullReplay)).unwrap();
    game.run_to_completion();
    assert_eq!(*violations.borrow(), 0);
}

#[test]
fn test_done_idempotence_preserves_state() {
    let mut builder = basic_builder(4);
    builder.set_soup(3, 3, 25);
    builder.place(Team::A, UnitKind::Depot, 1, 5).unwrap();
    builder.place(Team::B, UnitKind::Depot, 10, 5).unwrap();
    let map = builder.build().unwrap();

    let mut game =
        Match::new(&map, Box::new(brine::IdleControl), Box::new(NullReplay)).unwrap();
    game.run_to_completion();
    assert_eq!(game.state(), MatchState::Done);

    let round = game.world().round();
    let winner = game.world().winner();
    let soup_a = game.world().team_soup(Team::A);
    let cell_soup = game.world().terrain().soup(Loc::new(3, 3));

    for _ in 0..3 {
        assert_eq!(game.run_round(), MatchState::Done);
    }
    assert_eq!(game.world().round(), round);
    assert_eq!(game.world().winner(), winner);
    assert_eq!(game.world().team_soup(Team::A), soup_a);
    assert_eq!(game.world().terrain().soup(Loc::new(3, 3)), cell_soup);
}

#[test]
fn test_registry_grid_bijection_each_round() {
    // Registry/occupancy stay a bijection over a busy match: every
    // non-held unit occupies exactly its own cell.
    let mut builder = basic_builder(30);
    for x in 0..6 {
        builder.set_soup(x, 3, 40);
    }
    builder.place(Team::A, UnitKind::Depot, 1, 5).unwrap();
    builder.place(Team::B, UnitKind::Depot, 10, 5).unwrap();
    builder.place(Team::A, UnitKind::Prospector, 2, 4).unwrap();
    builder.place(Team::B, UnitKind::Prospector, 9, 4).unwrap();
    let map = builder.build().unwrap();

    let mut control = ScriptedControl::new();
    for id in [2, 3] {
        control.set_script(
            id,
            Box::new(move |ctl| {
                let loc = ctl.loc()?;
                for (dx, dy) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
                    let to = Loc::new(loc.x + dx, loc.y + dy);
                    if ctl.can_mine(to) {
                        ctl.mine(to)?;
                        return Ok(());
                    }
                    if ctl.can_move(to) {
                        ctl.move_to(to)?;
                        return Ok(());
                    }
                }
                Ok(())
            }),
        );
    }

    let mut game = Match::new(&map, Box::new(control), Box::new(NullReplay)).unwrap();
    while game.run_round() != MatchState::Done {
        let world = game.world();
        for unit in world.units() {
            assert_eq!(
                world.occupant(unit.loc),
                Some(unit.id),
                "unit {} not bijective with its cell",
                unit.id
            );
        }
    }
}
