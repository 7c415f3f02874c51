//! `run` command: a headless match driven by the built-in demo policy.

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use brine::{
    generate_map, ControlError, ControlProvider, InitialMap, Loc, Match, MatchState,
    SharedRecording, Team, UnitController, UnitKind,
};

use crate::cli::CliError;

/// Neighbor offsets, clockwise from east.
const DIRS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Built-in demo policy: depots build prospectors and refine, prospectors
/// mine and haul soup home, everything else idles.
#[derive(Debug, Clone, Copy, Default)]
struct DemoControl;

impl DemoControl {
    fn run_depot(ctl: &mut UnitController<'_>) -> Result<(), ControlError> {
        let carried = ctl.soup_carried()?;
        if carried > 0 {
            let amount = carried.min(ctl.kind().spec().refine_limit);
            if ctl.can_refine(amount) {
                ctl.refine(amount)?;
                return Ok(());
            }
        }
        let loc = ctl.loc()?;
        for (dx, dy) in DIRS {
            let to = Loc::new(loc.x + dx, loc.y + dy);
            if ctl.can_build(UnitKind::Prospector, to) {
                ctl.build(UnitKind::Prospector, to)?;
                return Ok(());
            }
        }
        Ok(())
    }

    fn run_prospector(ctl: &mut UnitController<'_>) -> Result<(), ControlError> {
        let loc = ctl.loc()?;
        let carried = ctl.soup_carried()?;

        // Hand a full hold to any adjacent refiner.
        if carried > 0 {
            for (dx, dy) in DIRS {
                let to = Loc::new(loc.x + dx, loc.y + dy);
                if ctl.can_give(to, carried) {
                    ctl.give(to, carried)?;
                    return Ok(());
                }
            }
        }

        for (dx, dy) in DIRS {
            let to = Loc::new(loc.x + dx, loc.y + dy);
            if ctl.can_mine(to) {
                ctl.mine(to)?;
                return Ok(());
            }
        }

        // Wander deterministically.
        let start = (ctl.round() as usize + ctl.id() as usize) % DIRS.len();
        for i in 0..DIRS.len() {
            let (dx, dy) = DIRS[(start + i) % DIRS.len()];
            let to = Loc::new(loc.x + dx, loc.y + dy);
            if ctl.can_move(to) {
                ctl.move_to(to)?;
                return Ok(());
            }
        }
        Ok(())
    }
}

impl ControlProvider for DemoControl {
    fn run_unit(&mut self, ctl: &mut UnitController<'_>) -> Result<(), ControlError> {
        if !ctl.is_ready() {
            return Ok(());
        }
        match ctl.kind() {
            UnitKind::Depot => Self::run_depot(ctl),
            UnitKind::Prospector => Self::run_prospector(ctl),
            _ => Ok(()),
        }
    }
}

/// Execute the `run` command.
pub(crate) fn execute(
    map: Option<PathBuf>,
    seed: u64,
    size: i32,
    rounds: Option<u32>,
    save: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let mut map = match map {
        Some(path) => InitialMap::load(&path)?,
        None => generate_map(seed, size, size)?,
    };
    if let Some(rounds) = rounds {
        map.round_limit = rounds;
    }

    let shared = SharedRecording::new();
    let mut game = Match::new(&map, Box::new(DemoControl), Box::new(shared.clone()))?;

    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(u64::from(map.round_limit));
        bar.set_style(
            ProgressStyle::with_template("{bar:40} round {pos}/{len}")
                .map_err(|e| CliError::new(e.to_string()))?,
        );
        bar
    };

    while game.run_round() != MatchState::Done {
        bar.inc(1);
    }
    bar.finish_and_clear();

    let world = game.world();
    println!("map:    {}", map.name);
    println!("rounds: {}", world.round());
    match world.winner() {
        Some(team) => println!("winner: {team:?} ({:?})", world.domination_factor()),
        None => println!("winner: none (match abandoned)"),
    }
    for team in [Team::A, Team::B] {
        println!(
            "team {team:?}: {} soup, {} units",
            world.team_soup(team),
            world.team_count(team)
        );
    }

    if let Some(path) = save {
        shared.snapshot().save(&path)?;
        println!("replay saved to {}", path.display());
    }
    Ok(())
}
