//! `replay` command: summarize a recorded match.

use std::collections::BTreeMap;
use std::path::Path;

use brine::{Event, Recording};

use crate::cli::CliError;

/// Execute the `replay` command.
pub(crate) fn execute(path: &Path) -> Result<(), CliError> {
    let recording = Recording::load(path)?;

    match &recording.map {
        Some(map) => println!("map:    {} ({}x{})", map.name, map.width, map.height),
        None => println!("map:    <missing header>"),
    }
    println!("rounds: {}", recording.rounds.len().saturating_sub(1));
    match recording.winner {
        Some(team) => println!("winner: {team:?} at round {}", recording.final_round),
        None => println!("winner: none"),
    }

    let mut totals: BTreeMap<&'static str, usize> = BTreeMap::new();
    for round in &recording.rounds {
        for event in round {
            *totals.entry(event_label(event)).or_insert(0) += 1;
        }
    }
    println!("events:");
    for (label, count) in totals {
        println!("  {label:<12} {count}");
    }
    Ok(())
}

fn event_label(event: &Event) -> &'static str {
    match event {
        Event::Spawned { .. } => "spawned",
        Event::Moved { .. } => "moved",
        Event::Action { .. } => "action",
        Event::Died { .. } => "died",
        Event::PollutionChanged { .. } => "pollution",
        Event::TeamSoup { .. } => "team-soup",
        Event::MessageEnqueued { .. } => "enqueued",
        Event::MessageBroadcast { .. } => "broadcast",
        Event::IndicatorDot { .. } | Event::IndicatorLine { .. } => "indicator",
    }
}
