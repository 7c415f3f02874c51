//! `genmap` command: generate a map file.

use std::path::Path;

use brine::generate_map;

use crate::cli::CliError;

/// Execute the `genmap` command.
pub(crate) fn execute(out: &Path, seed: u64, size: i32) -> Result<(), CliError> {
    let map = generate_map(seed, size, size)?;
    map.save(out)?;
    println!("wrote {} ({}x{}) to {}", map.name, map.width, map.height, out.display());
    Ok(())
}
