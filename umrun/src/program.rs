use anyhow::{Context, Result};
use log::*;
use std::{fs::File, io::Read, path::Path};

/// Read a program image off the disk and split it into words.
pub fn load(path: &Path) -> Result<Vec<u32>> {
    info!("Attempting to open path: '{}'", path.display());
    let mut f = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut bytes = Vec::new();
    f.read_to_end(&mut bytes)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let program = um32::parse_image(&bytes)
        .with_context(|| format!("{} isn't a program image", path.display()))?;
    info!("Program is {} words long", program.len());
    Ok(program)
}
