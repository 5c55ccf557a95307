use std::path::PathBuf;

use crate::error::Result;

pub fn run(path: PathBuf) -> Result<()> {
    let archive = super::open(&path)?;
    print!("{}", archive.dump());
    Ok(())
}
