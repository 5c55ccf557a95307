use std::path::PathBuf;

use humansize::{file_size_opts as options, FileSize};
use keyed_archive::header::{self, Format};
use keyed_archive::KeyedArchive;

use crate::error::{Error, Result};

pub fn run(path: PathBuf) -> Result<()> {
    let data = std::fs::read(&path).map_err(|source| Error::ReadFile {
        path: path.clone(),
        source,
    })?;

    let format = match header::describe(&data) {
        Some(format) => format,
        None => return Err(Error::UnknownFormat { path }),
    };

    let mut archive = KeyedArchive::new();
    archive
        .load_from_bytes(&data)
        .map_err(|source| Error::OpenArchive {
            path: path.clone(),
            source,
        })?;

    let size = data
        .len()
        .file_size(options::BINARY)
        .unwrap_or_else(|_| format!("{} B", data.len()));

    println!("Path:     {}", path.display());
    println!("Format:   {}", format);
    println!("Version:  {}", version(format));
    println!("Entries:  {}", archive.len());
    println!("Nested:   {}", nested_count(&archive));
    println!("Size:     {}", size);

    Ok(())
}

fn version(format: Format) -> u8 {
    match format {
        Format::StringMap => header::VERSION_STRING_MAP,
        Format::RegisterMap(_) => header::VERSION_REGISTER_MAP,
    }
}

/// Archives reachable below `archive`, through entries and variant vectors.
fn nested_count(archive: &KeyedArchive) -> usize {
    archive
        .iter()
        .map(|(_, value)| nested_in(value))
        .sum()
}

fn nested_in(value: &keyed_archive::Variant) -> usize {
    use keyed_archive::Variant;

    match value {
        Variant::KeyedArchive(inner) => 1 + nested_count(inner),
        Variant::VariantVector(items) => items.iter().map(nested_in).sum(),
        _ => 0,
    }
}
