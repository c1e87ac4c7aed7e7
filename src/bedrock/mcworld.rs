//! `.mcworld` archives: a zipped Bedrock world folder.

use crate::coords::Edition;
use crate::error::ConvertError;
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub fn is_mcworld(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("mcworld"))
}

#[derive(Serialize)]
struct ConversionMetadata<'a> {
    format: &'static str,
    converter: &'static str,
    version: &'static str,
    source: Edition,
    level_name: &'a str,
    chunk_count: u64,
}

/// Writes `metadata.json` describing the conversion next to `level.dat`.
pub fn write_metadata(
    world_dir: &Path,
    source: Edition,
    level_name: &str,
    chunk_count: u64,
) -> Result<(), ConvertError> {
    let metadata = ConversionMetadata {
        format: "bedrock-mcworld",
        converter: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        source,
        level_name,
        chunk_count,
    };
    let bytes = serde_json::to_vec_pretty(&metadata)?;
    let mut file = File::create(world_dir.join("metadata.json"))?;
    file.write_all(&bytes)?;
    Ok(())
}

/// Zips `world_dir` into `archive`.
pub fn package(world_dir: &Path, archive: &Path) -> Result<(), ConvertError> {
    if archive.exists() {
        fs::remove_file(archive)?;
    }
    let file = File::create(archive)?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for file_name in ["levelname.txt", "metadata.json", "level.dat"] {
        let path = world_dir.join(file_name);
        if path.exists() {
            writer.start_file(file_name, options)?;
            writer.write_all(&fs::read(&path)?)?;
        }
    }

    let db_path = world_dir.join("db");
    if db_path.is_dir() {
        add_directory_to_zip(&mut writer, &db_path, "db", options)?;
    }

    writer.finish()?;
    info!("Packaged {}", archive.display());
    Ok(())
}

fn add_directory_to_zip(
    writer: &mut ZipWriter<File>,
    dir_path: &Path,
    zip_prefix: &str,
    options: FileOptions,
) -> Result<(), ConvertError> {
    writer.add_directory(format!("{zip_prefix}/"), options)?;

    let mut entries: Vec<_> = fs::read_dir(dir_path)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let zip_path = format!("{zip_prefix}/{name}");
        if path.is_file() {
            writer.start_file(&zip_path, options)?;
            writer.write_all(&fs::read(&path)?)?;
        } else if path.is_dir() {
            add_directory_to_zip(writer, &path, &zip_path, options)?;
        }
    }
    Ok(())
}

/// Unpacks an `.mcworld` archive into `dir`.
pub fn extract(archive: &Path, dir: &Path) -> Result<(), ConvertError> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    zip.extract(dir)?;
    if !dir.join("db").is_dir() {
        return Err(ConvertError::metadata(format!(
            "{} holds no db folder",
            archive.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_then_extract() {
        let dir = tempfile::tempdir().unwrap();
        let world = dir.path().join("world");
        fs::create_dir_all(world.join("db")).unwrap();
        fs::write(world.join("db").join("CURRENT"), b"MANIFEST-000001\n").unwrap();
        fs::write(world.join("levelname.txt"), "Test").unwrap();
        write_metadata(&world, Edition::Java, "Test", 12).unwrap();

        let archive = dir.path().join("world.mcworld");
        package(&world, &archive).unwrap();
        assert!(is_mcworld(&archive));

        let mut zip = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let names: Vec<String> = zip.file_names().map(str::to_string).collect();
        assert!(names.contains(&"db/CURRENT".to_string()));
        let metadata: serde_json::Value =
            serde_json::from_reader(zip.by_name("metadata.json").unwrap()).unwrap();
        assert_eq!(metadata["format"], "bedrock-mcworld");
        assert_eq!(metadata["source"], "java");
        assert_eq!(metadata["chunk_count"], 12);

        let out = dir.path().join("out");
        extract(&archive, &out).unwrap();
        assert_eq!(fs::read_to_string(out.join("levelname.txt")).unwrap(), "Test");
        assert!(out.join("db").join("CURRENT").is_file());
    }
}
