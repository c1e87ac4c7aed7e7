use clap::Parser;
use std::path::{Path, PathBuf};
use worldbridge::entity::id_registry::parse_uuid;
use worldbridge::{ChunkPos, ConvertError, ConverterOptions, Dimension, Edition};

/// Command-line arguments parser
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// World to convert: a Java world folder, a Bedrock world folder or a .mcworld file (required)
    #[arg(long)]
    pub input: PathBuf,

    /// Where the converted world is created. A Bedrock output ending in .mcworld is zipped (required)
    #[arg(long)]
    pub output: PathBuf,

    /// Edition of the input world (java/bedrock). Detected from the input when omitted
    #[arg(long, value_parser = parse_edition)]
    pub from: Option<Edition>,

    /// Edition to convert to (java/bedrock). Defaults to the other edition
    #[arg(long, value_parser = parse_edition)]
    pub to: Option<Edition>,

    /// JSON file with conversion options. Flags given here override it (optional)
    #[arg(long, env = "WORLDBRIDGE_OPTIONS")]
    pub options: Option<PathBuf>,

    /// Dimensions to convert, comma separated (overworld,nether,end). Default: all
    #[arg(long, value_delimiter = ',', value_parser = parse_dimension)]
    pub dimensions: Vec<Dimension>,

    /// Chunk to convert as X,Z. Repeat for several chunks. Default: all
    #[arg(long = "chunk", allow_hyphen_values = true, value_parser = parse_chunk)]
    pub chunks: Vec<ChunkPos>,

    /// Directory for temporary files (optional)
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// UUID of the player that becomes the local player (optional)
    #[arg(long, value_parser = parse_player_uuid)]
    pub player_uuid: Option<u128>,

    /// Last-played time to stamp, in seconds since the Unix epoch (optional)
    #[arg(long, allow_hyphen_values = true)]
    pub last_played: Option<i64>,

    /// Number of worker threads. Default: one per hardware thread
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Name of the converted world (optional)
    #[arg(long)]
    pub level_name: Option<String>,

    /// Enable debug logging (optional)
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Options file, then flags, then edition detection.
    pub fn to_options(&self) -> Result<ConverterOptions, ConvertError> {
        let mut options = match &self.options {
            Some(path) => ConverterOptions::from_json_file(path)?,
            None => ConverterOptions::default(),
        };

        let from_file = self.options.is_some();
        options.source = match self.from {
            Some(edition) => edition,
            None if from_file => options.source,
            None => detect_edition(&self.input),
        };
        options.target = match self.to {
            Some(edition) => edition,
            None if from_file => options.target,
            None => other_edition(options.source),
        };

        if !self.dimensions.is_empty() {
            options.dimensions = self.dimensions.iter().copied().collect();
        }
        if !self.chunks.is_empty() {
            options.chunks = self.chunks.iter().copied().collect();
        }
        if let Some(dir) = &self.temp_dir {
            options.temp_dir = Some(dir.clone());
        }
        if let Some(uuid) = self.player_uuid {
            options.local_player_uuid = Some(uuid);
        }
        if let Some(time) = self.last_played {
            options.last_played = Some(time);
        }
        if let Some(concurrency) = self.concurrency {
            options.concurrency = concurrency;
        }
        if let Some(name) = &self.level_name {
            options.level_name = Some(name.clone());
        }
        Ok(options)
    }
}

/// Bedrock when the input is a `.mcworld` file or has a `db` folder.
fn detect_edition(input: &Path) -> Edition {
    let archive = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mcworld"));
    if archive || input.join("db").is_dir() {
        Edition::Bedrock
    } else {
        Edition::Java
    }
}

fn other_edition(edition: Edition) -> Edition {
    match edition {
        Edition::Java => Edition::Bedrock,
        Edition::Bedrock => Edition::Java,
    }
}

/// Validates CLI arguments after parsing.
/// The input must exist, and an output folder must be new or empty.
pub fn validate_args(args: &Args) -> Result<(), String> {
    if !args.input.exists() {
        return Err(format!("Input does not exist: {}", args.input.display()));
    }
    if args.input == args.output {
        return Err("Input and output must be different paths.".to_string());
    }
    if args.output.is_file() && detect_edition(&args.output) != Edition::Bedrock {
        return Err(format!(
            "Output is an existing file: {}",
            args.output.display()
        ));
    }
    if args.output.is_dir() {
        let empty = std::fs::read_dir(&args.output)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !empty {
            return Err(format!(
                "Output directory is not empty: {}",
                args.output.display()
            ));
        }
    }
    Ok(())
}

fn parse_edition(arg: &str) -> Result<Edition, String> {
    match arg.to_ascii_lowercase().as_str() {
        "java" => Ok(Edition::Java),
        "bedrock" => Ok(Edition::Bedrock),
        _ => Err(format!("unknown edition {arg:?} (expected java or bedrock)")),
    }
}

fn parse_dimension(arg: &str) -> Result<Dimension, String> {
    Dimension::ALL
        .into_iter()
        .find(|d| d.to_string().eq_ignore_ascii_case(arg) || d.java_name() == arg)
        .ok_or_else(|| format!("unknown dimension {arg:?} (expected overworld, nether or end)"))
}

fn parse_chunk(arg: &str) -> Result<ChunkPos, String> {
    let (x, z) = arg
        .split_once(',')
        .ok_or_else(|| format!("expected X,Z but got {arg:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad chunk x: {e}"))?;
    let z = z.trim().parse().map_err(|e| format!("bad chunk z: {e}"))?;
    Ok(ChunkPos::new(x, z))
}

fn parse_player_uuid(arg: &str) -> Result<u128, String> {
    parse_uuid(arg).ok_or_else(|| format!("invalid UUID {arg:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_flags() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let input_path = input.path().to_str().unwrap();
        let output_path = output.path().to_str().unwrap();

        let cmd = [
            "worldbridge",
            "--input",
            input_path,
            "--output",
            output_path,
            "--dimensions",
            "overworld,end",
            "--chunk",
            "0,0",
            "--chunk",
            "-3,7",
            "--player-uuid",
            "01234567-89ab-cdef-0011-223344556677",
            "--concurrency",
            "2",
            "--debug",
        ];
        let args = Args::parse_from(cmd.iter());
        assert!(args.debug);
        assert!(validate_args(&args).is_ok());

        let options = args.to_options().unwrap();
        assert_eq!(options.source, Edition::Java);
        assert_eq!(options.target, Edition::Bedrock);
        assert_eq!(
            options.selected_dimensions(),
            vec![Dimension::Overworld, Dimension::End]
        );
        assert_eq!(
            options.chunks,
            BTreeSet::from([ChunkPos::new(0, 0), ChunkPos::new(-3, 7)])
        );
        assert_eq!(options.concurrency, 2);
        assert!(options.local_player_uuid.is_some());
    }

    #[test]
    fn test_bedrock_input_is_detected() {
        let input = tempfile::tempdir().unwrap();
        std::fs::create_dir(input.path().join("db")).unwrap();
        let cmd = [
            "worldbridge",
            "--input",
            input.path().to_str().unwrap(),
            "--output",
            "/tmp/worldbridge-never-created",
        ];
        let options = Args::parse_from(cmd.iter()).to_options().unwrap();
        assert_eq!(options.source, Edition::Bedrock);
        assert_eq!(options.target, Edition::Java);
    }

    #[test]
    fn test_flags_override_options_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("options.json");
        std::fs::write(
            &file,
            r#"{"source": "bedrock", "target": "bedrock", "concurrency": 8, "level_name": "From file"}"#,
        )
        .unwrap();
        let cmd = [
            "worldbridge",
            "--input",
            "in",
            "--output",
            "out",
            "--options",
            file.to_str().unwrap(),
            "--concurrency",
            "1",
        ];
        let options = Args::parse_from(cmd.iter()).to_options().unwrap();
        assert_eq!(options.source, Edition::Bedrock);
        assert_eq!(options.target, Edition::Bedrock);
        assert_eq!(options.concurrency, 1);
        assert_eq!(options.level_name.as_deref(), Some("From file"));
    }

    #[test]
    fn test_required_options() {
        let cmd = ["worldbridge"];
        assert!(Args::try_parse_from(cmd.iter()).is_err());

        let cmd = ["worldbridge", "--input", "in", "--output", "out", "--chunk", "1"];
        assert!(Args::try_parse_from(cmd.iter()).is_err());

        let cmd = ["worldbridge", "--input", "in", "--output", "out", "--from", "pocket"];
        assert!(Args::try_parse_from(cmd.iter()).is_err());
    }

    #[test]
    fn test_input_must_exist() {
        let cmd = [
            "worldbridge",
            "--input",
            "/nonexistent/world",
            "--output",
            "/tmp/out",
        ];
        let args = Args::parse_from(cmd.iter());
        let result = validate_args(&args);
        assert!(result.unwrap_err().contains("does not exist"));
    }

    #[test]
    fn test_output_must_be_empty() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(output.path().join("level.dat"), b"").unwrap();
        let cmd = [
            "worldbridge",
            "--input",
            input.path().to_str().unwrap(),
            "--output",
            output.path().to_str().unwrap(),
        ];
        let args = Args::parse_from(cmd.iter());
        assert!(validate_args(&args).unwrap_err().contains("not empty"));
    }
}
