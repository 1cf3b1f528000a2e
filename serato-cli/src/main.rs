//! Command line access to a Serato library folder

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use walkdir::WalkDir;

use serato_core::config::default_root;
use serato_core::crate_file::{parse_column_names, parse_header, parse_track_paths};
use serato_core::{Crate, HotCue, Library, LibraryConfig, Track};

#[derive(Parser)]
#[command(name = "serato")]
#[command(about = "Read and write Serato crates and hot cues")]
#[command(version)]
struct Cli {
    /// Serato library root (defaults to ~/Music/_Serato_)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the crate tree
    Crates,

    /// Show the contents of one crate file
    Inspect {
        file: PathBuf,
    },

    /// List hot cues and saved loops of a track
    Cues {
        track: PathBuf,
    },

    /// Add (or replace) a hot cue or saved loop
    AddCue {
        track: PathBuf,

        #[arg(short, long)]
        index: u8,

        /// Position in milliseconds
        #[arg(short, long)]
        start: u32,

        /// Loop end in milliseconds
        #[arg(short, long)]
        end: Option<u32>,

        #[arg(short, long, default_value = "")]
        name: String,

        /// 6-digit hex RGB
        #[arg(short, long)]
        color: Option<String>,

        /// Store as a saved loop (requires --end)
        #[arg(long = "loop")]
        is_loop: bool,

        #[arg(long)]
        locked: bool,
    },

    /// Put every audio file under a directory into a (nested) crate
    Import {
        /// Music directory to scan
        dir: PathBuf,

        /// Crate names, outermost first
        #[arg(required = true)]
        names: Vec<String>,

        /// Replace crate files that already exist
        #[arg(long)]
        overwrite: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = LibraryConfig::new(cli.root.clone().unwrap_or_else(default_root));
    if let Commands::Import { overwrite, .. } = &cli.command {
        config.overwrite = *overwrite;
    }
    debug!("Library root: {:?}", config.root);
    let library = Library::new(config);

    match cli.command {
        Commands::Crates => list_crates(&library, cli.json),
        Commands::Inspect { file } => inspect(&file, cli.json),
        Commands::Cues { track } => list_cues(&library, &track, cli.json),
        Commands::AddCue {
            track,
            index,
            start,
            end,
            name,
            color,
            is_loop,
            locked,
        } => {
            let mut cue = if is_loop {
                let Some(end) = end else {
                    bail!("--loop requires --end");
                };
                HotCue::saved_loop(index, start, end, name).with_locked(locked)
            } else {
                HotCue::cue(index, start, name)
            };
            if let Some(color) = color {
                cue = cue.with_color(color.to_uppercase());
            }
            add_cue(&library, &track, cue)
        }
        Commands::Import { dir, names, .. } => import(&library, &dir, &names),
    }
}

fn list_crates(library: &Library, json: bool) -> anyhow::Result<()> {
    let crates = library.load_crates()?;

    if json {
        let roots: Vec<&Crate> = crates.values().collect();
        println!("{}", serde_json::to_string_pretty(&roots)?);
        return Ok(());
    }

    if crates.is_empty() {
        println!("No crates in {:?}", library.config().subcrates_dir());
    }
    for root in crates.values() {
        print_crate(root, 0);
    }
    Ok(())
}

fn print_crate(node: &Crate, depth: usize) {
    println!("{}{} ({} tracks)", "  ".repeat(depth), node.name(), node.tracks().len());
    for child in node.children() {
        print_crate(child, depth + 1);
    }
}

fn inspect(file: &Path, json: bool) -> anyhow::Result<()> {
    let data = fs::read(file).with_context(|| format!("Cannot read {:?}", file))?;
    let version = parse_header(&data)?;
    let columns = parse_column_names(&data);
    let tracks = parse_track_paths(&data);

    if json {
        let value = serde_json::json!({
            "version": version,
            "columns": columns,
            "tracks": tracks,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Version: {}", version);
    println!("Columns: {}", columns.join(", "));
    println!("Tracks ({}):", tracks.len());
    for path in &tracks {
        println!("  {}", path);
    }
    Ok(())
}

fn list_cues(library: &Library, track: &Path, json: bool) -> anyhow::Result<()> {
    let cues = library.read_hot_cues(track)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cues)?);
        return Ok(());
    }

    if cues.is_empty() {
        println!("No hot cues");
    }
    for cue in &cues {
        println!("{:<4} {}", cue.kind.tag(), cue);
    }
    Ok(())
}

fn add_cue(library: &Library, path: &Path, cue: HotCue) -> anyhow::Result<()> {
    let mut track = Track::from_path(path)?;
    library.load_hot_cues(&mut track)?;

    // Same slot replaces the old entry
    let kept: Vec<HotCue> = track
        .hot_cues()
        .iter()
        .chain(track.loops())
        .filter(|c| c.kind != cue.kind || c.index != cue.index)
        .cloned()
        .collect();
    track.set_hot_cues(kept)?;
    track.add_hot_cue(cue.clone())?;

    library.write_hot_cues(&track)?;
    info!("Added {} {} to {:?}", cue.kind.tag(), cue.index, track.path());
    Ok(())
}

fn import(library: &Library, dir: &Path, names: &[String]) -> anyhow::Result<()> {
    let tracks = collect_tracks(dir)?;
    info!("Found {} audio files in {:?}", tracks.len(), dir);

    let Some(root) = Crate::from_file_chain(names, tracks) else {
        bail!("No crate name given");
    };

    let written = library.save_crate(&root)?;
    if written.is_empty() {
        warn!("Nothing written; pass --overwrite to replace existing crates");
    }
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

/// Audio files below `dir`, sorted by path
fn collect_tracks(dir: &Path) -> anyhow::Result<Vec<Track>> {
    if !dir.is_dir() {
        bail!("Not a directory: {:?}", dir);
    }

    let mut tracks = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && Track::is_audio_file(entry.path()) {
            tracks.push(Track::from_path(entry.path())?);
        }
    }
    Ok(tracks)
}
