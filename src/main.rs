//! Songload CLI - Import legacy Praisenter 2 song XML
//!
//! # Main Commands
//!
//! ```bash
//! songload import songs.xml        # Import songs into the library
//! songload list                    # Show stored songs
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! songload detect songs.xml        # Check whether a file is the legacy format
//! songload parse songs.xml         # Convert to JSON without persisting
//! ```

use clap::{Parser, Subcommand};
use songload::{detect_path, parse_path, Detection, FileStore, Praisenter2Format};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "songload")]
#[command(about = "Import legacy Praisenter 2 song XML into the song library", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import all songs from a legacy XML file
    Import {
        /// Input XML file
        input: PathBuf,

        /// Song library directory (default: .songload/songs)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },

    /// Check whether a file is the legacy song format
    Detect {
        /// Input file
        input: PathBuf,
    },

    /// Convert a legacy XML file to JSON without persisting
    Parse {
        /// Input XML file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List stored songs
    List {
        /// Song library directory (default: .songload/songs)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import { input, store } => cmd_import(&input, store.as_deref()),
        Commands::Detect { input } => cmd_detect(&input),
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),
        Commands::List { store } => cmd_list(store.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn open_store(dir: Option<&Path>) -> FileStore {
    match dir {
        Some(d) => FileStore::with_dir(d),
        None => FileStore::new(),
    }
}

fn cmd_import(input: &Path, store_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Importing: {}", input.display());

    let store = open_store(store_dir);
    let outcome = Praisenter2Format.import(&store, input)?;

    if outcome.is_empty() {
        eprintln!("   Not a Praisenter 2 song file, nothing imported.");
        return Ok(());
    }

    eprintln!("   ✅ Created: {}", outcome.created.len());
    eprintln!("   🔄 Updated: {}", outcome.updated.len());

    if !outcome.warnings.is_empty() {
        eprintln!("   ⚠️  Warnings: {}", outcome.warnings.len());
        for w in outcome.warnings.iter().take(5) {
            eprintln!("      - {}", w);
        }
    }

    if !outcome.errors.is_empty() {
        eprintln!("   ❌ Failed: {}", outcome.errors.len());
        for e in &outcome.errors {
            eprintln!("      - {}: {}", e.song_name, e.error);
        }
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_detect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match detect_path(input) {
        Detection::Matched => {
            eprintln!("✅ {} is a Praisenter 2 song file", input.display());
            Ok(())
        }
        Detection::NotMatched => {
            eprintln!("❌ {} is not a Praisenter 2 song file", input.display());
            std::process::exit(1);
        }
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    if detect_path(input) == Detection::NotMatched {
        return Err(format!("{} is not a Praisenter 2 song file", input.display()).into());
    }

    let results = parse_path(input)?;
    eprintln!("✅ Parsed {} songs", results.len());

    for result in &results {
        for w in &result.warnings {
            eprintln!("   ⚠️  {}: {}", result.song.name, w);
        }
    }

    let songs: Vec<_> = results.into_iter().map(|r| r.song).collect();
    let json = serde_json::to_string_pretty(&songs)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_list(store_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(store_dir);
    let songs = store.list();

    if songs.is_empty() {
        eprintln!("📋 No songs stored yet.");
        eprintln!("   Use 'songload import <file>' to add some.");
        return Ok(());
    }

    eprintln!("📋 Stored songs ({}):\n", songs.len());
    for stored in songs {
        let sections: usize = stored.song.lyrics.iter().map(|l| l.sections.len()).sum();
        println!("  🎵 {} ({})", stored.song.name, stored.song.id);
        println!("     Sections: {}", sections);
        if let Some(ref notes) = stored.song.notes {
            println!("     Notes: {}", notes.lines().next().unwrap_or(""));
        }
        println!("     Saved: {}", stored.saved_at);
        println!();
    }

    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
