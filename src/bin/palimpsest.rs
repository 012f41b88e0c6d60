//! Palimpsest CLI: inspect and maintain a local chapter/translation store.
//!
//! Usage:
//!   palimpsest chapter list [--db path]
//!   palimpsest resolve <stable-id> [--db path]
//!   palimpsest versions --url <url> [--db path]
//!   palimpsest export [--out file] [--db path]

use clap::{Parser, Subcommand};
use palimpsest::{ChapterRef, Library};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "palimpsest",
    version,
    about = "Versioned local store for chapters and their translation history"
)]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage chapters
    Chapter {
        #[command(subcommand)]
        action: ChapterAction,
    },
    /// Resolve a stable id to its canonical URL
    Resolve {
        /// Stable id to resolve
        stable_id: String,
    },
    /// List translation versions for a chapter
    Versions {
        /// Chapter URL
        #[arg(long, conflicts_with = "stable_id")]
        url: Option<String>,
        /// Chapter stable id
        #[arg(long)]
        stable_id: Option<String>,
    },
    /// Make a version the active one
    Activate {
        /// Chapter URL
        #[arg(long, conflicts_with = "stable_id")]
        url: Option<String>,
        /// Chapter stable id
        #[arg(long)]
        stable_id: Option<String>,
        /// Version number to activate
        version: u32,
    },
    /// Export all chapters, mappings, and versions as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ChapterAction {
    /// List all chapters
    List,
    /// Show one chapter by URL
    Show {
        /// Chapter URL
        url: String,
    },
    /// Set a chapter's number by stable id
    SetNumber {
        /// Chapter stable id
        stable_id: String,
        /// New chapter number
        number: u32,
    },
}

/// Get the default database path (~/.local/share/palimpsest/palimpsest.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let dir = data_dir.join("palimpsest");
    std::fs::create_dir_all(&dir).ok();
    dir.join("palimpsest.db")
}

fn chapter_ref(url: Option<String>, stable_id: Option<String>) -> ChapterRef {
    ChapterRef { url, stable_id }
}

fn cmd_chapter_list(library: &Library) -> i32 {
    let chapters = match library.list_chapters() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if chapters.is_empty() {
        println!("No chapters stored.");
        return 0;
    }
    println!("{:<40}  {:<28}  {:>6}", "URL", "STABLE ID", "NUMBER");
    println!("{}", "-".repeat(78));
    for chapter in chapters {
        println!(
            "{:<40}  {:<28}  {:>6}",
            chapter.url,
            chapter.stable_id.as_deref().unwrap_or("-"),
            chapter
                .chapter_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    0
}

fn cmd_chapter_show(library: &Library, url: &str) -> i32 {
    match library.get_chapter(url) {
        Ok(Some(chapter)) => {
            println!("url:          {}", chapter.url);
            println!("stable id:    {}", chapter.stable_id.as_deref().unwrap_or("-"));
            println!("title:        {}", chapter.title);
            println!("number:       {:?}", chapter.chapter_number);
            println!("canonical:    {}", chapter.canonical_url.as_deref().unwrap_or("-"));
            println!("added:        {}", chapter.date_added);
            println!("content ({} chars)", chapter.content.len());
            0
        }
        Ok(None) => {
            eprintln!("Error: no chapter stored for '{}'", url);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_chapter_set_number(library: &Library, stable_id: &str, number: u32) -> i32 {
    match library.set_chapter_number(stable_id, number) {
        Ok(chapter) => {
            println!("Set chapter number {} on '{}'", number, chapter.url);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_resolve(library: &Library, stable_id: &str) -> i32 {
    match library.resolve(stable_id) {
        Ok(resolution) => {
            println!("url:      {}", resolution.url);
            println!("source:   {}", resolution.source);
            println!("repaired: {}", resolution.repaired);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_versions(library: &Library, reference: ChapterRef) -> i32 {
    let versions = match library.translation_versions(&reference).await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if versions.is_empty() {
        println!("No translation versions.");
        return 0;
    }
    println!("{:>7}  {:<8}  {:<20}  {}", "VERSION", "ACTIVE", "MODEL", "CREATED");
    println!("{}", "-".repeat(64));
    for v in versions {
        println!(
            "{:>7}  {:<8}  {:<20}  {}",
            v.version,
            if v.is_active { "yes" } else { "" },
            v.settings.model,
            v.created_at,
        );
    }
    0
}

async fn cmd_activate(library: &Library, reference: ChapterRef, version: u32) -> i32 {
    match library.set_active_version(&reference, version).await {
        Ok(v) => {
            println!("Version {} is now active for '{}'", v.version, v.chapter_url);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_export(library: &Library, out: Option<PathBuf>) -> i32 {
    let snapshot = match library.export_snapshot() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let json = match serde_json::to_string_pretty(&snapshot) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match out {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, json) {
                eprintln!("Error: cannot write '{}': {}", path.display(), e);
                return 1;
            }
            println!(
                "Exported {} chapters, {} mappings, {} versions to {}",
                snapshot.chapters.len(),
                snapshot.mappings.len(),
                snapshot.versions.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    0
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(default_db_path);
    let library = match Library::open(&db_path) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: failed to open database at {}: {}", db_path.display(), e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Chapter { action } => match action {
            ChapterAction::List => cmd_chapter_list(&library),
            ChapterAction::Show { url } => cmd_chapter_show(&library, &url),
            ChapterAction::SetNumber { stable_id, number } => {
                cmd_chapter_set_number(&library, &stable_id, number)
            }
        },
        Commands::Resolve { stable_id } => cmd_resolve(&library, &stable_id),
        Commands::Versions { url, stable_id } => {
            cmd_versions(&library, chapter_ref(url, stable_id)).await
        }
        Commands::Activate { url, stable_id, version } => {
            cmd_activate(&library, chapter_ref(url, stable_id), version).await
        }
        Commands::Export { out } => cmd_export(&library, out),
    };
    std::process::exit(code);
}
