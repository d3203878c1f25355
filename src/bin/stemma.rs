//! Stemma CLI: cross-document lineage over a SQLite content store.
//!
//! Usage:
//!   stemma stats [--db path]
//!   stemma export [--format json|node-link|graphml] [--output path]
//!   stemma import <path> [--format json|node-link]
//!   stemma verify [--db path]
//!   stemma archive <export|import> <path>

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stemma::export::{from_json, from_node_link, to_graphml, to_json, to_node_link};
use stemma::storage::{
    export_archive, import_archive, Archive, ContentStore, OpenStore, SqliteStore,
};
use stemma::{LineageTracker, TrackerConfig};

/// Root name the stored graph head hangs off in the content store.
const GRAPH_ROOT: &str = "lineage";

#[derive(Parser)]
#[command(name = "stemma", version, about = "Cross-document data lineage tracker")]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print summary statistics for the stored graph
    Stats,
    /// Write the graph to a lineage document
    Export {
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Destination file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace the stored graph with one read from a lineage document
    Import {
        /// Source file
        path: PathBuf,
        /// Input format (GraphML is export-only)
        #[arg(long, value_enum, default_value = "json")]
        format: ImportFormat,
    },
    /// Check stored records for signature and reference integrity
    Verify,
    /// Move content-addressed blobs in and out of portable archives
    Archive {
        #[command(subcommand)]
        action: ArchiveAction,
    },
}

#[derive(Subcommand)]
enum ArchiveAction {
    /// Write every root and reachable blob to an archive file
    Export {
        /// Destination file
        output: PathBuf,
    },
    /// Load blobs and roots from an archive file into the store
    Import {
        /// Source file
        input: PathBuf,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum ExportFormat {
    Json,
    NodeLink,
    Graphml,
}

#[derive(Copy, Clone, ValueEnum)]
enum ImportFormat {
    Json,
    NodeLink,
}

/// Get the default database path (~/.local/share/stemma/stemma.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let stemma_dir = data_dir.join("stemma");
    std::fs::create_dir_all(&stemma_dir).ok();
    stemma_dir.join("stemma.db")
}

fn open_tracker(db: Option<PathBuf>) -> Result<LineageTracker, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store =
        SqliteStore::open(&db_path).map_err(|e| format!("failed to open database: {}", e))?;
    let store = Arc::new(store);
    let head = store
        .get_root(GRAPH_ROOT)
        .map_err(|e| format!("failed to read graph root: {}", e))?;
    let mut tracker = LineageTracker::with_store(TrackerConfig::default(), store);
    if let Some(head) = head {
        tracker
            .load(&head)
            .map_err(|e| format!("failed to load graph: {}", e))?;
    }
    Ok(tracker)
}

/// Store the tracker's graph and point the graph root at the new head.
fn persist(tracker: &mut LineageTracker) -> Result<(), String> {
    let head = tracker
        .store()
        .map_err(|e| format!("failed to store graph: {}", e))?;
    match tracker.archiver() {
        Some(archiver) => archiver
            .store()
            .set_root(GRAPH_ROOT, &head)
            .map_err(|e| format!("failed to update graph root: {}", e)),
        None => Err("no content store attached".to_string()),
    }
}

fn cmd_stats(tracker: &mut LineageTracker) -> i32 {
    let report = tracker.analyze();
    println!("{:<24}{:>8}", "Nodes", report.basic.node_count);
    println!("{:<24}{:>8}", "Links", report.basic.link_count);
    println!("{:<24}{:>8}", "Documents", report.basic.document_count);
    println!(
        "{:<24}{:>8}  ({:.1}%)",
        "Cross-document links",
        report.basic.cross_document_links,
        report.basic.cross_document_ratio * 100.0
    );
    println!("{:<24}{:>8}", "Clusters", report.clusters.cluster_count());
    println!("{:<24}{:>8}", "Critical paths", report.critical_paths.len());
    if let (Some(earliest), Some(latest)) = (report.time.earliest, report.time.latest) {
        println!("{:<24}{:>7.1}s", "Span", report.time.span_seconds);
        println!("  {} .. {}", earliest.to_rfc3339(), latest.to_rfc3339());
    }
    0
}

fn render_graph(tracker: &LineageTracker, format: ExportFormat) -> Result<String, String> {
    let graph = tracker.graph();
    match format {
        ExportFormat::Json => to_json(graph)
            .and_then(|doc| serde_json::to_string_pretty(&doc).map_err(Into::into))
            .map_err(|e| e.to_string()),
        ExportFormat::NodeLink => to_node_link(graph)
            .and_then(|doc| serde_json::to_string_pretty(&doc).map_err(Into::into))
            .map_err(|e| e.to_string()),
        ExportFormat::Graphml => Ok(to_graphml(graph)),
    }
}

fn cmd_export(tracker: &LineageTracker, format: ExportFormat, output: Option<&Path>) -> i32 {
    let rendered = match render_graph(tracker, format) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, rendered) {
                eprintln!("Error: cannot write '{}': {}", path.display(), e);
                return 1;
            }
            println!("Exported graph to '{}'", path.display());
        }
        None => println!("{}", rendered),
    }
    0
}

fn cmd_import(tracker: &mut LineageTracker, path: &Path, format: ImportFormat) -> i32 {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", path.display(), e);
            return 1;
        }
    };
    let doc: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: invalid JSON in '{}': {}", path.display(), e);
            return 1;
        }
    };
    let graph = match format {
        ImportFormat::Json => from_json(&doc),
        ImportFormat::NodeLink => from_node_link(&doc),
    };
    let graph = match graph {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let nodes = graph.node_count();
    *tracker.graph_mut() = graph;
    if let Err(e) = persist(tracker) {
        eprintln!("Error: {}", e);
        return 1;
    }
    println!("Imported {} nodes from '{}'", nodes, path.display());
    0
}

fn cmd_verify(tracker: &LineageTracker) -> i32 {
    let report = match tracker.verify() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    println!("Checked {} records, {} valid", report.checked, report.valid);
    if report.is_valid() {
        return 0;
    }
    for violation in &report.violations {
        eprintln!("  {}: {}", violation.record_id, violation.reason);
    }
    1
}

fn cmd_archive_export(tracker: &LineageTracker, output: &Path) -> i32 {
    let archiver = match tracker.archiver() {
        Some(archiver) => archiver,
        None => {
            eprintln!("Error: no content store attached");
            return 1;
        }
    };
    let store = archiver.store();
    let roots = match store.list_roots() {
        Ok(roots) => roots,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if roots.is_empty() {
        eprintln!("Error: store has no roots to archive");
        return 1;
    }
    let archive = match export_archive(store.as_ref(), &roots) {
        Ok(archive) => archive,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let body = match serde_json::to_string_pretty(&archive) {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(e) = std::fs::write(output, body) {
        eprintln!("Error: cannot write '{}': {}", output.display(), e);
        return 1;
    }
    println!("Archived {} blobs to '{}'", archive.blobs.len(), output.display());
    0
}

fn cmd_archive_import(tracker: &mut LineageTracker, input: &Path) -> i32 {
    let raw = match std::fs::read_to_string(input) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", input.display(), e);
            return 1;
        }
    };
    let archive: Archive = match serde_json::from_str(&raw) {
        Ok(archive) => archive,
        Err(e) => {
            eprintln!("Error: invalid archive in '{}': {}", input.display(), e);
            return 1;
        }
    };
    let store = match tracker.archiver() {
        Some(archiver) => archiver.store().clone(),
        None => {
            eprintln!("Error: no content store attached");
            return 1;
        }
    };
    let imported = match import_archive(store.as_ref(), &archive) {
        Ok(imported) => imported,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    println!("Imported {} blobs from '{}'", imported, input.display());
    if let Ok(Some(head)) = store.get_root(GRAPH_ROOT) {
        match tracker.load(&head) {
            Ok(()) => println!("Graph head {} ({} nodes)", head, tracker.graph().node_count()),
            Err(e) => {
                eprintln!("Error: archive imported but graph failed to load: {}", e);
                return 1;
            }
        }
    }
    0
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let mut tracker = match open_tracker(cli.db) {
        Ok(tracker) => tracker,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let code = match cli.command {
        Commands::Stats => cmd_stats(&mut tracker),
        Commands::Export { format, output } => cmd_export(&tracker, format, output.as_deref()),
        Commands::Import { path, format } => cmd_import(&mut tracker, &path, format),
        Commands::Verify => cmd_verify(&tracker),
        Commands::Archive { action } => match action {
            ArchiveAction::Export { output } => cmd_archive_export(&tracker, &output),
            ArchiveAction::Import { input } => cmd_archive_import(&mut tracker, &input),
        },
    };
    std::process::exit(code);
}
