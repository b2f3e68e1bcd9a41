//! ztree - keeps a directory tree, its sidecar settings and the disk in sync.
//!
//! Usage:
//!   ztree tree [PATH]                 Print the document tree
//!   ztree export [PATH]               Export the tree snapshot as JSON
//!   ztree sort DIR [METHOD]           Change how a directory is sorted
//!   ztree mkdir PATH                  Create a directory
//!   ztree touch PATH                  Create a document
//!   ztree rename PATH NAME            Rename a directory
//!   ztree mv SOURCE TARGET_DIR        Move a file or directory
//!   ztree rm PATH                     Remove a file or directory
//!   ztree icon DIR [ICON]             Set or clear a directory icon
//!   ztree project init|remove|set DIR Manage project settings

mod logging;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, bail, eyre};
use serde_json::{Map, Value};
use tracing::debug;

use ztree_core::{ChildMeta, DirMeta, DirTree, NodeId, TreeConfig};
use ztree_ops::{MutationEngine, RemoveOutcome};
use ztree_scan::{ParseCache, TreeBuilder};

use crate::logging::Verbosity;

#[derive(Parser)]
#[command(
    name = "ztree",
    version,
    about = "Manage a tree of documents with per-directory settings",
    long_about = "ztree reads a directory of markdown and LaTeX documents, applies the \
                  sorting and project settings stored in `.ztr-directory` files, and \
                  performs file operations that keep those settings consistent."
)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the document tree
    Tree {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Export the tree snapshot to JSON
    Export {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Change the sort method of a directory (name-up, name-down, time-up, time-down)
    Sort {
        path: PathBuf,

        /// Keeps the current method when omitted
        method: Option<String>,
    },

    /// Create a directory
    Mkdir { path: PathBuf },

    /// Create a document
    Touch {
        path: PathBuf,

        /// Initial content
        #[arg(short = 'm', long, default_value = "")]
        content: String,
    },

    /// Rename a directory
    Rename { path: PathBuf, name: String },

    /// Move a file or directory into another directory
    Mv { source: PathBuf, target: PathBuf },

    /// Remove a file or directory (to the trash if enabled)
    Rm { path: PathBuf },

    /// Set the icon of a directory, or clear it when omitted
    Icon { path: PathBuf, icon: Option<String> },

    /// Manage project settings
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Turn a directory into a project with default settings
    Init { path: PathBuf },

    /// Remove the project settings of a directory
    Remove { path: PathBuf },

    /// Update project properties
    Set {
        path: PathBuf,

        #[arg(long)]
        title: Option<String>,

        /// pdf, html, docx or odt
        #[arg(long)]
        format: Option<String>,

        /// Citation style file
        #[arg(long)]
        csl: Option<String>,

        /// Raw JSON object merged onto the project (e.g. '{"pdf":{"fontsize":11}}')
        #[arg(long)]
        json: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Tree { path, depth } => {
            let ws = Workspace::open(config, &path).await?;
            print_tree(&ws.builder().project(&ws.tree, ws.root)?, depth);
        }
        Command::Export { path, output } => {
            let ws = Workspace::open(config, &path).await?;
            let json = serde_json::to_string_pretty(&ws.builder().project(&ws.tree, ws.root)?)?;
            match output {
                Some(output_path) => {
                    std::fs::write(&output_path, json)
                        .wrap_err_with(|| format!("Failed to write {}", output_path.display()))?;
                    eprintln!("Exported to {}", output_path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Sort { path, method } => {
            let mut ws = Workspace::open(config, &path).await?;
            let root = ws.root;
            let method = ws.engine.sort(&mut ws.tree, root, method.as_deref()).await?;
            println!("{} sorted by {method}", ws.root_path.display());
        }
        Command::Mkdir { path } => {
            let (mut ws, name) = Workspace::open_parent(config, &path).await?;
            let root = ws.root;
            ws.engine.create(&mut ws.tree, root, &name, &ws.cache).await?;
            println!("Created {}", ws.root_path.join(&name).display());
        }
        Command::Touch { path, content } => {
            let (mut ws, name) = Workspace::open_parent(config, &path).await?;
            let root = ws.root;
            ws.engine
                .create_file(&mut ws.tree, root, &name, &content, &ws.cache)
                .await?;
            println!("Created {}", ws.root_path.join(&name).display());
        }
        Command::Rename { path, name } => {
            let (mut ws, old) = Workspace::open_parent(config, &path).await?;
            let id = ws.child(&old)?;
            let renamed = ws.engine.rename(&mut ws.tree, id, &name, &ws.cache).await?;
            println!("Renamed to {}", ws.tree.node(renamed)?.path().display());
        }
        Command::Mv { source, target } => {
            let source = canonical(&source)?;
            let target = canonical(&target)?;
            let base = common_ancestor(source.parent().unwrap_or(&source), &target);
            let mut ws = Workspace::open(config, &base).await?;
            let (from, to) = (ws.locate(&source)?, ws.locate(&target)?);

            let outcome = ws.engine.move_node(&mut ws.tree, from, to, &ws.cache).await?;
            println!("Moved to {}", ws.tree.node(outcome.node)?.path().display());
        }
        Command::Rm { path } => {
            let (mut ws, name) = Workspace::open_parent(config, &path).await?;
            let id = ws.child(&name)?;
            match ws.engine.remove(&mut ws.tree, id, &ws.cache).await {
                RemoveOutcome::Trashed => println!("Moved {name} to the trash"),
                RemoveOutcome::Deleted => println!("Deleted {name}"),
                RemoveOutcome::Failed => bail!("Could not remove {}", path.display()),
            }
        }
        Command::Icon { path, icon } => {
            let mut ws = Workspace::open(config, &path).await?;
            let root = ws.root;
            ws.engine.set_icon(&mut ws.tree, root, icon.as_deref()).await?;
        }
        Command::Project { command } => run_project(config, command).await?,
    }

    Ok(())
}

async fn run_project(config: TreeConfig, command: ProjectCommand) -> Result<()> {
    match command {
        ProjectCommand::Init { path } => {
            let mut ws = Workspace::open(config, &path).await?;
            let root = ws.root;
            ws.engine.make_project(&mut ws.tree, root).await?;
        }
        ProjectCommand::Remove { path } => {
            let mut ws = Workspace::open(config, &path).await?;
            let root = ws.root;
            ws.engine.remove_project(&mut ws.tree, root).await?;
        }
        ProjectCommand::Set {
            path,
            title,
            format,
            csl,
            json,
        } => {
            let mut properties = match json {
                Some(json) => match serde_json::from_str(&json).wrap_err("Invalid --json")? {
                    Value::Object(map) => map,
                    _ => bail!("--json must be a JSON object"),
                },
                None => Map::new(),
            };
            for (key, value) in [("title", title), ("format", format), ("cslStyle", csl)] {
                if let Some(value) = value {
                    properties.insert(key.to_string(), Value::String(value));
                }
            }

            let mut ws = Workspace::open(config, &path).await?;
            let root = ws.root;
            ws.engine
                .update_project_properties(&mut ws.tree, root, &Value::Object(properties))
                .await?;
        }
    }
    Ok(())
}

/// A tree built for one command, rooted at the directory it works on.
struct Workspace {
    engine: MutationEngine,
    tree: DirTree,
    cache: ParseCache,
    root: NodeId,
    root_path: PathBuf,
}

impl Workspace {
    async fn open(config: TreeConfig, path: &Path) -> Result<Self> {
        let root_path = canonical(path)?;
        let engine = MutationEngine::new(TreeBuilder::new(config)?);
        let mut tree = DirTree::new();
        let cache = ParseCache::new();

        let root = engine
            .builder()
            .build(&mut tree, &root_path, None, &cache)
            .await
            .wrap_err_with(|| format!("Failed to read {}", root_path.display()))?;

        Ok(Self {
            engine,
            tree,
            cache,
            root,
            root_path,
        })
    }

    /// Open the parent directory of `path` and return the final component.
    async fn open_parent(config: TreeConfig, path: &Path) -> Result<(Self, String)> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| eyre!("Invalid path: {}", path.display()))?
            .to_string();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Ok((Self::open(config, parent).await?, name))
    }

    fn builder(&self) -> &TreeBuilder {
        self.engine.builder()
    }

    fn child(&self, name: &str) -> Result<NodeId> {
        self.tree.child_named(self.root, name).ok_or_else(|| {
            eyre!(
                "{} is not part of the tree (missing, ignored or not a document)",
                self.root_path.join(name).display()
            )
        })
    }

    /// Find the node for a canonical path below the root.
    fn locate(&self, path: &Path) -> Result<NodeId> {
        let relative = path
            .strip_prefix(&self.root_path)
            .wrap_err_with(|| format!("{} is outside {}", path.display(), self.root_path.display()))?;

        let mut current = self.root;
        for component in relative.components() {
            let name = component.as_os_str().to_string_lossy();
            current = self.tree.child_named(current, &name).ok_or_else(|| {
                eyre!(
                    "{} is not part of the tree (missing, ignored or not a document)",
                    path.display()
                )
            })?;
        }
        Ok(current)
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .wrap_err_with(|| format!("Invalid path: {}", path.display()))
}

fn common_ancestor(a: &Path, b: &Path) -> PathBuf {
    a.components()
        .zip(b.components())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect()
}

/// Load the config from `path`, or from the user config directory if present.
fn load_config(path: Option<&Path>) -> Result<TreeConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(TreeConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("Failed to read config {}", path.display()))?;
    let config: TreeConfig = toml::from_str(&content)
        .wrap_err_with(|| format!("Invalid config {}", path.display()))?;
    config.validate()?;

    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ztree").join("config.toml"))
}

/// Print a snapshot and its children.
fn print_tree(meta: &DirMeta, max_depth: Option<usize>) {
    println!("{}", dir_label(meta));
    print_children(meta, 1, max_depth);
}

fn print_children(meta: &DirMeta, depth: usize, max_depth: Option<usize>) {
    if max_depth.is_some_and(|max| depth > max) {
        return;
    }
    let indent = "  ".repeat(depth);

    for child in &meta.children {
        match child {
            ChildMeta::Directory(dir) => {
                println!("{indent}{}", dir_label(dir));
                print_children(dir, depth + 1, max_depth);
            }
            ChildMeta::File(leaf) | ChildMeta::Code(leaf) => {
                println!(
                    "{indent}{:<40} {:>8}  {}",
                    truncate(&leaf.name, 40),
                    leaf.size,
                    format_time(leaf.modtime)
                );
            }
        }
    }
    for attachment in &meta.attachments {
        println!("{indent}@ {}", attachment.name);
    }
}

fn dir_label(meta: &DirMeta) -> String {
    let mut label = format!("{}/", meta.name);
    if let Some(icon) = &meta.settings.icon {
        label = format!("[{icon}] {label}");
    }
    if meta.settings.project {
        label.push_str(" (project)");
    }
    if meta.not_found {
        label.push_str(" (not found)");
    }
    label
}

fn format_time(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .filter(|ms| *ms > 0)
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{head}…")
    }
}
