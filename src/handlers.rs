use crate::backend::EditorBackend;
use crate::file_system::collect_upload_files;
use crate::models::{parent_path, TreeNode};
use crate::session::EditorSession;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, warn};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Root of the tree as the loader addresses it.
pub const ROOT_NODE_ID: &str = "#";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the children of a tree node
    Ls {
        #[arg(default_value = ROOT_NODE_ID)]
        id: String,
    },
    /// Switch to another environment
    Env { path: String },
    /// Open a file into a buffer and print it
    Open { path: String },
    /// Replace the open buffer with the contents of a local file
    Write { file: PathBuf },
    /// Print the open buffer
    Cat,
    /// Save the open buffer
    Save,
    /// Show open buffers
    Status,
    /// Create a file
    Touch {
        name: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Create a folder
    Mkdir {
        name: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Rename a node in place
    Rename { path: String, name: String },
    /// Move a node under another folder (the root when --to is omitted)
    Mv {
        path: String,
        #[arg(long)]
        to: Option<String>,
    },
    /// Delete a node
    Rm { path: String },
    /// Upload local files or directories into a folder
    Upload {
        target: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the environment's source root
    SrcPath,
    /// Render the open buffer and print the preview URL
    Preview,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    #[command(flatten)]
    Op(Command),
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

pub async fn dispatch<B: EditorBackend>(
    session: &mut EditorSession<B>,
    command: Command,
    out: &mut dyn Write,
) -> Result<()> {
    debug!("Dispatching {:?}", command);
    match command {
        Command::Ls { id } => {
            let nodes = session.load_children(&id).await?;
            print_nodes(out, &nodes)?;
        }
        Command::Env { path } => {
            session.set_environment(path);
            refresh(session, out, ROOT_NODE_ID).await?;
        }
        Command::Open { path } => {
            let buffer = session.open(&path).await?;
            writeln!(out, "{}", buffer.text())?;
        }
        Command::Write { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            if !session.edit_selected(text) {
                return Err(anyhow!("No file is open"));
            }
            writeln!(out, "{} *", session.selected().unwrap_or_default())?;
        }
        Command::Cat => match session.selected_buffer() {
            Some(buffer) => writeln!(out, "{}", buffer.text())?,
            None => return Err(anyhow!("No file is open")),
        },
        Command::Save => {
            let saved = session.save_selected().await.context("Failed to save file.")?;
            if saved {
                writeln!(out, "File saved!")?;
            } else {
                writeln!(out, "Nothing to save")?;
            }
        }
        Command::Status => print_status(session, out)?,
        Command::Touch { name, parent } => create(session, out, name, parent, false).await?,
        Command::Mkdir { name, parent } => create(session, out, name, parent, true).await?,
        Command::Rename { path, name } => match session.rename(&path, &name).await {
            Ok(new_path) => writeln!(out, "{} -> {}", path, new_path)?,
            Err(e) => {
                refresh(session, out, parent_id(&path)).await?;
                return Err(anyhow!(e).context("Rename failed."));
            }
        },
        Command::Mv { path, to } => match session.move_to(&path, to.as_deref()).await {
            Ok(new_path) => writeln!(out, "{} -> {}", path, new_path)?,
            Err(e) => {
                refresh(session, out, parent_id(&path)).await?;
                return Err(anyhow!(e).context("Failed to move file."));
            }
        },
        Command::Rm { path } => match session.delete(&path).await {
            Ok(()) => writeln!(out, "Deleted {}", path)?,
            Err(e) => {
                refresh(session, out, parent_id(&path)).await?;
                return Err(anyhow!(e).context("Deletion failed"));
            }
        },
        Command::Upload { target, files } => {
            let files = collect_upload_files(&files).map_err(|e| anyhow!(e))?;
            let outcomes = session.upload(&target, &files).await;
            let mut failed = 0;
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(_) => writeln!(out, "Uploaded {} -> {}", outcome.file_name, outcome.target_path)?,
                    Err(e) => {
                        failed += 1;
                        writeln!(out, "Error uploading {}: {}", outcome.file_name, e)?;
                    }
                }
            }
            refresh(session, out, node_id(&target)).await?;
            if failed > 0 {
                return Err(anyhow!("{} of {} uploads failed", failed, outcomes.len()));
            }
        }
        Command::SrcPath => {
            let src_path = session
                .src_path()
                .await
                .context("Failed to load environment data")?;
            writeln!(out, "{}", src_path)?;
        }
        Command::Preview => match session.preview().await.context("Preview error")? {
            Some(handle) => writeln!(out, "{}", handle.url)?,
            None => return Err(anyhow!("No file is open")),
        },
    }
    Ok(())
}

/// Reads commands line by line until EOF or `quit`. A failing command is
/// reported and the loop keeps going.
pub async fn run_shell<B, R>(session: &mut EditorSession<B>, input: R, out: &mut dyn Write) -> Result<()>
where
    B: EditorBackend,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        write!(out, "{}> ", session.environment())?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let words = match shell_words::split(&line) {
            Ok(words) => words,
            Err(e) => {
                writeln!(out, "error: {}", e)?;
                continue;
            }
        };
        if words.is_empty() {
            continue;
        }
        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => {
                write!(out, "{}", e.render())?;
                continue;
            }
        };
        match parsed.command {
            ShellCommand::Quit => break,
            ShellCommand::Op(command) => {
                if let Err(e) = dispatch(session, command, out).await {
                    writeln!(out, "! {:#}", e)?;
                }
            }
        }
    }
    Ok(())
}

async fn create<B: EditorBackend>(
    session: &mut EditorSession<B>,
    out: &mut dyn Write,
    name: String,
    parent: Option<String>,
    is_folder: bool,
) -> Result<()> {
    // Without --parent the new node goes next to the open file.
    let parent = parent.or_else(|| session.selected().and_then(parent_path).map(str::to_string));
    match session.create(parent.as_deref(), &name, is_folder).await {
        Ok(path) => {
            writeln!(out, "Created {}", path)?;
            Ok(())
        }
        Err(e) => {
            refresh(session, out, parent.as_deref().map_or(ROOT_NODE_ID, node_id)).await?;
            Err(anyhow!(e).context("Creation failed"))
        }
    }
}

/// Re-lists a folder so the user sees the backend's state after a failure.
async fn refresh<B: EditorBackend>(session: &EditorSession<B>, out: &mut dyn Write, id: &str) -> Result<()> {
    match session.load_children(id).await {
        Ok(nodes) => print_nodes(out, &nodes)?,
        Err(e) => warn!("Failed to refresh '{}': {}", id, e),
    }
    Ok(())
}

fn print_nodes(out: &mut dyn Write, nodes: &[TreeNode]) -> Result<()> {
    for node in nodes {
        if node.is_folder() {
            writeln!(out, "{}/\t{}", node.text, node.path)?;
        } else {
            writeln!(out, "{}\t{}", node.text, node.path)?;
        }
    }
    Ok(())
}

fn print_status<B: EditorBackend>(session: &EditorSession<B>, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "environment: {}", session.environment())?;
    let mut buffers: Vec<_> = session.buffers().collect();
    buffers.sort_by(|a, b| {
        a.environment
            .cmp(&b.environment)
            .then_with(|| natord::compare(&a.path, &b.path))
    });
    for buffer in buffers {
        let marker = if session.selected() == Some(buffer.path.as_str())
            && buffer.environment == session.environment()
        {
            ">"
        } else {
            " "
        };
        let dirty = if buffer.is_dirty() { " *" } else { "" };
        let saved = buffer
            .saved_at()
            .map(|t| format!(", saved {}", t.format("%H:%M:%S")))
            .unwrap_or_default();
        writeln!(
            out,
            "{} [{}] {}{} ({}, opened {}{})",
            marker,
            buffer.environment,
            buffer.path,
            dirty,
            buffer.language,
            buffer.loaded_at().format("%H:%M:%S"),
            saved
        )?;
    }
    Ok(())
}

fn node_id(path: &str) -> &str {
    if path.is_empty() {
        ROOT_NODE_ID
    } else {
        path
    }
}

fn parent_id(path: &str) -> &str {
    parent_path(path).map_or(ROOT_NODE_ID, node_id)
}
