use anyhow::Result;
use clap::{Parser, Subcommand};
use editor_shell::api_client::DEFAULT_API_URL;
use editor_shell::handlers::{dispatch, run_shell, Command};
use editor_shell::preview_api::DEFAULT_ORIGIN;
use editor_shell::{EditorSession, RemoteBackend};
use log::info;
use std::env;
use std::io::{self, Write};
use tokio::io::BufReader;

#[derive(Debug, Parser)]
#[command(name = "editor-shell", about = "Browse and edit files on an editor backend")]
struct Args {
    /// Root of the REST API; the editor resource lives below it
    #[arg(long, env = "EDITOR_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Page origin serving /preview and preview.html
    #[arg(long, env = "EDITOR_ORIGIN", default_value = DEFAULT_ORIGIN)]
    origin: String,

    /// Environment whose tree is edited
    #[arg(short, long, env = "EDITOR_ENVIRONMENT", default_value = "")]
    environment: String,

    #[command(subcommand)]
    command: Option<TopLevel>,
}

#[derive(Debug, Subcommand)]
enum TopLevel {
    /// Interactive shell (the default)
    Shell,
    #[command(flatten)]
    Op(Command),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    // Override the log level with RUST_LOG, e.g. `RUST_LOG=debug editor-shell ls`.
    env::set_var("RUST_LOG", env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()));
    env_logger::init();

    let args = Args::parse();
    info!("Using API {} (origin {})", args.api_url, args.origin);

    let backend = RemoteBackend::new(&args.api_url, &args.origin);
    let mut session = EditorSession::new(backend, args.environment);
    let mut stdout = io::stdout();

    match args.command {
        Some(TopLevel::Op(command)) => dispatch(&mut session, command, &mut stdout).await?,
        Some(TopLevel::Shell) | None => {
            run_shell(&mut session, BufReader::new(tokio::io::stdin()), &mut stdout).await?
        }
    }
    stdout.flush()?;
    Ok(())
}
