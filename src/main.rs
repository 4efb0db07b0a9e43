use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;

mod app;
mod config;
mod conversation;
mod endpoint;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use config::Config;
use endpoint::ChatClient;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "optibuy")]
#[command(version, about = "Chat with the OptiBuy product assistant from your terminal")]
struct Cli {
    /// Chat endpoint URL
    #[arg(long, env = "OPTIBUY_ENDPOINT")]
    endpoint: Option<String>,

    /// Config file (defaults to <config dir>/optibuy/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log file (defaults to <data dir>/optibuy/optibuy.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = logging::init(cli.log_file.as_deref(), cli.verbose)?;

    let config = Config::load(cli.config.as_deref())?;
    let endpoint = config.endpoint(cli.endpoint.as_deref())?;
    tracing::info!(endpoint = %endpoint, log = %log_path.display(), "Starting OptiBuy chat");

    let mut events = EventHandler::new();
    let mut app = App::new(
        ChatClient::new(endpoint),
        config.greeting(),
        config.title(),
        events.sender(),
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    tracing::info!("Terminal restored, exiting");

    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}
