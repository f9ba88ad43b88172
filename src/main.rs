//! Loan Wizard - terminal multi-step loan application
//!
//! A Ratatui-based TUI that walks an applicant through loan selection,
//! step-by-step details with OTP verification, and document uploads.
//!
//! Usage: `loan-wizard [--offline] [--write-config] [LOAN_TYPE [SUBTYPE]]`,
//! for example `loan-wizard vehicle 2wheeler`.

mod app;
mod backend;
mod config;
mod data;
mod state;
mod ui;

use anyhow::{bail, Result};
use app::App;
use clap::Parser;
use config::WizardConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use state::{LoanSelection, SystemClock};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Poll interval of the event loop; also drives the loader and debounce
const TICK: Duration = Duration::from_millis(50);

/// Command line options
#[derive(Debug, Parser)]
#[command(name = "loan-wizard", about = "Terminal multi-step loan application wizard")]
struct Args {
    /// Use the built-in offline backend instead of HTTP
    #[arg(long)]
    offline: bool,

    /// Write the effective config file and exit
    #[arg(long)]
    write_config: bool,

    /// Loan to start right away: home, personal, vehicle or education
    loan_type: Option<String>,

    /// Vehicle subtype: 4wheeler or 2wheeler
    #[arg(requires = "loan_type")]
    subtype: Option<String>,
}

impl Args {
    /// Loan selection named on the command line, if any
    fn selection(&self) -> Result<Option<LoanSelection>> {
        let Some(loan_type) = self.loan_type.as_deref() else {
            return Ok(None);
        };
        match LoanSelection::from_values(loan_type, self.subtype.as_deref()) {
            Some(selection) => Ok(Some(selection)),
            None => bail!("Unknown loan type {loan_type}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loan_wizard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let selection = args.selection()?;
    let mut config = WizardConfig::load()?;
    if args.offline {
        config.offline = Some(true);
    }
    if args.write_config {
        config.save()?;
        if let Some(path) = WizardConfig::config_path() {
            println!("Wrote {}", path.display());
        }
        return Ok(());
    }
    let backend = backend::connect(&config)?;

    let mut app = App::new(config, backend, Arc::new(SystemClock));
    if let Some(selection) = selection {
        app.start_wizard(selection);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Handle any errors
    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    info!("exiting");
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.tick();

        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                // Global quit: Ctrl+C
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }
                app.handle_key(key)?;
            }
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}
