use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use campus_portal::app::App;
use campus_portal::config::Config;
use campus_portal::fetch::{HttpTransport, Transport};
use campus_portal::render::to_plain_text;
use campus_portal::pages::{self, Page};
use campus_portal::{input, logging, ui};

/// Browse a college website's notices, faculty, committees and FAQs.
#[derive(Debug, Parser)]
#[command(name = "campus-portal", version, about)]
struct Cli {
    /// Config file (default: the platform config dir).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the API base URL from the config file.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Load one page, print it as plain text and exit.
    #[arg(long, value_name = "PAGE")]
    dump: Option<String>,
}

// ---------------------------------------------------------------------------
// Terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing();

    // -- configuration -------------------------------------------------------
    let path = cli.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_from(&path)?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
        config.validate()?;
    }
    let base = config.base_origin()?;
    info!(base = %base, config = %path.display(), "starting");

    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::new(base.clone(), config.timeout(), config.connect_timeout())
            .context("failed to build the HTTP client")?,
    );
    let pages = pages::build(&base, &config.site);

    if let Some(slug) = cli.dump {
        return dump(pages, transport, &slug, config.timeout() + Duration::from_secs(1));
    }

    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(pages, transport);
    app.start();

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Apply finished fetches on the current page.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        app.tick();

        guard.terminal.draw(|f| ui::draw(&app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}

/// Load the page named `slug` and print it without the TUI.
fn dump(
    mut pages: Vec<Box<dyn Page>>,
    transport: Arc<dyn Transport>,
    slug: &str,
    timeout: Duration,
) -> Result<()> {
    let Some(index) = pages.iter().position(|p| p.slug() == slug) else {
        let known: Vec<&str> = pages.iter().map(|p| p.slug()).collect();
        bail!("unknown page '{slug}' (expected one of: {})", known.join(", "));
    };

    let page = &mut pages[index];
    page.activate(transport);
    if !page.wait(timeout) {
        bail!("timed out loading '{slug}'");
    }

    println!("{}", page.title());
    println!("{}", to_plain_text(&page.lines()));
    Ok(())
}
