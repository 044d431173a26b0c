//! devfeed — a terminal client for a personalized developer-news feed.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────┐  FetchMsg   ┌──────────┐  draw()  ┌────────┐
//! │ fetch.rs  │ ──────────► │  app.rs  │ ───────► │ ui.rs  │
//! │ (thread)  │  (channel)  │ (state)  │          │(render)│
//! └───────────┘             └──────────┘          └────────┘
//!       ▲                        ▲
//!       │ FetchRequest           │ handle_key_event()
//!       │                   ┌──────────┐
//!   state.rs ───────────────│ input.rs │
//!                           └──────────┘
//! ```
//!
//! * **`feed/`** — domain types, the `FeedSource`/`AdSource` traits and the
//!   HTTP + demo implementations.
//! * **`cache`** — the shared page cache keyed by query identity.
//! * **`state`** — one mounted feed instance: pagination, ads, mutations.
//! * **`fetch`** — the background worker thread doing the blocking IO.
//! * **`layout` / `scroll`** — grid position math and the end-of-list
//!   fetch trigger.
//! * **`app`** — owns all application state and the action dispatcher.
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to actions.
//! * **`main`** — wires everything together: parse args, set up the
//!   terminal, and run the event loop.

mod analytics;
mod app;
mod cache;
mod feed;
mod fetch;
mod input;
mod layout;
mod scroll;
mod settings;
mod state;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use analytics::{AnalyticsSink, LogSink, NullSink};
use app::{App, Panel};
use feed::demo::{DemoAdSource, DemoSource};
use feed::http::{HttpAdSource, HttpSource};
use feed::{AdSource, FeedKind, FeedQuery, FeedSource};
use settings::{Density, Settings};

// ---------------------------------------------------------------------------
// RAII terminal guard — idiomatic cleanup even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.  This prevents the common TUI bug where a panic leaves the
/// terminal in a broken state.
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

/// Install a panic hook that restores the terminal before printing the
/// panic message.  Without this, a panic inside the event loop would leave
/// raw mode enabled and the alternate screen active.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CliArgs {
    demo: bool,
    popular: bool,
    preview: bool,
    squad: Option<String>,
    tag: Option<String>,
    settings_path: Option<PathBuf>,
    api: Option<String>,
}

const USAGE: &str = "\
devfeed — a terminal client for a personalized developer-news feed

USAGE:
    devfeed [OPTIONS]

OPTIONS:
    --demo              browse deterministic offline data, no backend needed
    --popular           start on the popular feed instead of my feed
    --preview           read-only feed preview (no infinite scrolling)
    --squad <handle>    add a squad to the feed rotation and start there
    --tag <tag>         filter the feed by tag
    --settings <path>   JSON settings file
    --api <url>         backend base URL (also: DEVFEED_API)
    -h, --help          print this help
";

fn parse_args() -> Result<CliArgs> {
    let mut args = CliArgs::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--demo" => args.demo = true,
            "--popular" => args.popular = true,
            "--preview" => args.preview = true,
            "--squad" => match iter.next() {
                Some(handle) => args.squad = Some(handle),
                None => bail!("--squad requires a handle"),
            },
            "--tag" => match iter.next() {
                Some(tag) => args.tag = Some(tag),
                None => bail!("--tag requires a tag"),
            },
            "--settings" => match iter.next() {
                Some(path) => args.settings_path = Some(PathBuf::from(path)),
                None => bail!("--settings requires a path"),
            },
            "--api" => match iter.next() {
                Some(url) => args.api = Some(url),
                None => bail!("--api requires a URL"),
            },
            "-h" | "--help" => {
                print!("{USAGE}");
                std::process::exit(0);
            }
            other => bail!("unknown argument `{other}` (try --help)"),
        }
    }
    Ok(args)
}

/// Everything the renderer depends on. The cache version stands in for the
/// page data itself (it bumps on every visible change, loading included),
/// so a frame is only drawn when something actually moved.
type RenderState = (u64, usize, usize, Option<Panel>, String, bool, Density, bool);

fn render_state(app: &App) -> RenderState {
    (
        app.cache.version(app.feed.query()),
        app.feed.ads_available(),
        app.selected,
        app.panel,
        app.status.clone(),
        app.settings.list_mode,
        app.settings.density,
        app.feed.last_error().is_some(),
    )
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    install_panic_hook();
    // Logging goes to stderr (redirect it; the TUI owns stdout).
    env_logger::init();

    let args = parse_args()?;
    let mut settings = Settings::load(args.settings_path.as_deref())?;
    if let Some(api) = args.api {
        settings.api_base = api;
    }
    if let Some(squad) = &args.squad {
        settings.squad = Some(squad.clone());
    }

    // -- configure data sources ----------------------------------------------
    let (source, ads): (Box<dyn FeedSource>, Box<dyn AdSource>) = if args.demo {
        (Box::new(DemoSource::new(50)), Box::new(DemoAdSource::new(12)))
    } else {
        (
            Box::new(HttpSource::new(
                settings.api_base.clone(),
                settings.api_token.clone(),
            )?),
            Box::new(HttpAdSource::new(settings.api_base.clone())?),
        )
    };

    // -- start the background fetch worker -----------------------------------
    let (handle, rx) = fetch::spawn(source, ads);

    let kind = match (args.preview, &args.squad, args.popular) {
        (true, _, _) => FeedKind::Preview,
        (false, Some(handle), _) => FeedKind::Squad(handle.clone()),
        (false, None, true) => FeedKind::Popular,
        (false, None, false) => FeedKind::MyFeed,
    };
    let mut query = FeedQuery::new(kind);
    if let Some(tag) = args.tag {
        query = query.with_variable("tag", tag);
    }

    let sink: Box<dyn AnalyticsSink> = if settings.analytics {
        Box::new(LogSink)
    } else {
        Box::new(NullSink)
    };

    // -- terminal setup (RAII — Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(settings, query, Box::new(handle), sink);

    // -- main event loop ------------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Drain results from the fetch worker.
    //   2. Run per-tick work (scroll trigger, empty-feed notification).
    //   3. Render the UI, but only when something visible changed.
    //   4. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);
    let mut last_rendered: Option<RenderState> = None;

    loop {
        // 1. Process fetch results
        while let Ok(msg) = rx.try_recv() {
            app.handle_fetch_msg(msg);
        }

        // 2. Per-tick work
        app.tick();

        // 3. Render on change
        let state = render_state(&app);
        if last_rendered.as_ref() != Some(&state) {
            guard.terminal.draw(|f| ui::draw(&mut app, f))?;
            last_rendered = Some(state);
        }

        // 4. Handle input
        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => input::handle_key_event(&mut app, key),
                // A resize invalidates the whole frame.
                Event::Resize(_, _) => last_rendered = None,
                _ => {}
            }
        }

        if app.quit {
            break;
        }
    }

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
