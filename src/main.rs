use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

mod app;
mod config;
mod error;
mod logging;
mod modules;
mod ui;

use app::App;
use config::Config;
use modules::api::{HttpNotificationApi, NotificationApi};
use modules::controller::{HitMap, UiEvent};
use modules::render::{project_list, render_badge_html, render_list_html, render_toast_html};

#[derive(Parser, Debug)]
#[command(name = "notibell", version, about = "Unread-notification bell for the terminal")]
struct Cli {
    /// Config file to use instead of the per-user default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override `base_url` from the config file.
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Fetch once and print the badge and list as an HTML fragment.
    Snapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
        config.validate()?;
    }
    logging::init(&config)?;

    if let Some(Cmd::Snapshot) = cli.command {
        return snapshot(&config).await;
    }

    // Anything that can fail on bad config happens before the terminal is taken over.
    let mut app = App::new(&config)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.start();
    let res = run_app(&mut terminal, &mut app).await;
    app.teardown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "ui loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.tick();
        let mut hits = HitMap::default();
        terminal.draw(|f| hits = ui::draw(f, app))?;
        app.hits = hits;

        if event::poll(Duration::from_millis(100))? {
            let ui_event = match event::read()? {
                Event::Key(KeyEvent { code, modifiers, kind, .. }) => {
                    if kind != KeyEventKind::Press { continue; }
                    UiEvent::Key { code, modifiers }
                }
                Event::Mouse(MouseEvent { kind: MouseEventKind::Down(MouseButton::Left), column, row, .. }) => {
                    UiEvent::Click { column, row }
                }
                _ => continue,
            };
            if app.handle_event(ui_event) {
                return Ok(());
            }
        }
    }
}

async fn snapshot(config: &Config) -> Result<()> {
    let api = HttpNotificationApi::new(config)?;
    let (unread, all) = tokio::join!(api.fetch_unread(), api.fetch_all());
    let unread = unread?;
    let all = all?;
    println!("{}", render_badge_html(unread.count));
    for notification in &unread.notifications {
        println!("{}", render_toast_html(notification));
    }
    println!("{}", render_list_html(&project_list(&all, chrono::Local::now())));
    Ok(())
}
