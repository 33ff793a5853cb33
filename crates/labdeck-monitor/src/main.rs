mod table;
mod theme;
mod ui;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use labdeck_core::wire::InboundMsg;
use labdeck_sync::{activity::ActivityTracker, TableSync};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io,
    path::PathBuf,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use table::TableView;

const FRAME_INTERVAL_MS: u64 = 200;
const SOCKET_QUEUE_CAPACITY: usize = 256;

#[derive(Parser, Debug)]
#[command(name = "labdeck-monitor", about = "Live session participant monitor")]
struct Args {
    /// Websocket URL of the session monitor feed
    url: String,
    /// Session title shown in the header
    #[arg(long, default_value = "session")]
    title: String,
    /// Append logs to this file (the terminal itself is the display)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
struct Config {
    url: Url,
    title: String,
    log_file: Option<PathBuf>,
}

#[derive(Debug)]
enum SocketEvent {
    Connected,
    Disconnected,
    Message(InboundMsg),
}

struct App {
    config: Config,
    connected: bool,
    sync: TableSync,
    activity: ActivityTracker,
    view: TableView,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            connected: false,
            sync: TableSync::new(),
            activity: ActivityTracker::new(),
            view: TableView::new(),
        }
    }

    /// Messages are applied one at a time, each to completion, so the
    /// synchronizer state is never touched by overlapping passes.
    fn apply_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Connected => self.connected = true,
            SocketEvent::Disconnected => self.connected = false,
            SocketEvent::Message(InboundMsg::Snapshot(snapshot)) => {
                let report = self.sync.apply_snapshot(&snapshot.rows);
                let now = Instant::now();
                self.view.apply_report(&report, now);
                if report.inserted_any {
                    self.view.set_visited_count(self.sync.visited_count());
                }
                let msg = self
                    .activity
                    .note_activity(&report.updated_ids, Utc::now().timestamp_millis());
                // An empty message must not replace the one on display.
                if !msg.is_empty() {
                    self.view.set_status(msg, now);
                }
            }
            SocketEvent::Message(InboundMsg::UpdateNotes(payload)) => {
                let report = self.sync.apply_notes(&payload.ids, &payload.note);
                self.view.apply_report(&report, Instant::now());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    init_logging(&config);

    let (socket_tx, mut socket_rx) = mpsc::channel(SOCKET_QUEUE_CAPACITY);
    tokio::spawn(socket_loop(config.url.clone(), socket_tx));

    let mut app = App::new(config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut events = EventStream::new();
    let mut frame_ticker = tokio::time::interval(Duration::from_millis(FRAME_INTERVAL_MS));

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;
        tokio::select! {
            _ = frame_ticker.tick() => {}
            Some(event) = socket_rx.recv() => {
                app.apply_socket_event(event);
            }
            maybe_event = events.next() => {
                if let Some(Ok(event)) = maybe_event {
                    if should_quit(&event) {
                        break;
                    }
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn load_config() -> Result<Config> {
    let args = Args::parse();
    let url = Url::parse(&args.url).context("invalid websocket url")?;
    Ok(Config {
        url,
        title: args.title,
        log_file: args.log_file,
    })
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file = config.log_file.as_ref().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    match file {
        Some(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
}

/// Owns the connection lifecycle: connect, forward parsed frames, and on
/// any failure retry with a doubling backoff capped at ten seconds. The
/// synchronizer never sees connectivity loss, only an absence of messages.
async fn socket_loop(url: Url, events: mpsc::Sender<SocketEvent>) {
    let mut backoff = Duration::from_secs(1);
    loop {
        let connection = connect_async(url.as_str()).await;
        let (mut ws, _) = match connection {
            Ok(value) => value,
            Err(err) => {
                warn!("monitor_connect_error: {err}");
                tokio::time::sleep(backoff).await;
                backoff = next_backoff(backoff);
                continue;
            }
        };
        backoff = Duration::from_secs(1);
        info!("monitor_connected");
        if events.send(SocketEvent::Connected).await.is_err() {
            return;
        }

        while let Some(frame) = ws.next().await {
            match frame {
                Ok(Message::Text(text)) => match InboundMsg::parse(&text) {
                    Ok(msg) => {
                        if events.send(SocketEvent::Message(msg)).await.is_err() {
                            return;
                        }
                    }
                    Err(err) => warn!("monitor_frame_error: {err}"),
                },
                Ok(_) => {}
                Err(err) => {
                    warn!("monitor_socket_error: {err}");
                    break;
                }
            }
        }
        let _ = ws.close(None).await;
        if events.send(SocketEvent::Disconnected).await.is_err() {
            return;
        }
    }
}

fn next_backoff(current: Duration) -> Duration {
    let next = current + current;
    if next > Duration::from_secs(10) {
        Duration::from_secs(10)
    } else {
        next
    }
}

fn should_quit(event: &Event) -> bool {
    let Event::Key(KeyEvent {
        code,
        modifiers,
        kind,
        ..
    }) = event
    else {
        return false;
    };
    if *kind == KeyEventKind::Release {
        return false;
    }
    matches!(code, KeyCode::Char('q') | KeyCode::Esc)
        || (*code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL))
}
