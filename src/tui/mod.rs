//! Interactive region selector
//!
//! [`run`] owns the terminal: raw mode and the alternate screen are entered
//! on the way in and always restored on the way out. Input handling lives in
//! [`state`], drawing in [`render`]; this module only moves events between
//! them and the background batch.

pub mod render;
pub mod state;

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info, warn};

use crate::app::models::Region;
use crate::app::processor::BatchSummary;
use crate::app::progress::{BatchLauncher, ProgressBridge};
use crate::app::tree::{LocationFocus, RegionTree};
use crate::constants::ui;
use crate::errors::Result;

pub use state::{KeyInput, Mode, RowView, SelectionState, UiCommand, UiEvent};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Runtime UI configuration
#[derive(Debug, Clone, PartialEq)]
pub struct UiConfig {
    /// Input poll timeout and redraw interval
    pub tick: Duration,
    /// Capacity of the progress channel between batch and UI
    pub channel_capacity: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick: ui::TICK_INTERVAL,
            channel_capacity: ui::CHANNEL_CAPACITY,
        }
    }
}

impl From<KeyEvent> for KeyInput {
    fn from(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
                KeyInput::Ctrl(c.to_ascii_lowercase())
            }
            KeyCode::Char(c) => KeyInput::Char(c),
            KeyCode::Enter => KeyInput::Enter,
            KeyCode::Esc => KeyInput::Esc,
            KeyCode::Backspace => KeyInput::Backspace,
            KeyCode::Up => KeyInput::Up,
            KeyCode::Down => KeyInput::Down,
            KeyCode::PageUp => KeyInput::PageUp,
            KeyCode::PageDown => KeyInput::PageDown,
            KeyCode::Home => KeyInput::Home,
            KeyCode::End => KeyInput::End,
            _ => KeyInput::Other,
        }
    }
}

/// Run the selector until the user quits
///
/// Returns the summary of the last batch started from the UI, if any. A
/// batch cancelled on the way out only reports a summary if it had already
/// stopped when the UI closed.
pub async fn run(
    regions: Vec<Region>,
    tree: RegionTree,
    focus: LocationFocus,
    launcher: BatchLauncher,
    config: UiConfig,
) -> Result<Option<BatchSummary>> {
    let mut state = SelectionState::new(regions, tree, focus);

    let mut terminal = enter_terminal()?;
    let outcome = event_loop(&mut terminal, &mut state, &launcher, &config).await;
    if let Err(e) = leave_terminal(&mut terminal) {
        warn!("Failed to restore terminal: {}", e);
    }

    outcome?;
    Ok(state.take_summary())
}

fn enter_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = stdout.execute(EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e);
    }
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn leave_terminal(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()
}

async fn event_loop(
    terminal: &mut Tui,
    state: &mut SelectionState,
    launcher: &BatchLauncher,
    config: &UiConfig,
) -> Result<()> {
    let size = terminal.size()?;
    state.handle(UiEvent::Resize(size.width, size.height));

    let mut batch: Option<ProgressBridge> = None;

    loop {
        if let Some(active) = batch.as_mut() {
            drain_updates(active, state);
            if let Some(result) = active.finished() {
                // Updates sent just before the task ended
                drain_updates(active, state);
                batch = None;
                let summary = result?;
                info!("{}", summary.headline());
                state.handle(UiEvent::BatchFinished(summary));
            }
        }

        terminal.draw(|f| render::draw(f, state))?;

        if state.is_quitting() {
            break;
        }

        if !event::poll(config.tick)? {
            continue;
        }

        let command = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                state.handle(UiEvent::Key(KeyInput::from(key)))
            }
            Event::Resize(width, height) => state.handle(UiEvent::Resize(width, height)),
            _ => UiCommand::None,
        };

        apply_command(command, &mut batch, launcher);
    }

    // A cancelled batch is not waited for; pick up its summary only if it
    // has already ended
    if let Some(mut active) = batch {
        match active.finished() {
            Some(result) => {
                state.handle(UiEvent::BatchFinished(result?));
            }
            None => info!("Leaving cancelled batch to stop in the background"),
        }
    }

    Ok(())
}

/// Act on a command from the state machine without blocking the loop
fn apply_command(command: UiCommand, batch: &mut Option<ProgressBridge>, launcher: &BatchLauncher) {
    match command {
        UiCommand::StartBatch(regions) => {
            info!("Starting batch of {} region(s)", regions.len());
            *batch = Some(launcher.launch(regions));
        }
        UiCommand::CancelBatch => {
            if let Some(active) = batch.as_ref() {
                info!("Cancelling batch");
                active.cancel();
            }
        }
        UiCommand::Quit => debug!("Quit requested"),
        UiCommand::None => {}
    }
}

fn drain_updates(batch: &mut ProgressBridge, state: &mut SelectionState) {
    for update in batch.poll_updates() {
        state.handle(UiEvent::Progress(update));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        let plain = |code| KeyEvent::new(code, KeyModifiers::NONE);

        assert_eq!(KeyInput::from(plain(KeyCode::Char('j'))), KeyInput::Char('j'));
        assert_eq!(KeyInput::from(plain(KeyCode::PageDown)), KeyInput::PageDown);
        assert_eq!(KeyInput::from(plain(KeyCode::F(1))), KeyInput::Other);
        assert_eq!(
            KeyInput::from(KeyEvent::new(KeyCode::Char('C'), KeyModifiers::CONTROL)),
            KeyInput::Ctrl('c')
        );
    }

    #[tokio::test]
    async fn test_cancel_does_not_wait_for_batch() {
        use crate::app::processor::ProcessorConfig;
        use tempfile::TempDir;

        // Accepts connections and never answers, so the download stalls
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/stall-latest.osm.pbf", listener.local_addr().unwrap());

        let temp = TempDir::new().unwrap();
        let launcher = BatchLauncher::new(
            ProcessorConfig {
                output_dir: temp.path().join("out"),
                work_dir: temp.path().join("work"),
                ..Default::default()
            },
            reqwest::Client::new(),
            16,
        );

        let mut batch = None;
        let region = Region::new("test/stall", "Stall").with_url("pbf", url);
        apply_command(UiCommand::StartBatch(vec![region]), &mut batch, &launcher);
        assert!(batch.is_some());

        apply_command(UiCommand::CancelBatch, &mut batch, &launcher);
        let active = batch.as_mut().unwrap();
        assert!(active.cancel_token().is_cancelled());
        assert!(active.finished().is_none());
        drop(listener);
    }

    #[test]
    fn test_default_config() {
        let config = UiConfig::default();
        assert_eq!(config.tick, Duration::from_millis(100));
        assert_eq!(config.channel_capacity, 100);
    }
}
