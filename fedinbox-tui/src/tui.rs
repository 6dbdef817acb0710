use crate::{
    feeders::spawn_tui_feeders,
    keys::{Action, action_for},
    view::{self, ViewSnap},
};
use anyhow::Result;
use crossterm::{
    event::Event as CtEvent,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use fedinbox_client::{ClientError, Inbox, KeyValueStore, Notice};
use ratatui::{Terminal, backend::Backend, backend::CrosstermBackend};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const MAILBOX: usize = 1024;

pub enum TuiMsg {
    Input(CtEvent),
    Tick,
    Refresh,
    OpError(String),
    Shutdown,
}

/// Restores the terminal however the loop exits.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<(Self, Terminal<CrosstermBackend<Stdout>>)> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let mut term = Terminal::new(CrosstermBackend::new(stdout))?;
        term.clear()?;
        Ok((Self, term))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        disable_raw_mode().ok();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Run the inbox in the terminal until the viewer quits.
pub async fn run_inbox<S: KeyValueStore>(inbox: Inbox<S>) -> Result<()> {
    let (guard, term) = TerminalGuard::enter()?;
    let (tx, rx) = mpsc::channel(MAILBOX);
    let (shutdown, _) = broadcast::channel(4);

    spawn_tui_feeders(tx.clone(), &shutdown);
    // first fetch happens inside the loop so the "Loading…" frame shows
    let _ = tx.send(TuiMsg::Refresh).await;

    let result = InboxTui::new(inbox, term).run(rx).await;
    let _ = shutdown.send(());
    drop(guard);
    result
}

/// Message loop state. Every action is awaited before the next message is
/// taken, so redraws never interleave with an in-flight action.
pub struct InboxTui<S, B: Backend> {
    inbox: Inbox<S>,
    term: Terminal<B>,
    tick_rate: Duration,
    last_tick: Instant,

    selected: usize,
    notice: Option<Notice>,
    dirty: bool,

    busy: bool,
    spin_idx: usize,
}

impl<S: KeyValueStore, B: Backend> InboxTui<S, B> {
    pub fn new(inbox: Inbox<S>, term: Terminal<B>) -> Self {
        Self {
            inbox,
            term,
            tick_rate: Duration::from_millis(80),
            last_tick: Instant::now(),
            selected: 0,
            notice: None,
            dirty: true,
            busy: false,
            spin_idx: 0,
        }
    }

    pub fn inbox(&self) -> &Inbox<S> {
        &self.inbox
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.term
    }

    pub async fn run(mut self, mut rx: mpsc::Receiver<TuiMsg>) -> Result<()> {
        while let Some(msg) = rx.recv().await {
            if !self.handle(msg).await? {
                break;
            }
        }
        info!("Inbox closed");
        Ok(())
    }

    /// Handle one message. Returns `false` once the loop should stop.
    pub async fn handle(&mut self, msg: TuiMsg) -> Result<bool> {
        match msg {
            TuiMsg::Input(CtEvent::Key(key)) => {
                if let Some(action) = action_for(key, self.notice.is_some()) {
                    return self.apply(action).await;
                }
            }
            TuiMsg::Input(CtEvent::Resize(..)) => self.dirty = true,
            TuiMsg::Input(_) => {}
            TuiMsg::Refresh => {
                self.run_refresh().await?;
            }
            TuiMsg::OpError(e) => {
                warn!(error = %e, "Terminal input error");
                self.notice = Some(Notice::error(format!("Error: {e}")));
                self.dirty = true;
            }
            TuiMsg::Tick => {
                if self.busy {
                    self.spin_idx = (self.spin_idx + 1) % BRAILLE_FRAMES.len();
                    self.dirty = true;
                }
                if self.dirty || self.last_tick.elapsed() >= self.tick_rate {
                    self.draw()?;
                    self.last_tick = Instant::now();
                    self.dirty = false;
                }
            }
            TuiMsg::Shutdown => return Ok(false),
        }
        Ok(true)
    }

    pub async fn apply(&mut self, action: Action) -> Result<bool> {
        debug!(?action, "Key action");
        let selected_id = self
            .inbox
            .view()
            .cards()
            .get(self.selected)
            .map(|c| c.id.clone());

        match (action, selected_id) {
            (Action::Quit, _) => return Ok(false),
            (Action::DismissNotice, _) => self.notice = None,
            (Action::SelectPrev, _) => self.selected = self.selected.saturating_sub(1),
            (Action::SelectNext, _) => self.selected = self.selected.saturating_add(1),
            (Action::Refresh, _) => self.run_refresh().await?,
            (Action::ArchiveAll, _) if self.inbox.view().has_archive_all() => {
                self.start_busy()?;
                let result = self.inbox.archive_all().await.map(|_| ());
                self.finish("archive posts", result);
            }
            (Action::ToggleContent, Some(id)) => {
                let result = self.inbox.toggle_content(&id).map(|_| ());
                self.finish("expand post", result);
            }
            (Action::Archive, Some(id)) => {
                self.start_busy()?;
                let result = self.inbox.archive(&id).await;
                self.finish("archive post", result);
            }
            (Action::ToggleFavorite, Some(id)) => match self.inbox.begin_favorite(&id) {
                Ok(action) => {
                    self.start_busy()?;
                    let result = self.inbox.complete_favorite(&id, action).await.map(|_| ());
                    self.finish("update favorite", result);
                }
                Err(e) => self.finish("update favorite", Err(e)),
            },
            (Action::Share, Some(id)) => {
                self.start_busy()?;
                let notice = self.inbox.share(&id).await;
                self.busy = false;
                self.notice = Some(notice);
            }
            // post actions with nothing selected
            _ => {}
        }
        self.clamp_selection();
        self.dirty = true;
        Ok(true)
    }

    async fn run_refresh(&mut self) -> Result<()> {
        self.start_busy()?;
        let result = self.inbox.refresh().await;
        self.finish("refresh", result);
        self.clamp_selection();
        Ok(())
    }

    /// Show the busy state right away; the action will block the loop.
    fn start_busy(&mut self) -> Result<()> {
        self.busy = true;
        self.draw()
    }

    fn finish(&mut self, action: &str, result: Result<(), ClientError>) {
        self.busy = false;
        self.dirty = true;
        if let Err(e) = result {
            self.notice = Some(Notice::failure(action, &e));
        }
    }

    fn clamp_selection(&mut self) {
        let count = self.inbox.view().cards().len();
        self.selected = self.selected.min(count.saturating_sub(1));
    }

    fn spinner(&self) -> &'static str {
        if self.busy {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    fn draw(&mut self) -> Result<()> {
        let snap = ViewSnap {
            view: self.inbox.view().clone(),
            selected: self.selected,
            loaded: self.inbox.is_loaded(),
            busy: self.busy,
            spinner: self.spinner(),
            notice: self.notice.clone(),
        };

        view::draw(&mut self.term, &snap)
    }
}
