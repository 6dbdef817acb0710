use crate::tui::TuiMsg;
use crossterm::event;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::{self, signal, time};
use tracing::info;

/// How long one blocking poll waits for input before checking for shutdown.
const INPUT_POLL: Duration = Duration::from_millis(100);
const TICK: Duration = Duration::from_millis(80);

/// Feed terminal input, redraw ticks and termination signals into the TUI
/// loop until `shutdown` fires or the loop goes away.
pub fn spawn_tui_feeders(tui: mpsc::Sender<TuiMsg>, shutdown: &broadcast::Sender<()>) {
    let tui_in = tui.clone();
    let mut shutdown_input = shutdown.subscribe();
    tokio::spawn(async move {
        loop {
            let poll = tokio::task::spawn_blocking(|| -> std::io::Result<Option<event::Event>> {
                if event::poll(INPUT_POLL)? {
                    event::read().map(Some)
                } else {
                    Ok(None)
                }
            });
            tokio::select! {
                _ = shutdown_input.recv() => break,
                ev = poll => {
                    let sent = match ev {
                        Ok(Ok(Some(e))) => tui_in.send(TuiMsg::Input(e)).await,
                        Ok(Ok(None)) => Ok(()),
                        Ok(Err(e)) => tui_in.send(TuiMsg::OpError(format!("input: {e}"))).await,
                        Err(_) => break,
                    };
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let tui_tick = tui.clone();
    let mut shutdown_tick = shutdown.subscribe();
    tokio::spawn(async move {
        let mut interval = time::interval(TICK);
        loop {
            tokio::select! {
                _ = shutdown_tick.recv() => break,
                _ = interval.tick() => {
                    if tui_tick.is_closed() {
                        break;
                    }
                    let _ = tui_tick.try_send(TuiMsg::Tick);
                }
            }
        }
    });

    // raw mode swallows Ctrl+C as a key; this catches signals sent by others
    let tui_signal = tui;
    let mut shutdown_signal = shutdown.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_signal.recv() => {}
            _ = termination() => {
                let _ = tui_signal.send(TuiMsg::Shutdown).await;
            }
        }
    });
}

async fn termination() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received interrupt, closing inbox"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, closing inbox");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
