/// Live state client
///
/// Holds the persistent WebSocket connection to the bot process and keeps
/// the shared view current: dispatching pushed messages, reconnecting
/// with capped exponential backoff, and firing the one-shot HTTP fallback
/// fetch at startup. Transport failures never propagate to callers; they
/// surface only through the view's connection flag and last_error.

use anyhow::{anyhow, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};

use crate::backoff::Backoff;
use crate::fallback;
use crate::models::StreamEvent;
use crate::settings::{Config, WS_BACKOFF_FACTOR, WS_PING_INTERVAL};
use crate::view::{ConnectionState, SharedView};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct LiveStateClient {
    cfg: Config,
    view: SharedView,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    task: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl LiveStateClient {
    pub fn new(cfg: Config) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            cfg,
            view: SharedView::new(),
            shutdown_tx,
            shutdown_rx,
            task: tokio::sync::Mutex::new(None),
        }
    }

    /// Handle presentation layers read the view through
    pub fn view(&self) -> SharedView {
        self.view.clone()
    }

    /// Begin connection attempts and fire the one-shot fallback fetch
    /// concurrently. Idempotent: a no-op while already running. Never
    /// blocks on any network I/O.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return;
        }

        // Re-arm the shutdown flag when restarting after a stop()
        self.shutdown_tx.send_if_modified(|stopped| {
            if *stopped {
                *stopped = false;
                true
            } else {
                false
            }
        });

        tokio::spawn(fallback::fetch_once(
            self.cfg.clone(),
            self.view.clone(),
            self.shutdown_rx.clone(),
        ));

        *task = Some(tokio::spawn(run_loop(
            self.cfg.clone(),
            self.view.clone(),
            self.shutdown_rx.clone(),
        )));
    }

    /// Shut down: cancels any pending reconnect timer, requests closure of
    /// the open transport, and waits for the connection loop to exit. An
    /// in-flight fallback fetch is allowed to finish and its results are
    /// discarded.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);

        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.view
            .update(|v| v.set_connection(ConnectionState::Disconnected))
            .await;
    }
}

async fn run_loop(cfg: Config, view: SharedView, mut shutdown_rx: watch::Receiver<bool>) {
    let mut backoff = Backoff::new(cfg.backoff_base, WS_BACKOFF_FACTOR, cfg.backoff_max);

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        view.update(|v| v.set_connection(ConnectionState::Connecting))
            .await;

        // A closed shutdown channel means every sender is gone: the owning
        // client was dropped without an explicit stop(). Treat it exactly
        // like a stop so the loop cannot outlive its owner.
        let attempt = tokio::select! {
            result = connect_async(&cfg.ws_url) => result,
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
        };

        match attempt {
            Ok((ws, _)) => {
                backoff.reset();
                println!("🔌 Connected to bot stream at {}", cfg.ws_url);
                view.update(|v| {
                    let mut changed = v.set_connection(ConnectionState::Connected);
                    changed |= v.clear_error();
                    changed
                })
                .await;

                let closed = read_stream(ws, &view, &mut shutdown_rx).await;
                let error = closed.err().map(|e| e.to_string());
                view.update(|v| {
                    let mut changed = v.set_connection(ConnectionState::Disconnected);
                    if let Some(msg) = &error {
                        changed |= v.record_error(msg.clone());
                    }
                    changed
                })
                .await;
                if let Some(msg) = &error {
                    eprintln!("⚠️ Stream closed: {}. Reconnecting...", msg);
                }
            }
            Err(e) => {
                view.update(|v| {
                    let mut changed = v.set_connection(ConnectionState::Disconnected);
                    changed |= v.record_error(e.to_string());
                    changed
                })
                .await;
            }
        }

        if *shutdown_rx.borrow() {
            break;
        }

        // Exactly one reconnect timer outstanding; stop() cancels it
        let delay = backoff.next_delay();
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}

/// Pump one open connection until it closes, errors, or shutdown is
/// requested. Returns Ok(()) only on a shutdown-initiated close.
async fn read_stream(
    mut ws: WsStream,
    view: &SharedView,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> Result<()> {
    let mut ping = tokio::time::interval(WS_PING_INTERVAL);
    ping.tick().await; // first tick fires immediately; skip it

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    let _ = ws.close(None).await;
                    return Ok(());
                }
            }
            _ = ping.tick() => {
                ws.send(Message::Text(r#"{"type":"ping"}"#.to_string())).await?;
            }
            msg = ws.next() => {
                let msg = msg.ok_or_else(|| anyhow!("stream ended"))??;
                match msg {
                    Message::Text(text) => dispatch(&text, view).await,
                    Message::Binary(bin) => {
                        if let Ok(text) = String::from_utf8(bin) {
                            dispatch(&text, view).await;
                        }
                    }
                    Message::Ping(payload) => ws.send(Message::Pong(payload)).await?,
                    Message::Close(frame) => {
                        return Err(anyhow!("server closed connection: {:?}", frame));
                    }
                    _ => {}
                }
            }
        }
    }
}

async fn dispatch(raw: &str, view: &SharedView) {
    match StreamEvent::parse(raw) {
        Ok(event) => view.update(|v| v.apply_event(event)).await,
        // Malformed payloads are logged and dropped, never fatal
        Err(e) => eprintln!("⚠️ Dropping malformed message: {:#}", e),
    }
}
