/// Live dashboard view
///
/// Single owned container for everything a presentation layer reads:
/// connection status, the latest bot state snapshot, bounded trade and
/// action sequences, and the last transport error. All mutation goes
/// through the state client; subscribers get read-only snapshots plus a
/// change-generation watch channel.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use crate::models::{Action, BotState, StreamEvent, Trade};
use crate::settings::{MAX_ACTIONS, MAX_TRADES};

/// Streaming transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone)]
pub struct LiveView {
    pub connection: ConnectionState,
    pub state: Option<BotState>,
    /// Most recent trades in arrival order (newest last)
    pub trades: VecDeque<Trade>,
    /// Most recent actions, most-recent-first
    pub actions: VecDeque<Action>,
    pub last_error: Option<String>,
    /// True once the stream has populated `state`; late fallback responses
    /// must not overwrite streamed values
    state_from_stream: bool,
    /// Same guard for the actions sequence
    actions_from_stream: bool,
}

impl LiveView {
    pub fn new() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            state: None,
            trades: VecDeque::with_capacity(MAX_TRADES),
            actions: VecDeque::with_capacity(MAX_ACTIONS),
            last_error: None,
            state_from_stream: false,
            actions_from_stream: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Apply one dispatched stream message. Returns true if the view
    /// changed (drives the re-render signal).
    pub fn apply_event(&mut self, event: StreamEvent) -> bool {
        match event {
            StreamEvent::InitialState(snapshot) => {
                // Full snapshot replaces the view wholesale and
                // re-synchronizes after a reconnect
                self.state = snapshot.state;
                self.state_from_stream = true;

                let mut trades = snapshot.recent_trades;
                if trades.len() > MAX_TRADES {
                    trades.drain(..trades.len() - MAX_TRADES);
                }
                self.trades = trades.into_iter().collect();

                // The bot sends its action log in append order; the view
                // stores most-recent-first
                self.actions.clear();
                for action in snapshot.recent_actions.into_iter().rev().take(MAX_ACTIONS) {
                    self.actions.push_back(action);
                }
                self.actions_from_stream = true;

                true
            }
            StreamEvent::Trade(trade) => {
                self.trades.push_back(trade);
                if self.trades.len() > MAX_TRADES {
                    self.trades.pop_front();
                }
                true
            }
            StreamEvent::Action(action) => {
                self.actions.push_front(action);
                if self.actions.len() > MAX_ACTIONS {
                    self.actions.pop_back();
                }
                self.actions_from_stream = true;
                true
            }
            StreamEvent::StateUpdate(update) => match self.state.as_mut() {
                Some(state) => {
                    let changed = state.merge_update(&update);
                    self.state_from_stream = true;
                    changed
                }
                // No prior state to merge into
                None => false,
            },
            StreamEvent::Pong => false,
            StreamEvent::Unknown(_) => false,
        }
    }

    /// Merge a fallback-fetched state snapshot. Discarded once the stream
    /// has populated the state, so arrival order of stream vs. fallback
    /// never matters.
    pub fn apply_fallback_state(&mut self, state: BotState) -> bool {
        if self.state_from_stream {
            return false;
        }
        if self.state.as_ref() == Some(&state) {
            return false;
        }
        self.state = Some(state);
        true
    }

    /// Merge a fallback-fetched actions list (already most-recent-first).
    pub fn apply_fallback_actions(&mut self, actions: Vec<Action>) -> bool {
        if self.actions_from_stream {
            return false;
        }
        let incoming: VecDeque<Action> = actions.into_iter().take(MAX_ACTIONS).collect();
        if self.actions == incoming {
            return false;
        }
        self.actions = incoming;
        true
    }

    pub fn set_connection(&mut self, connection: ConnectionState) -> bool {
        if self.connection == connection {
            return false;
        }
        self.connection = connection;
        true
    }

    pub fn record_error(&mut self, message: String) -> bool {
        if self.last_error.as_deref() == Some(&message) {
            return false;
        }
        self.last_error = Some(message);
        true
    }

    pub fn clear_error(&mut self) -> bool {
        if self.last_error.is_none() {
            return false;
        }
        self.last_error = None;
        true
    }
}

impl Default for LiveView {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Shared handle
// ============================================================================

/// Shared, observable view handle
///
/// Wraps the view in an `Arc<RwLock>` with a watch channel carrying a
/// generation counter. The counter only advances when a mutation actually
/// changed the view, so no-op updates produce no re-render signal.
#[derive(Clone)]
pub struct SharedView {
    inner: Arc<RwLock<LiveView>>,
    change_tx: watch::Sender<u64>,
    change_rx: watch::Receiver<u64>,
}

impl SharedView {
    pub fn new() -> Self {
        let (change_tx, change_rx) = watch::channel(0u64);
        Self {
            inner: Arc::new(RwLock::new(LiveView::new())),
            change_tx,
            change_rx,
        }
    }

    /// Read lock on the current view
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, LiveView> {
        self.inner.read().await
    }

    /// Owned snapshot for consumers that must not hold the lock
    pub async fn snapshot(&self) -> LiveView {
        self.inner.read().await.clone()
    }

    /// Mutate the view; the closure reports whether anything changed and
    /// subscribers are only notified when it did.
    pub async fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut LiveView) -> bool,
    {
        let changed = {
            let mut guard = self.inner.write().await;
            mutate(&mut guard)
        };
        if changed {
            // send_modify increments under the channel's own lock, so
            // concurrent updaters cannot collapse two bumps into one
            self.change_tx.send_modify(|generation| *generation += 1);
        }
    }

    /// Receiver yielding generation counters, one bump per real change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.change_rx.clone()
    }

    pub fn generation(&self) -> u64 {
        *self.change_rx.borrow()
    }
}

impl Default for SharedView {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
