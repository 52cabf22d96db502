//! Publish/subscribe observation over the ledger store.
//!
//! # Responsibility
//! - Keep live queries current: a write publishes a `StoreChange`, each
//!   affected query recomputes against the connection and pushes the fresh
//!   value to its subscriber.
//! - Prune subscribers that have gone away.
//!
//! # Invariants
//! - Subscribers are independent and never block one another.
//! - Attaching a query emits an initial value immediately.
//! - Recompute failures are logged and keep the subscription alive; only a
//!   gone subscriber removes it.

use log::warn;
use rusqlite::Connection;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::model::cycle::{Cycle, CycleId};
use crate::model::digest::CycleDigest;
use crate::repo::cycle_repo::{CycleRepository, RepoResult, SqliteCycleRepository};
use crate::repo::entry_repo::{ExpenseRepository, SqliteExpenseRepository};

/// A change published after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// A cycle was created, edited or deleted.
    Cycles,
    /// Entries under one cycle changed.
    Entries { cycle_id: CycleId },
}

/// Receiving half of a live query subscription.
///
/// Dropping the watch unsubscribes; the hub prunes it on the next publish.
pub struct Watch<T> {
    rx: Receiver<T>,
}

impl<T> Watch<T> {
    /// Blocks for the next published value. `None` once the hub is gone.
    pub fn next(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Blocks for at least one value, then drains to the most recent.
    pub fn latest(&self) -> Option<T> {
        let mut latest = self.rx.recv().ok()?;
        while let Ok(newer) = self.rx.try_recv() {
            latest = newer;
        }
        Some(latest)
    }

    /// Non-blocking probe for an already-published value.
    pub fn try_next(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

/// One registered live query.
trait LiveQuery: Send {
    fn touched_by(&self, change: &StoreChange) -> bool;
    /// Recomputes and pushes the current value. `false` when the
    /// subscriber has gone away.
    fn publish(&self, conn: &Connection) -> bool;
}

struct CyclesQuery {
    tx: Sender<Vec<Cycle>>,
}

impl LiveQuery for CyclesQuery {
    fn touched_by(&self, change: &StoreChange) -> bool {
        matches!(change, StoreChange::Cycles)
    }

    fn publish(&self, conn: &Connection) -> bool {
        match list_cycles(conn) {
            Ok(cycles) => self.tx.send(cycles).is_ok(),
            Err(err) => {
                warn!("event=watch_publish module=watch status=error query=cycles error={err}");
                true
            }
        }
    }
}

struct DigestQuery {
    cycle_id: CycleId,
    tx: Sender<Option<CycleDigest>>,
}

impl LiveQuery for DigestQuery {
    fn touched_by(&self, change: &StoreChange) -> bool {
        match change {
            StoreChange::Cycles => true,
            StoreChange::Entries { cycle_id } => *cycle_id == self.cycle_id,
        }
    }

    fn publish(&self, conn: &Connection) -> bool {
        match compute_digest(conn, self.cycle_id) {
            Ok(digest) => self.tx.send(digest).is_ok(),
            Err(err) => {
                warn!(
                    "event=watch_publish module=watch status=error query=digest cycle_id={} error={err}",
                    self.cycle_id
                );
                true
            }
        }
    }
}

fn list_cycles(conn: &Connection) -> RepoResult<Vec<Cycle>> {
    SqliteCycleRepository::try_new(conn)?.list_cycles()
}

/// Recombines the cycle record, its expense list and the current total.
///
/// `None` when the cycle has been deleted or never existed.
pub fn compute_digest(conn: &Connection, cycle_id: CycleId) -> RepoResult<Option<CycleDigest>> {
    let cycle_repo = SqliteCycleRepository::try_new(conn)?;
    let Some(cycle) = cycle_repo.get_cycle(cycle_id)? else {
        return Ok(None);
    };

    let entry_repo = SqliteExpenseRepository::try_new(conn)?;
    let expenses = entry_repo.list_for_cycle(cycle_id)?;
    Ok(Some(CycleDigest::assemble(cycle, expenses)))
}

/// Registry of live queries, owned alongside the store connection.
#[derive(Default)]
pub struct WatchHub {
    queries: Vec<Box<dyn LiveQuery>>,
}

impl WatchHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.queries.len()
    }

    /// Subscribes to the ordered list of all cycles.
    pub fn watch_cycles(&mut self, conn: &Connection) -> Watch<Vec<Cycle>> {
        let (tx, rx) = mpsc::channel();
        let query = CyclesQuery { tx };
        query.publish(conn);
        self.queries.push(Box::new(query));
        Watch { rx }
    }

    /// Subscribes to the digest of one cycle.
    pub fn watch_digest(
        &mut self,
        conn: &Connection,
        cycle_id: CycleId,
    ) -> Watch<Option<CycleDigest>> {
        let (tx, rx) = mpsc::channel();
        let query = DigestQuery { cycle_id, tx };
        query.publish(conn);
        self.queries.push(Box::new(query));
        Watch { rx }
    }

    /// Recomputes and pushes every query affected by `change`.
    pub fn publish(&mut self, conn: &Connection, change: &StoreChange) {
        self.queries
            .retain(|query| !query.touched_by(change) || query.publish(conn));
    }
}
