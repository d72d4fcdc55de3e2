//! # Dispatcher
//!
//! Per-message state machine: classify → dedup (transactions only) →
//! persist → log. State is implicit per hash and derived from store
//! queries, so the store stays the single source of truth; the only
//! in-memory state is the recent-transaction cache.

use log::{debug, info, warn};

use crate::error::MonitorError;
use crate::lock_store::LockStore;
use crate::notification::{classify, RawNotification, Topic};
use crate::recent_tx_cache::RecentTxCache;

/// What processing a single notification did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// New block record inserted.
    BlockInserted,
    /// Existing block's ChainLock columns updated.
    BlockLockUpdated,
    /// `hashblock` for an already-stored block; nothing written.
    BlockUnchanged,
    /// New transaction record inserted.
    TxInserted,
    /// Existing transaction's InstantLock columns updated.
    TxLockUpdated,
    /// `hashtx` for an already-stored transaction; nothing written.
    TxUnchanged,
    /// Duplicate `hashtx` suppressed by the recent cache; nothing written.
    DuplicateSkipped,
    /// Topic outside the subscription filter; dropped.
    Ignored,
}

pub struct Dispatcher {
    store: LockStore,
    recent: RecentTxCache,
}

impl Dispatcher {
    pub fn new(store: LockStore, recent: RecentTxCache) -> Self {
        Self { store, recent }
    }

    /// Process one raw notification end to end.
    pub async fn process(&mut self, raw: &RawNotification) -> Result<DispatchOutcome, MonitorError> {
        let event = match classify(raw) {
            Some(event) => event,
            None => {
                debug!(
                    "Ignoring unsubscribed topic {:?} (sequence {})",
                    String::from_utf8_lossy(&raw.topic),
                    raw.sequence_label()
                );
                return Ok(DispatchOutcome::Ignored);
            }
        };

        info!(
            "{}\tTopic received: {}\tData: {}\tSequence: {}",
            event.observed_at,
            event.topic.as_str(),
            event.hash,
            raw.sequence_label()
        );

        let outcome = if event.topic.is_block_scoped() {
            if self.store.block_exists(&event.hash).await? {
                if event.topic == Topic::HashChainLock {
                    self.store
                        .update_block_lock(true, event.observed_at, &event.hash)
                        .await?;
                    DispatchOutcome::BlockLockUpdated
                } else {
                    // Re-seen block without a lock: the first-seen record
                    // stands, and ChainLock must never regress.
                    DispatchOutcome::BlockUnchanged
                }
            } else {
                self.store
                    .insert_block_seen(
                        &event.hash,
                        event.lock_status(),
                        event.observed_at,
                        event.lock_seen_at(),
                    )
                    .await?;
                DispatchOutcome::BlockInserted
            }
        } else {
            if event.topic == Topic::HashTx {
                if self.recent.contains(&event.hash) {
                    debug!(
                        "Skipping {} - already processed ({} tracked)",
                        event.hash,
                        self.recent.len()
                    );
                    self.recent.forget(&event.hash);
                    if self.recent.len() > self.recent.capacity() {
                        self.recent.evict_oldest();
                    }
                    return Ok(DispatchOutcome::DuplicateSkipped);
                }
                self.recent.record(&event.hash);
                debug!("Tracking {} ({} tracked)", event.hash, self.recent.len());
            }

            if self.store.tx_exists(&event.hash).await? {
                if event.topic == Topic::HashTxLock {
                    self.store
                        .update_tx_lock(true, event.observed_at, &event.hash)
                        .await?;
                    DispatchOutcome::TxLockUpdated
                } else {
                    // Lock-absent re-seen transaction: deliberately no
                    // write, not even a seen-time refresh.
                    DispatchOutcome::TxUnchanged
                }
            } else {
                self.store
                    .insert_tx_seen(
                        &event.hash,
                        event.lock_status(),
                        event.observed_at,
                        event.lock_seen_at(),
                    )
                    .await?;
                DispatchOutcome::TxInserted
            }
        };

        debug!("{} -> {:?}", event.hash, outcome);
        Ok(outcome)
    }

    /// Process a notification under the service's per-message failure
    /// policy: malformed messages and storage failures are logged (with the
    /// attempted record attached) and the loop continues.
    pub async fn process_logged(&mut self, raw: &RawNotification) -> Option<DispatchOutcome> {
        match self.process(raw).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("Dropping notification: {:#}", anyhow::Error::new(e));
                None
            }
        }
    }

    pub fn store(&self) -> &LockStore {
        &self.store
    }

    pub fn recent(&self) -> &RecentTxCache {
        &self.recent
    }
}
