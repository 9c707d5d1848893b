//! Serialized declaration write path.
//!
//! The bare admission entry points are read-then-decide: two concurrent
//! writes in one namespace can each see a registry without the other's keys
//! and both be admitted. `AdmissionRuntime` closes that window by admitting
//! and committing declaration writes on single-writer shards. A namespace
//! maps to exactly one shard (stable `blake3` hash), so every write for that
//! namespace is listed, checked and stored by one thread, in submission
//! order.
//!
//! Queues are bounded; a full queue is reported to the caller instead of
//! blocking it.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use serde::{Deserialize, Serialize};

use crate::admission::{AdmissionController, Decision};
use crate::config::RuntimeConfig;
use crate::declaration::{Declaration, ObjectRef};
use crate::engine::DuplicatePolicy;
use crate::error::{ExecutionError, KeyReserveError, KeyReserveResult};
use crate::events::ResolutionEvent;
use crate::storage::DeclarationStore;

/// A declaration write to admit and commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "target", rename_all = "snake_case")]
pub enum DeclarationWrite {
    /// Create or update.
    Upsert(Declaration),
    /// Remove.
    Delete(ObjectRef),
}

impl DeclarationWrite {
    /// Namespace the write applies to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::Upsert(d) => d.namespace(),
            Self::Delete(target) => &target.namespace,
        }
    }
}

/// Result of a committed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The declaration was stored.
    Committed {
        /// The stored copy, carrying its new revision.
        declaration: Declaration,
        /// Keys dropped before commit (`DuplicatePolicy::Drop` only).
        warnings: Vec<String>,
    },
    /// The declaration was removed.
    Deleted {
        /// The removed declaration.
        target: ObjectRef,
    },
}

enum Job {
    Write {
        write: DeclarationWrite,
        reply: Sender<KeyReserveResult<WriteOutcome>>,
    },

    #[cfg(test)]
    Sleep {
        duration: Duration,
        reply: Sender<()>,
    },
}

/// Maps a namespace to a shard index in `0..shards`.
#[must_use]
pub fn shard_for(namespace: &str, shards: usize) -> usize {
    let hash = blake3::hash(namespace.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    #[allow(clippy::cast_possible_truncation)]
    let index = (u64::from_le_bytes(prefix) % shards.max(1) as u64) as usize;
    index
}

fn apply_write<S: DeclarationStore + ?Sized>(
    controller: &AdmissionController<S>,
    policy: DuplicatePolicy,
    write: DeclarationWrite,
) -> KeyReserveResult<WriteOutcome> {
    let candidate = match write {
        DeclarationWrite::Delete(target) => {
            controller.store().delete(&target)?;
            tracing::info!(object = %target, "declaration deleted");
            return Ok(WriteOutcome::Deleted { target });
        }
        DeclarationWrite::Upsert(candidate) => candidate,
    };

    // One listing per write. The shard is the namespace's only writer, so the
    // mutated key list cannot conflict with the snapshot it was resolved on.
    let (candidate, events) = match policy {
        DuplicatePolicy::Drop => {
            let outcome = controller.on_declaration_mutate(candidate)?;
            (outcome.declaration, outcome.events)
        }
        DuplicatePolicy::Reject => {
            if let Decision::Reject { violation } = controller.on_declaration_validate(&candidate)? {
                return Err(violation.into());
            }
            (candidate, Vec::new())
        }
    };

    let declaration = controller.store().put(candidate)?;
    tracing::info!(
        object = %declaration.meta,
        revision = declaration.revision,
        keys = declaration.keys.len(),
        "declaration committed"
    );
    Ok(WriteOutcome::Committed {
        declaration,
        warnings: events.iter().map(ResolutionEvent::warning).collect(),
    })
}

struct Shard {
    index: usize,
    tx: Sender<Job>,
    worker: JoinHandle<()>,
    queue_capacity: usize,
}

impl Shard {
    fn start<S>(
        index: usize,
        queue_capacity: usize,
        controller: AdmissionController<S>,
        policy: DuplicatePolicy,
    ) -> KeyReserveResult<Self>
    where
        S: DeclarationStore + ?Sized + 'static,
    {
        let (tx, rx) = bounded::<Job>(queue_capacity);
        let worker = thread::Builder::new()
            .name(format!("keyreserve-shard-{index}"))
            .spawn(move || {
                tracing::debug!(shard = index, "shard worker started");
                loop {
                    match rx.recv() {
                        Ok(Job::Write { write, reply }) => {
                            let result = apply_write(&controller, policy, write);
                            let _ = reply.send(result);
                        }
                        Err(_) => break,

                        #[cfg(test)]
                        Ok(Job::Sleep { duration, reply }) => {
                            thread::sleep(duration);
                            let _ = reply.send(());
                        }
                    }
                }
                tracing::debug!(shard = index, "shard worker stopped");
            })
            .map_err(|e| KeyReserveError::internal(format!("failed to spawn shard {index}: {e}")))?;

        Ok(Self {
            index,
            tx,
            worker,
            queue_capacity,
        })
    }

    fn try_submit(&self, job: Job) -> Result<(), KeyReserveError> {
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(KeyReserveError::Execution(ExecutionError::QueueFull {
                shard: self.index,
                capacity: self.queue_capacity,
            })),
            Err(TrySendError::Disconnected(_)) => {
                Err(KeyReserveError::Execution(ExecutionError::Disconnected { shard: self.index }))
            }
        }
    }

    fn shutdown(self) {
        // Close the channel: the worker drains queued writes then exits.
        drop(self.tx);
        let _ = self.worker.join();
    }
}

/// Handle returned by `AdmissionRuntime::submit`.
pub struct WriteHandle {
    shard: usize,
    rx: Receiver<KeyReserveResult<WriteOutcome>>,
}

impl WriteHandle {
    /// The shard the write was queued on.
    #[must_use]
    pub const fn shard(&self) -> usize {
        self.shard
    }

    /// Waits for the write to complete.
    pub fn join(self) -> KeyReserveResult<WriteOutcome> {
        let shard = self.shard;
        self.rx
            .recv()
            .map_err(|_| KeyReserveError::Execution(ExecutionError::Disconnected { shard }))?
    }

    /// Waits for the write to complete with a timeout.
    ///
    /// A timed out write may still commit later.
    pub fn join_timeout(self, timeout: Duration) -> KeyReserveResult<WriteOutcome> {
        let shard = self.shard;
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => KeyReserveError::Execution(ExecutionError::Timeout {
                duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            }),
            RecvTimeoutError::Disconnected => {
                KeyReserveError::Execution(ExecutionError::Disconnected { shard })
            }
        })?
    }
}

/// Admits and commits declaration writes on per-namespace single-writer shards.
pub struct AdmissionRuntime<S: DeclarationStore + ?Sized + 'static> {
    controller: AdmissionController<S>,
    shards: Vec<Shard>,
    config: RuntimeConfig,
}

impl<S: DeclarationStore + ?Sized + 'static> AdmissionRuntime<S> {
    /// Validate `config` and start one worker thread per shard.
    pub fn start(store: Arc<S>, config: RuntimeConfig) -> KeyReserveResult<Self> {
        config.validate()?;
        let controller = AdmissionController::new(store);

        let mut shards = Vec::with_capacity(config.shards);
        for index in 0..config.shards {
            let shard = Shard::start(
                index,
                config.queue_capacity,
                controller.clone(),
                config.write_policy,
            );
            match shard {
                Ok(shard) => shards.push(shard),
                Err(e) => {
                    for started in shards {
                        started.shutdown();
                    }
                    return Err(e);
                }
            }
        }

        tracing::info!(
            shards = config.shards,
            queue_capacity = config.queue_capacity,
            write_policy = ?config.write_policy,
            "admission runtime started"
        );
        Ok(Self {
            controller,
            shards,
            config,
        })
    }

    /// Shard index for `namespace`.
    #[must_use]
    pub fn shard_of(&self, namespace: &str) -> usize {
        shard_for(namespace, self.shards.len())
    }

    /// Queue a write on its namespace's shard.
    pub fn submit(&self, write: DeclarationWrite) -> KeyReserveResult<WriteHandle> {
        let shard = self.shard_of(write.namespace());
        let (tx, rx) = bounded::<KeyReserveResult<WriteOutcome>>(1);
        self.shard(shard)?.try_submit(Job::Write { write, reply: tx })?;
        Ok(WriteHandle { shard, rx })
    }

    /// Queue a write and wait for it, bounded by the configured join timeout.
    pub fn write(&self, write: DeclarationWrite) -> KeyReserveResult<WriteOutcome> {
        self.submit(write)?.join_timeout(self.config.join_timeout())
    }

    /// The controller, for read-only checks (configuration guard, reconcile).
    #[must_use]
    pub fn controller(&self) -> &AdmissionController<S> {
        &self.controller
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    fn shard(&self, index: usize) -> KeyReserveResult<&Shard> {
        self.shards
            .get(index)
            .ok_or_else(|| KeyReserveError::internal(format!("no shard at index {index}")))
    }

    #[cfg(test)]
    fn submit_sleep(&self, shard: usize, duration: Duration) -> KeyReserveResult<Receiver<()>> {
        let (tx, rx) = bounded::<()>(1);
        self.shard(shard)?.try_submit(Job::Sleep { duration, reply: tx })?;
        Ok(rx)
    }
}

impl<S: DeclarationStore + ?Sized + 'static> Drop for AdmissionRuntime<S> {
    fn drop(&mut self) {
        for shard in self.shards.drain(..) {
            shard.shutdown();
        }
    }
}
