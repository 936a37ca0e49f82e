//! Record set lifecycle
//!
//! The RecordSetEngine is responsible for:
//! - Planning the update transaction that moves observed state to desired state
//! - Applying it through the exchanger
//! - Reading back server-authoritative state after every change
//! - Deciding when the caller's stored identity must be forgotten
//!
//! ## Architecture
//!
//! ```text
//!  desired ──┐
//!            ├─▶ RecordDiff ─▶ UpdateTransaction ─▶ execute ─┐
//!  observed ─┘                                               │
//!     ▲                                                      ▼
//!     └──────────────────────── read ◀───────────────── DnsClient
//! ```
//!
//! ## Identity
//!
//! The engine keeps nothing between calls. The caller owns a
//! [`RecordSetState`] per record set and passes it to every operation:
//!
//! 1. `create` assigns the identity (the record set's FQDN)
//! 2. A read that finds nothing clears it
//! 3. A rejected update clears it
//! 4. A transport failure keeps it; the outcome is unknown and the next
//!    read decides. `update` and `delete` perform that read themselves
//!    when they find an identity without observed state
//! 5. `delete` clears it after the removals are accepted

use crate::diff::RecordDiff;
use crate::error::Result;
use crate::exchange::execute;
use crate::reader::read;
use crate::record::{RecordKind, RecordSet, RecordSetKey, ValueSet};
use crate::traits::DnsClient;
use crate::update::{UpdateTransaction, build};
use tracing::{debug, info, warn};

/// Caller-owned state of one managed record set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSetState {
    /// Identity of the record set, `None` when it is not (known to be) managed
    pub id: Option<String>,

    /// Last state read from the server
    pub observed: Option<RecordSet>,

    /// Record set the identity refers to, kept so that a later operation
    /// can re-read it when `observed` is unknown
    pub target: Option<(RecordSetKey, RecordKind)>,
}

impl RecordSetState {
    /// State for a record set that has never been applied
    pub fn new() -> Self {
        Self::default()
    }

    fn forget(&mut self) {
        self.id = None;
        self.observed = None;
        self.target = None;
    }

    /// Identity is held but the server state behind it was never confirmed
    fn is_unconfirmed(&self) -> bool {
        self.id.is_some() && self.observed.is_none()
    }
}

/// Result of a lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The record set was created
    Created {
        /// Number of values inserted
        added: usize,
    },
    /// Values were removed and/or inserted
    Updated {
        /// Number of values removed
        removed: usize,
        /// Number of values inserted
        added: usize,
    },
    /// The record set was moved to a new zone or name
    Replaced,
    /// Observed state already matched (no-op)
    Unchanged,
    /// The record set was removed
    Deleted {
        /// Number of values removed
        removed: usize,
    },
}

/// Lifecycle engine for record sets on one DNS server
///
/// ## Threading
///
/// The engine holds no mutable state. Independent record sets may be driven
/// concurrently from separate tasks sharing one engine.
pub struct RecordSetEngine {
    /// Client for the server holding the zones
    client: Box<dyn DnsClient>,
}

impl RecordSetEngine {
    /// Create a new engine on top of a configured client
    pub fn new(client: Box<dyn DnsClient>) -> Self {
        Self { client }
    }

    /// The client handle, for direct reads and exchanges
    pub fn client(&self) -> &dyn DnsClient {
        self.client.as_ref()
    }

    /// Compute the transaction that moves `observed` to `desired`
    ///
    /// Nothing is sent. When the observed TTL differs from the declared one,
    /// every value is rewritten so the record set ends up with the new TTL.
    pub fn plan(&self, desired: &RecordSet, observed: Option<&RecordSet>) -> Result<UpdateTransaction> {
        let previous = observed.map(RecordSet::value_set).unwrap_or_default();
        let wanted = desired.value_set();

        let diff = match observed {
            Some(current) if current.ttl != desired.ttl && !wanted.is_empty() => {
                RecordDiff::replace_all(&previous, &wanted)
            }
            _ => RecordDiff::between(&previous, &wanted),
        };

        build(
            desired.key.zone(),
            desired.key.fqdn(),
            desired.ttl,
            desired.kind,
            &diff,
        )
    }

    /// Create a record set that is not managed yet
    ///
    /// Assigns the identity, inserts every desired value and reads the
    /// result back into `state`.
    pub async fn create(&self, state: &mut RecordSetState, desired: &RecordSet) -> Result<ApplyOutcome> {
        state.id = Some(desired.key.identity());
        state.observed = None;
        state.target = Some((desired.key.clone(), desired.kind));

        let transaction = self.plan(desired, None)?;
        let added = transaction.insertions.len();
        info!(fqdn = %desired.key.fqdn(), kind = %desired.kind, added, "creating record set");

        self.apply(state, &transaction).await?;
        self.refresh(state, &desired.key, desired.kind).await?;
        Ok(ApplyOutcome::Created { added })
    }

    /// Refresh `state` from the server
    ///
    /// Returns the observed record set; `None` means it no longer exists and
    /// the identity has been cleared.
    pub async fn refresh(
        &self,
        state: &mut RecordSetState,
        key: &RecordSetKey,
        kind: RecordKind,
    ) -> Result<Option<RecordSet>> {
        match read(key, kind, self.client()).await? {
            Some(observed) => {
                state.observed = Some(observed.clone());
                state.target = Some((key.clone(), kind));
                Ok(Some(observed))
            }
            None => {
                if state.id.is_some() {
                    info!(fqdn = %key.fqdn(), %kind, "record set vanished, clearing identity");
                }
                state.forget();
                Ok(None)
            }
        }
    }

    /// Bring a managed record set to `desired`
    ///
    /// The diff is computed against the last observed state in `state`. When
    /// an identity is held without observed state (a previous exchange had
    /// an unknown outcome) the server is read first; if the record set is
    /// gone it is created again. A changed zone or name removes the old
    /// record set first and creates the new one.
    pub async fn update(&self, state: &mut RecordSetState, desired: &RecordSet) -> Result<ApplyOutcome> {
        if state.is_unconfirmed() {
            let (key, kind) = state
                .target
                .clone()
                .unwrap_or_else(|| (desired.key.clone(), desired.kind));
            if self.refresh(state, &key, kind).await?.is_none() {
                return self.create(state, desired).await;
            }
        }

        if let Some(observed) = &state.observed
            && is_moved(observed, desired)
        {
            info!(
                from = %observed.key.fqdn(),
                to = %desired.key.fqdn(),
                "identity changed, replacing record set"
            );
            self.delete(state).await?;
            self.create(state, desired).await?;
            return Ok(ApplyOutcome::Replaced);
        }

        let transaction = self.plan(desired, state.observed.as_ref())?;
        if transaction.is_empty() {
            debug!(fqdn = %desired.key.fqdn(), kind = %desired.kind, "record set unchanged");
            return Ok(ApplyOutcome::Unchanged);
        }

        let removed = transaction.removals.len();
        let added = transaction.insertions.len();
        info!(fqdn = %desired.key.fqdn(), kind = %desired.kind, removed, added, "updating record set");

        self.apply(state, &transaction).await?;
        self.refresh(state, &desired.key, desired.kind).await?;
        Ok(ApplyOutcome::Updated { removed, added })
    }

    /// Remove every observed value of the record set and clear its identity
    ///
    /// An identity without observed state is re-read first, so values applied
    /// by an exchange with an unknown outcome are removed as well.
    pub async fn delete(&self, state: &mut RecordSetState) -> Result<ApplyOutcome> {
        if state.is_unconfirmed()
            && let Some((key, kind)) = state.target.clone()
        {
            self.refresh(state, &key, kind).await?;
        }

        let Some(observed) = state.observed.clone() else {
            state.forget();
            return Ok(ApplyOutcome::Deleted { removed: 0 });
        };

        let diff = RecordDiff::between(&observed.value_set(), &ValueSet::new());
        let transaction = build(
            observed.key.zone(),
            observed.key.fqdn(),
            observed.ttl,
            observed.kind,
            &diff,
        )?;
        let removed = transaction.removals.len();
        info!(fqdn = %observed.key.fqdn(), kind = %observed.kind, removed, "deleting record set");

        self.apply(state, &transaction).await?;
        state.forget();
        Ok(ApplyOutcome::Deleted { removed })
    }

    async fn apply(&self, state: &mut RecordSetState, transaction: &UpdateTransaction) -> Result<()> {
        match execute(transaction, self.client()).await {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.clears_identity() {
                    warn!(zone = %transaction.zone, error = %e, "update rejected, clearing identity");
                    state.forget();
                } else {
                    warn!(zone = %transaction.zone, error = %e, "update outcome unknown, keeping identity");
                }
                Err(e)
            }
        }
    }
}

// Names compare case-insensitively; the relative name string does not.
fn is_moved(observed: &RecordSet, desired: &RecordSet) -> bool {
    observed.key.zone() != desired.key.zone()
        || observed.key.fqdn() != desired.key.fqdn()
        || observed.kind != desired.kind
}

impl std::fmt::Debug for RecordSetEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSetEngine")
            .field("client", &self.client.client_name())
            .finish()
    }
}
