// # rrsync-core
//
// Record set reconciliation over RFC2136 dynamic DNS updates.
//
// ## Architecture Overview
//
// - **record**: Canonical values, per-kind codecs and presentation orderings
// - **diff**: Set difference between previous and desired values
// - **update**: Update transactions (removals, then insertions)
// - **exchange**: Sending transactions with datagram → stream escalation
// - **reader**: Reading authoritative state back into canonical form
// - **engine**: Create/read/update/delete lifecycle with identity handling
// - **DnsClient**: Trait for the opaque server handle
//
// ## Design Principles
//
// 1. **Explicit client**: The server handle is passed in, never global
// 2. **Stateless**: Nothing is cached between calls; callers own state
// 3. **Deterministic**: Same inputs yield the same transaction text
// 4. **Structured errors**: Failures carry their context as fields

pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod reader;
pub mod record;
pub mod traits;
pub mod update;

// Re-export core types for convenience
pub use config::{ClientConfig, ReconcileConfig, RecordSetConfig};
pub use diff::{RecordDiff, diff};
pub use engine::{ApplyOutcome, RecordSetEngine, RecordSetState};
pub use error::{Error, Result};
pub use exchange::{ExchangeResult, execute};
pub use reader::{lookup_services, read};
pub use record::{RecordKind, RecordSet, RecordSetKey, RecordValue, ServiceTarget, ValueSet};
pub use traits::{DnsClient, DnsClientFactory, Transport};
pub use update::{UpdateEntry, UpdateTransaction, build as build_transaction};
