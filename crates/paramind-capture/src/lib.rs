//! # paramind-capture
//!
//! The note ingestion pipeline and the PARA tree cache.
//!
//! This crate provides:
//! - `CapturePipeline`: dedup → parallel enrichment → confidence-gated
//!   bucket resolution → exactly-once persistence → detached side effects
//! - `ParaTreeCache`: per-user, TTL-bounded cache of the bucket hierarchy
//!   with aggregated note counts and derived paths
//! - `TaskDispatcher`: bounded background execution for side effects with
//!   observable outcomes

pub mod clock;
pub mod connections;
pub mod dedup;
pub mod dispatcher;
pub mod enrich;
pub mod para_tree;
pub mod pipeline;
pub mod policy;
pub mod reorganize;

pub use clock::{Clock, ManualClock, SystemClock};
pub use connections::ConnectionDetector;
pub use dedup::DuplicateDetector;
pub use dispatcher::{TaskDispatcher, TaskEvent};
pub use enrich::{Enricher, Enrichment};
pub use para_tree::ParaTreeCache;
pub use pipeline::{CaptureOptions, CapturePipeline, CaptureResult};
pub use policy::{new_bucket_gate, resolve, BucketResolution};
pub use reorganize::ReorganizeTrigger;
