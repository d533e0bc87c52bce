//! Orchestration layer for the wiki-to-pages sync
//!
//! This module provides the workflow driver and the filesystem steps it
//! runs between the two checkouts.

pub mod copy_filter;
pub mod pages_sync;
pub mod workspace;

// Re-export main types for convenience
pub use copy_filter::{CopyFilter, CopyReport, overlay_copy, prune_stale};
pub use pages_sync::{PagesSync, SyncOutcome, SyncReport, exit_code, marker_timestamp};
pub use workspace::Workspace;
