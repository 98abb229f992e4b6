//! Legislation corpus builder.
//!
//! Public API:
//! - [`SefazPortal`]: POSTs the SharePoint search query for a keyword.
//! - [`recover_payload`]: slices the first `[` .. last `]` of a response and parses it.
//! - [`extract_passages`]: typed walk that collects `ResultRows` into numbered passages.
//! - [`CorpusBuilder`]: runs the above, embeds every passage in one batch and persists
//!   the index through `legis_store`.

pub mod builder;
pub mod config;
pub mod errors;
pub mod payload;
pub mod portal;
pub mod visitor;

pub use builder::{CorpusBuilder, CorpusOutcome};
pub use config::PortalConfig;
pub use errors::CorpusError;
pub use payload::recover_payload;
pub use portal::{LegislationSource, SefazPortal, SourceFuture, query_body};
pub use visitor::{Node, extract_passages, walk};
