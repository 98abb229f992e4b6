//! Vector store for legislation passages.
//!
//! Public API:
//! - [`FlatL2Index`]: exhaustive squared-L2 nearest-neighbor index.
//! - [`persist::save`] / [`persist::load`]: index file plus `_metadados.json` sidecar,
//!   position-aligned with passage ids.
//! - [`retrieve`] / [`search_keyword`] and [`format_results`]: ranked retrieval and
//!   its plain-text rendering.
//! - [`EmbeddingsProvider`]: seam for the embedding backend.

pub mod embed;
pub mod errors;
pub mod flat_index;
pub mod persist;
pub mod record;
pub mod retrieve;

pub use embed::{EmbeddingsProvider, embed_one, service::ServiceEmbedder};
pub use errors::StoreError;
pub use flat_index::FlatL2Index;
pub use persist::{IndexPaths, LoadedIndex};
pub use record::{Neighbor, Passage, RetrievalResult};
pub use retrieve::{DEFAULT_TOP_K, format_results, retrieve, search_keyword};
