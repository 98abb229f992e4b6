//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// One retrievable unit of legal text.
///
/// `id` equals the row position of the passage's vector in the index.
/// `conteudo` is the full text blob that was embedded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: usize,
    pub path: String,
    pub conteudo: String,
}

/// Nearest-neighbor slot produced by the flat index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub id: usize,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
}

/// A passage annotated with its rank (1-based, ascending distance) and raw distance.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub rank: usize,
    #[serde(rename = "distancia_l2")]
    pub distance: f32,
    #[serde(flatten)]
    pub passage: Passage,
}
