//! Typed recursive walk over the recovered payload and `ResultRows` extraction.

use legis_store::Passage;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Key whose list value holds the search hits.
pub const RESULT_ROWS_KEY: &str = "ResultRows";
pub const PATH_FIELD: &str = "Path";
pub const CONTENT_FIELD: &str = "PublishingPageContentOWSHTML";

/// A payload node viewed as a tagged union.
#[derive(Clone, Copy, Debug)]
pub enum Node<'a> {
    Mapping(&'a Map<String, Value>),
    List(&'a [Value]),
    Scalar(&'a Value),
}

impl<'a> From<&'a Value> for Node<'a> {
    fn from(v: &'a Value) -> Self {
        match v {
            Value::Object(m) => Node::Mapping(m),
            Value::Array(items) => Node::List(items),
            other => Node::Scalar(other),
        }
    }
}

/// What the walker does after a mapping entry has been visited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Walk into the entry's value, then continue with the next entry.
    Descend,
    /// The entry was consumed; skip the remaining entries of this mapping.
    LeaveMapping,
}

/// Callback for [`walk`].
pub trait Visitor<'a> {
    fn visit_entry(&mut self, key: &'a str, value: &'a Value) -> Flow;
}

/// Depth-first walk in document order. Scalars are leaves.
///
/// Depth is bounded by the JSON parser's recursion limit.
pub fn walk<'a, V: Visitor<'a>>(node: Node<'a>, visitor: &mut V) {
    match node {
        Node::Mapping(map) => {
            for (key, value) in map {
                match visitor.visit_entry(key, value) {
                    Flow::Descend => walk(Node::from(value), visitor),
                    Flow::LeaveMapping => return,
                }
            }
        }
        Node::List(items) => {
            for item in items {
                walk(Node::from(item), visitor);
            }
        }
        Node::Scalar(_) => {}
    }
}

/// Collects passages from every `ResultRows` list, numbering them from 0.
#[derive(Debug, Default)]
pub struct ResultRowsCollector {
    passages: Vec<Passage>,
    skipped: usize,
}

impl ResultRowsCollector {
    fn take_rows(&mut self, rows: &[Value]) {
        for row in rows {
            let Some(row) = row.as_object() else {
                self.skipped += 1;
                continue;
            };
            match (non_empty_str(row, PATH_FIELD), non_empty_str(row, CONTENT_FIELD)) {
                (Some(path), Some(content)) => {
                    let id = self.passages.len();
                    self.passages.push(Passage {
                        id,
                        path: path.to_string(),
                        conteudo: passage_text(path, content),
                    });
                }
                _ => self.skipped += 1,
            }
        }
    }

    /// Passages collected so far and the number of rows that were dropped.
    pub fn finish(self) -> (Vec<Passage>, usize) {
        (self.passages, self.skipped)
    }
}

impl<'a> Visitor<'a> for ResultRowsCollector {
    fn visit_entry(&mut self, key: &'a str, value: &'a Value) -> Flow {
        match (key, value) {
            (RESULT_ROWS_KEY, Value::Array(rows)) => {
                self.take_rows(rows);
                Flow::LeaveMapping
            }
            _ => Flow::Descend,
        }
    }
}

fn non_empty_str<'a>(row: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    row.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Text blob that gets embedded for one row.
pub fn passage_text(path: &str, content: &str) -> String {
    format!("PATH: {path}\nCONTEÚDO: {content}")
}

/// Walks `payload` and returns the passages of all `ResultRows` lists in document order.
///
/// Rows that are not objects, or that lack a non-empty string `Path` or
/// `PublishingPageContentOWSHTML`, are skipped. A `ResultRows` list is a leaf: its rows
/// are not searched for nested `ResultRows`, and the remaining keys of the mapping that
/// holds it are not visited.
pub fn extract_passages(payload: &Value) -> Vec<Passage> {
    let mut collector = ResultRowsCollector::default();
    walk(Node::from(payload), &mut collector);
    let (passages, skipped) = collector.finish();

    if skipped > 0 {
        warn!(target: "legis_corpus::extract", skipped, "rows without Path or content skipped");
    }
    debug!(target: "legis_corpus::extract", passages = passages.len(), "rows extracted");
    passages
}
