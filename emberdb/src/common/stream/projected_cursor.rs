use crate::collection::Document;
use crate::common::stream::document_cursor::{removal_not_supported, DocumentCursor, DocumentIter};
use crate::common::Value;
use crate::errors::{EmberError, EmberResult, ErrorKind};
use crate::field_separator;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A [DocumentCursor] whose documents are reduced to a projection shape.
/// Fields named by the shape but absent from a document are left out.
#[derive(Clone)]
pub struct ProjectedCursor {
    cursor: DocumentCursor,
    paths: Arc<Vec<String>>,
}

impl ProjectedCursor {
    pub(crate) fn new(cursor: DocumentCursor, shape: &Document) -> EmberResult<Self> {
        if shape.is_empty() {
            return Err(invalid_shape("projection shape cannot be empty"));
        }

        let separator = field_separator();
        let mut paths = Vec::new();
        collect_paths(shape, "", &separator, &mut paths)?;
        Ok(ProjectedCursor {
            cursor,
            paths: Arc::new(paths),
        })
    }

    pub fn iter(&self) -> ProjectedIter {
        ProjectedIter {
            inner: self.cursor.iter(),
            paths: self.paths.clone(),
        }
    }

    pub fn size(&self) -> usize {
        self.cursor.size()
    }

    pub fn total_count(&self) -> usize {
        self.cursor.total_count()
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more()
    }

    pub fn first(&self) -> EmberResult<Option<Document>> {
        self.iter().next().transpose()
    }

    pub fn to_vec(&self) -> EmberResult<Vec<Document>> {
        self.iter().collect()
    }
}

impl Debug for ProjectedCursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectedCursor")
            .field("size", &self.size())
            .field("total_count", &self.total_count())
            .field("has_more", &self.has_more())
            .field("paths", &self.paths)
            .finish()
    }
}

impl<'a> IntoIterator for &'a ProjectedCursor {
    type Item = EmberResult<Document>;
    type IntoIter = ProjectedIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct ProjectedIter {
    inner: DocumentIter,
    paths: Arc<Vec<String>>,
}

impl ProjectedIter {
    pub fn remove(&mut self) -> EmberResult<()> {
        Err(removal_not_supported())
    }
}

impl Iterator for ProjectedIter {
    type Item = EmberResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        let document = match self.inner.next()? {
            Ok(document) => document,
            Err(err) => return Some(Err(err)),
        };
        Some(project(&document, &self.paths))
    }
}

fn project(document: &Document, paths: &[String]) -> EmberResult<Document> {
    let mut projected = Document::new();
    for path in paths {
        // unresolvable paths project to nothing
        if let Ok(Some(value)) = document.get(path) {
            projected.put(path, value)?;
        }
    }
    Ok(projected)
}

/// Leaf paths of `shape`, `_id` included. Every leaf must be null.
fn collect_paths(
    shape: &Document,
    prefix: &str,
    separator: &str,
    paths: &mut Vec<String>,
) -> EmberResult<()> {
    for (key, value) in shape.iter() {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}{}{}", prefix, separator, key)
        };

        match value {
            Value::Null => paths.push(path),
            Value::Document(nested) if !nested.is_empty() => {
                collect_paths(nested, &path, separator, paths)?
            }
            other => {
                return Err(invalid_shape(&format!(
                    "projection field {} must be null or a non-empty document, found {}",
                    path,
                    other.kind_name()
                )))
            }
        }
    }
    Ok(())
}

fn invalid_shape(message: &str) -> EmberError {
    log::warn!("Invalid projection: {}", message);
    EmberError::new(message, ErrorKind::ValidationError)
}
