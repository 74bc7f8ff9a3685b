//! Process-wide, lazily loaded boundary.

use field_common::FieldResult;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::Boundary;

/// Read-only handle to a boundary loaded on first use.
///
/// Once loaded the boundary is never invalidated or mutated, so clones of the
/// returned `Arc` can be shared across requests without locking. A failed load
/// is not remembered; the next call tries again.
#[derive(Debug)]
pub struct BoundaryProvider {
    path: PathBuf,
    cell: OnceCell<Arc<Boundary>>,
}

impl BoundaryProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// A provider that is already initialised with `boundary`.
    pub fn preloaded(boundary: Boundary) -> Self {
        Self {
            path: PathBuf::new(),
            cell: OnceCell::with_value(Arc::new(boundary)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The shared boundary, loading it on first call.
    pub fn get(&self) -> FieldResult<Arc<Boundary>> {
        self.cell
            .get_or_try_init(|| Boundary::load(&self.path).map(Arc::new))
            .cloned()
    }
}
