//! Scoped drawing surfaces backed by a thread-local pool.
//!
//! Rendering a sequence reuses the same frame size over and over, so
//! surfaces are cached per thread instead of allocated per frame. A surface
//! is only ever reachable inside [`with_surface`]; on every exit path
//! (success, error or panic) it is cleared and handed back to the pool.
//!
//! ```ignore
//! let raster = with_surface(800, 600, |pixmap| {
//!     pixmap.fill_path(...);
//!     Ok(Raster::from_pixmap(pixmap))
//! })?;
//! ```

use field_common::{FieldError, FieldResult};
use std::cell::RefCell;
use tiny_skia::{Color, Pixmap};

/// Surfaces kept per thread once released.
const POOL_CAPACITY: usize = 4;

thread_local! {
    static SURFACES: RefCell<Vec<Pixmap>> = const { RefCell::new(Vec::new()) };
}

/// Returns the surface to the pool when dropped.
struct SurfaceGuard {
    pixmap: Option<Pixmap>,
}

impl Drop for SurfaceGuard {
    fn drop(&mut self) {
        if let Some(mut pixmap) = self.pixmap.take() {
            pixmap.fill(Color::TRANSPARENT);
            // Ignore failures during thread teardown
            let _ = SURFACES.try_with(|pool| {
                let mut pool = pool.borrow_mut();
                if pool.len() < POOL_CAPACITY {
                    pool.push(pixmap);
                }
            });
        }
    }
}

fn acquire(width: u32, height: u32) -> FieldResult<Pixmap> {
    let pooled = SURFACES.with(|pool| {
        let mut pool = pool.borrow_mut();
        pool.iter()
            .position(|p| p.width() == width && p.height() == height)
            .map(|i| pool.swap_remove(i))
    });

    match pooled {
        Some(pixmap) => Ok(pixmap),
        None => Pixmap::new(width, height).ok_or_else(|| {
            FieldError::Render(format!("cannot allocate {}x{} surface", width, height))
        }),
    }
}

/// Run `f` with a transparent `width × height` surface.
///
/// Calls may nest; each level gets its own surface.
pub fn with_surface<F, R>(width: u32, height: u32, f: F) -> FieldResult<R>
where
    F: FnOnce(&mut Pixmap) -> FieldResult<R>,
{
    let mut guard = SurfaceGuard {
        pixmap: Some(acquire(width, height)?),
    };
    match guard.pixmap.as_mut() {
        Some(pixmap) => f(pixmap),
        None => Err(FieldError::Internal("surface released early".to_string())),
    }
}

/// Number of idle surfaces cached on this thread.
pub fn pooled_surfaces() -> usize {
    SURFACES.with(|pool| pool.borrow().len())
}
