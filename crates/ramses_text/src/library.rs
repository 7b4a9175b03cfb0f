//! Reference counted font library shared by all font registries
//!
//! The first [`LibraryHandle`] creates the shared fontdb database, the last
//! dropped handle destroys it. Registries hold one handle each for their
//! whole lifetime.

use fontdb::Database;
use std::sync::{Arc, Mutex, PoisonError};

struct LibraryState {
    refs: usize,
    database: Option<Arc<Database>>,
}

/// Lazily created font database with an explicit reference count
pub struct SharedLibrary {
    state: Mutex<LibraryState>,
    load_system_fonts: bool,
}

/// Process-wide library used by [`FontRegistry`](crate::FontRegistry)
static GLOBAL_LIBRARY: SharedLibrary = SharedLibrary::new(true);

impl SharedLibrary {
    pub const fn new(load_system_fonts: bool) -> Self {
        Self {
            state: Mutex::new(LibraryState {
                refs: 0,
                database: None,
            }),
            load_system_fonts,
        }
    }

    pub fn global() -> &'static SharedLibrary {
        &GLOBAL_LIBRARY
    }

    /// Take a reference, creating the database if this is the first one
    pub fn acquire(&self) -> LibraryHandle<'_> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let load_system_fonts = self.load_system_fonts;
        let database = state
            .database
            .get_or_insert_with(|| {
                let mut database = Database::new();
                if load_system_fonts {
                    database.load_system_fonts();
                }
                tracing::debug!("font library created with {} faces", database.len());
                Arc::new(database)
            })
            .clone();
        state.refs += 1;
        LibraryHandle {
            library: self,
            database,
        }
    }

    pub fn reference_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .refs
    }

    pub fn is_alive(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .database
            .is_some()
    }

    fn release(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.refs = state.refs.saturating_sub(1);
        if state.refs == 0 {
            state.database = None;
            tracing::debug!("font library destroyed");
        }
    }
}

/// One reference to a [`SharedLibrary`]
pub struct LibraryHandle<'a> {
    library: &'a SharedLibrary,
    database: Arc<Database>,
}

impl LibraryHandle<'static> {
    /// Reference to the process-wide library
    pub fn acquire_global() -> Self {
        SharedLibrary::global().acquire()
    }
}

impl LibraryHandle<'_> {
    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl Drop for LibraryHandle<'_> {
    fn drop(&mut self) {
        self.library.release();
    }
}

impl std::fmt::Debug for LibraryHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryHandle")
            .field("faces", &self.database.len())
            .finish()
    }
}
