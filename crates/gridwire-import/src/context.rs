//! Shared state handed to every stage.
//!
//! A [`StageContext`] borrows the process-wide collaborators (schema
//! catalog, live-circuit host, notification sink) for one pipeline run and
//! carries typed reports stages leave for callers.
//!
//! # Example
//!
//! ```
//! use gridwire_import::{ImportConfig, LiveCircuits, RecordingSink, StageContext};
//! use gridwire_ir::SchemaCatalog;
//!
//! #[derive(Debug, PartialEq)]
//! struct Note(u32);
//!
//! let config = ImportConfig::default();
//! let mut catalog = SchemaCatalog::with_builtins();
//! let mut host = LiveCircuits::new();
//! let mut sink = RecordingSink::new();
//! let mut ctx = StageContext::new(&mut catalog, &mut host, &mut sink, &config);
//!
//! ctx.insert(Note(7));
//! assert_eq!(ctx.get::<Note>(), Some(&Note(7)));
//! ```

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

use gridwire_ir::SchemaCatalog;

use crate::config::ImportConfig;
use crate::live::CircuitHost;
use crate::notify::NotificationSink;

/// Collaborators and reports for one pipeline run.
pub struct StageContext<'a> {
    /// Component-type schemas.
    pub catalog: &'a mut SchemaCatalog,
    /// Live circuits.
    pub host: &'a mut dyn CircuitHost,
    /// Change notifications.
    pub sink: &'a mut dyn NotificationSink,
    /// Pipeline configuration.
    pub config: &'a ImportConfig,
    reports: FxHashMap<TypeId, Box<dyn Any>>,
}

impl<'a> StageContext<'a> {
    /// Borrow the collaborators for a run.
    pub fn new(
        catalog: &'a mut SchemaCatalog,
        host: &'a mut dyn CircuitHost,
        sink: &'a mut dyn NotificationSink,
        config: &'a ImportConfig,
    ) -> Self {
        Self {
            catalog,
            host,
            sink,
            config,
            reports: FxHashMap::default(),
        }
    }

    /// A context over the same collaborators with no reports, for
    /// validating a nested record without clobbering the outer reports.
    pub fn nested(&mut self) -> StageContext<'_> {
        StageContext {
            catalog: &mut *self.catalog,
            host: &mut *self.host,
            sink: &mut *self.sink,
            config: self.config,
            reports: FxHashMap::default(),
        }
    }

    /// A context over the same collaborators that publishes into `sink`
    /// instead, so notifications can be held back until a run commits.
    pub fn with_sink<'b>(&'b mut self, sink: &'b mut dyn NotificationSink) -> StageContext<'b> {
        StageContext {
            catalog: &mut *self.catalog,
            host: &mut *self.host,
            sink,
            config: self.config,
            reports: FxHashMap::default(),
        }
    }

    /// Store a report. Replaces an earlier one of the same type.
    pub fn insert<T: Any>(&mut self, value: T) {
        self.reports.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a report.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.reports
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Get a mutable report.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.reports
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Remove a report.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.reports
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}
