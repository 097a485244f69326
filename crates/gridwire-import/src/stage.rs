//! Stage trait for validation stages.

use gridwire_ir::StructuralRecord;

use crate::context::StageContext;
use crate::error::ImportResult;

/// The kind of validation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Works on the record alone (with read access to the catalog).
    Local,
    /// Validates and registers nested dependencies.
    Resolution,
}

/// One step of record validation.
///
/// A stage either succeeds, possibly after repairing the record, or
/// returns the error that rejects the record.
pub trait Stage {
    /// Get the name of this stage.
    fn name(&self) -> &str;

    /// Get the kind of this stage.
    fn kind(&self) -> StageKind;

    /// Run the stage on the given record.
    fn run(&self, record: &mut StructuralRecord, ctx: &mut StageContext<'_>) -> ImportResult<()>;

    /// Check if this stage should run based on current state.
    fn should_run(&self, _record: &StructuralRecord, _ctx: &StageContext<'_>) -> bool {
        true
    }
}
