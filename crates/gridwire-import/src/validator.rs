//! Validator: runs the stages over a record and records the verdict.

use tracing::{debug, info, instrument, warn};

use gridwire_ir::{StructuralRecord, Validity};

use crate::context::StageContext;
use crate::error::{ImportError, ImportResult};
use crate::stage::{Stage, StageKind};
use crate::stages::{
    AutoLayout, ConnectionRepair, DependencyResolver, GeometryNormalizer, ResolveReport,
};

/// Runs a sequence of stages and turns their outcome into the record's
/// all-or-nothing validity.
pub struct Validator {
    /// The stages to execute, in order.
    stages: Vec<Box<dyn Stage>>,
}

impl Validator {
    /// Create a new validator with no stages.
    pub fn new() -> Self {
        Self { stages: vec![] }
    }

    /// Add a stage to the validator.
    pub fn add_stage(&mut self, stage: impl Stage + 'static) {
        self.stages.push(Box::new(stage));
    }

    /// Validate a record.
    ///
    /// On the first stage error the record is rejected for good and the
    /// error returned. A rejected record is never revisited, and any
    /// dependency registered earlier in the run is rolled back.
    #[instrument(skip(self, record, ctx), fields(record = %record.name()))]
    pub fn run(&self, record: &mut StructuralRecord, ctx: &mut StageContext<'_>) -> ImportResult<()> {
        if record.validity() == Validity::Invalid {
            return Err(ImportError::AlreadyRejected);
        }

        info!(
            "Validating '{}' with {} stages: {} components, {} links",
            record.name(),
            self.stages.len(),
            record.num_components(),
            record.links().len()
        );

        let mut resolved = false;
        for stage in &self.stages {
            if !stage.should_run(record, ctx) {
                debug!("Skipping stage: {}", stage.name());
                continue;
            }
            debug!("Running stage: {}", stage.name());
            if let Err(err) = stage.run(record, ctx) {
                warn!("Stage {} rejected '{}': {}", stage.name(), record.name(), err);
                record.reject();
                if resolved {
                    ResolveReport::roll_back(ctx);
                }
                return Err(err);
            }
            resolved |= stage.kind() == StageKind::Resolution;
            debug!("Stage {} completed, links: {}", stage.name(), record.links().len());
        }

        record.mark_valid();
        info!("Record '{}' is valid", record.name());
        Ok(())
    }

    /// Names of the stages, in order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Check if any stage resolves dependencies.
    pub fn resolves_dependencies(&self) -> bool {
        self.stages.iter().any(|s| s.kind() == StageKind::Resolution)
    }

    /// Get the number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the validator has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Default for Validator {
    fn default() -> Self {
        ValidatorBuilder::new().build()
    }
}

/// Builder for validators.
pub struct ValidatorBuilder {
    resolution: bool,
    layout: bool,
    extra: Vec<Box<dyn Stage>>,
}

impl ValidatorBuilder {
    /// Create a builder for the full pipeline:
    /// repair, normalize, resolve dependencies, lay out.
    pub fn new() -> Self {
        Self {
            resolution: true,
            layout: true,
            extra: vec![],
        }
    }

    /// Include or drop dependency resolution.
    #[must_use]
    pub fn with_resolution(mut self, enabled: bool) -> Self {
        self.resolution = enabled;
        self
    }

    /// Include or drop auto-layout.
    #[must_use]
    pub fn with_layout(mut self, enabled: bool) -> Self {
        self.layout = enabled;
        self
    }

    /// Append a custom stage after the built-in ones.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.extra.push(Box::new(stage));
        self
    }

    /// Build the validator.
    pub fn build(self) -> Validator {
        let mut validator = Validator::new();

        validator.add_stage(ConnectionRepair);
        validator.add_stage(GeometryNormalizer);

        if self.resolution {
            validator.add_stage(DependencyResolver::new());
        }

        if self.layout {
            validator.add_stage(AutoLayout);
        }

        validator.stages.extend(self.extra);
        validator
    }
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::live::LiveCircuits;
    use crate::notify::RecordingSink;
    use gridwire_ir::{LinkEnd, Orientation, Placement, PortId, Primitive, SchemaCatalog};

    struct Refuse;

    impl Stage for Refuse {
        fn name(&self) -> &'static str {
            "refuse"
        }

        fn kind(&self) -> StageKind {
            StageKind::Local
        }

        fn run(&self, _record: &mut StructuralRecord, _ctx: &mut StageContext<'_>) -> ImportResult<()> {
            Err(ImportError::StageFailed {
                name: "refuse".into(),
                reason: "always".into(),
            })
        }
    }

    fn sample() -> StructuralRecord {
        let mut record = StructuralRecord::new("sample");
        let a = record.push_component(Primitive::Switch.type_id(), Placement::Undefined, Orientation::Zero);
        let b = record.push_component(Primitive::Light.type_id(), Placement::Undefined, Orientation::Zero);
        record.add_link(LinkEnd::new(a, PortId(0)), LinkEnd::new(b, PortId(0)));
        record
    }

    #[test]
    fn test_builder_stage_order() {
        let validator = ValidatorBuilder::new().build();
        assert_eq!(
            validator.stage_names(),
            vec!["connection_repair", "geometry_normalizer", "dependency_resolver", "auto_layout"]
        );
        assert!(validator.resolves_dependencies());

        let local = ValidatorBuilder::new().with_resolution(false).build();
        assert_eq!(local.len(), 3);
        assert!(!local.resolves_dependencies());
    }

    #[test]
    fn test_run_marks_valid() {
        let config = ImportConfig::default();
        let mut catalog = SchemaCatalog::with_builtins();
        let mut host = LiveCircuits::new();
        let mut sink = RecordingSink::new();
        let mut ctx = StageContext::new(&mut catalog, &mut host, &mut sink, &config);

        let mut record = sample();
        Validator::default().run(&mut record, &mut ctx).unwrap();
        assert!(record.is_valid());
        assert_eq!(record.links().len(), 2);
        assert!(record.components().all(|c| c.placement.exact().is_some()));
    }

    #[test]
    fn test_failure_rejects_for_good() {
        let config = ImportConfig::default();
        let mut catalog = SchemaCatalog::with_builtins();
        let mut host = LiveCircuits::new();
        let mut sink = RecordingSink::new();
        let mut ctx = StageContext::new(&mut catalog, &mut host, &mut sink, &config);

        let mut record = sample();
        let validator = ValidatorBuilder::new().with_stage(Refuse).build();
        assert!(matches!(
            validator.run(&mut record, &mut ctx),
            Err(ImportError::StageFailed { .. })
        ));
        assert_eq!(record.validity(), Validity::Invalid);

        assert!(matches!(
            Validator::default().run(&mut record, &mut ctx),
            Err(ImportError::AlreadyRejected)
        ));
    }
}
