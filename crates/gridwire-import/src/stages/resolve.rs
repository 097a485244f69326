//! Dependency resolution.
//!
//! Nested dependency records are flattened into a worklist (no recursion),
//! validated children first, and registered as composite types only once
//! every record in the tree is valid. Each registration's type is then
//! written back onto the components that referred to the dependency by name.
//!
//! Registrations stay provisional until the import they belong to commits:
//! their notifications are held in the [`ResolveReport`] and released with
//! [`ResolveReport::release`], or the registrations are undone with
//! [`ResolveReport::roll_back`].

use tracing::{debug, info, warn};

use gridwire_ir::{Dependency, StructuralRecord, TypeId, TypeRef};

use crate::context::StageContext;
use crate::error::{ImportError, ImportResult};
use crate::notify::{Event, RecordingSink};
use crate::registrar::{Registrar, Registration};
use crate::stage::{Stage, StageKind};
use crate::validator::{Validator, ValidatorBuilder};

/// What dependency resolution did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Nested records validated.
    pub validated: usize,
    /// Nested records registered as new types.
    pub registered: usize,
    /// Nested records whose identity was already registered.
    pub reused: usize,
    /// Registrations made, in order.
    pub committed: Vec<Registration>,
    /// Notifications not yet published.
    pub held: Vec<Event>,
}

impl ResolveReport {
    /// Publish the notifications held back by the last resolution.
    pub fn release(ctx: &mut StageContext<'_>) {
        let held = ctx
            .get_mut::<ResolveReport>()
            .map(|report| std::mem::take(&mut report.held))
            .unwrap_or_default();
        for event in held {
            ctx.sink.publish(event);
        }
    }

    /// Undo every registration the last resolution made, newest first.
    pub fn roll_back(ctx: &mut StageContext<'_>) {
        let Some(report) = ctx.remove::<ResolveReport>() else {
            return;
        };
        let registrar = Registrar::new();
        for registration in report.committed.iter().rev() {
            registrar.unregister(registration, ctx);
        }
    }
}

/// Validates and registers every named dependency of a record.
pub struct DependencyResolver {
    local: Validator,
    registrar: Registrar,
}

/// Path of dependency names from the top-level record.
type DepPath = Vec<String>;

/// Dependencies found in a record tree.
#[derive(Default)]
struct Discovery {
    /// Paths carrying a nested record, in pre-order.
    frames: Vec<DepPath>,
    /// Paths bound to a registered type by an earlier import.
    bound: Vec<(DepPath, TypeId)>,
}

impl DependencyResolver {
    /// Create a resolver. Nested records go through every stage except
    /// resolution itself, which this resolver drives.
    pub fn new() -> Self {
        Self {
            local: ValidatorBuilder::new().with_resolution(false).build(),
            registrar: Registrar::new(),
        }
    }

    /// Collect every nested dependency in pre-order.
    ///
    /// Contract violations (a name re-entering its own chain, chains deeper
    /// than the bound) abort at once; unresolvable names are collected.
    fn discover(
        root: &StructuralRecord,
        max_depth: usize,
        failures: &mut Vec<ImportError>,
    ) -> ImportResult<Discovery> {
        let mut found = Discovery::default();
        Self::check_references(root, &[], failures);

        let mut stack: Vec<DepPath> = root
            .dependencies()
            .map(|d| vec![d.name.clone()])
            .rev()
            .collect();

        while let Some(path) = stack.pop() {
            if path.len() > max_depth {
                return Err(ImportError::DependencyDepthExceeded { max_depth });
            }
            let Some((name, lineage)) = path.split_last() else {
                continue;
            };
            if lineage.contains(name) {
                return Err(ImportError::ReentrantDependency {
                    name: name.clone(),
                    chain: path.join(" -> "),
                });
            }
            let Some(dependency) = dependency_at(root, &path) else {
                continue;
            };
            match (&dependency.record, dependency.resolved) {
                (Some(record), _) => {
                    Self::check_references(record, &path, failures);
                    for child in record.dependencies().rev() {
                        let mut child_path = path.clone();
                        child_path.push(child.name.clone());
                        stack.push(child_path);
                    }
                    found.frames.push(path);
                }
                (None, Some(ty)) => {
                    debug!("Dependency '{}' is already registered as {}", path.join("/"), ty);
                    found.bound.push((path, ty));
                }
                (None, None) => failures.push(ImportError::MissingDependency {
                    name: path.join("/"),
                }),
            }
        }
        Ok(found)
    }

    /// Components naming a dependency the record does not declare.
    fn check_references(record: &StructuralRecord, path: &[String], failures: &mut Vec<ImportError>) {
        for component in record.components() {
            if let TypeRef::Dependency(name) = &component.ty {
                if record.dependency(name).is_none() {
                    let mut full = path.to_vec();
                    full.push(name.clone());
                    failures.push(ImportError::MissingDependency {
                        name: full.join("/"),
                    });
                }
            }
        }
    }

    fn failure(mut failures: Vec<ImportError>) -> ImportError {
        if failures.len() == 1 {
            failures.remove(0)
        } else {
            ImportError::Dependencies(failures)
        }
    }

    /// Register one validated dependency and write its type back.
    fn register(
        &self,
        root: &mut StructuralRecord,
        path: &[String],
        ctx: &mut StageContext<'_>,
        report: &mut ResolveReport,
    ) -> ImportResult<Registration> {
        let name = path.join("/");
        let record = dependency_at_mut(root, path)
            .and_then(|d| d.record.take())
            .ok_or_else(|| ImportError::MissingDependency { name: name.clone() })?;

        let registration = self.registrar.register(*record, true, &mut ctx.nested())?;
        let ty = registration
            .component_type
            .ok_or_else(|| ImportError::StageFailed {
                name: "dependency_resolver".into(),
                reason: format!("'{name}' registered without a component type"),
            })?;
        if registration.reused {
            report.reused += 1;
        } else {
            report.registered += 1;
        }

        if let Some(dependency) = dependency_at_mut(root, path) {
            dependency.resolved = Some(ty);
        }
        if let (Some(parent), Some(dep_name)) = (parent_at_mut(root, path), path.last()) {
            back_fill(parent, dep_name, ty);
        }
        debug!("Dependency '{}' resolved to {}", name, ty);
        Ok(registration)
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Point every component naming `name` at the registered type.
fn back_fill(record: &mut StructuralRecord, name: &str, ty: TypeId) {
    for component in record.components_mut() {
        if matches!(&component.ty, TypeRef::Dependency(n) if n == name) {
            component.ty = TypeRef::Known(ty);
        }
    }
}

fn dependency_at<'r>(root: &'r StructuralRecord, path: &[String]) -> Option<&'r Dependency> {
    let (last, parents) = path.split_last()?;
    let mut record = root;
    for name in parents {
        record = record.dependency(name)?.record.as_deref()?;
    }
    record.dependency(last)
}

fn dependency_at_mut<'r>(root: &'r mut StructuralRecord, path: &[String]) -> Option<&'r mut Dependency> {
    let last = path.last()?;
    parent_at_mut(root, path)?.dependency_mut(last)
}

/// The record declaring the last dependency of `path`.
fn parent_at_mut<'r>(root: &'r mut StructuralRecord, path: &[String]) -> Option<&'r mut StructuralRecord> {
    let (_, parents) = path.split_last()?;
    let mut record = root;
    for name in parents {
        record = record.dependency_mut(name)?.record.as_deref_mut()?;
    }
    Some(record)
}

fn record_at_mut<'r>(root: &'r mut StructuralRecord, path: &[String]) -> Option<&'r mut StructuralRecord> {
    dependency_at_mut(root, path)?.record.as_deref_mut()
}

impl Stage for DependencyResolver {
    fn name(&self) -> &'static str {
        "dependency_resolver"
    }

    fn kind(&self) -> StageKind {
        StageKind::Resolution
    }

    fn run(&self, record: &mut StructuralRecord, ctx: &mut StageContext<'_>) -> ImportResult<()> {
        let mut report = ResolveReport::default();
        let fail_fast = ctx.config.resolver.fail_fast;
        let mut failures = vec![];

        let Discovery { frames, bound } =
            Self::discover(record, ctx.config.resolver.max_depth, &mut failures)?;
        if fail_fast && !failures.is_empty() {
            failures.truncate(1);
            return Err(Self::failure(failures));
        }
        for (path, ty) in &bound {
            if let (Some(parent), Some(name)) = (parent_at_mut(record, path), path.last()) {
                back_fill(parent, name, *ty);
            }
        }

        // Children first: a parent's layout sees its children's final ports.
        for path in frames.iter().rev() {
            if fail_fast && !failures.is_empty() {
                break;
            }
            let Some(child) = record_at_mut(record, path) else {
                continue;
            };
            match self.local.run(child, &mut ctx.nested()) {
                Ok(()) => report.validated += 1,
                Err(err) => {
                    warn!("Dependency '{}' failed validation: {}", path.join("/"), err);
                    failures.push(ImportError::DependencyFailed {
                        name: path.join("/"),
                        source: Box::new(err),
                    });
                }
            }
        }

        if !failures.is_empty() {
            return Err(Self::failure(failures));
        }

        // Nothing is published until the whole tree registered.
        let mut held = RecordingSink::new();
        for path in frames.iter().rev() {
            let registered = self.register(record, path, &mut ctx.with_sink(&mut held), &mut report);
            match registered {
                Ok(registration) => report.committed.push(registration),
                Err(err) => {
                    warn!("Dependency '{}' failed to register: {}", path.join("/"), err);
                    for registration in report.committed.iter().rev() {
                        self.registrar.unregister(registration, ctx);
                    }
                    return Err(err);
                }
            }
        }
        report.held = held.take();

        if !frames.is_empty() {
            info!(
                "Resolved {} dependencies of '{}' ({} registered, {} reused)",
                frames.len(),
                record.name(),
                report.registered,
                report.reused
            );
        }
        ctx.insert(report);
        Ok(())
    }
}
