//! Geometry normalization: integer positions, no overlapping footprints.

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use gridwire_ir::{
    ComponentId, IrError, Placement, PortDecl, PortId, Position, Primitive, StructuralRecord,
    TypeId, TypeRef, Vector,
};

use super::footprint;
use crate::context::StageContext;
use crate::error::ImportResult;
use crate::stage::{Stage, StageKind};

/// What normalization changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// NONE-typed components turned into junctions.
    pub coerced: usize,
    /// Ports derived from I/O components.
    pub derived_ports: usize,
    /// Fractional positions floored onto the grid.
    pub snapped: usize,
    /// Components whose position was taken and became undefined.
    pub demoted: usize,
}

/// Snaps positions to the grid and clears colliding duplicates.
///
/// Components are visited in ascending id order, so the lowest id keeps a
/// contested cell. Losers become undefined and are placed by auto-layout.
pub struct GeometryNormalizer;

impl GeometryNormalizer {
    fn coerce_none_types(record: &mut StructuralRecord, report: &mut NormalizeReport) {
        for component in record.components_mut() {
            if component.ty == TypeRef::Known(TypeId::NONE) {
                warn!("Component {} has the NONE type; using a junction", component.id);
                component.ty = TypeRef::Known(Primitive::Junction.type_id());
                report.coerced += 1;
            }
        }
    }

    /// Switches, buttons and tick buttons become inputs on the left column,
    /// lights become outputs on the right column.
    fn derive_ports(record: &mut StructuralRecord, report: &mut NormalizeReport) -> ImportResult<()> {
        if !record.ports().is_empty() {
            return Ok(());
        }
        let io: Vec<(ComponentId, Primitive)> = record
            .components()
            .filter_map(|c| {
                let primitive = Primitive::from_type_id(c.ty.known()?)?;
                (primitive.is_input_source() || primitive.is_output_sink())
                    .then_some((c.id, primitive))
            })
            .collect();

        let inputs = io.iter().filter(|(_, p)| p.is_input_source());
        let outputs = io.iter().filter(|(_, p)| p.is_output_sink());
        let mut next_port = 0u32;
        for (row, (id, _)) in (0i32..).zip(inputs) {
            let decl = PortDecl::input(PortId(next_port), Vector::new(0, row), *id)
                .named(format!("INPUT: {row}"));
            record.add_port(decl)?;
            next_port += 1;
        }
        for (row, (id, _)) in (0i32..).zip(outputs) {
            let decl = PortDecl::output(PortId(next_port), Vector::new(1, row), *id)
                .named(format!("OUTPUT: {row}"));
            record.add_port(decl)?;
            next_port += 1;
        }
        report.derived_ports = next_port as usize;
        Ok(())
    }

    /// Every declared port names an existing component and a unique id.
    fn check_ports(record: &StructuralRecord) -> ImportResult<()> {
        let mut seen = FxHashSet::default();
        for port in record.ports() {
            if !record.contains(port.internal) {
                return Err(IrError::ComponentNotFound(port.internal).into());
            }
            if !seen.insert(port.id) {
                return Err(IrError::DuplicatePort {
                    port: port.id,
                    ty: None,
                }
                .into());
            }
        }
        Ok(())
    }

    fn snap(record: &mut StructuralRecord, report: &mut NormalizeReport) {
        for component in record.components_mut() {
            if let Placement::Fractional { x, y } = component.placement {
                component.placement = Placement::from_coords(x.floor(), y.floor());
                debug!(
                    "Snapped component {} from ({x}, {y}) to {:?}",
                    component.id, component.placement
                );
                report.snapped += 1;
            }
        }
    }

    /// Claim footprints in id order; extend bounds for every survivor.
    fn claim(
        record: &mut StructuralRecord,
        ctx: &StageContext<'_>,
        report: &mut NormalizeReport,
    ) -> ImportResult<()> {
        let mut occupied: FxHashSet<Position> = FxHashSet::default();
        let ids: Vec<ComponentId> = record.component_ids().collect();

        for id in ids {
            let Some(component) = record.component(id) else {
                continue;
            };
            let Some(anchor) = component.placement.exact() else {
                continue;
            };
            let size = footprint(record, component, ctx.catalog)?;
            let cells = anchor
                .footprint_cells(size)
                .filter(|cells| cells.iter().all(|cell| !occupied.contains(cell)));

            let Some(cells) = cells else {
                warn!("Component {} at {} is taken or off the grid; position cleared", id, anchor);
                if let Some(component) = record.component_mut(id) {
                    component.placement = Placement::Undefined;
                }
                report.demoted += 1;
                continue;
            };
            occupied.extend(cells);
            record.include_in_bounds(anchor, size);
        }
        Ok(())
    }
}

impl Stage for GeometryNormalizer {
    fn name(&self) -> &'static str {
        "geometry_normalizer"
    }

    fn kind(&self) -> StageKind {
        StageKind::Local
    }

    fn run(&self, record: &mut StructuralRecord, ctx: &mut StageContext<'_>) -> ImportResult<()> {
        let mut report = NormalizeReport::default();

        Self::coerce_none_types(record, &mut report);
        Self::derive_ports(record, &mut report)?;
        Self::check_ports(record)?;
        let fitted = record.fitted_size();
        if fitted != record.size() {
            debug!("Record '{}' footprint fitted to {}", record.name(), fitted);
            record.set_size(fitted);
        }
        Self::snap(record, &mut report);
        Self::claim(record, ctx, &mut report)?;

        debug!(
            "Normalized '{}': {} snapped, {} demoted, {} coerced",
            record.name(),
            report.snapped,
            report.demoted,
            report.coerced
        );
        ctx.insert(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::live::LiveCircuits;
    use crate::notify::RecordingSink;
    use gridwire_ir::{Orientation, PortDirection, SchemaCatalog};

    fn try_run(record: &mut StructuralRecord) -> ImportResult<NormalizeReport> {
        let config = ImportConfig::default();
        let mut catalog = SchemaCatalog::with_builtins();
        let mut host = LiveCircuits::new();
        let mut sink = RecordingSink::new();
        let mut ctx = StageContext::new(&mut catalog, &mut host, &mut sink, &config);
        GeometryNormalizer.run(record, &mut ctx)?;
        Ok(ctx.get::<NormalizeReport>().copied().unwrap_or_default())
    }

    fn run(record: &mut StructuralRecord) -> NormalizeReport {
        try_run(record).unwrap()
    }

    #[test]
    fn test_fractional_positions_are_floored() {
        let mut record = StructuralRecord::new("r");
        let id = record.push_component(
            Primitive::And.type_id(),
            Placement::from_coords(2.7, -0.5),
            Orientation::Zero,
        );
        let report = run(&mut record);
        assert_eq!(report.snapped, 1);
        assert_eq!(
            record.component(id).unwrap().placement,
            Placement::Exact(Position::new(2, -1))
        );
        assert_eq!(record.bounds().min(), Some(Position::new(2, -1)));
    }

    #[test]
    fn test_lowest_id_keeps_contested_cell() {
        let mut record = StructuralRecord::new("r");
        record
            .add_component(ComponentId(7), Primitive::And.type_id(), Placement::from_coords(1.2, 1.9), Orientation::Zero)
            .unwrap();
        record
            .add_component(ComponentId(3), Primitive::Or.type_id(), Placement::from_coords(1.0, 1.0), Orientation::Zero)
            .unwrap();
        let report = run(&mut record);
        assert_eq!(report.demoted, 1);
        assert_eq!(
            record.component(ComponentId(3)).unwrap().placement,
            Placement::Exact(Position::new(1, 1))
        );
        assert!(record.component(ComponentId(7)).unwrap().placement.is_undefined());
    }

    #[test]
    fn test_footprints_collide_not_just_anchors() {
        let mut record = StructuralRecord::new("r");
        let tall = record.push_component(
            Primitive::TristateBuffer.type_id(),
            Placement::Exact(Position::new(0, 0)),
            Orientation::Zero,
        );
        let below = record.push_component(
            Primitive::And.type_id(),
            Placement::Exact(Position::new(0, 1)),
            Orientation::Zero,
        );
        run(&mut record);
        assert!(record.component(tall).unwrap().placement.exact().is_some());
        assert!(record.component(below).unwrap().placement.is_undefined());
    }

    #[test]
    fn test_none_type_becomes_junction() {
        let mut record = StructuralRecord::new("r");
        let id = record.push_component(TypeId::NONE, Placement::Undefined, Orientation::Zero);
        let report = run(&mut record);
        assert_eq!(report.coerced, 1);
        assert_eq!(
            record.component(id).unwrap().ty,
            TypeRef::Known(Primitive::Junction.type_id())
        );
    }

    #[test]
    fn test_ports_derived_from_io_components() {
        let mut record = StructuralRecord::new("r");
        let a = record.push_component(Primitive::Switch.type_id(), Placement::Undefined, Orientation::Zero);
        let b = record.push_component(Primitive::Button.type_id(), Placement::Undefined, Orientation::Zero);
        record.push_component(Primitive::And.type_id(), Placement::Undefined, Orientation::Zero);
        let out = record.push_component(Primitive::Light.type_id(), Placement::Undefined, Orientation::Zero);

        let report = run(&mut record);
        assert_eq!(report.derived_ports, 3);

        let ports = record.ports();
        assert_eq!(ports[0].internal, a);
        assert_eq!(ports[1].internal, b);
        assert_eq!(ports[1].offset, Vector::new(0, 1));
        assert_eq!(ports[2].internal, out);
        assert_eq!(ports[2].direction, PortDirection::Output);
        assert_eq!(ports[2].offset, Vector::new(1, 0));
        assert_eq!(ports[2].name.as_deref(), Some("OUTPUT: 0"));
        assert_eq!(record.size(), Vector::new(2, 2));
    }

    #[test]
    fn test_footprint_past_grid_edge_is_cleared() {
        let mut record = StructuralRecord::new("r");
        let edge = f64::from(i32::MAX);
        let tall = record.push_component(
            Primitive::TristateBuffer.type_id(),
            Placement::from_coords(0.0, edge),
            Orientation::Zero,
        );
        let small = record.push_component(
            Primitive::And.type_id(),
            Placement::from_coords(1.0, edge),
            Orientation::Zero,
        );

        let report = run(&mut record);
        assert_eq!(report.demoted, 1);
        assert!(record.component(tall).unwrap().placement.is_undefined());
        assert_eq!(
            record.component(small).unwrap().placement,
            Placement::Exact(Position::new(1, i32::MAX))
        );
    }

    #[test]
    fn test_port_on_missing_component_is_rejected() {
        let mut record = StructuralRecord::new("r");
        record.push_component(Primitive::Switch.type_id(), Placement::Undefined, Orientation::Zero);
        record
            .add_port(PortDecl::input(PortId(0), Vector::new(0, 0), ComponentId(99)))
            .unwrap();

        let err = try_run(&mut record).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ImportError::Ir(IrError::ComponentNotFound(ComponentId(99)))
        ));
    }

    #[test]
    fn test_duplicate_port_ids_are_rejected() {
        let mut record = StructuralRecord::new("r");
        let a = record.push_component(Primitive::Switch.type_id(), Placement::Undefined, Orientation::Zero);
        let b = record.push_component(Primitive::Light.type_id(), Placement::Undefined, Orientation::Zero);
        record.ports_mut().push(PortDecl::input(PortId(0), Vector::new(0, 0), a));
        record.ports_mut().push(PortDecl::output(PortId(0), Vector::new(1, 0), b));

        let err = try_run(&mut record).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ImportError::Ir(IrError::DuplicatePort { port: PortId(0), .. })
        ));
    }
}
