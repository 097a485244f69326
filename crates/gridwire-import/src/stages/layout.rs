//! Auto-layout: definite, collision-free positions for every component.
//!
//! Each weakly-connected sub-graph of the link graph gets its own
//! horizontal band. Inside a band, components are layered left to right by
//! signal flow (cycles collapsed into SCCs first) and each layer column is
//! packed top-down from a per-column cursor.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, error, warn};

use gridwire_ir::{
    ComponentId, LinkGraph, Placement, PortDirection, Position, StructuralRecord, Vector,
};

use super::footprint;
use crate::context::StageContext;
use crate::error::{ImportError, ImportResult};
use crate::stage::{Stage, StageKind};

/// What auto-layout did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutReport {
    /// Components given a position.
    pub placed: usize,
    /// Definite positions found overlapping and cleared before placement.
    pub demoted: usize,
    /// Weakly-connected sub-graphs that needed placement.
    pub bands: usize,
}

/// Places every component still undefined. Never moves a definite one.
pub struct AutoLayout;

struct Occupancy {
    cells: FxHashSet<Position>,
}

impl Occupancy {
    /// A footprint reaching past the grid edge is never free.
    fn is_free(&self, anchor: Position, size: Vector) -> bool {
        anchor
            .footprint_cells(size)
            .is_some_and(|cells| cells.iter().all(|cell| !self.cells.contains(cell)))
    }

    fn claim(&mut self, anchor: Position, size: Vector) {
        self.cells
            .extend(size.cells().filter_map(|offset| anchor.checked_add(offset)));
    }
}

impl AutoLayout {
    /// Build the link graph: every link joins its ends, links leaving an
    /// output port drive the component on the other end.
    pub fn link_graph(record: &StructuralRecord, ctx: &StageContext<'_>) -> LinkGraph {
        let mut graph = LinkGraph::new();
        for id in record.component_ids() {
            graph.add_node(id);
        }
        for link in record.links() {
            if !record.contains(link.output.component) || !record.contains(link.input.component) {
                continue;
            }
            if record.port_direction(link.output, ctx.catalog) == Some(PortDirection::Output) {
                graph.drive(link.output.component, link.input.component);
            } else {
                graph.join(link.output.component, link.input.component);
            }
        }
        graph
    }

    /// Seed occupancy from definite footprints, clearing any that collide.
    fn seed(
        record: &mut StructuralRecord,
        sizes: &FxHashMap<ComponentId, Vector>,
        report: &mut LayoutReport,
    ) -> Occupancy {
        let mut occupancy = Occupancy {
            cells: FxHashSet::default(),
        };
        let ids: Vec<ComponentId> = record.component_ids().collect();
        for id in ids {
            let Some(anchor) = record.component(id).and_then(|c| c.placement.exact()) else {
                continue;
            };
            let size = sizes.get(&id).copied().unwrap_or(Vector::UNIT);
            if occupancy.is_free(anchor, size) {
                occupancy.claim(anchor, size);
            } else {
                warn!(
                    "Record '{}': component {} at {} overlaps; re-placing it",
                    record.name(),
                    id,
                    anchor
                );
                if let Some(component) = record.component_mut(id) {
                    component.placement = Placement::Undefined;
                }
                report.demoted += 1;
            }
        }
        occupancy
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl Stage for AutoLayout {
    fn name(&self) -> &'static str {
        "auto_layout"
    }

    fn kind(&self) -> StageKind {
        StageKind::Local
    }

    fn should_run(&self, record: &StructuralRecord, _ctx: &StageContext<'_>) -> bool {
        !record.is_empty()
    }

    fn run(&self, record: &mut StructuralRecord, ctx: &mut StageContext<'_>) -> ImportResult<()> {
        let mut report = LayoutReport::default();
        let config = ctx.config;

        let mut sizes: FxHashMap<ComponentId, Vector> = FxHashMap::default();
        for component in record.components() {
            sizes.insert(component.id, footprint(record, component, ctx.catalog)?);
        }

        let mut occupancy = Self::seed(record, &sizes, &mut report);

        let graph = Self::link_graph(record, ctx);
        let condensation = graph.condense().map_err(|err| {
            error!("Record '{}': {}", record.name(), err);
            ImportError::CondensationCycle
        })?;

        let mut layer: FxHashMap<ComponentId, u32> = FxHashMap::default();
        let mut rank: FxHashMap<ComponentId, usize> = FxHashMap::default();
        for (index, (members, &scc_layer)) in condensation
            .sccs
            .iter()
            .zip(&condensation.layers)
            .enumerate()
        {
            for &id in members {
                layer.insert(id, scc_layer);
                rank.insert(id, index);
            }
        }

        let column_width = to_i32(config.layout.column_width);
        let spacing = to_i32(config.layout.component_spacing);
        let mut band_top = config.layout.origin_y;

        for members in graph.weak_components() {
            let mut pending: Vec<ComponentId> = members
                .into_iter()
                .filter(|id| {
                    record
                        .component(*id)
                        .is_some_and(|c| c.placement.is_undefined())
                })
                .collect();
            if pending.is_empty() {
                continue;
            }
            pending.sort_by_key(|id| (rank.get(id).copied().unwrap_or(usize::MAX), *id));
            report.bands += 1;

            let mut cursors: FxHashMap<u32, i32> = FxHashMap::default();
            let mut band_bottom = band_top;

            for id in pending {
                let column = layer.get(&id).copied().unwrap_or(0);
                let size = sizes.get(&id).copied().unwrap_or(Vector::UNIT);
                let x = config
                    .layout
                    .origin_x
                    .saturating_add(to_i32(column).saturating_mul(column_width));

                let cursor = cursors.entry(column).or_insert(band_top);
                let mut row = *cursor;
                while !occupancy.is_free(Position::new(x, row), size) {
                    row = row.checked_add(1).ok_or(ImportError::NoFreeCell(id))?;
                }

                let anchor = Position::new(x, row);
                occupancy.claim(anchor, size);
                *cursor = row.saturating_add(size.dy.max(1));
                band_bottom = band_bottom.max(*cursor);

                if let Some(component) = record.component_mut(id) {
                    component.placement = Placement::Exact(anchor);
                }
                record.include_in_bounds(anchor, size);
                debug!("Placed component {} in layer {} at {}", id, column, anchor);
                report.placed += 1;
            }

            band_top = band_bottom.saturating_add(spacing);
        }

        debug!(
            "Laid out '{}': {} placed in {} band(s), {} demoted",
            record.name(),
            report.placed,
            report.bands,
            report.demoted
        );
        ctx.insert(report);
        Ok(())
    }
}
