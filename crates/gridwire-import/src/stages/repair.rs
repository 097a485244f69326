//! Connection repair: every link ends up with exactly one reciprocal.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, error, warn};

use gridwire_ir::{Link, StructuralRecord};

use crate::context::StageContext;
use crate::error::{ImportError, ImportResult};
use crate::stage::{Stage, StageKind};

/// What connection repair changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Links naming a component the record does not have.
    pub dangling: usize,
    /// Exact duplicates collapsed onto their first occurrence.
    pub duplicates: usize,
    /// Reciprocals appended.
    pub synthesized: usize,
}

/// Forces every link to have exactly one reciprocal.
///
/// Dangling links are dropped and exact duplicates collapsed first. Then a
/// frequency table keyed by the exact link is walked in order: each link
/// consumes one occurrence of its reciprocal, and a missing reciprocal is
/// appended. Originals keep their order; synthesized links follow them.
pub struct ConnectionRepair;

impl ConnectionRepair {
    /// Repair a link list in place.
    pub fn repair(links: &mut Vec<Link>) -> ImportResult<usize> {
        let mut frequency: FxHashMap<Link, i64> = FxHashMap::default();
        for link in links.iter() {
            *frequency.entry(*link).or_insert(0) += 1;
        }

        let mut synthesized = 0;
        let mut index = 0;
        while index < links.len() {
            let reciprocal = links[index].reciprocal();
            let count = frequency.entry(reciprocal).or_insert(0);
            *count -= 1;
            if *count < 0 {
                debug!("Synthesizing reciprocal {}", reciprocal);
                links.push(reciprocal);
                *count = 0;
                synthesized += 1;
            }
            index += 1;
        }

        let remaining: i64 = frequency.values().map(|c| c.abs()).sum();
        if remaining != 0 {
            error!("{} link entries left unmatched after repair", remaining);
            return Err(ImportError::UnrepairedAsymmetry {
                remaining: usize::try_from(remaining).unwrap_or(usize::MAX),
            });
        }
        Ok(synthesized)
    }
}

impl Stage for ConnectionRepair {
    fn name(&self) -> &'static str {
        "connection_repair"
    }

    fn kind(&self) -> StageKind {
        StageKind::Local
    }

    fn run(&self, record: &mut StructuralRecord, ctx: &mut StageContext<'_>) -> ImportResult<()> {
        let mut report = RepairReport::default();

        let present: FxHashSet<_> = record.component_ids().collect();
        let mut seen = FxHashSet::default();
        let links = record.links_mut();
        links.retain(|link| {
            let ok = [link.output.component, link.input.component]
                .iter()
                .all(|id| id.is_valid() && present.contains(id));
            if !ok {
                warn!("Dropping dangling link {}", link);
                report.dangling += 1;
                return false;
            }
            if !seen.insert(*link) {
                report.duplicates += 1;
                return false;
            }
            true
        });

        report.synthesized = Self::repair(links)?;
        if report.synthesized > 0 {
            warn!(
                "Record '{}': synthesized {} missing reciprocal link(s)",
                record.name(),
                report.synthesized
            );
        }

        ctx.insert(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwire_ir::{ComponentId, LinkEnd, PortId};

    fn link(a: u32, pa: u32, b: u32, pb: u32) -> Link {
        Link::new(
            LinkEnd::new(ComponentId(a), PortId(pa)),
            LinkEnd::new(ComponentId(b), PortId(pb)),
        )
    }

    #[test]
    fn test_symmetric_input_is_untouched() {
        let mut links = vec![link(1, 1, 2, 0), link(2, 0, 1, 1)];
        let before = links.clone();
        assert_eq!(ConnectionRepair::repair(&mut links).unwrap(), 0);
        assert_eq!(links, before);
    }

    #[test]
    fn test_missing_reciprocal_is_appended() {
        let mut links = vec![link(1, 1, 2, 0), link(3, 1, 2, 1), link(2, 1, 3, 1)];
        assert_eq!(ConnectionRepair::repair(&mut links).unwrap(), 1);
        assert_eq!(links.len(), 4);
        assert_eq!(links[3], link(2, 0, 1, 1));
        assert_eq!(ConnectionRepair::repair(&mut links).unwrap(), 0);
        assert_eq!(links.len(), 4);
    }

    #[test]
    fn test_self_link_is_its_own_reciprocal() {
        let mut links = vec![link(1, 0, 1, 0)];
        assert_eq!(ConnectionRepair::repair(&mut links).unwrap(), 0);
        assert_eq!(links.len(), 1);
    }
}
