//! Links between component ports.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{ComponentId, PortId};

/// One end of a link: a port on a specific component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkEnd {
    /// The component.
    pub component: ComponentId,
    /// The port on that component.
    pub port: PortId,
}

impl LinkEnd {
    /// Create a link end.
    #[inline]
    pub fn new(component: ComponentId, port: PortId) -> Self {
        Self { component, port }
    }
}

impl fmt::Display for LinkEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.port)
    }
}

/// A directed link as recorded by a producer.
///
/// Records store every connection twice, once from each end. The
/// reciprocal of `a -> b` is `b -> a`; which of the two is the signal
/// direction depends on the port directions of the component types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Link {
    /// The "output" end as written by the producer.
    pub output: LinkEnd,
    /// The "input" end as written by the producer.
    pub input: LinkEnd,
}

impl Link {
    /// Create a link.
    #[inline]
    pub fn new(output: LinkEnd, input: LinkEnd) -> Self {
        Self { output, input }
    }

    /// The same connection seen from the other end.
    #[inline]
    #[must_use]
    pub fn reciprocal(self) -> Self {
        Self {
            output: self.input,
            input: self.output,
        }
    }

    /// Check if either end names `component`.
    #[inline]
    pub fn touches(&self, component: ComponentId) -> bool {
        self.output.component == component || self.input.component == component
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.output, self.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reciprocal_is_involution() {
        let link = Link::new(
            LinkEnd::new(ComponentId(1), PortId(1)),
            LinkEnd::new(ComponentId(2), PortId(0)),
        );
        assert_eq!(link.reciprocal().reciprocal(), link);
        assert_eq!(
            link.reciprocal().output,
            LinkEnd::new(ComponentId(2), PortId(0))
        );
        assert_eq!(format!("{link}"), "#1.p1 -> #2.p0");
    }
}
