//! Horizontal packing: wraps a node chain in a measured HList.

use ets_node::{HList, Node, NodeArena, NodeId};
use ets_types::ScaledPoint;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Measure {
    width: ScaledPoint,
    height: ScaledPoint,
    depth: ScaledPoint,
    stretch: ScaledPoint,
    shrink: ScaledPoint,
}

fn measure(arena: &NodeArena, head: Option<NodeId>) -> Measure {
    let mut m = Measure::default();
    for id in arena.iter(head) {
        let node = arena.node(id);
        m.width += node.width();
        m.height = m.height.max(node.height());
        m.depth = m.depth.max(node.depth());
        if let Node::Glue(g) = node {
            m.stretch += g.stretch;
            m.shrink += g.shrink;
        }
    }
    m
}

/// Packs the chain starting at `head` at its natural width.
pub fn hpack(arena: &mut NodeArena, head: Option<NodeId>) -> NodeId {
    let m = measure(arena, head);
    log::debug!("hpack: natural width {}", m.width);
    arena.alloc(HList {
        list: head,
        width: m.width,
        height: m.height,
        depth: m.depth,
        glue_set: 0.0,
    })
}

/// Packs the chain to exactly `width`, recording how much the glue has to
/// stretch (positive ratio) or shrink (negative ratio).
///
/// Shrinking never goes past the glue's shrink limit, so an overfull box
/// keeps a ratio of -1.
pub fn hpack_to(arena: &mut NodeArena, head: Option<NodeId>, width: ScaledPoint) -> NodeId {
    let m = measure(arena, head);
    let excess = width - m.width;
    let glue_set = if excess > ScaledPoint::ZERO && m.stretch > ScaledPoint::ZERO {
        excess.raw() as f64 / m.stretch.raw() as f64
    } else if excess < ScaledPoint::ZERO && m.shrink > ScaledPoint::ZERO {
        (excess.raw() as f64 / m.shrink.raw() as f64).max(-1.0)
    } else {
        0.0
    };
    if glue_set <= -1.0 && excess + m.shrink < ScaledPoint::ZERO {
        log::debug!("hpack_to: overfull box by {}", -(excess + m.shrink));
    }
    arena.alloc(HList {
        list: head,
        width,
        height: m.height,
        depth: m.depth,
        glue_set,
    })
}

/// Width a glue node takes inside a box set with `glue_set`.
pub fn glue_width(glue: &ets_node::Glue, glue_set: f64) -> ScaledPoint {
    if glue_set > 0.0 {
        glue.width + glue.stretch.scale(glue_set)
    } else if glue_set < 0.0 {
        glue.width + glue.shrink.scale(glue_set)
    } else {
        glue.width
    }
}
