//! First-fit line breaking of a packed paragraph.

use crate::LayoutError;
use crate::algorithms::hpack::{hpack, hpack_to};
use ets_node::{Glue, HList, Node, NodeArena, NodeId, VList};
use ets_types::ScaledPoint;
use std::ops::Range;

/// Penalties at or above this value never break.
pub const INF_PENALTY: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinebreakSettings {
    /// Target line width.
    pub hsize: ScaledPoint,
    /// Baseline-to-baseline distance.
    pub line_height: ScaledPoint,
}

/// Nodes that disappear when a line is broken at or after them.
fn is_discardable(node: &Node) -> bool {
    matches!(node, Node::Glue(_) | Node::Penalty(_) | Node::Disc(_))
}

/// Whether a line may end at `items[i]`, and whether it must.
fn break_kind(arena: &NodeArena, items: &[NodeId], i: usize) -> Option<bool> {
    match arena.node(items[i]) {
        Node::Glue(_) => {
            let after_box = i > 0 && !is_discardable(arena.node(items[i - 1]));
            after_box.then_some(false)
        }
        Node::Penalty(p) if p.penalty <= -INF_PENALTY => Some(true),
        Node::Penalty(p) if p.penalty < INF_PENALTY => Some(false),
        Node::Disc(_) => Some(false),
        _ => None,
    }
}

/// Splits `items` into line ranges. Break nodes are not part of any range.
fn find_lines(arena: &NodeArena, items: &[NodeId], hsize: ScaledPoint) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    'line: while start < items.len() {
        while start < items.len() && is_discardable(arena.node(items[start])) {
            start += 1;
        }
        let mut width = ScaledPoint::ZERO;
        let mut last_break = None;
        for i in start..items.len() {
            match break_kind(arena, items, i) {
                Some(true) => {
                    lines.push(start..i);
                    start = i + 1;
                    continue 'line;
                }
                Some(false) => last_break = Some(i),
                None => {}
            }
            width += arena.node(items[i]).width();
            if width > hsize
                && let Some(b) = last_break
            {
                lines.push(start..b);
                start = b + 1;
                continue 'line;
            }
        }
        if start < items.len() {
            lines.push(start..items.len());
        }
        break;
    }
    lines
}

/// Breaks the contents of `hlist` into lines of `settings.hsize` and stacks
/// them in a new VList, separated by glue so that baselines are
/// `settings.line_height` apart.
///
/// Lines are cut at the last feasible break before the measure overflows.
/// A line without any feasible break stays overfull. The nodes of the
/// paragraph are relinked into the lines; the glue, penalty and disc nodes
/// at the breaks are unlinked.
pub fn simple_linebreak(arena: &mut NodeArena, hlist: NodeId, settings: &LinebreakSettings) -> Result<NodeId, LayoutError> {
    if settings.hsize <= ScaledPoint::ZERO {
        return Err(LayoutError::InvalidSettings(format!("hsize must be positive, got {}", settings.hsize)));
    }
    let head = arena.get::<HList>(hlist)?.list;
    let items: Vec<NodeId> = arena.iter(head).collect();
    let ranges = find_lines(arena, &items, settings.hsize);
    log::debug!("simple_linebreak: {} nodes into {} lines", items.len(), ranges.len());

    for &id in &items {
        arena.set_prev(id, None);
        arena.set_next(id, None);
    }

    let count = ranges.len();
    let mut lines = Vec::with_capacity(count);
    for (n, range) in ranges.into_iter().enumerate() {
        let line = &items[range];
        for pair in line.windows(2) {
            arena.set_next(pair[0], Some(pair[1]));
            arena.set_prev(pair[1], Some(pair[0]));
        }
        let first = line.first().copied();
        let packed = if n + 1 == count {
            let id = hpack(arena, first);
            arena.get_mut::<HList>(id)?.width = settings.hsize;
            id
        } else {
            hpack_to(arena, first, settings.hsize)
        };
        lines.push(packed);
    }

    let mut vhead: Option<NodeId> = None;
    let mut tail: Option<NodeId> = None;
    let mut height = ScaledPoint::ZERO;
    let mut depth = ScaledPoint::ZERO;
    for line in lines {
        let (line_height, line_depth) = {
            let h = arena.get::<HList>(line)?;
            (h.height, h.depth)
        };
        if tail.is_some() {
            let skip = (settings.line_height - depth - line_height).max(ScaledPoint::ZERO);
            let glue = arena.alloc(Glue {
                width: skip,
                ..Default::default()
            });
            vhead = Some(arena.insert_after(vhead, tail, glue));
            tail = Some(glue);
            height += depth + skip;
        }
        vhead = Some(arena.insert_after(vhead, tail, line));
        tail = Some(line);
        height += line_height;
        depth = line_depth;
    }

    Ok(arena.alloc(VList {
        list: vhead,
        width: settings.hsize,
        height,
        depth,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ets_node::{Glyph, NodeKind, Penalty};

    fn sp(pt: f64) -> ScaledPoint {
        ScaledPoint::from_pt(pt)
    }

    /// Words of `word_width` points separated by 2pt glue.
    fn paragraph(arena: &mut NodeArena, words: usize, word_width: f64) -> NodeId {
        let mut head = None;
        let mut tail = None;
        for w in 0..words {
            if w > 0 {
                let glue = arena.alloc(Glue {
                    width: sp(2.0),
                    stretch: sp(1.0),
                    shrink: sp(0.5),
                });
                head = Some(arena.insert_after(head, tail, glue));
                tail = Some(glue);
            }
            let glyph = arena.alloc(Glyph {
                width: sp(word_width),
                height: sp(7.0),
                depth: sp(2.0),
                ..Default::default()
            });
            head = Some(arena.insert_after(head, tail, glyph));
            tail = Some(glyph);
        }
        hpack(arena, head)
    }

    fn lines_of(arena: &NodeArena, vlist: NodeId) -> Vec<NodeId> {
        let head = arena.get::<VList>(vlist).unwrap().list;
        arena
            .iter(head)
            .filter(|&id| arena.kind(id) == NodeKind::HList)
            .collect()
    }

    fn natural_width(arena: &NodeArena, line: NodeId) -> ScaledPoint {
        let head = arena.get::<HList>(line).unwrap().list;
        arena.iter(head).map(|id| arena.node(id).width()).sum()
    }

    #[test]
    fn test_lines_respect_hsize() {
        let mut arena = NodeArena::new();
        let par = paragraph(&mut arena, 10, 20.0);
        let settings = LinebreakSettings {
            hsize: sp(70.0),
            line_height: sp(12.0),
        };
        let vlist = simple_linebreak(&mut arena, par, &settings).unwrap();
        let lines = lines_of(&arena, vlist);
        assert_eq!(lines.len(), 4);
        for &line in &lines {
            assert!(natural_width(&arena, line) <= settings.hsize);
            assert_eq!(arena.get::<HList>(line).unwrap().width, settings.hsize);
            let head = arena.get::<HList>(line).unwrap().list.unwrap();
            assert_eq!(arena.prev(head), None);
            assert_eq!(arena.kind(head), NodeKind::Glyph);
        }
        let words: usize = lines
            .iter()
            .map(|&l| {
                let head = arena.get::<HList>(l).unwrap().list;
                arena.iter(head).filter(|&id| arena.kind(id) == NodeKind::Glyph).count()
            })
            .sum();
        assert_eq!(words, 10);
    }

    #[test]
    fn test_baselines_are_line_height_apart() {
        let mut arena = NodeArena::new();
        let par = paragraph(&mut arena, 4, 30.0);
        let settings = LinebreakSettings {
            hsize: sp(40.0),
            line_height: sp(12.0),
        };
        let vlist = simple_linebreak(&mut arena, par, &settings).unwrap();
        let v = arena.get::<VList>(vlist).unwrap();
        let head = v.list.unwrap();
        let kinds: Vec<_> = arena.iter(Some(head)).map(|id| arena.kind(id)).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::HList,
                NodeKind::Glue,
                NodeKind::HList,
                NodeKind::Glue,
                NodeKind::HList,
                NodeKind::Glue,
                NodeKind::HList
            ]
        );
        let skip = arena.get::<Glue>(arena.next(head).unwrap()).unwrap().width;
        assert_eq!(skip, sp(3.0));
        assert_eq!(v.height, sp(7.0 + 3.0 * 12.0));
        assert_eq!(v.depth, sp(2.0));
    }

    #[test]
    fn test_forced_break() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(Glyph {
            width: sp(5.0),
            ..Default::default()
        });
        let p = arena.alloc(Penalty {
            penalty: -INF_PENALTY,
            ..Default::default()
        });
        let b = arena.alloc(Glyph {
            width: sp(5.0),
            ..Default::default()
        });
        let head = arena.insert_after(None, None, a);
        arena.insert_after(Some(head), Some(a), p);
        arena.insert_after(Some(head), Some(p), b);
        let par = hpack(&mut arena, Some(head));
        let settings = LinebreakSettings {
            hsize: sp(100.0),
            line_height: sp(12.0),
        };
        let vlist = simple_linebreak(&mut arena, par, &settings).unwrap();
        assert_eq!(lines_of(&arena, vlist).len(), 2);
        assert_eq!(arena.next(p), None);
    }

    #[test]
    fn test_rejects_non_hlist_and_bad_settings() {
        let mut arena = NodeArena::new();
        let glue = arena.new_node(NodeKind::Glue);
        let settings = LinebreakSettings {
            hsize: sp(10.0),
            line_height: sp(12.0),
        };
        assert!(matches!(
            simple_linebreak(&mut arena, glue, &settings),
            Err(LayoutError::Node(_))
        ));
        let par = hpack(&mut arena, None);
        let bad = LinebreakSettings {
            hsize: ScaledPoint::ZERO,
            ..settings
        };
        assert!(matches!(
            simple_linebreak(&mut arena, par, &bad),
            Err(LayoutError::InvalidSettings(_))
        ));
        let vlist = simple_linebreak(&mut arena, par, &settings).unwrap();
        assert_eq!(arena.get::<VList>(vlist).unwrap().list, None);
    }
}
