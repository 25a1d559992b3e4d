use crate::arena::{NodeArena, NodeId};
use crate::variants::Node;
use std::collections::HashSet;
use std::fmt::Write;

impl NodeArena {
    /// Renders the list starting at `head`, nested lists indented below
    /// their container. Stops at nodes it has already printed.
    pub fn dump(&self, head: NodeId) -> String {
        let mut out = String::new();
        let mut seen = HashSet::new();
        self.dump_list(head, 0, &mut seen, &mut out);
        out
    }

    fn dump_list(&self, head: NodeId, depth: usize, seen: &mut HashSet<NodeId>, out: &mut String) {
        let mut cur = Some(head);
        while let Some(id) = cur {
            let indent = "  ".repeat(depth);
            if !seen.insert(id) {
                let _ = writeln!(out, "{indent}{id} (seen before)");
                return;
            }
            let _ = writeln!(out, "{indent}{id} {}", describe(self.node(id)));
            if let Some(child) = self.node(id).list() {
                self.dump_list(child, depth + 1, seen, out);
            }
            cur = self.next(id);
        }
    }
}

fn describe(node: &Node) -> String {
    match node {
        Node::Disc(_) => "disc".to_string(),
        Node::Glue(g) => format!("glue wd={} st={} sh={}", g.width, g.stretch, g.shrink),
        Node::Glyph(g) => format!(
            "glyph cp={} '{}' wd={} font={}",
            g.codepoint,
            g.components,
            g.width,
            g.font.map_or_else(|| "-".to_string(), |f| f.to_string())
        ),
        Node::HList(h) => format!(
            "hlist wd={} ht={} dp={} glue_set={:.3}",
            h.width, h.height, h.depth, h.glue_set
        ),
        Node::Image(i) => format!("image wd={} ht={}", i.width, i.height),
        Node::Lang(l) => format!("lang {}", l.lang.map_or_else(|| "-".to_string(), |l| l.to_string())),
        Node::Penalty(p) => format!("penalty {} flagged={} wd={}", p.penalty, p.flagged, p.width),
        Node::VList(v) => format!("vlist wd={} ht={} dp={}", v.width, v.height, v.depth),
    }
}

#[cfg(test)]
mod tests {
    use crate::{HList, NodeArena, NodeKind};

    #[test]
    fn test_dump_nests_and_leaves_links_alone() {
        let mut arena = NodeArena::new();
        let a = arena.new_node(NodeKind::Glyph);
        let b = arena.new_node(NodeKind::Glue);
        let head = arena.insert_after(Some(a), Some(a), b);
        let boxed = arena.new_node(NodeKind::HList);
        arena.get_mut::<HList>(boxed).unwrap().list = Some(head);

        let text = arena.dump(boxed);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("n2 hlist"));
        assert!(lines[1].starts_with("  n0 glyph"));
        assert!(lines[2].starts_with("  n1 glue"));
        assert_eq!(arena.next(a), Some(b));
        assert_eq!(arena.prev(b), Some(a));
    }

    #[test]
    fn test_dump_survives_cycles() {
        let mut arena = NodeArena::new();
        let a = arena.new_node(NodeKind::Disc);
        arena.set_next(a, Some(a));
        assert!(arena.dump(a).contains("seen before"));
    }
}
