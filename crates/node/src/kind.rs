use std::fmt;

/// The variant tag of a node.
///
/// Every node carries its kind for its whole life; only field values and
/// links change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Disc,
    Glue,
    Glyph,
    HList,
    Image,
    Lang,
    Penalty,
    VList,
}

impl NodeKind {
    pub const ALL: [NodeKind; 8] = [
        NodeKind::Disc,
        NodeKind::Glue,
        NodeKind::Glyph,
        NodeKind::HList,
        NodeKind::Image,
        NodeKind::Lang,
        NodeKind::Penalty,
        NodeKind::VList,
    ];

    /// Resolves the names accepted by `node.new`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "disc" => Some(NodeKind::Disc),
            "glue" => Some(NodeKind::Glue),
            "glyph" => Some(NodeKind::Glyph),
            "hlist" => Some(NodeKind::HList),
            "image" => Some(NodeKind::Image),
            "lang" => Some(NodeKind::Lang),
            "penalty" => Some(NodeKind::Penalty),
            "vlist" => Some(NodeKind::VList),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Disc => "disc",
            NodeKind::Glue => "glue",
            NodeKind::Glyph => "glyph",
            NodeKind::HList => "hlist",
            NodeKind::Image => "image",
            NodeKind::Lang => "lang",
            NodeKind::Penalty => "penalty",
            NodeKind::VList => "vlist",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::HList | NodeKind::VList)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(NodeKind::from_name("rule"), None);
    }
}
