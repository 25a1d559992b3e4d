use crate::arena::NodeId;
use crate::kind::NodeKind;
use ets_types::{FontRef, ImageRef, LangRef, ScaledPoint};

/// A shaped character with its advance and font binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    /// Glyph id inside the font; this is what ends up in the PDF.
    pub codepoint: i64,
    /// The source text this glyph stands for (several characters for ligatures).
    pub components: String,
    pub font: Option<FontRef>,
    pub width: ScaledPoint,
    pub height: ScaledPoint,
    pub depth: ScaledPoint,
}

/// A spacer with natural width and the amounts it may stretch or shrink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glue {
    pub width: ScaledPoint,
    pub stretch: ScaledPoint,
    pub shrink: ScaledPoint,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Penalty {
    pub penalty: i64,
    pub flagged: bool,
    pub width: ScaledPoint,
}

/// Marks an optional break point, typically a hyphenation site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Disc;

/// Horizontal box. `list` is the head of the nested child chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HList {
    pub list: Option<NodeId>,
    pub width: ScaledPoint,
    pub height: ScaledPoint,
    pub depth: ScaledPoint,
    /// Glue ratio set by packing: positive values stretch, negative values shrink.
    pub glue_set: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VList {
    pub list: Option<NodeId>,
    pub width: ScaledPoint,
    pub height: ScaledPoint,
    pub depth: ScaledPoint,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageNode {
    pub img: Option<ImageRef>,
    pub width: ScaledPoint,
    pub height: ScaledPoint,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LangNode {
    pub lang: Option<LangRef>,
}

/// The closed sum of all node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Disc(Disc),
    Glue(Glue),
    Glyph(Glyph),
    HList(HList),
    Image(ImageNode),
    Lang(LangNode),
    Penalty(Penalty),
    VList(VList),
}

impl Node {
    /// A node of the given kind with default fields.
    pub fn new(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Disc => Node::Disc(Disc),
            NodeKind::Glue => Node::Glue(Glue::default()),
            NodeKind::Glyph => Node::Glyph(Glyph::default()),
            NodeKind::HList => Node::HList(HList::default()),
            NodeKind::Image => Node::Image(ImageNode::default()),
            NodeKind::Lang => Node::Lang(LangNode::default()),
            NodeKind::Penalty => Node::Penalty(Penalty::default()),
            NodeKind::VList => Node::VList(VList::default()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Disc(_) => NodeKind::Disc,
            Node::Glue(_) => NodeKind::Glue,
            Node::Glyph(_) => NodeKind::Glyph,
            Node::HList(_) => NodeKind::HList,
            Node::Image(_) => NodeKind::Image,
            Node::Lang(_) => NodeKind::Lang,
            Node::Penalty(_) => NodeKind::Penalty,
            Node::VList(_) => NodeKind::VList,
        }
    }

    /// Natural width in horizontal mode. Penalties only take space when a
    /// line is broken at them, so they report zero here.
    pub fn width(&self) -> ScaledPoint {
        match self {
            Node::Glue(g) => g.width,
            Node::Glyph(g) => g.width,
            Node::HList(h) => h.width,
            Node::Image(i) => i.width,
            Node::VList(v) => v.width,
            Node::Disc(_) | Node::Lang(_) | Node::Penalty(_) => ScaledPoint::ZERO,
        }
    }

    pub fn height(&self) -> ScaledPoint {
        match self {
            Node::Glyph(g) => g.height,
            Node::HList(h) => h.height,
            Node::Image(i) => i.height,
            Node::VList(v) => v.height,
            _ => ScaledPoint::ZERO,
        }
    }

    pub fn depth(&self) -> ScaledPoint {
        match self {
            Node::Glyph(g) => g.depth,
            Node::HList(h) => h.depth,
            Node::VList(v) => v.depth,
            _ => ScaledPoint::ZERO,
        }
    }

    /// Head of the nested list for containers.
    pub fn list(&self) -> Option<NodeId> {
        match self {
            Node::HList(h) => h.list,
            Node::VList(v) => v.list,
            _ => None,
        }
    }
}

/// Safe downcasting from [`Node`] to one concrete variant.
pub trait NodeVariant: Sized + Into<Node> + 'static {
    const KIND: NodeKind;

    fn from_node(node: &Node) -> Option<&Self>;

    fn from_node_mut(node: &mut Node) -> Option<&mut Self>;
}

/// Variants that own a nested child chain.
pub trait Container: NodeVariant {
    fn list(&self) -> Option<NodeId>;

    fn set_list(&mut self, head: Option<NodeId>);
}

macro_rules! node_variant {
    ($ty:ident, $kind:ident) => {
        impl NodeVariant for $ty {
            const KIND: NodeKind = NodeKind::$kind;

            fn from_node(node: &Node) -> Option<&Self> {
                match node {
                    Node::$kind(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_node_mut(node: &mut Node) -> Option<&mut Self> {
                match node {
                    Node::$kind(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Node {
            fn from(value: $ty) -> Self {
                Node::$kind(value)
            }
        }
    };
}

node_variant!(Disc, Disc);
node_variant!(Glue, Glue);
node_variant!(Glyph, Glyph);
node_variant!(HList, HList);
node_variant!(ImageNode, Image);
node_variant!(LangNode, Lang);
node_variant!(Penalty, Penalty);
node_variant!(VList, VList);

impl Container for HList {
    fn list(&self) -> Option<NodeId> {
        self.list
    }

    fn set_list(&mut self, head: Option<NodeId>) {
        self.list = head;
    }
}

impl Container for VList {
    fn list(&self) -> Option<NodeId> {
        self.list
    }

    fn set_list(&mut self, head: Option<NodeId>) {
        self.list = head;
    }
}
