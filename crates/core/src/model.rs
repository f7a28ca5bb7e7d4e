use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One loaded row: a country, the region it is grouped under, and the raw
/// text of every measure column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub country_code: String,
    pub region: String,
    pub measures: BTreeMap<String, String>,
}

impl Record {
    pub fn new(country_code: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
            region: region.into(),
            measures: BTreeMap::new(),
        }
    }

    pub fn with_measure(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.measures.insert(name.into(), value.to_string());
        self
    }

    pub fn raw(&self, measure: &str) -> Option<&str> {
        self.measures.get(measure).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stable identity of a laid-out element across passes.
///
/// Groups sort before leaves, so a snapshot lists backgrounds first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum OwnerId {
    Group(String),
    Leaf(String),
}

impl OwnerId {
    pub fn key(&self) -> &str {
        match self {
            OwnerId::Group(k) | OwnerId::Leaf(k) => k,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, OwnerId::Leaf(_))
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerId::Group(k) => write!(f, "group:{k}"),
            OwnerId::Leaf(k) => write!(f, "leaf:{k}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// The root has no key; region nodes carry the region name.
    Internal { key: Option<String> },
    Leaf(Record),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    pub depth: u16,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// `None` for the root, which is never drawn.
    pub fn owner_id(&self) -> Option<OwnerId> {
        match &self.kind {
            NodeKind::Internal { key: Some(k) } => Some(OwnerId::Group(k.clone())),
            NodeKind::Internal { key: None } => None,
            NodeKind::Leaf(r) => Some(OwnerId::Leaf(r.country_code.clone())),
        }
    }

    /// Region this node belongs to (its own key for a group).
    pub fn region(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Internal { key } => key.as_deref(),
            NodeKind::Leaf(r) => Some(&r.region),
        }
    }
}

/// Arena tree. Parents always precede their children in `nodes`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Tree {
    pub root: NodeId,
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn leaves(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    /// Region keys in first-seen order.
    pub fn regions(&self) -> Vec<String> {
        self.children(self.root)
            .iter()
            .filter_map(|&id| self.get(id).region().map(str::to_owned))
            .collect()
    }
}

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn short_side(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        let short = self.short_side();
        if short <= 0.0 {
            return f64::INFINITY;
        }
        self.width.max(self.height) / short
    }

    pub fn inset(&self, margin: &Margin) -> Self {
        Rect::new(
            self.x + margin.left,
            self.y + margin.top,
            self.width - margin.left - margin.right,
            self.height - margin.top - margin.bottom,
        )
    }

    /// Snap edges to whole pixels. For render bindings only; the engine
    /// stays in full precision.
    pub fn rounded(&self) -> Self {
        let x0 = self.x.round();
        let y0 = self.y.round();
        Rect::new(x0, y0, self.right().round() - x0, self.bottom().round() - y0)
    }

    /// Linear interpolation; `t` is clamped to `0..=1`.
    pub fn lerp(&self, to: &Rect, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Rect::new(
            mix(self.x, to.x),
            mix(self.y, to.y),
            mix(self.width, to.width),
            mix(self.height, to.height),
        )
    }

    /// Degenerate rectangle sitting on this one's centre.
    pub fn collapsed(&self) -> Self {
        Rect::new(self.x + self.width / 2.0, self.y + self.height / 2.0, 0.0, 0.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}
