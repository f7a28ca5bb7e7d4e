use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use crate::error::{Result, TreemapError};
use crate::hierarchy::{owner_label, Valuation};
use crate::model::{Canvas, Margin, NodeId, OwnerId, Rect, Tree};

/// How a node's rectangle is split among its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tiling {
    /// Greedy row packing that keeps aspect ratios close to 1.
    #[default]
    Squarify,
    /// One row per node, cutting along x at even depths and y at odd depths.
    SliceDice,
}

/// How much of the previous pass's ordering feeds the next squarify pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stickiness {
    Off,
    /// Equal values keep their previous relative order.
    #[default]
    TieBreak,
    /// Continuing nodes keep their previous order outright; new nodes follow.
    Retain,
}

/// What to do when a node with several children has a total value `<= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Split the rectangle equally among the children.
    #[default]
    EqualArea,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub canvas: Canvas,
    pub margin: Margin,
    pub tiling: Tiling,
    pub stickiness: Stickiness,
    #[serde(rename = "degenerate_policy")]
    pub degenerate: DegeneratePolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 960.0,
                height: 500.0,
            },
            margin: Margin {
                top: 40.0,
                right: 10.0,
                bottom: 10.0,
                left: 10.0,
            },
            tiling: Tiling::Squarify,
            stickiness: Stickiness::TieBreak,
            degenerate: DegeneratePolicy::EqualArea,
        }
    }
}

impl LayoutConfig {
    /// Drawable area: canvas minus margin.
    pub fn bounds(&self) -> Rect {
        self.canvas.rect().inset(&self.margin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub owner_id: OwnerId,
    pub rect: Rect,
    pub is_leaf: bool,
    pub region: String,
    pub value: f64,
}

/// Rank of each owner among its siblings in squarify pass order.
pub type OrderHint = HashMap<OwnerId, usize>;

/// One completed layout pass, keyed by owner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutSnapshot {
    measure: String,
    bounds: Rect,
    entries: BTreeMap<OwnerId, LayoutEntry>,
    order: OrderHint,
}

impl LayoutSnapshot {
    pub fn measure(&self) -> &str {
        &self.measure
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn get(&self, owner: &OwnerId) -> Option<&LayoutEntry> {
        self.entries.get(owner)
    }

    pub fn contains(&self, owner: &OwnerId) -> bool {
        self.entries.contains_key(owner)
    }

    pub fn entries(&self) -> impl Iterator<Item = &LayoutEntry> {
        self.entries.values()
    }

    pub fn owners(&self) -> impl Iterator<Item = &OwnerId> {
        self.entries.keys()
    }

    pub fn leaves(&self) -> impl Iterator<Item = &LayoutEntry> {
        self.entries.values().filter(|e| e.is_leaf)
    }

    pub fn groups(&self) -> impl Iterator<Item = &LayoutEntry> {
        self.entries.values().filter(|e| !e.is_leaf)
    }

    pub fn order_hint(&self) -> &OrderHint {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lay out `tree` with the values in `valuation`.
///
/// Either the whole snapshot is produced or an error is returned; nothing
/// is built in place.
pub fn layout(
    tree: &Tree,
    valuation: &Valuation,
    config: &LayoutConfig,
    hint: Option<&OrderHint>,
) -> Result<LayoutSnapshot> {
    let bounds = config.bounds();
    let mut pass = Pass {
        tree,
        valuation,
        config,
        hint: if config.stickiness == Stickiness::Off { None } else { hint },
        entries: BTreeMap::new(),
        order: HashMap::new(),
    };
    if !tree.is_empty() {
        pass.place_children(tree.root, bounds, 0)?;
    }
    tracing::debug!(
        "laid out {} rects for '{}' in {:.0}x{:.0} ({:?})",
        pass.entries.len(),
        valuation.measure(),
        bounds.width,
        bounds.height,
        config.tiling
    );
    Ok(LayoutSnapshot {
        measure: valuation.measure().to_string(),
        bounds,
        entries: pass.entries,
        order: pass.order,
    })
}

struct Pass<'a> {
    tree: &'a Tree,
    valuation: &'a Valuation,
    config: &'a LayoutConfig,
    hint: Option<&'a OrderHint>,
    entries: BTreeMap<OwnerId, LayoutEntry>,
    order: OrderHint,
}

impl Pass<'_> {
    fn place_children(&mut self, parent: NodeId, rect: Rect, depth: usize) -> Result<()> {
        let tree = self.tree;
        let children = tree.children(parent);
        match children.len() {
            0 => return Ok(()),
            1 => return self.place(children[0], rect, 0, depth),
            _ => {}
        }

        let values: Vec<f64> = children.iter().map(|&c| self.valuation.value(c)).collect();
        let total: f64 = values.iter().sum();
        if !total.is_finite() {
            return Err(TreemapError::ValueOverflow {
                owner: owner_label(tree.get(parent)),
                measure: self.valuation.measure().to_string(),
            });
        }
        let weights = if total > 0.0 {
            values
        } else {
            let owner = owner_label(tree.get(parent));
            match self.config.degenerate {
                DegeneratePolicy::Reject => return Err(TreemapError::DegenerateArea { owner, total }),
                DegeneratePolicy::EqualArea => {
                    tracing::warn!("total under {owner} is {total}, splitting area equally");
                    vec![1.0; children.len()]
                }
            }
        };
        let weight_total: f64 = weights.iter().sum();
        let scale = rect.area() / weight_total;

        let placed: Vec<(NodeId, Rect)> = match self.config.tiling {
            Tiling::Squarify => {
                let order = self.squarify_order(children, &weights);
                let areas: Vec<f64> = order.iter().map(|&i| weights[i] * scale).collect();
                let rects = squarify(&areas, rect)
                    .into_iter()
                    .flat_map(|row| row.rects);
                order.iter().map(|&i| children[i]).zip(rects).collect()
            }
            Tiling::SliceDice => {
                let areas: Vec<f64> = weights.iter().map(|w| w * scale).collect();
                let along_x = depth % 2 == 0;
                children
                    .iter()
                    .copied()
                    .zip(slice(&areas, rect, along_x))
                    .collect()
            }
        };

        for (rank, (id, r)) in placed.into_iter().enumerate() {
            self.place(id, r, rank, depth)?;
        }
        Ok(())
    }

    fn place(&mut self, id: NodeId, rect: Rect, rank: usize, depth: usize) -> Result<()> {
        let tree = self.tree;
        let node = tree.get(id);
        if let Some(owner) = node.owner_id() {
            self.order.insert(owner.clone(), rank);
            self.entries.insert(
                owner.clone(),
                LayoutEntry {
                    owner_id: owner,
                    rect,
                    is_leaf: node.is_leaf(),
                    region: node.region().unwrap_or_default().to_string(),
                    value: self.valuation.value(id),
                },
            );
        }
        if !node.is_leaf() {
            self.place_children(id, rect, depth + 1)?;
        }
        Ok(())
    }

    /// Indices into `children`, in the order squarify should consume them.
    fn squarify_order(&self, children: &[NodeId], weights: &[f64]) -> Vec<usize> {
        let prev_rank = |i: usize| -> Option<usize> {
            let hint = self.hint?;
            let owner = self.tree.get(children[i]).owner_id()?;
            hint.get(&owner).copied()
        };

        let mut order: Vec<usize> = (0..children.len()).collect();
        match (self.config.stickiness, self.hint.is_some()) {
            (Stickiness::Retain, true) => {
                order.sort_by(|&a, &b| match (prev_rank(a), prev_rank(b)) {
                    (Some(ra), Some(rb)) => ra.cmp(&rb),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => weights[b].total_cmp(&weights[a]),
                });
            }
            (Stickiness::TieBreak, true) => {
                order.sort_by(|&a, &b| {
                    weights[b].total_cmp(&weights[a]).then_with(|| {
                        let ra = prev_rank(a).unwrap_or(usize::MAX);
                        let rb = prev_rank(b).unwrap_or(usize::MAX);
                        ra.cmp(&rb)
                    })
                });
            }
            // Stable sort: equal values keep child order.
            _ => order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a])),
        }
        order
    }
}

/// One closed squarify row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Indices into the `areas` slice handed to [`squarify`].
    pub members: Range<usize>,
    /// The remaining strip at the moment the row was opened.
    pub strip: Rect,
    pub rects: Vec<Rect>,
}

/// `max(w²·a / s², s² / (w²·a))` over the row, `s` being the row's total area.
///
/// Lower is squarer. An empty row, a zero-length side, or a zero-area member
/// gives infinity.
pub fn worst_aspect_ratio(row: &[f64], w: f64) -> f64 {
    let s: f64 = row.iter().sum();
    if row.is_empty() || s <= 0.0 || w <= 0.0 {
        return f64::INFINITY;
    }
    let w2 = w * w;
    let s2 = s * s;
    row.iter()
        .map(|&a| {
            if a <= 0.0 {
                f64::INFINITY
            } else {
                (w2 * a / s2).max(s2 / (w2 * a))
            }
        })
        .fold(0.0, f64::max)
}

/// Squarified tiling of `rect` for `areas`, taken in the given order.
///
/// `areas` must sum to `rect.area()`. Rows span the short side of the
/// remaining strip. Zero areas trail the positive ones and collapse onto the
/// far corner of `rect`.
pub fn squarify(areas: &[f64], rect: Rect) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut strip = rect;
    let mut start = 0usize;
    let n = areas.len();

    while start < n {
        if areas[start] <= 0.0 {
            // A zero area can't open a sensible row; give it an empty rect
            // and move on.
            rows.push(Row {
                members: start..start + 1,
                strip,
                rects: vec![Rect::new(rect.right(), rect.bottom(), 0.0, 0.0)],
            });
            start += 1;
            continue;
        }

        let w = strip.short_side();
        let mut end = start + 1;
        if w > 0.0 {
            while end < n && areas[end] > 0.0 {
                let current = worst_aspect_ratio(&areas[start..end], w);
                let grown = worst_aspect_ratio(&areas[start..=end], w);
                if grown > current {
                    break;
                }
                end += 1;
            }
        } else {
            // Nothing left to be square about; take every positive area.
            while end < n && areas[end] > 0.0 {
                end += 1;
            }
        }

        let (rects, rest) = lay_row(&areas[start..end], strip);
        rows.push(Row {
            members: start..end,
            strip,
            rects,
        });
        strip = rest;
        start = end;
    }
    rows
}

/// Place one row along the short side of `strip`; returns the member rects
/// and what is left of the strip.
fn lay_row(row: &[f64], strip: Rect) -> (Vec<Rect>, Rect) {
    let s: f64 = row.iter().sum();
    let wide = strip.width >= strip.height;
    let side = if wide { strip.height } else { strip.width };
    let thickness = if side > 0.0 { s / side } else { 0.0 };

    let mut rects = Vec::with_capacity(row.len());
    let mut offset = 0.0;
    for &a in row {
        let length = if thickness > 0.0 { a / thickness } else { 0.0 };
        rects.push(if wide {
            Rect::new(strip.x, strip.y + offset, thickness, length)
        } else {
            Rect::new(strip.x + offset, strip.y, length, thickness)
        });
        offset += length;
    }

    let rest = if wide {
        Rect::new(strip.x + thickness, strip.y, strip.width - thickness, strip.height)
    } else {
        Rect::new(strip.x, strip.y + thickness, strip.width, strip.height - thickness)
    };
    (rects, rest)
}

/// Single-row split of `rect` in the given order, along x or along y.
pub fn slice(areas: &[f64], rect: Rect, along_x: bool) -> Vec<Rect> {
    let total: f64 = areas.iter().sum();
    let mut out = Vec::with_capacity(areas.len());
    let mut offset = 0.0;
    for &a in areas {
        let share = if total > 0.0 { a / total } else { 0.0 };
        if along_x {
            let w = rect.width * share;
            out.push(Rect::new(rect.x + offset, rect.y, w, rect.height));
            offset += w;
        } else {
            let h = rect.height * share;
            out.push(Rect::new(rect.x, rect.y + offset, rect.width, h));
            offset += h;
        }
    }
    out
}
