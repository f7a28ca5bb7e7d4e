use crate::aggregate::Grouped;
use crate::error::{Result, TreemapError};
use crate::measure::{MeasureSet, ValueAccessor, ValuePolicy};
use crate::model::{NodeId, NodeKind, Record, Tree, TreeNode};

/// Per-node values for one measure selection, indexed by `NodeId`.
///
/// Produced fresh by [`recompute`]; the tree itself is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    measure: String,
    values: Vec<f64>,
}

impl Valuation {
    pub fn measure(&self) -> &str {
        &self.measure
    }

    pub fn value(&self, id: NodeId) -> f64 {
        self.values[id.index()]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Root → one internal node per group → one leaf per record.
pub fn build(grouped: Grouped<String>) -> Tree {
    let mut nodes: Vec<TreeNode> = Vec::with_capacity(1 + grouped.len() * 8);
    let root = NodeId(0);
    nodes.push(TreeNode {
        id: root,
        parent: None,
        kind: NodeKind::Internal { key: None },
        children: Vec::with_capacity(grouped.len()),
        depth: 0,
    });

    fn push(nodes: &mut Vec<TreeNode>, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(nodes.len() as u32);
        let depth = nodes[parent.index()].depth + 1;
        nodes.push(TreeNode {
            id,
            parent: Some(parent),
            kind,
            children: Vec::new(),
            depth,
        });
        nodes[parent.index()].children.push(id);
        id
    }

    for (region, records) in grouped {
        let group = push(&mut nodes, root, NodeKind::Internal { key: Some(region) });
        for record in records {
            push(&mut nodes, group, NodeKind::Leaf(record));
        }
    }

    tracing::debug!("built tree with {} nodes", nodes.len());
    Tree { root, nodes }
}

/// Value every node for `measure`. Leaves come from `accessor`, internal
/// nodes are the sum of their children.
pub fn recompute(
    tree: &Tree,
    measures: &MeasureSet,
    measure: &str,
    accessor: &impl ValueAccessor,
    policy: ValuePolicy,
) -> Result<Valuation> {
    measures.validate(measure)?;

    let mut values = vec![0.0; tree.len()];
    let mut coerced = 0usize;

    // Children always sit at higher indices than their parent.
    for node in tree.nodes.iter().rev() {
        values[node.id.index()] = match &node.kind {
            NodeKind::Leaf(record) => leaf_value(record, measure, accessor, policy, &mut coerced)?,
            NodeKind::Internal { .. } => {
                let sum: f64 = node.children.iter().map(|c| values[c.index()]).sum();
                // Finite leaves can still add up past f64::MAX.
                if !sum.is_finite() {
                    return Err(TreemapError::ValueOverflow {
                        owner: owner_label(node),
                        measure: measure.to_string(),
                    });
                }
                sum
            }
        };
    }

    if coerced > 0 {
        tracing::warn!("{coerced} value(s) of '{measure}' coerced to zero");
    }
    tracing::debug!(
        "recomputed '{}': total {}",
        measure,
        values.get(tree.root.index()).copied().unwrap_or(0.0)
    );

    Ok(Valuation {
        measure: measure.to_string(),
        values,
    })
}

pub(crate) fn owner_label(node: &TreeNode) -> String {
    node.owner_id()
        .map(|o| o.to_string())
        .unwrap_or_else(|| "root".to_string())
}

fn leaf_value(
    record: &Record,
    measure: &str,
    accessor: &impl ValueAccessor,
    policy: ValuePolicy,
    coerced: &mut usize,
) -> Result<f64> {
    match accessor.value(record, measure) {
        Ok(v) => Ok(v),
        Err(fault) => match policy {
            ValuePolicy::Strict => Err(TreemapError::InvalidValue {
                country_code: record.country_code.clone(),
                measure: measure.to_string(),
                fault,
            }),
            ValuePolicy::Lenient => {
                tracing::debug!("{}: '{}' {}, using 0", record.country_code, measure, fault);
                *coerced += 1;
                Ok(0.0)
            }
        },
    }
}
