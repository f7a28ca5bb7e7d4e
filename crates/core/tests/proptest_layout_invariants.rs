//! Property-based invariants for grouping, valuation and tiling.
//!
//! 1. Group keys come out in first-occurrence order.
//! 2. Every internal value is the sum of its children.
//! 3. Leaf areas add up to their group, and groups to the canvas.
//! 4. Squarify rows obey the greedy stopping rule.
//! 5. Reconciling a snapshot with itself changes nothing.

use nestmap_core::aggregate::{by_region, group_by};
use nestmap_core::hierarchy::{build, recompute};
use nestmap_core::measure::{FieldAccessor, MeasureSet, ValuePolicy};
use nestmap_core::reconcile::{reconcile, TransitionKind};
use nestmap_core::treemap::{layout, squarify, worst_aspect_ratio, LayoutConfig, Tiling};
use nestmap_core::{Canvas, Margin, OwnerId, Record, Rect};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn records_strategy() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec((0usize..6, 0u32..1000), 1..40).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (region, v))| Record::new(format!("C{i}"), format!("R{region}")).with_measure("v", v))
            .collect()
    })
}

fn canvas_strategy() -> impl Strategy<Value = LayoutConfig> {
    (1u32..2000, 1u32..2000, prop_oneof![Just(Tiling::Squarify), Just(Tiling::SliceDice)]).prop_map(|(w, h, tiling)| {
        LayoutConfig {
            canvas: Canvas {
                width: w as f64,
                height: h as f64,
            },
            margin: Margin::default(),
            tiling,
            ..LayoutConfig::default()
        }
    })
}

fn close(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= 1e-9 * scale.max(1.0)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Group order
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn group_keys_in_first_seen_order(keys in prop::collection::vec(0u8..10, 1..60)) {
        let grouped = group_by(keys.clone(), |k| *k).unwrap();
        let mut expected: Vec<u8> = Vec::new();
        for k in &keys {
            if !expected.contains(k) {
                expected.push(*k);
            }
        }
        let got: Vec<u8> = grouped.keys().copied().collect();
        prop_assert_eq!(got, expected);

        let total: usize = grouped.iter().map(|(_, items)| items.len()).sum();
        prop_assert_eq!(total, keys.len());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Internal value = sum of children
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn internal_values_sum_children(records in records_strategy()) {
        let tree = build(by_region(records).unwrap());
        let v = recompute(&tree, &MeasureSet::new(["v"]), "v", &FieldAccessor, ValuePolicy::Strict).unwrap();
        for node in tree.nodes.iter().filter(|n| !n.is_leaf()) {
            let sum: f64 = node.children.iter().map(|&c| v.value(c)).sum();
            prop_assert!((v.value(node.id) - sum).abs() < 1e-9);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Area conservation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn areas_are_conserved(records in records_strategy(), config in canvas_strategy()) {
        let tree = build(by_region(records).unwrap());
        let v = recompute(&tree, &MeasureSet::new(["v"]), "v", &FieldAccessor, ValuePolicy::Strict).unwrap();
        let s = layout(&tree, &v, &config, None).unwrap();
        let canvas = config.bounds().area();

        let leaves: f64 = s.leaves().map(|e| e.rect.area()).sum();
        prop_assert!(close(leaves, canvas, canvas), "leaves {} vs canvas {}", leaves, canvas);

        let groups: f64 = s.groups().map(|e| e.rect.area()).sum();
        prop_assert!(close(groups, canvas, canvas));

        for g in s.groups() {
            let inside: f64 = s.leaves().filter(|l| l.region == g.region).map(|l| l.rect.area()).sum();
            prop_assert!(close(inside, g.rect.area(), canvas), "group {}", g.region);
        }

        for e in s.entries() {
            prop_assert!(e.rect.width >= 0.0 && e.rect.height >= 0.0);
        }
        prop_assert_eq!(s.leaves().count(), tree.leaves().count());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Greedy stopping rule
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn squarify_rows_are_locally_optimal(
        weights in prop::collection::vec(1u32..500, 1..30),
        w in 1u32..300,
        h in 1u32..300,
    ) {
        let rect = Rect::new(0.0, 0.0, w as f64, h as f64);
        let mut weights: Vec<f64> = weights.into_iter().map(f64::from).collect();
        weights.sort_by(|a, b| b.total_cmp(a));
        let total: f64 = weights.iter().sum();
        let areas: Vec<f64> = weights.iter().map(|x| x / total * rect.area()).collect();

        let rows = squarify(&areas, rect);
        let mut next_start = 0;
        for row in &rows {
            prop_assert_eq!(row.members.start, next_start);
            next_start = row.members.end;

            let side = row.strip.short_side();
            let start = row.members.start;
            for k in start + 1..row.members.end {
                prop_assert!(
                    worst_aspect_ratio(&areas[start..=k], side) <= worst_aspect_ratio(&areas[start..k], side)
                );
            }
            if row.members.end < areas.len() {
                prop_assert!(
                    worst_aspect_ratio(&areas[start..=row.members.end], side)
                        > worst_aspect_ratio(&areas[start..row.members.end], side)
                );
            }
        }
        prop_assert_eq!(next_start, areas.len());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Self-reconciliation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reconcile_with_self_is_identity(records in records_strategy()) {
        let config = LayoutConfig::default();
        let tree = build(by_region(records).unwrap());
        let v = recompute(&tree, &MeasureSet::new(["v"]), "v", &FieldAccessor, ValuePolicy::Strict).unwrap();
        let s = layout(&tree, &v, &config, None).unwrap();

        let ts = reconcile(Some(&s), &s);
        prop_assert_eq!(ts.len(), s.len());
        for t in ts {
            prop_assert_eq!(t.kind(), TransitionKind::Updating);
            prop_assert_eq!(t.from, t.to);
            prop_assert!(matches!(t.owner_id, OwnerId::Group(_) | OwnerId::Leaf(_)));
        }
    }
}
