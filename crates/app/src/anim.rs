use eframe::egui::emath::easing;
use nestmap_core::reconcile::{Transition, TransitionKind};
use nestmap_core::{OwnerId, Rect};
use std::collections::HashMap;

/// d3's default transition easing, applied to linear progress.
fn ease(t: f64) -> f64 {
    easing::cubic_in_out(t.clamp(0.0, 1.0) as f32) as f64
}

/// One element as drawn on a given frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub owner_id: OwnerId,
    pub rect: Rect,
    pub opacity: f32,
}

/// A running set of transitions.
#[derive(Debug, Clone)]
pub struct Animation {
    transitions: Vec<Transition>,
    /// Opacity that carried-over exits start fading from.
    fading: HashMap<OwnerId, f32>,
    started: f64,
    duration: f64,
}

impl Animation {
    pub fn new(transitions: Vec<Transition>, now: f64, duration_ms: u64) -> Self {
        Self {
            transitions,
            fading: HashMap::new(),
            started: now,
            duration: duration_ms as f64 / 1000.0,
        }
    }

    /// Start `next` from wherever this animation currently has each element,
    /// so a change mid-flight doesn't jump back to the old endpoints.
    ///
    /// Elements still fading out that `next` no longer mentions keep fading
    /// from their current rect instead of vanishing.
    pub fn retarget(&self, mut next: Vec<Transition>, now: f64, duration_ms: u64) -> Self {
        let shown = self.frames(now);
        for t in &mut next {
            if let Some(f) = shown.iter().find(|f| f.owner_id == t.owner_id) {
                t.from = Some(f.rect);
            }
        }
        let mut fading = HashMap::new();
        for f in shown {
            if next.iter().any(|t| t.owner_id == f.owner_id) {
                continue;
            }
            fading.insert(f.owner_id.clone(), f.opacity);
            next.push(Transition {
                owner_id: f.owner_id,
                from: Some(f.rect),
                to: None,
            });
        }
        Self {
            fading,
            ..Self::new(next, now, duration_ms)
        }
    }

    pub fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.started) / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_running(&self, now: f64) -> bool {
        self.progress(now) < 1.0
    }

    pub fn frames(&self, now: f64) -> Vec<Frame> {
        let t = ease(self.progress(now));
        self.transitions
            .iter()
            .filter_map(|tr| {
                let opacity = match tr.kind() {
                    TransitionKind::Exiting => {
                        let from = self.fading.get(&tr.owner_id).copied().unwrap_or(1.0);
                        from * (1.0 - t as f32)
                    }
                    _ => 1.0,
                };
                if opacity <= 0.0 {
                    return None;
                }
                Some(Frame {
                    owner_id: tr.owner_id.clone(),
                    rect: tr.at(t),
                    opacity,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tr(id: &str, from: Option<Rect>, to: Option<Rect>) -> Transition {
        Transition {
            owner_id: OwnerId::Leaf(id.into()),
            from,
            to,
        }
    }

    #[test]
    fn easing_is_symmetric() {
        assert_eq!(ease(0.0), 0.0);
        assert_eq!(ease(1.0), 1.0);
        assert!((ease(0.5) - 0.5).abs() < 1e-6);
        assert!((ease(0.25) + ease(0.75) - 1.0).abs() < 1e-6);
        assert_eq!(ease(1.5), 1.0);
    }

    #[test]
    fn exiting_elements_disappear_at_the_end() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let anim = Animation::new(vec![tr("gone", Some(a), None), tr("stay", Some(a), Some(a))], 0.0, 1000);
        assert_eq!(anim.frames(0.0).len(), 2);
        let end = anim.frames(1.0);
        assert_eq!(end.len(), 1);
        assert_eq!(end[0].owner_id, OwnerId::Leaf("stay".into()));
        assert!(!anim.is_running(1.0));
    }

    #[test]
    fn retarget_starts_from_the_shown_position() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let c = Rect::new(20.0, 0.0, 10.0, 10.0);
        let first = Animation::new(vec![tr("x", Some(a), Some(b))], 0.0, 1000);
        let mid = first.frames(0.5)[0].rect;

        let second = first.retarget(vec![tr("x", Some(b), Some(c))], 0.5, 1000);
        assert_eq!(second.frames(0.5)[0].rect, mid);
        assert_eq!(second.frames(1.5)[0].rect, c);
    }

    #[test]
    fn fading_elements_survive_a_retarget() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let first = Animation::new(vec![tr("gone", Some(a), None), tr("x", Some(a), Some(b))], 0.0, 1000);
        let mid = first.frames(0.5);
        let gone_mid = mid.iter().find(|f| f.owner_id.key() == "gone").unwrap().clone();
        assert!(gone_mid.opacity > 0.0);

        let second = first.retarget(vec![tr("x", Some(b), Some(a))], 0.5, 1000);
        let start = second.frames(0.5);
        let gone = start.iter().find(|f| f.owner_id.key() == "gone").unwrap();
        assert_eq!(gone.rect, gone_mid.rect);
        assert_eq!(gone.opacity, gone_mid.opacity);
        assert!(second.frames(1.5).iter().all(|f| f.owner_id.key() != "gone"));
    }

    #[test]
    fn finished_animation_carries_nothing_over() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let first = Animation::new(vec![tr("gone", Some(a), None)], 0.0, 1000);
        let second = first.retarget(Vec::new(), 2.0, 1000);
        assert!(second.frames(2.0).is_empty());
    }
}
