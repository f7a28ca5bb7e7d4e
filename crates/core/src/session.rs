use crate::aggregate;
use crate::color::ColorAssigner;
use crate::config::Config;
use crate::error::Result;
use crate::hierarchy::{self, Valuation};
use crate::measure::{FieldAccessor, MeasureSelected};
use crate::model::{Record, Tree};
use crate::reconcile::{Reconciler, Transition};
use crate::treemap::{self, LayoutSnapshot};

/// The single writer driving the pipeline: dataset loads rebuild the tree,
/// measure selections re-value, re-layout and reconcile.
///
/// Every operation either completes or leaves the session exactly as it was.
#[derive(Debug)]
pub struct Session {
    config: Config,
    tree: Tree,
    colors: ColorAssigner,
    valuation: Option<Valuation>,
    reconciler: Reconciler,
}

impl Session {
    pub fn new(records: Vec<Record>, config: Config) -> Result<Self> {
        let tree = hierarchy::build(aggregate::by_region(records)?);
        let colors = ColorAssigner::new(tree.regions());
        tracing::info!(
            "dataset ready: {} regions, {} countries",
            tree.children(tree.root).len(),
            tree.leaves().count()
        );
        Ok(Self {
            config,
            tree,
            colors,
            valuation: None,
            reconciler: Reconciler::new(),
        })
    }

    /// Start from the configured initial measure.
    pub fn start(&mut self) -> Result<Vec<Transition>> {
        let initial = MeasureSelected::new(self.config.initial_measure.clone());
        self.select_measure(&initial)
    }

    pub fn select_measure(&mut self, event: &MeasureSelected) -> Result<Vec<Transition>> {
        tracing::info!("measure selected: {}", event.name());
        let valuation = hierarchy::recompute(
            &self.tree,
            &self.config.measures,
            event.name(),
            &FieldAccessor,
            self.config.value_policy,
        )?;
        let snapshot = treemap::layout(
            &self.tree,
            &valuation,
            &self.config.layout,
            self.reconciler.order_hint(),
        )?;
        self.valuation = Some(valuation);
        Ok(self.reconciler.advance(snapshot))
    }

    /// Replace the dataset. The previous snapshot survives, so the next
    /// transitions show countries entering and leaving. The current measure
    /// is re-applied straight away when there is one.
    pub fn reload(&mut self, records: Vec<Record>) -> Result<Vec<Transition>> {
        let tree = hierarchy::build(aggregate::by_region(records)?);
        let measure = self.current_measure().map(str::to_owned);

        let Some(measure) = measure else {
            self.colors = ColorAssigner::new(tree.regions());
            self.tree = tree;
            return Ok(Vec::new());
        };

        let valuation = hierarchy::recompute(
            &tree,
            &self.config.measures,
            &measure,
            &FieldAccessor,
            self.config.value_policy,
        )?;
        let snapshot = treemap::layout(&tree, &valuation, &self.config.layout, self.reconciler.order_hint())?;

        tracing::info!("dataset reloaded: {} countries", tree.leaves().count());
        self.colors = ColorAssigner::new(tree.regions());
        self.tree = tree;
        self.valuation = Some(valuation);
        Ok(self.reconciler.advance(snapshot))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn colors(&self) -> &ColorAssigner {
        &self.colors
    }

    pub fn regions(&self) -> Vec<String> {
        self.tree.regions()
    }

    pub fn valuation(&self) -> Option<&Valuation> {
        self.valuation.as_ref()
    }

    pub fn current_measure(&self) -> Option<&str> {
        self.valuation.as_ref().map(Valuation::measure)
    }

    pub fn snapshot(&self) -> Option<&LayoutSnapshot> {
        self.reconciler.current()
    }

    pub fn previous_snapshot(&self) -> Option<&LayoutSnapshot> {
        self.reconciler.previous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreemapError;
    use crate::measure::MeasureSet;
    use crate::reconcile::TransitionKind;
    use crate::treemap::DegeneratePolicy;

    fn records() -> Vec<Record> {
        vec![
            Record::new("KEN", "Africa").with_measure("fertility_rate", 3.9).with_measure("population", 48),
            Record::new("FRA", "Europe").with_measure("fertility_rate", 1.9).with_measure("population", 67),
            Record::new("NGA", "Africa").with_measure("fertility_rate", 5.4).with_measure("population", 190),
        ]
    }

    fn config() -> Config {
        Config {
            measures: MeasureSet::new(["fertility_rate", "population"]),
            ..Config::default()
        }
    }

    #[test]
    fn first_pass_is_all_entering() {
        let mut s = Session::new(records(), config()).unwrap();
        let ts = s.start().unwrap();
        assert_eq!(ts.len(), 2 + 3);
        assert!(ts.iter().all(|t| t.kind() == TransitionKind::Entering));
        assert_eq!(s.current_measure(), Some("fertility_rate"));
    }

    #[test]
    fn failed_selection_keeps_state() {
        let mut s = Session::new(records(), config()).unwrap();
        s.start().unwrap();
        let before = s.snapshot().cloned();

        let err = s.select_measure(&MeasureSelected::new("gdp")).unwrap_err();
        assert!(matches!(err, TreemapError::InvalidMeasure { .. }));
        assert_eq!(s.snapshot().cloned(), before);
        assert_eq!(s.current_measure(), Some("fertility_rate"));
        assert!(s.previous_snapshot().is_none());
    }

    #[test]
    fn failed_layout_keeps_state() {
        let rs: Vec<Record> = records().into_iter().map(|r| r.with_measure("population", 0)).collect();
        let mut config = config();
        config.layout.degenerate = DegeneratePolicy::Reject;
        let mut s = Session::new(rs, config).unwrap();
        s.start().unwrap();
        s.select_measure(&MeasureSelected::new("fertility_rate")).unwrap();
        let current = s.snapshot().cloned();
        let previous = s.previous_snapshot().cloned();
        assert!(previous.is_some());

        let err = s.select_measure(&MeasureSelected::new("population")).unwrap_err();
        assert!(matches!(err, TreemapError::DegenerateArea { .. }));
        assert_eq!(s.snapshot().cloned(), current);
        assert_eq!(s.previous_snapshot().cloned(), previous);
        assert_eq!(s.current_measure(), Some("fertility_rate"));
        assert_eq!(s.valuation().map(|v| v.measure()), Some("fertility_rate"));
    }

    #[test]
    fn reload_reports_exits() {
        let mut s = Session::new(records(), config()).unwrap();
        s.start().unwrap();
        let mut fewer = records();
        fewer.truncate(2);

        let ts = s.reload(fewer).unwrap();
        let exiting: Vec<_> = ts
            .iter()
            .filter(|t| t.kind() == TransitionKind::Exiting)
            .map(|t| t.owner_id.key().to_string())
            .collect();
        assert_eq!(exiting, ["NGA"]);
        assert_eq!(s.tree().leaves().count(), 2);
    }

    #[test]
    fn empty_dataset_rejected() {
        let err = Session::new(Vec::new(), config()).unwrap_err();
        assert_eq!(err, TreemapError::EmptyInput);
    }
}
