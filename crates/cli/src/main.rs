use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use nestmap_core::measure::{MeasureSelected, MeasureSet, ValuePolicy};
use nestmap_core::reconcile::{Transition, TransitionSummary};
use nestmap_core::treemap::{Stickiness, Tiling};
use nestmap_core::{export, loader, Config, Session};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nestmap", about = "Lay out country measures as a region treemap")]
struct Args {
    /// CSV with country_code, region and one column per measure
    data: PathBuf,
    /// JSON config file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Measures to step through, in order (defaults to the initial measure)
    #[arg(short, long = "measure")]
    measures: Vec<String>,
    /// Replace the selectable measure set
    #[arg(long, value_delimiter = ',')]
    selectable: Option<Vec<String>>,
    #[arg(long)]
    tiling: Option<TilingArg>,
    #[arg(long)]
    sticky: Option<StickyArg>,
    /// Coerce bad values to zero instead of failing
    #[arg(long)]
    lenient: bool,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    /// Write the final snapshot as JSON
    #[arg(short, long)]
    json: Option<PathBuf>,
    /// Write the final snapshot as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Write the last transition list as JSON
    #[arg(long)]
    transitions: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TilingArg {
    Squarify,
    SliceDice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StickyArg {
    Off,
    TieBreak,
    Retain,
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_path(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(names) = &args.selectable {
        config.measures = MeasureSet::new(names.iter().cloned());
        if !config.measures.contains(&config.initial_measure) {
            if let Some(first) = config.measures.names().first() {
                config.initial_measure = first.clone();
            }
        }
    }
    if let Some(first) = args.measures.first() {
        config.initial_measure = first.clone();
    }
    if let Some(t) = args.tiling {
        config.layout.tiling = match t {
            TilingArg::Squarify => Tiling::Squarify,
            TilingArg::SliceDice => Tiling::SliceDice,
        };
    }
    if let Some(s) = args.sticky {
        config.layout.stickiness = match s {
            StickyArg::Off => Stickiness::Off,
            StickyArg::TieBreak => Stickiness::TieBreak,
            StickyArg::Retain => Stickiness::Retain,
        };
    }
    if args.lenient {
        config.value_policy = ValuePolicy::Lenient;
    }
    if let Some(w) = args.width {
        config.layout.canvas.width = w;
    }
    if let Some(h) = args.height {
        config.layout.canvas.height = h;
    }
    config.validate()?;
    Ok(config)
}

fn print_step(measure: &str, transitions: &[Transition]) {
    let s = TransitionSummary::of(transitions);
    println!(
        "{:<20} {:>4} entering {:>4} updating {:>4} exiting",
        measure, s.entering, s.updating, s.exiting
    );
}

fn main() -> Result<()> {
    nestmap_core::logging::init("nestmap=info");
    let args = Args::parse();
    let config = build_config(&args)?;

    let records = loader::load_path(&args.data, &config.measures)
        .with_context(|| format!("reading {}", args.data.display()))?;
    let mut session = Session::new(records, config)?;

    let mut last = session.start()?;
    print_step(&session.config().initial_measure, &last);
    for name in args.measures.iter().skip(1) {
        last = session.select_measure(&MeasureSelected::new(name.clone()))?;
        print_step(name, &last);
    }

    let Some(snapshot) = session.snapshot() else {
        return Ok(());
    };
    if let Some(path) = &args.json {
        let json = export::snapshot_to_json(snapshot);
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        export::snapshot_to_csv(snapshot, file)?;
    }
    if let Some(path) = &args.transitions {
        let json = export::transitions_to_json(&last);
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    tracing::info!(
        "{} rects for '{}' across {} regions",
        snapshot.len(),
        snapshot.measure(),
        session.regions().len()
    );
    Ok(())
}
