mod anim;
mod state;
mod ui;

use eframe::egui;
use nestmap_core::Config;
use state::AppState;
use std::path::PathBuf;

struct NestmapApp {
    state: AppState,
}

impl NestmapApp {
    fn new(_cc: &eframe::CreationContext<'_>, config: Config, initial: Option<PathBuf>) -> Self {
        let mut state = AppState::new(config);
        if let Some(path) = initial {
            state.start_load(path);
        }
        Self { state }
    }
}

impl eframe::App for NestmapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::draw(&mut self.state, ctx);
    }
}

fn main() -> anyhow::Result<()> {
    nestmap_core::logging::init("nestmap=info");

    // nestmap-app [data.csv] [config.json]
    let mut args = std::env::args().skip(1).map(PathBuf::from);
    let initial = args.next();
    let config = match args.next() {
        Some(path) => Config::from_path(&path)?,
        None => Config::default(),
    };

    let canvas = config.layout.canvas;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([canvas.width as f32 + 16.0, canvas.height as f32 + 64.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Nestmap",
        options,
        Box::new(move |cc| Ok(Box::new(NestmapApp::new(cc, config, initial)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
