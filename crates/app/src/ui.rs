use eframe::egui::{self, Color32, Pos2, Stroke, Ui};
use nestmap_core::search::fuzzy_score;
use nestmap_core::{OwnerId, Rect};

use crate::anim::Frame;
use crate::state::{AppState, LoadMsg};

pub fn draw(app: &mut AppState, ctx: &egui::Context) {
    let now = ctx.input(|i| i.time);
    poll_load(app, ctx, now);

    egui::TopBottomPanel::top("top").show(ctx, |ui| {
        top_bar(ui, app, now);
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        if let Some(err) = &app.error {
            ui.colored_label(Color32::LIGHT_RED, err);
        }
        match &app.source {
            Some(path) if app.session.is_none() && app.load_rx.is_some() => {
                ui.label(format!("Loading {}…", path.display()));
            }
            None => {
                ui.label("Open a CSV with country_code, region and measure columns");
            }
            _ => {}
        }
        treemap(ui, app, now);
    });

    if app.animation.as_ref().is_some_and(|a| a.is_running(now)) || app.load_rx.is_some() {
        ctx.request_repaint();
    }
}

fn top_bar(ui: &mut Ui, app: &mut AppState, now: f64) {
    ui.horizontal(|ui| {
        if ui.button("Open CSV").clicked() {
            if let Some(path) = rfd::FileDialog::new().add_filter("CSV", &["csv"]).pick_file() {
                app.start_load(path);
            }
        }
        ui.separator();

        let mut chosen = app.measure.clone();
        for name in app.config.measures.names() {
            ui.radio_value(&mut chosen, name.clone(), name.replace('_', " "));
        }
        if chosen != app.measure {
            app.measure = chosen.clone();
            app.select_measure(chosen, now);
        }

        ui.separator();
        ui.label("Search:");
        ui.text_edit_singleline(&mut app.search);
    });
}

fn treemap(ui: &mut Ui, app: &AppState, now: f64) {
    let (Some(session), Some(anim)) = (&app.session, &app.animation) else {
        return;
    };
    let canvas = app.config.layout.canvas;
    let (response, painter) = ui.allocate_painter(
        egui::vec2(canvas.width as f32, canvas.height as f32),
        egui::Sense::hover(),
    );
    let origin = response.rect.min;
    let frames = anim.frames(now);

    let to_screen = |r: &Rect| {
        let r = r.rounded();
        egui::Rect::from_min_size(
            origin + egui::vec2(r.x as f32, r.y as f32),
            egui::vec2(r.width as f32, r.height as f32),
        )
    };
    let region_of = |f: &Frame| -> String {
        match &f.owner_id {
            OwnerId::Group(region) => region.clone(),
            OwnerId::Leaf(_) => session
                .snapshot()
                .and_then(|s| s.get(&f.owner_id))
                .or_else(|| session.previous_snapshot().and_then(|s| s.get(&f.owner_id)))
                .map(|e| e.region.clone())
                .unwrap_or_default(),
        }
    };

    let mut hovered: Option<&Frame> = None;
    for f in frames.iter().filter(|f| f.owner_id.is_leaf()) {
        let rect = to_screen(&f.rect);
        let c = session.colors().color(&region_of(f));
        let fill = Color32::from_rgb(c.r, c.g, c.b).gamma_multiply(f.opacity);
        painter.rect_filled(rect, 0.0, fill);
        painter.rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::WHITE.gamma_multiply(f.opacity)));

        let code = f.owner_id.key();
        if rect.width() > 28.0 && rect.height() > 14.0 {
            painter.with_clip_rect(rect).text(
                rect.min + egui::vec2(3.0, 2.0),
                egui::Align2::LEFT_TOP,
                code,
                egui::FontId::proportional(11.0),
                Color32::WHITE.gamma_multiply(f.opacity),
            );
        }
        if !app.search.is_empty() && fuzzy_score(&app.search, code).is_some() {
            painter.rect_stroke(rect.shrink(1.0), 0.0, Stroke::new(2.0, Color32::BLACK));
        }
        if response.hover_pos().is_some_and(|p: Pos2| rect.contains(p)) {
            hovered = Some(f);
        }
    }

    // Region outlines on top so group boundaries stay readable.
    for f in frames.iter().filter(|f| !f.owner_id.is_leaf()) {
        painter.rect_stroke(
            to_screen(&f.rect),
            0.0,
            Stroke::new(2.0, Color32::WHITE.gamma_multiply(f.opacity)),
        );
    }

    if let Some(f) = hovered {
        let value = session
            .snapshot()
            .and_then(|s| s.get(&f.owner_id))
            .map(|e| e.value)
            .unwrap_or_default();
        let measure = session.current_measure().unwrap_or_default().replace('_', " ");
        response.on_hover_text(format!("{} ({})\n{measure}: {value}", f.owner_id.key(), region_of(f)));
    }
}

fn poll_load(app: &mut AppState, ctx: &egui::Context, now: f64) {
    let Some(rx) = app.load_rx.take() else { return; };
    match rx.try_recv() {
        Ok(LoadMsg::Done(records)) => {
            app.on_loaded(records, now);
            ctx.request_repaint();
        }
        Ok(LoadMsg::Error(e)) => {
            tracing::warn!("load failed: {e}");
            app.error = Some(e);
        }
        // Put the receiver back to keep polling next frame
        Err(crossbeam_channel::TryRecvError::Empty) => app.load_rx = Some(rx),
        Err(crossbeam_channel::TryRecvError::Disconnected) => {
            app.error = Some("loader stopped without a result".into());
        }
    }
}
