use crossbeam_channel::{unbounded, Receiver, Sender};
use nestmap_core::measure::MeasureSelected;
use nestmap_core::{loader, Config, Record, Session};
use std::path::PathBuf;

use crate::anim::Animation;

pub enum LoadMsg {
    Done(Vec<Record>),
    Error(String),
}

pub struct AppState {
    pub config: Config,
    pub source: Option<PathBuf>,
    pub load_rx: Option<Receiver<LoadMsg>>,
    pub session: Option<Session>,
    pub animation: Option<Animation>,
    /// Measure shown by the selector; may briefly differ from the session's
    /// if a selection failed.
    pub measure: String,
    pub search: String,
    pub error: Option<String>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let measure = config.initial_measure.clone();
        Self {
            config,
            source: None,
            load_rx: None,
            session: None,
            animation: None,
            measure,
            search: String::new(),
            error: None,
        }
    }

    pub fn start_load(&mut self, path: PathBuf) {
        self.source = Some(path.clone());
        self.error = None;

        let (tx, rx): (Sender<LoadMsg>, Receiver<LoadMsg>) = unbounded();
        self.load_rx = Some(rx);
        let measures = self.config.measures.clone();

        std::thread::spawn(move || {
            let msg = match loader::load_path(&path, &measures) {
                Ok(records) => LoadMsg::Done(records),
                Err(e) => LoadMsg::Error(format!("{}: {e}", path.display())),
            };
            let _ = tx.send(msg);
        });
    }

    /// A fresh dataset: first load builds the session, later loads reuse it
    /// so countries can enter and leave.
    pub fn on_loaded(&mut self, records: Vec<Record>, now: f64) {
        let result = if let Some(session) = self.session.as_mut() {
            session.reload(records)
        } else {
            match Session::new(records, self.config.clone()) {
                Ok(mut session) => {
                    let started = session.start();
                    if started.is_ok() {
                        self.session = Some(session);
                    }
                    started
                }
                Err(e) => Err(e),
            }
        };
        match result {
            Ok(transitions) => {
                if let Some(m) = self.session.as_ref().and_then(Session::current_measure) {
                    self.measure = m.to_string();
                }
                self.animate(transitions, now);
            }
            Err(e) => {
                tracing::warn!("dataset rejected: {e}");
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn select_measure(&mut self, name: String, now: f64) {
        let Some(session) = self.session.as_mut() else {
            self.measure = name;
            return;
        };
        match session.select_measure(&MeasureSelected::new(name)) {
            Ok(transitions) => {
                self.error = None;
                self.animate(transitions, now);
            }
            Err(e) => {
                self.error = Some(e.to_string());
                if let Some(m) = session.current_measure() {
                    self.measure = m.to_string();
                }
            }
        }
    }

    fn animate(&mut self, transitions: Vec<nestmap_core::reconcile::Transition>, now: f64) {
        let ms = self.config.transition_ms;
        self.animation = Some(match &self.animation {
            Some(running) => running.retarget(transitions, now, ms),
            None => Animation::new(transitions, now, ms),
        });
    }
}
