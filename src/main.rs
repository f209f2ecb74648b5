//! Wacky Mole entry point
//!
//! Web: binds the DOM grid and drives the game from requestAnimationFrame.
//! Native: headless autoplay demo.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use wacky_mole::audio::AudioManager;
    use wacky_mole::consts::SLOT_COUNT;
    use wacky_mole::persistence::LocalStorageStore;
    use wacky_mole::platform::NoAds;
    use wacky_mole::sim::{SlotView, TargetKind};
    use wacky_mole::{ContinueResult, Game, Settings, Tuning};

    type WebGame = Game<LocalStorageStore, NoAds, AudioManager>;

    fn now_ms() -> u64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now() as u64)
            .unwrap_or(0)
    }

    fn slot_class(view: SlotView) -> &'static str {
        match view {
            SlotView::Empty => "hole",
            SlotView::Consumed => "hole hole-consumed",
            SlotView::Target {
                kind: TargetKind::Normal,
                ..
            } => "hole hole-active",
            SlotView::Target {
                kind: TargetKind::Decoy,
                safe: false,
            } => "hole hole-decoy-waiting",
            SlotView::Target {
                kind: TargetKind::Decoy,
                safe: true,
            } => "hole hole-decoy-safe",
            SlotView::Target {
                kind: TargetKind::Heal,
                ..
            } => "hole hole-heal",
            SlotView::Target {
                kind: TargetKind::Harm,
                ..
            } => "hole hole-harm",
        }
    }

    fn set_text(document: &web_sys::Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn render(game: &WebGame) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let snapshot = game.snapshot();
        for (slot, view) in snapshot.slots.iter().enumerate() {
            if let Some(el) = document.get_element_by_id(&format!("hole-{slot}")) {
                let _ = el.set_attribute("class", slot_class(*view));
            }
        }
        let session = &snapshot.session;
        set_text(&document, "score", &session.score.to_string());
        set_text(&document, "lives", &session.lives.to_string());
        set_text(&document, "best", &session.best_score.to_string());
        set_text(
            &document,
            "combo",
            &format!(
                "{}/{} {}x",
                session.combo_hits,
                game.tuning().combo_max,
                snapshot.combo_multiplier
            ),
        );
        if let Some(el) = document.get_element_by_id("game-over") {
            let class = if session.game_over { "" } else { "hidden" };
            let _ = el.set_attribute("class", class);
        }
        if let Some(el) = document.get_element_by_id("continue-btn") {
            let class = if snapshot.continues_left > 0 { "" } else { "hidden" };
            let _ = el.set_attribute("class", class);
        }
    }

    fn on_click(id: &str, handler: impl FnMut() + 'static) {
        let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        else {
            log::warn!("Missing element #{id}");
            return;
        };
        let mut handler = handler;
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::PointerEvent| {
            handler();
        });
        let _ = el.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_frame(f: &Closure<dyn FnMut()>) {
        if let Some(window) = web_sys::window() {
            let _ = window.request_animation_frame(f.as_ref().unchecked_ref());
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let game = match Game::new(
            Tuning::default(),
            seed,
            LocalStorageStore::new(),
            NoAds,
            AudioManager::new(&settings),
        ) {
            Ok(game) => Rc::new(RefCell::new(game)),
            Err(e) => {
                log::error!("Invalid tuning: {e}");
                return;
            }
        };
        log::info!("Wacky Mole ready (seed {seed})");

        for slot in 0..SLOT_COUNT as u8 {
            let game = game.clone();
            on_click(&format!("hole-{slot}"), move || {
                let outcome = game.borrow_mut().tap(slot, now_ms());
                log::debug!("Tap {slot}: {outcome:?}");
            });
        }
        {
            let game = game.clone();
            on_click("start-btn", move || {
                let mut g = game.borrow_mut();
                g.audio().resume();
                g.start(now_ms());
            });
        }
        {
            let game = game.clone();
            on_click("continue-btn", move || {
                if game.borrow_mut().request_continue(now_ms()) == ContinueResult::Declined {
                    log::info!("Continue not rewarded");
                }
            });
        }

        {
            let game = game.clone();
            let settings = Rc::new(RefCell::new(settings));
            on_click("mute-btn", move || {
                let mut settings = settings.borrow_mut();
                settings.toggle_mute();
                settings.save();
                game.borrow_mut().audio_mut().apply_settings(&settings);
                log::info!("Muted: {}", settings.muted);
            });
        }

        // requestAnimationFrame loop
        let frame: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
        let frame_handle = frame.clone();
        *frame_handle.borrow_mut() = Some(Closure::new(move || {
            {
                let mut g = game.borrow_mut();
                g.advance(now_ms());
                render(&g);
            }
            if let Some(f) = frame.borrow().as_ref() {
                request_frame(f);
            }
        }));
        if let Some(f) = frame_handle.borrow().as_ref() {
            request_frame(f);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use clap::Parser;

    /// Wacky Mole headless autoplay
    #[derive(Parser, Debug)]
    #[command(name = "wacky-mole")]
    #[command(about = "Let a bot play Wacky Mole and print the run summary")]
    #[command(version)]
    pub struct Args {
        /// Seed for both the spawner and the bot
        #[arg(long, default_value_t = 12345)]
        pub seed: u64,

        /// Bot tap accuracy (0.0 - 1.0)
        #[arg(long, default_value_t = 0.9, value_parser = parse_accuracy)]
        pub accuracy: f64,

        /// Bot reaction time after a spawn
        #[arg(long, default_value_t = 180)]
        pub reaction_ms: u64,

        /// Maximum simulated run length
        #[arg(long, default_value_t = 3)]
        pub minutes: u64,

        /// JSON tuning override (missing fields keep their defaults)
        #[arg(long)]
        pub tuning: Option<PathBuf>,

        /// Where the best score is kept (defaults to the temp dir)
        #[arg(long)]
        pub data_dir: Option<PathBuf>,
    }

    fn parse_accuracy(raw: &str) -> Result<f64, String> {
        let value: f64 = raw.parse().map_err(|e| format!("{e}"))?;
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(format!("{value} is not in 0.0..=1.0"))
        }
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;
    use wacky_mole::autoplay::{Autoplayer, play_run};
    use wacky_mole::persistence::FileStore;
    use wacky_mole::platform::{NoAds, SilentAudio};
    use wacky_mole::{Game, Tuning};

    env_logger::init();
    let args = cli::Args::parse();
    log::info!("Wacky Mole (native) starting headless autoplay...");

    let tuning = match &args.tuning {
        Some(path) => {
            let loaded = std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()));
            match loaded {
                Ok(tuning) => tuning,
                Err(e) => {
                    log::error!("Cannot use tuning file {}: {e}", path.display());
                    std::process::exit(1);
                }
            }
        }
        None => Tuning::default(),
    };

    let data_dir = args.data_dir.clone().unwrap_or_else(std::env::temp_dir);
    let store = FileStore::in_dir(data_dir);
    let mut game = match Game::new(tuning, args.seed, store, NoAds, SilentAudio) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Invalid tuning: {e}");
            std::process::exit(1);
        }
    };
    let mut bot = Autoplayer::new(args.seed, args.accuracy, args.reaction_ms);
    let summary = play_run(&mut game, &mut bot, 0, 16, args.minutes * 60_000);

    println!(
        "score {} (best {}), lives {}, hits {}, mistakes {}, {:.1}s{}",
        summary.score,
        summary.best_score,
        summary.lives,
        summary.hits,
        summary.mistakes,
        summary.duration_ms as f64 / 1000.0,
        if summary.game_over { ", game over" } else { "" }
    );
    game.shutdown();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
