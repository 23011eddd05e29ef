//! Penguin Defense entry point
//!
//! Wires the simulation to the page on the web, or plays a short scripted
//! session headlessly on native.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlElement, MouseEvent, TouchEvent};

    use penguin_defense::audio::AudioManager;
    use penguin_defense::sim::{EnemyKind, Facing, Layout, LoopControl, Session};
    use penguin_defense::{Presentation, Tuning};

    /// Enemy sprite font size for a size-1 enemy
    const ENEMY_FONT_PX: f32 = 35.0;

    /// Presentation over the page DOM
    struct DomView {
        document: Document,
        game_area: Option<Element>,
        enemies: Vec<u32>,
        rng: Pcg32,
    }

    impl DomView {
        fn new(document: Document, seed: u64) -> Self {
            let game_area = document.get_element_by_id("game-area");
            Self {
                document,
                game_area,
                enemies: Vec::new(),
                rng: Pcg32::seed_from_u64(seed),
            }
        }

        fn html(&self, id: &str) -> Option<HtmlElement> {
            self.document
                .get_element_by_id(id)
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_display(&self, id: &str, display: &str) {
            if let Some(el) = self.html(id) {
                let _ = el.style().set_property("display", display);
            }
        }

        fn enemy(&self, id: u32) -> Option<HtmlElement> {
            self.html(&format!("enemy-{}", id))
        }

        /// Append a short-lived effect element to the game area
        fn effect(&self, class: &str, text: &str, x: f32, y: f32, style: &str, lifetime_ms: i32) {
            let Some(game_area) = &self.game_area else {
                return;
            };
            let Ok(el) = self.document.create_element("div") else {
                return;
            };
            el.set_class_name(class);
            el.set_text_content(Some(text));
            let _ = el.set_attribute(
                "style",
                &format!("position: absolute; transform: translate({}px, {}px); {}", x, y, style),
            );
            if game_area.append_child(&el).is_ok() {
                remove_later(el, lifetime_ms);
            }
        }

        fn flash_class(&self, el: Element, class: &'static str, ms: i32) {
            let _ = el.class_list().add_1(class);
            let Some(window) = web_sys::window() else {
                return;
            };
            let closure = Closure::once(move || {
                let _ = el.class_list().remove_1(class);
            });
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                ms,
            );
            closure.forget();
        }
    }

    fn remove_later(el: Element, ms: i32) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move || el.remove());
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            ms,
        );
        closure.forget();
    }

    impl Presentation for DomView {
        fn set_projectile_transform(&mut self, x: f32, y: f32, facing: Facing, opacity: f32) {
            let Some(el) = self.html("penguin") else {
                return;
            };
            let style = el.style();
            let _ = style.set_property("transform", &format!("translate({}px, {}px)", x, y));
            let _ = style.set_property("opacity", &opacity.to_string());
            let _ = match facing {
                Facing::Right => el.class_list().add_1("face-right"),
                Facing::Left => el.class_list().remove_1("face-right"),
            };
        }

        fn set_enemy_transform(&mut self, id: u32, x: f32, y: f32) {
            if let Some(el) = self.enemy(id) {
                let _ = el
                    .style()
                    .set_property("transform", &format!("translate({}px, {}px)", x, y));
            }
        }

        fn show_explosion(&mut self, x: f32, y: f32) {
            let count = self.rng.random_range(3..=5);
            for _ in 0..count {
                let size = 52.5 + self.rng.random::<f32>() * 45.0;
                let dx = (self.rng.random::<f32>() - 0.5) * 60.0;
                let dy = (self.rng.random::<f32>() - 0.5) * 60.0;
                self.effect(
                    "explosion active",
                    "💥",
                    x + dx - size / 2.0,
                    y + dy - size / 2.0,
                    &format!("font-size: {}px;", size),
                    600,
                );
            }
            if let Some(area) = self.game_area.clone() {
                self.flash_class(area, "shake", 500);
            }
        }

        fn show_hit(&mut self, x: f32, y: f32, damage: u32) {
            let text = if damage > 1 {
                format!("{}!", damage)
            } else {
                "Hit!".to_string()
            };
            self.effect(
                "hit-indicator",
                &text,
                x,
                y,
                &format!("font-size: {}px;", 20 + damage * 3),
                800,
            );
        }

        fn update_score_display(&mut self, score: u64) {
            self.set_text("score", &score.to_string());
        }

        fn update_health_bar(&mut self, pct: u32) {
            let Some(bar) = self.html("health-bar") else {
                return;
            };
            let style = bar.style();
            let _ = style.set_property("width", &format!("{}%", pct));
            let _ = if pct < 25 {
                style.set_property("background-color", "#FF4500")
            } else if pct < 50 {
                style.set_property("background-color", "#FFA500")
            } else {
                style.remove_property("background-color").map(|_| ())
            };
        }

        fn update_wave_display(&mut self, wave: u32) {
            self.set_text("wave-number", &wave.to_string());
            if let Some(container) = self.document.get_element_by_id("wave-container") {
                self.flash_class(container, "wave-transition", 1000);
            }
        }

        fn show_game_over(&mut self, message: &str, score: u64, wave: u32) {
            if let Some(heading) = self
                .document
                .query_selector("#game-over-content h1")
                .ok()
                .flatten()
            {
                heading.set_text_content(Some(message));
            }
            self.set_text("final-score", &score.to_string());
            self.set_text("final-wave", &wave.to_string());
            self.set_display("pause-overlay", "none");
            self.set_display("game-over-overlay", "flex");
        }

        fn show_pause(&mut self) {
            self.set_display("pause-overlay", "flex");
        }

        fn hide_pause(&mut self) {
            self.set_display("pause-overlay", "none");
        }

        fn spawn_enemy(&mut self, id: u32, kind: EnemyKind, size: f32) {
            let (Some(area), Ok(el)) = (&self.game_area, self.document.create_element("div"))
            else {
                return;
            };
            el.set_id(&format!("enemy-{}", id));
            el.set_class_name("enemy");
            el.set_text_content(Some(kind.emoji()));
            let _ = el.set_attribute("style", &format!("font-size: {}px;", ENEMY_FONT_PX * size));
            if area.append_child(&el).is_ok() {
                self.enemies.push(id);
            }
        }

        fn hide_enemy(&mut self, id: u32) {
            if let Some(el) = self.enemy(id) {
                let _ = el.style().set_property("opacity", "0");
            }
        }

        fn show_enemy_damage(&mut self, id: u32, remaining: f32) {
            let Some(el) = self.enemy(id) else {
                return;
            };
            let damage = 1.0 - remaining;
            let style = el.style();
            let _ = style.set_property("opacity", &(1.0 - damage * 0.5).to_string());
            let _ = style.set_property(
                "filter",
                &format!("sepia({}) saturate(3) hue-rotate({}deg)", damage, 300.0 * damage),
            );
        }

        fn wobble_enemy(&mut self, id: u32, _size: f32) {
            if let Some(el) = self.enemy(id) {
                self.flash_class(el.into(), "wobble", 300);
            }
        }

        fn show_sinking(&mut self, x: f32, y: f32) {
            for _ in 0..5 {
                let dx = self.rng.random::<f32>() * 20.0 - 10.0;
                let size = self.rng.random::<f32>() * 10.0 + 5.0;
                self.effect(
                    "bubble",
                    "",
                    x + dx,
                    y,
                    &format!("width: {size}px; height: {size}px;"),
                    1500,
                );
            }
        }

        fn show_falling_trail(&mut self, x: f32, y: f32) {
            if self.rng.random::<f32>() > 0.2 {
                return;
            }
            self.effect("trail", "", x, y, "width: 8px; height: 8px;", 800);
        }

        fn show_base_damage(&mut self) {
            if let Some(base) = self.document.get_element_by_id("base") {
                self.flash_class(base, "base-damage", 500);
            }
        }

        fn clear_enemies(&mut self) {
            for id in self.enemies.drain(..) {
                if let Some(el) = self.document.get_element_by_id(&format!("enemy-{}", id)) {
                    el.remove();
                }
            }
        }

        fn set_slingshot_bands(&mut self, pouch: Option<Vec2>) {
            let (Some(left), Some(right), Some(frame)) = (
                self.html("slingshot-band-left"),
                self.html("slingshot-band-right"),
                self.html("slingshot"),
            ) else {
                return;
            };
            let Some(pouch) = pouch else {
                let _ = left.style().set_property("display", "none");
                let _ = right.style().set_property("display", "none");
                return;
            };

            let area_rect = self.game_area.as_ref().map(|a| a.get_bounding_client_rect());
            let (ox, oy) = area_rect.map_or((0.0, 0.0), |r| (r.left() as f32, r.top() as f32));
            let rect = frame.get_bounding_client_rect();
            let top = rect.top() as f32 - oy;
            let ends = [
                (&left, rect.left() as f32 - ox, "0 0"),
                (&right, rect.right() as f32 - ox, "100% 0"),
            ];
            for (band, x, origin) in ends {
                let delta = pouch - Vec2::new(x, top);
                let angle = delta.y.atan2(delta.x) - std::f32::consts::FRAC_PI_2;
                let style = band.style();
                let _ = style.set_property("display", "block");
                let _ = style.set_property("height", &format!("{}px", delta.length()));
                let _ = style.set_property("transform-origin", origin);
                let _ = style.set_property("transform", &format!("rotate({}rad)", angle));
            }
        }

        fn set_muted(&mut self, muted: bool) {
            self.set_text("mute-button", if muted { "🔇" } else { "🔊" });
        }

        fn hide_game_over(&mut self) {
            self.set_display("game-over-overlay", "none");
        }
    }

    /// Game instance holding all state
    struct Game {
        session: Session,
        view: DomView,
        audio: AudioManager,
        physics_scheduled: bool,
        game_scheduled: bool,
    }

    impl Game {
        fn present(&mut self) {
            self.session.present(&mut self.view, &mut self.audio);
        }
    }

    /// Measure the play area from the page elements
    fn measure_layout(document: &Document, tuning: &Tuning) -> Layout {
        let rect = |id: &str| document.get_element_by_id(id).map(|el| el.get_bounding_client_rect());
        let mut layout = Layout::default();

        let Some(area) = rect("game-area") else {
            log::warn!("#game-area missing, using default layout");
            return layout;
        };
        let (ox, oy) = (area.left() as f32, area.top() as f32);
        layout.width = area.width() as f32;
        layout.height = area.height() as f32;

        if let Some(sling) = rect("slingshot") {
            layout.slingshot_left = sling.left() as f32 - ox;
            layout.slingshot_right = sling.right() as f32 - ox;
            // Resting projectile sits on top of the frame, overlapping it slightly
            layout.anchor = Vec2::new(
                (sling.left() + sling.width() / 2.0) as f32 - ox,
                sling.top() as f32 - oy - tuning.projectile_radius + 10.0,
            );
        }
        if let Some(base) = rect("base") {
            layout.base_right = base.right() as f32 - ox;
        }
        if let Some(sea) = rect("sea") {
            layout.sea_top = sea.top() as f32 - oy;
            layout.sea_height = sea.height() as f32;
        }
        layout
    }

    fn now() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map_or_else(js_sys::Date::now, |p| p.now())
    }

    /// Pointer position relative to the game area
    fn to_area(x: i32, y: i32) -> Vec2 {
        let offset = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("game-area"))
            .map(|el| el.get_bounding_client_rect())
            .map_or(Vec2::ZERO, |r| Vec2::new(r.left() as f32, r.top() as f32));
        Vec2::new(x as f32, y as f32) - offset
    }

    fn touch_point(event: &TouchEvent) -> Option<Vec2> {
        let touch = event.touches().get(0).or_else(|| event.changed_touches().get(0))?;
        Some(to_area(touch.client_x(), touch.client_y()))
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Penguin Defense starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let tuning = Tuning::load();
        let layout = measure_layout(&document, &tuning);
        let seed = js_sys::Date::now() as u64;

        let game = Rc::new(RefCell::new(Game {
            session: Session::new(layout, tuning, seed, now()),
            view: DomView::new(document.clone(), seed ^ 0x5eed),
            audio: AudioManager::new(seed.rotate_left(17)),
            physics_scheduled: false,
            game_scheduled: false,
        }));

        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&document, game.clone());
        setup_buttons(&document, game.clone());
        setup_resize(game.clone());

        game.borrow_mut().present();
        ensure_loops(&game);

        log::info!("Penguin Defense running!");
    }

    /// Schedule whichever loops the session wants running but are idle
    fn ensure_loops(game: &Rc<RefCell<Game>>) {
        let (physics, wave) = {
            let mut g = game.borrow_mut();
            let physics = g.session.physics_running() && !g.physics_scheduled;
            let wave = g.session.game_running() && !g.game_scheduled;
            g.physics_scheduled |= physics;
            g.game_scheduled |= wave;
            (physics, wave)
        };
        if physics {
            request_animation_frame(game.clone(), physics_loop);
        }
        if wave {
            request_animation_frame(game.clone(), game_loop);
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>, frame: fn(Rc<RefCell<Game>>, f64)) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| frame(game, time));
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn physics_loop(game: Rc<RefCell<Game>>, time: f64) {
        let control = {
            let mut g = game.borrow_mut();
            let control = g.session.physics_frame(time);
            g.present();
            g.physics_scheduled = control == LoopControl::Continue;
            control
        };
        if control == LoopControl::Continue {
            request_animation_frame(game, physics_loop);
        } else {
            // Removal can end the game and restart needs the wave loop again
            ensure_loops(&game);
        }
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let control = {
            let mut g = game.borrow_mut();
            let control = g.session.game_frame(time);
            g.present();
            g.game_scheduled = control == LoopControl::Continue;
            control
        };
        if control == LoopControl::Continue {
            request_animation_frame(game, game_loop);
        }
    }

    fn on_press(game: &Rc<RefCell<Game>>, point: Vec2) {
        let mut g = game.borrow_mut();
        if g.session.press(point) {
            if let Some(el) = g.view.html("penguin") {
                let _ = el.class_list().add_1("dragging");
            }
            g.present();
        }
    }

    fn on_drag(game: &Rc<RefCell<Game>>, point: Vec2) {
        let mut g = game.borrow_mut();
        if g.session.aim().is_some() {
            g.session.drag(point, now());
            g.present();
        }
    }

    fn on_release(game: &Rc<RefCell<Game>>, point: Vec2) {
        {
            let mut g = game.borrow_mut();
            if g.session.aim().is_none() {
                return;
            }
            g.session.release(point, now());
            if let Some(el) = g.view.html("penguin") {
                let _ = el.class_list().remove_1("dragging");
            }
            g.present();
        }
        ensure_loops(game);
    }

    fn setup_input_handlers(document: &Document, game: Rc<RefCell<Game>>) {
        let penguin = document.get_element_by_id("penguin");

        // Press on the penguin
        if let Some(penguin) = &penguin {
            {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                    event.prevent_default();
                    on_press(&game, to_area(event.client_x(), event.client_y()));
                });
                let _ = penguin
                    .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
                closure.forget();
            }
            {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                    event.prevent_default();
                    if let Some(point) = touch_point(&event) {
                        on_press(&game, point);
                    }
                });
                let _ = penguin
                    .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        } else {
            log::warn!("#penguin missing - input disabled");
        }

        // Drag anywhere on the page
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                on_drag(&game, to_area(event.client_x(), event.client_y()));
            });
            let _ = document
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if let Some(point) = touch_point(&event) {
                    if game.borrow().session.aim().is_some() {
                        event.prevent_default();
                    }
                    on_drag(&game, point);
                }
            });
            let _ = document
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Release anywhere on the page
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                on_release(&game, to_area(event.client_x(), event.client_y()));
            });
            let _ = document
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if let Some(point) = touch_point(&event) {
                    on_release(&game, point);
                }
            });
            let _ = document
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, mut handler: impl FnMut() + 'static) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("#{} missing", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| handler());
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for id in ["restart-button", "play-again-button"] {
            let game = game.clone();
            on_click(document, id, move || {
                {
                    let mut g = game.borrow_mut();
                    g.session.restart(now());
                    g.present();
                }
                ensure_loops(&game);
            });
        }
        {
            let game = game.clone();
            on_click(document, "pause-button", move || {
                let mut g = game.borrow_mut();
                g.session.pause();
                g.present();
            });
        }
        {
            let game = game.clone();
            on_click(document, "resume-button", move || {
                let mut g = game.borrow_mut();
                g.session.resume(now());
                g.present();
            });
        }
        on_click(document, "mute-button", move || {
            let mut g = game.borrow_mut();
            let muted = g.session.toggle_mute();
            log::info!("Muted: {}", muted);
            g.present();
        });
    }

    fn setup_resize(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        for event in ["resize", "orientationchange"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                let layout = measure_layout(&g.view.document, &g.session.world().tuning);
                g.session.resize(layout);
                g.present();
            });
            let _ = window.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Penguin Defense (native) starting...");
    log::info!("Native mode runs a headless demo - use `trunk serve` for the web version");

    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless scripted session: fire at whatever is closest to the base
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use penguin_defense::audio::LogAudio;
    use penguin_defense::consts::FRAME_MS;
    use penguin_defense::presentation::Presentation;
    use penguin_defense::sim::{Facing, Layout, LoopControl, Session, SessionPhase};
    use penguin_defense::Tuning;

    /// Demo length in simulated milliseconds
    const DEMO_MS: f64 = 120_000.0;

    #[derive(Default)]
    struct Summary {
        explosions: u32,
        hits: u32,
        game_over: Option<String>,
    }

    impl Presentation for Summary {
        fn set_projectile_transform(&mut self, _x: f32, _y: f32, _facing: Facing, _opacity: f32) {}
        fn set_enemy_transform(&mut self, _id: u32, _x: f32, _y: f32) {}
        fn show_explosion(&mut self, _x: f32, _y: f32) {
            self.explosions += 1;
        }
        fn show_hit(&mut self, _x: f32, _y: f32, _damage: u32) {
            self.hits += 1;
        }
        fn update_score_display(&mut self, _score: u64) {}
        fn update_health_bar(&mut self, pct: u32) {
            log::debug!("Base health {}%", pct);
        }
        fn update_wave_display(&mut self, wave: u32) {
            log::info!("Wave {}", wave);
        }
        fn show_game_over(&mut self, message: &str, score: u64, wave: u32) {
            log::info!("{} score {} wave {}", message, score, wave);
            self.game_over = Some(message.to_string());
        }
        fn show_pause(&mut self) {}
        fn hide_pause(&mut self) {}
    }

    pub fn run() {
        let tuning = Tuning::load();
        let mut session = Session::new(Layout::default(), tuning, 0xC0FFEE, 0.0);
        let mut view = Summary::default();
        let mut audio = LogAudio::default();

        let mut t = 0.0;
        while t < DEMO_MS {
            t += FRAME_MS as f64;

            if !session.physics_running() && !session.world().is_game_over() {
                aim_and_fire(&mut session, t);
            }
            if session.physics_running() {
                session.physics_frame(t);
            }
            if session.game_frame(t) == LoopControl::Stop {
                session.present(&mut view, &mut audio);
                break;
            }
            session.present(&mut view, &mut audio);
        }

        let world = session.world();
        log::info!(
            "Demo finished: score {}, wave {}, base {}%, {} explosions, {} hits, {} sounds",
            world.score,
            world.current_wave,
            world.base.percent(),
            view.explosions,
            view.hits,
            audio.played
        );
        if !matches!(world.phase, SessionPhase::Over { .. }) {
            log::info!("Still standing after {}s", DEMO_MS / 1000.0);
        }
    }

    /// Pull back along the line to the leading enemy
    fn aim_and_fire(session: &mut Session, now: f64) {
        let world = session.world();
        let radius = world.tuning.enemy_radius;
        let Some(target) = world
            .enemies
            .iter()
            .filter(|e| !e.is_hit)
            .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x))
            .map(|e| e.center(radius))
        else {
            return;
        };

        let anchor = world.layout.anchor;
        let toward = (target - anchor).normalize_or_zero();
        let pull = anchor - toward * world.tuning.max_drag;

        if session.press(anchor) {
            session.drag(pull, now);
            session.release(pull, now);
        }
    }
}
