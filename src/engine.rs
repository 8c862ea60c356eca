use crate::browser::{self, LoopClosure};
use anyhow::{anyhow, Error, Result};
// wasm is single threaded, so Rc RefCell over Arc Mutex
use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use futures::channel::oneshot::channel;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref casts our closures to js Functions, we built them so we
    // know the expected signature
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement, KeyboardEvent, MouseEvent};

use self::input::{InputEvent, InputSnapshot, InputState};

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, input: &InputSnapshot);
    fn draw(&self, renderer: &Renderer);

    /// Display pixels per game unit, pointer coordinates are divided by this
    fn display_scale(&self) -> f64 {
        1.0
    }
}

// length of a frame in milliseconds
const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;
// a hidden tab comes back with seconds of delta, don't replay all of it
const MAX_UPDATES_PER_FRAME: u32 = 8;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut game = game.initialize().await?;
        let mut events = prepare_input()?;
        let mut input = InputState::new(game.display_scale());
        let mut game_loop = GameLoop::new(browser::now()?);
        let renderer = Renderer {
            context: browser::context()?,
        };
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input.drain(&mut events);
            // no step this frame leaves clicks pending for the next one
            for _ in 0..game_loop.steps(perf) {
                game.update(&input.snapshot());
            }
            game.draw(&renderer);
            if let Some(next_frame) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(next_frame) {
                    error!("GameLoop stopped : {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }

    fn new(now: f64) -> Self {
        GameLoop {
            last_frame: now,
            accumulated_delta: 0.0,
        }
    }

    /// Whole fixed steps owed at frame time `perf` (milliseconds)
    /// - the remainder carries into the next frame
    /// - past MAX_UPDATES_PER_FRAME the backlog is dropped
    /// - a timestamp behind the previous one owes nothing
    fn steps(&mut self, perf: f64) -> u32 {
        self.accumulated_delta += (perf - self.last_frame) as f32;
        self.last_frame = perf;
        if self.accumulated_delta < 0.0 {
            self.accumulated_delta = 0.0;
        }
        let mut steps = 0;
        while self.accumulated_delta > FRAME_SIZE {
            if steps == MAX_UPDATES_PER_FRAME {
                self.accumulated_delta = 0.0;
                break;
            }
            self.accumulated_delta -= FRAME_SIZE;
            steps += 1;
        }
        steps
    }
}

/// Position in game units, origin top left, y grows downward
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Heading in radians from self toward `target`
    pub fn angle_to(&self, target: Point) -> f64 {
        (target.y - self.y).atan2(target.x - self.x)
    }

    /// Move `distance` units along `angle`
    pub fn step(&self, angle: f64, distance: f64) -> Point {
        Point {
            x: self.x + angle.cos() * distance,
            y: self.y + angle.sin() * distance,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

/// Two stop radial gradient, `inner_color` up to `inner_radius` fading to
/// `outer_color` at `outer_radius`
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: Point,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub inner_color: &'static str,
    pub outer_color: &'static str,
}

/// Everything a frame needs from a 2d raster target
/// - Renderer draws to the canvas
/// - tests record the calls instead
pub trait Surface {
    fn save(&self);
    fn restore(&self);
    fn scale(&self, factor: f64);
    fn fill_rect(&self, rect: &Rect, color: &str);
    fn fill_radial_gradient(&self, rect: &Rect, gradient: &RadialGradient);
    fn fill_circle(&self, center: Point, radius: f64, color: &str);
    /// Draw `image` centered on `center`, rotated by `angle` radians
    fn draw_rotated_image(&self, image: &HtmlImageElement, center: Point, angle: f64, size: f64);
    fn fill_text(&self, text: &str, position: Point, color: &str);
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    // the canvas throws on bad arguments (NaN, negative radius ...)
    // a broken draw call skips that shape, never the frame
    fn report(result: Result<(), JsValue>, operation: &str) {
        if let Err(err) = result {
            error!("Renderer::{} failed : {:#?}", operation, err);
        }
    }
}

impl Surface for Renderer {
    fn save(&self) {
        self.context.save();
    }

    fn restore(&self) {
        self.context.restore();
    }

    fn scale(&self, factor: f64) {
        Self::report(self.context.scale(factor, factor), "scale");
    }

    fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context
            .fill_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn fill_radial_gradient(&self, rect: &Rect, gradient: &RadialGradient) {
        let canvas_gradient = match self.context.create_radial_gradient(
            gradient.center.x,
            gradient.center.y,
            gradient.inner_radius,
            gradient.center.x,
            gradient.center.y,
            gradient.outer_radius,
        ) {
            Ok(canvas_gradient) => canvas_gradient,
            Err(err) => {
                error!("Renderer::fill_radial_gradient failed : {:#?}", err);
                return;
            }
        };
        Self::report(
            canvas_gradient.add_color_stop(0.0, gradient.inner_color),
            "add_color_stop",
        );
        Self::report(
            canvas_gradient.add_color_stop(1.0, gradient.outer_color),
            "add_color_stop",
        );
        self.context.set_fill_style_canvas_gradient(&canvas_gradient);
        self.context
            .fill_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn fill_circle(&self, center: Point, radius: f64, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.begin_path();
        Self::report(
            self.context
                .arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU),
            "arc",
        );
        self.context.fill();
    }

    fn draw_rotated_image(&self, image: &HtmlImageElement, center: Point, angle: f64, size: f64) {
        self.context.save();
        Self::report(self.context.translate(center.x, center.y), "translate");
        Self::report(self.context.rotate(angle), "rotate");
        Self::report(
            self.context.draw_image_with_html_image_element_and_dw_and_dh(
                image,
                -size / 2.0,
                -size / 2.0,
                size,
                size,
            ),
            "draw_image",
        );
        self.context.restore();
    }

    fn fill_text(&self, text: &str, position: Point, color: &str) {
        self.context.set_fill_style_str(color);
        Self::report(
            self.context.fill_text(text, position.x, position.y),
            "fill_text",
        );
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::create_html_image_element()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image: {:#?}",
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - Result<Result<(), Error>, oneshot::Canceled>
    // - first ? yields channel result : Result<(), Error>
    // - second ? yields image load result : () or propagating Error
    rx.await??;

    Ok(image)
}

/// Wire DOM listeners into a channel, drained once per frame by the loop
/// - keys are read from the document so focus on the canvas isn't required
/// - pointer and clicks are read from the canvas in canvas offset coordinates
fn prepare_input() -> Result<UnboundedReceiver<InputEvent>> {
    let (sender, receiver) = unbounded();

    let keydown_sender = sender.clone();
    let onkeydown = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
        let _ = keydown_sender.unbounded_send(InputEvent::KeyDown(event.key()));
    }) as Box<dyn FnMut(KeyboardEvent)>);

    let keyup_sender = sender.clone();
    let onkeyup = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
        let _ = keyup_sender.unbounded_send(InputEvent::KeyUp(event.key()));
    }) as Box<dyn FnMut(KeyboardEvent)>);

    let move_sender = sender.clone();
    let onmousemove = browser::closure_wrap(Box::new(move |event: MouseEvent| {
        let _ = move_sender.unbounded_send(InputEvent::PointerMove {
            x: event.offset_x().into(),
            y: event.offset_y().into(),
        });
    }) as Box<dyn FnMut(MouseEvent)>);

    let onclick = browser::closure_wrap(Box::new(move |event: MouseEvent| {
        let _ = sender.unbounded_send(InputEvent::Click {
            x: event.offset_x().into(),
            y: event.offset_y().into(),
        });
    }) as Box<dyn FnMut(MouseEvent)>);

    let document = browser::document()?;
    document.set_onkeydown(Some(onkeydown.as_ref().unchecked_ref()));
    document.set_onkeyup(Some(onkeyup.as_ref().unchecked_ref()));

    let canvas = browser::canvas()?;
    canvas.set_onmousemove(Some(onmousemove.as_ref().unchecked_ref()));
    canvas.set_onclick(Some(onclick.as_ref().unchecked_ref()));

    // listeners live as long as the page
    onkeydown.forget();
    onkeyup.forget();
    onmousemove.forget();
    onclick.forget();

    Ok(receiver)
}

pub mod input {
    //! Input capture
    //!
    //! DOM events arrive whenever the browser fires them. They are folded
    //! into an `InputState` at the start of each frame and handed to the
    //! game as an owned `InputSnapshot` per update, so the simulation never
    //! reads shared mutable input.

    use super::Point;
    use futures::channel::mpsc::UnboundedReceiver;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    pub enum InputEvent {
        KeyDown(String),
        KeyUp(String),
        /// canvas offset coordinates, display pixels
        PointerMove { x: f64, y: f64 },
        /// canvas offset coordinates, display pixels
        Click { x: f64, y: f64 },
    }

    /// Held/released per key identifier, last write wins
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct KeyState {
        pressed_keys: HashMap<String, bool>,
    }

    impl KeyState {
        pub fn new() -> Self {
            KeyState {
                pressed_keys: HashMap::new(),
            }
        }

        pub fn is_pressed(&self, key: &str) -> bool {
            self.pressed_keys.get(key).copied().unwrap_or(false)
        }

        pub fn set_pressed(&mut self, key: &str) {
            self.pressed_keys.insert(key.to_string(), true);
        }

        pub fn set_released(&mut self, key: &str) {
            self.pressed_keys.insert(key.to_string(), false);
        }
    }

    /// What one update sees, all coordinates in game units
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct InputSnapshot {
        pub keys: KeyState,
        /// last known pointer, None until the pointer has moved over the canvas
        pub pointer: Option<Point>,
        /// clicks since the previous update, oldest first
        pub clicks: Vec<Point>,
    }

    #[derive(Debug)]
    pub struct InputState {
        scale: f64,
        keys: KeyState,
        pointer: Option<Point>,
        pending_clicks: Vec<Point>,
    }

    impl InputState {
        pub fn new(scale: f64) -> Self {
            InputState {
                scale,
                keys: KeyState::new(),
                pointer: None,
                pending_clicks: Vec::new(),
            }
        }

        pub fn apply(&mut self, event: InputEvent) {
            match event {
                InputEvent::KeyDown(key) => self.keys.set_pressed(&key),
                InputEvent::KeyUp(key) => self.keys.set_released(&key),
                InputEvent::PointerMove { x, y } => self.pointer = Some(self.to_game_units(x, y)),
                InputEvent::Click { x, y } => {
                    let target = self.to_game_units(x, y);
                    self.pending_clicks.push(target);
                }
            }
        }

        /// Apply everything queued so far without waiting for more
        pub fn drain(&mut self, receiver: &mut UnboundedReceiver<InputEvent>) {
            // Err : queue is empty, or every sender is gone
            while let Ok(event) = receiver.try_recv() {
                self.apply(event);
            }
        }

        /// Held keys and pointer carry over, clicks are handed out once
        pub fn snapshot(&mut self) -> InputSnapshot {
            InputSnapshot {
                keys: self.keys.clone(),
                pointer: self.pointer,
                clicks: std::mem::take(&mut self.pending_clicks),
            }
        }

        fn to_game_units(&self, x: f64, y: f64) -> Point {
            Point::new(x / self.scale, y / self.scale)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use futures::channel::mpsc::unbounded;

        #[test]
        fn key_state_is_last_write_wins() {
            let mut keys = KeyState::new();
            assert!(!keys.is_pressed("w"));

            keys.set_pressed("w");
            keys.set_pressed("w");
            assert!(keys.is_pressed("w"));

            keys.set_released("w");
            assert!(!keys.is_pressed("w"));
            assert!(!keys.is_pressed("a"));
        }

        #[test]
        fn pointer_is_converted_to_game_units() {
            let mut input = InputState::new(2.0);
            input.apply(InputEvent::PointerMove { x: 250.0, y: 100.0 });

            let snapshot = input.snapshot();
            assert_eq!(snapshot.pointer, Some(Point::new(125.0, 50.0)));
        }

        #[test]
        fn pointer_persists_between_snapshots() {
            let mut input = InputState::new(2.0);
            assert_eq!(input.snapshot().pointer, None);

            input.apply(InputEvent::PointerMove { x: 10.0, y: 20.0 });
            input.snapshot();
            assert_eq!(input.snapshot().pointer, Some(Point::new(5.0, 10.0)));
        }

        #[test]
        fn clicks_are_delivered_once_in_order() {
            let mut input = InputState::new(2.0);
            input.apply(InputEvent::Click { x: 20.0, y: 40.0 });
            input.apply(InputEvent::Click { x: 60.0, y: 80.0 });
            input.apply(InputEvent::KeyDown("r".to_string()));

            let first = input.snapshot();
            assert_eq!(
                first.clicks,
                vec![Point::new(10.0, 20.0), Point::new(30.0, 40.0)]
            );
            assert!(first.keys.is_pressed("r"));

            let second = input.snapshot();
            assert!(second.clicks.is_empty());
            assert!(second.keys.is_pressed("r"));
        }

        #[test]
        fn clicks_wait_for_the_next_snapshot() {
            let (sender, mut receiver) = unbounded();
            let mut input = InputState::new(1.0);

            // two frames with no update in between
            sender
                .unbounded_send(InputEvent::Click { x: 1.0, y: 1.0 })
                .unwrap();
            input.drain(&mut receiver);
            sender
                .unbounded_send(InputEvent::Click { x: 2.0, y: 2.0 })
                .unwrap();
            input.drain(&mut receiver);

            assert_eq!(
                input.snapshot().clicks,
                vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]
            );
        }

        #[test]
        fn clicks_do_not_move_the_pointer() {
            let mut input = InputState::new(1.0);
            input.apply(InputEvent::PointerMove { x: 1.0, y: 2.0 });
            input.apply(InputEvent::Click { x: 50.0, y: 50.0 });

            assert_eq!(input.snapshot().pointer, Some(Point::new(1.0, 2.0)));
        }

        #[test]
        fn drain_applies_queued_events() {
            let (sender, mut receiver) = unbounded();
            sender
                .unbounded_send(InputEvent::KeyDown("d".to_string()))
                .unwrap();
            sender
                .unbounded_send(InputEvent::KeyDown("w".to_string()))
                .unwrap();
            sender
                .unbounded_send(InputEvent::KeyUp("w".to_string()))
                .unwrap();

            let mut input = InputState::new(2.0);
            input.drain(&mut receiver);

            let snapshot = input.snapshot();
            assert!(snapshot.keys.is_pressed("d"));
            assert!(!snapshot.keys.is_pressed("w"));

            // nothing queued, senders alive
            input.drain(&mut receiver);
            drop(sender);
            // senders gone
            input.drain(&mut receiver);
            assert!(input.snapshot().keys.is_pressed("d"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn short_frame_waits_for_a_full_step() {
        let mut game_loop = GameLoop::new(1000.0);
        assert_eq!(game_loop.steps(1016.0), 0);
        // the 16ms carried over plus another 16ms pays for one step
        assert_eq!(game_loop.steps(1032.0), 1);
    }

    #[test]
    fn steady_frames_step_once_each() {
        let mut game_loop = GameLoop::new(0.0);
        let frame = f64::from(FRAME_SIZE) + 0.5;
        let steps: u32 = (1..=60).map(|i| game_loop.steps(frame * i as f64)).sum();
        assert!((59..=61).contains(&steps));
    }

    #[test]
    fn long_stall_is_capped_and_forgotten() {
        let mut game_loop = GameLoop::new(0.0);
        assert_eq!(game_loop.steps(5000.0), MAX_UPDATES_PER_FRAME);
        assert_eq!(game_loop.accumulated_delta, 0.0);
        assert_eq!(game_loop.steps(5010.0), 0);
    }

    #[test]
    fn timestamp_behind_clock_owes_nothing() {
        let mut game_loop = GameLoop::new(1000.0);
        assert_eq!(game_loop.steps(990.0), 0);
        assert_eq!(game_loop.accumulated_delta, 0.0);
        assert_eq!(game_loop.steps(1007.0), 1);
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_abs_diff_eq!(a.distance(b), 5.0);
        assert_abs_diff_eq!(b.distance(a), 5.0);
    }

    #[test]
    fn angle_to_uses_screen_axes() {
        let origin = Point::new(10.0, 10.0);
        assert_abs_diff_eq!(origin.angle_to(Point::new(20.0, 10.0)), 0.0);
        assert_abs_diff_eq!(origin.angle_to(Point::new(10.0, 20.0)), FRAC_PI_2);
        assert_abs_diff_eq!(origin.angle_to(Point::new(0.0, 10.0)), PI);
    }

    #[test]
    fn step_moves_along_heading() {
        let moved = Point::new(1.0, 1.0).step(FRAC_PI_2, 2.0);
        assert_abs_diff_eq!(moved.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(moved.y, 3.0, epsilon = 1e-12);
    }
}
