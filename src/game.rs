use crate::browser;
use crate::engine::input::InputSnapshot;
use crate::engine::{self, Game, Point, RadialGradient, Rect, Renderer, Surface};
use crate::settings::{KeyBindings, Settings};
use crate::world::{TickOutcome, World, HEIGHT, WIDTH};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use web_sys::HtmlImageElement;

/// ┌───────────────────── Game Architecture Overview ────────────────────────┐
/// │                                                                         │
/// │    ┌─────────────┐          ┌─────────────┐          ┌──────────────┐   │
/// │    │  engine.rs  │ snapshot │   game.rs   │ controls │  world/      │   │
/// │    │  GameLoop   ├─────────►│ ZombieShoot ├─────────►│  World::tick │   │
/// │    │  InputState │          │  update()   │          │              │   │
/// │    └──────┬──────┘          └──────┬──────┘          └──────┬───────┘   │
/// │           │                        │                        │           │
/// │           │ draw()                 │ draw_scene()           │ read only │
/// │           ▼                        ▼                        │           │
/// │    ┌─────────────┐          ┌─────────────┐                 │           │
/// │    │  Renderer   │◄─────────┤   Surface   │◄────────────────┘           │
/// │    │  (canvas)   │          │   trait     │                             │
/// │    └─────────────┘          └─────────────┘                             │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
pub enum ZombieShooter {
    /// Settings and sprite are still loading
    Loading,

    /// Playing, game over resets in place so there is no third state
    Loaded(Survival),
}

pub struct Survival {
    world: World<StdRng>,
    bindings: KeyBindings,
    scale: f64,
    // None when the sprite failed to load, the player is then not drawn
    sprite: Option<HtmlImageElement>,
}

impl ZombieShooter {
    const SETTINGS_PATH: &'static str = "settings.json";

    pub fn new() -> Self {
        ZombieShooter::Loading
    }

    async fn load_settings() -> Settings {
        match browser::fetch_json::<Settings>(Self::SETTINGS_PATH).await {
            Ok(settings) => {
                log!("Loaded settings from {}", Self::SETTINGS_PATH);
                settings.sanitized()
            }
            Err(err) => {
                log!("Using default settings : {:#}", err);
                Settings::default()
            }
        }
    }

    async fn load_sprite_image(source: &str) -> Option<HtmlImageElement> {
        let image = engine::load_image(source)
            .await
            .with_context(|| format!("Failed to load player sprite from : {}", source));
        match image {
            Ok(image) => Some(image),
            Err(err) => {
                error!("{:#}", err);
                None
            }
        }
    }
}

impl Default for ZombieShooter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Game for ZombieShooter {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            ZombieShooter::Loading => {
                // settings name the sprite, so they load first
                let settings = Self::load_settings().await;
                let sprite = Self::load_sprite_image(&settings.sprite).await;

                // backing store in display pixels, drawing scales up once per frame
                let canvas = browser::canvas()?;
                canvas.set_width((WIDTH * settings.scale) as u32);
                canvas.set_height((HEIGHT * settings.scale) as u32);

                let world = World::new(StdRng::from_entropy())
                    .with_flashlight_radius(settings.flashlight_radius);
                log!(
                    "Zombie Flashlight started : {}x{} at scale {}",
                    WIDTH,
                    HEIGHT,
                    settings.scale
                );
                Ok(Box::new(ZombieShooter::Loaded(Survival {
                    world,
                    bindings: settings.keys,
                    scale: settings.scale,
                    sprite,
                })))
            }
            ZombieShooter::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, input: &InputSnapshot) {
        if let ZombieShooter::Loaded(survival) = self {
            let controls = survival.bindings.controls(input);
            let level = survival.world.level();
            match survival.world.tick(&controls) {
                TickOutcome::GameOver { score } => {
                    log!("Game over at level {} with score {}", level, score);
                    if let Err(err) = browser::alert(&format!("Game Over! Your score: {}", score)) {
                        error!("{:#}", err);
                    }
                }
                TickOutcome::Playing => {
                    if survival.world.level() > level {
                        log!(
                            "Wave {} : {} zombies",
                            survival.world.level(),
                            survival.world.zombies().len()
                        );
                    }
                }
            }
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if let ZombieShooter::Loaded(survival) = self {
            draw_scene(
                &survival.world,
                survival.sprite.as_ref(),
                survival.scale,
                renderer,
            );
        }
    }

    fn display_scale(&self) -> f64 {
        match self {
            ZombieShooter::Loaded(survival) => survival.scale,
            ZombieShooter::Loading => 1.0,
        }
    }
}

// scene consts, game units
const FLASHLIGHT_INNER_RADIUS: f64 = 10.0;
const SPRITE_SIZE: f64 = 16.0;
const ZOMBIE_RADIUS: f64 = 5.0;
const BULLET_RADIUS: f64 = 2.0;
const HUD_X: f64 = 10.0;
const HUD_LINE_HEIGHT: f64 = 10.0;

/// One frame, purely from current state
/// Draw order matters : darkness -> light -> player -> zombies -> bullets -> HUD
pub fn draw_scene<R>(
    world: &World<R>,
    sprite: Option<&HtmlImageElement>,
    scale: f64,
    surface: &impl Surface,
) {
    let arena = Rect::new(0.0, 0.0, WIDTH, HEIGHT);
    let player = world.player();

    surface.save();
    surface.scale(scale);

    surface.fill_rect(&arena, "black");
    surface.fill_radial_gradient(
        &arena,
        &RadialGradient {
            center: player.position,
            inner_radius: FLASHLIGHT_INNER_RADIUS,
            outer_radius: world.flashlight_radius(),
            inner_color: "rgba(255, 255, 255, 1)",
            outer_color: "rgba(0, 0, 0, 0.9)",
        },
    );

    if let Some(sprite) = sprite {
        surface.draw_rotated_image(sprite, player.position, player.facing, SPRITE_SIZE);
    }

    for zombie in world.zombies() {
        surface.fill_circle(zombie.position, ZOMBIE_RADIUS, "green");
    }
    for bullet in world.bullets() {
        surface.fill_circle(bullet.position, BULLET_RADIUS, "red");
    }

    let mut hud = vec![
        format!("Score: {}", world.score()),
        format!("Health: {}", player.health),
        format!("Ammo: {}", player.ammo),
    ];
    if player.is_reloading() {
        hud.push("Reloading...".to_string());
    }
    for (line, text) in hud.iter().enumerate() {
        let y = HUD_LINE_HEIGHT * (line + 1) as f64;
        surface.fill_text(text, Point::new(HUD_X, y), "white");
    }

    surface.restore();
}
