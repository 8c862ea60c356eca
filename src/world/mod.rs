//! Arena simulation
//!
//! `World` owns everything that changes while playing. One call to
//! `World::tick` advances it by one frame; drawing only reads it.
//!
//! ┌──────────────────────── Tick Order ─────────────────────────┐
//! │  0. queued shots          (fire toward each click)          │
//! │  1. walk                  (held keys, unnormalized)         │
//! │  2. clamp                 (player stays in the arena)       │
//! │  3. face                  (toward last pointer)             │
//! │  4. start reload          (key held, not full, not busy)    │
//! │  5. reload countdown      (refill when it reaches 0)        │
//! │  6. zombies pursue        (toward the player's new spot)    │
//! │  7. bullets advance                                         │
//! │  8. bullet hits           (one zombie per bullet)           │
//! │  9. zombie contact        (1 damage per touching zombie)    │
//! │ 10. game over             (reset everything)                │
//! │ 11. next wave             (when no zombies are left)        │
//! └─────────────────────────────────────────────────────────────┘

mod actors;
mod spawn;

pub use self::actors::{Bullet, Player, Zombie};
pub use self::actors::{MAX_AMMO, MAX_HEALTH, RELOAD_TICKS};
pub use self::spawn::spawn_zombies;

use crate::engine::Point;
use rand::Rng;

// arena consts
pub const WIDTH: f64 = 240.0;
pub const HEIGHT: f64 = 240.0;
pub const FLASHLIGHT_RADIUS: f64 = 60.0;

// collision consts, both strictly-less-than
pub const HIT_DISTANCE: f64 = 10.0;
pub const CONTACT_DISTANCE: f64 = 10.0;

// wave consts
pub const FIRST_WAVE_SIZE: usize = 5;
pub const ZOMBIES_PER_LEVEL: usize = 5;

/// Player intent for one tick, already mapped from raw input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Controls {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub reload: bool,
    /// last known pointer in game units
    pub aim: Option<Point>,
    /// fire attempts since the last tick, oldest first
    pub shots: Vec<Point>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Playing,
    /// the player died this tick, the world has already been reset
    GameOver { score: u32 },
}

pub struct World<R> {
    player: Player,
    zombies: Vec<Zombie>,
    bullets: Vec<Bullet>,
    score: u32,
    level: u32,
    flashlight_radius: f64,
    rng: R,
}

/// read access for drawing
impl<R> World<R> {
    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn zombies(&self) -> &[Zombie] {
        &self.zombies
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn flashlight_radius(&self) -> f64 {
        self.flashlight_radius
    }
}

impl<R: Rng> World<R> {
    /// Fresh game: centred player, level 1, first wave on the board
    pub fn new(rng: R) -> Self {
        let mut world = World {
            player: Player::new(Self::spawn_point()),
            zombies: Vec::new(),
            bullets: Vec::new(),
            score: 0,
            level: 1,
            flashlight_radius: FLASHLIGHT_RADIUS,
            rng,
        };
        world.reset();
        world
    }

    pub fn with_flashlight_radius(mut self, radius: f64) -> Self {
        self.flashlight_radius = radius;
        self
    }

    fn spawn_point() -> Point {
        Point::new(WIDTH / 2.0, HEIGHT / 2.0)
    }

    /// Everything back to the starting state, the RNG keeps its stream
    pub fn reset(&mut self) {
        self.player = Player::new(Self::spawn_point());
        self.zombies.clear();
        self.bullets.clear();
        self.score = 0;
        self.level = 1;
        self.spawn_zombies(FIRST_WAVE_SIZE);
    }

    pub fn spawn_zombies(&mut self, count: usize) {
        spawn_zombies(&mut self.zombies, count, WIDTH, HEIGHT, &mut self.rng);
    }

    /// Shoot from the player toward `target`, dropped when empty or reloading
    /// # Returns
    /// * `true` - a bullet was added
    pub fn fire(&mut self, target: Point) -> bool {
        match self.player.try_fire(target) {
            Some(bullet) => {
                self.bullets.push(bullet);
                true
            }
            None => false,
        }
    }

    pub fn tick(&mut self, controls: &Controls) -> TickOutcome {
        for target in &controls.shots {
            self.fire(*target);
        }

        self.player.walk(controls);
        self.player.clamp_to(WIDTH, HEIGHT);
        if let Some(aim) = controls.aim {
            self.player.face(aim);
        }
        self.player.update_reload(controls.reload);

        let target = self.player.position;
        for zombie in &mut self.zombies {
            zombie.pursue(target);
        }
        for bullet in &mut self.bullets {
            bullet.advance();
        }

        self.resolve_bullet_hits();
        self.resolve_zombie_contact();

        if self.player.is_dead() {
            let score = self.score;
            self.reset();
            return TickOutcome::GameOver { score };
        }

        if self.zombies.is_empty() {
            self.next_wave();
        }

        TickOutcome::Playing
    }

    /// Each bullet kills the first zombie in range, then it is spent
    /// - O(bullets x zombies), fine for a few dozen of each
    /// - removal keeps zombie order so "first" stays stable
    fn resolve_bullet_hits(&mut self) {
        let zombies = &mut self.zombies;
        let score = &mut self.score;
        self.bullets.retain(|bullet| {
            let hit = zombies
                .iter()
                .position(|zombie| zombie.position.distance(bullet.position) < HIT_DISTANCE);
            match hit {
                Some(index) => {
                    zombies.remove(index);
                    *score += 1;
                    false
                }
                None => bullet.in_bounds(WIDTH, HEIGHT),
            }
        });
    }

    /// No per tick cap, three zombies touching deal three damage
    fn resolve_zombie_contact(&mut self) {
        let position = self.player.position;
        let touching = self
            .zombies
            .iter()
            .filter(|zombie| zombie.position.distance(position) < CONTACT_DISTANCE)
            .count();
        self.player.take_hits(touching);
    }

    fn next_wave(&mut self) {
        self.level += 1;
        self.spawn_zombies(self.level as usize * ZOMBIES_PER_LEVEL);
    }
}
