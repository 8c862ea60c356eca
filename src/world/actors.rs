use super::Controls;
use crate::engine::Point;

// player consts
pub const PLAYER_SPEED: f64 = 2.0;
pub const MAX_HEALTH: i32 = 100;
pub const MAX_AMMO: u32 = 10;
pub const RELOAD_TICKS: u32 = 50;

pub const BULLET_SPEED: f64 = 5.0;

/// Shared data for the one player avatar
/// - physics : position + speed
/// - combat : health, ammo, reload countdown
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Player {
    pub position: Point,
    /// radians, toward the last known pointer
    pub facing: f64,
    pub speed: f64,
    /// goes negative when several zombies land hits on the final tick
    pub health: i32,
    pub ammo: u32,
    /// ticks left, 0 when not reloading
    pub reload_timer: u32,
}

impl Player {
    pub fn new(position: Point) -> Self {
        Player {
            position,
            facing: 0.0,
            speed: PLAYER_SPEED,
            health: MAX_HEALTH,
            ammo: MAX_AMMO,
            reload_timer: 0,
        }
    }

    /// Each held direction applies on its own axis, so diagonals cover more
    /// ground than straight lines
    pub fn walk(&mut self, controls: &Controls) {
        if controls.up {
            self.position.y -= self.speed;
        }
        if controls.down {
            self.position.y += self.speed;
        }
        if controls.left {
            self.position.x -= self.speed;
        }
        if controls.right {
            self.position.x += self.speed;
        }
    }

    pub fn clamp_to(&mut self, width: f64, height: f64) {
        self.position.x = self.position.x.clamp(0.0, width);
        self.position.y = self.position.y.clamp(0.0, height);
    }

    pub fn face(&mut self, target: Point) {
        self.facing = self.position.angle_to(target);
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_timer > 0
    }

    /// Start a reload when asked for and useful, then count it down
    /// - the starting tick already counts toward the wait
    /// - ammo refills on the tick the timer reaches 0
    pub fn update_reload(&mut self, requested: bool) {
        if requested && self.ammo < MAX_AMMO && !self.is_reloading() {
            self.reload_timer = RELOAD_TICKS;
        }
        if self.is_reloading() {
            self.reload_timer -= 1;
            if self.reload_timer == 0 {
                self.ammo = MAX_AMMO;
            }
        }
    }

    /// A shot toward `target`, or None when empty or reloading
    pub fn try_fire(&mut self, target: Point) -> Option<Bullet> {
        if self.ammo == 0 || self.is_reloading() {
            return None;
        }
        self.ammo -= 1;
        Some(Bullet::new(self.position, self.position.angle_to(target)))
    }

    pub fn take_hits(&mut self, hits: usize) {
        self.health = self.health.saturating_sub(hits as i32);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Zombie {
    pub position: Point,
    pub speed: f64,
    /// heading of the last pursuit step, cosmetic only
    pub facing: f64,
}

impl Zombie {
    pub fn new(position: Point, speed: f64, facing: f64) -> Self {
        Zombie {
            position,
            speed,
            facing,
        }
    }

    /// Straight line pursuit, re-aimed every tick
    pub fn pursue(&mut self, target: Point) {
        self.facing = self.position.angle_to(target);
        self.position = self.position.step(self.facing, self.speed);
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bullet {
    pub position: Point,
    /// fixed at creation
    pub angle: f64,
    pub speed: f64,
}

impl Bullet {
    pub fn new(position: Point, angle: f64) -> Self {
        Bullet {
            position,
            angle,
            speed: BULLET_SPEED,
        }
    }

    pub fn advance(&mut self) {
        self.position = self.position.step(self.angle, self.speed);
    }

    /// Half open, a bullet exactly on the far edge is already gone
    pub fn in_bounds(&self, width: f64, height: f64) -> bool {
        self.position.x >= 0.0
            && self.position.y >= 0.0
            && self.position.x < width
            && self.position.y < height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn new_player_is_fully_stocked() {
        let player = Player::new(Point::new(120.0, 120.0));
        assert_eq!(player.health, MAX_HEALTH);
        assert_eq!(player.ammo, MAX_AMMO);
        assert_eq!(player.reload_timer, 0);
        assert_eq!(player.speed, PLAYER_SPEED);
        assert_eq!(player.facing, 0.0);
    }

    #[test]
    fn diagonal_walk_is_not_normalized() {
        let mut player = Player::new(Point::new(100.0, 100.0));
        player.walk(&Controls {
            up: true,
            right: true,
            ..Default::default()
        });
        assert_eq!(player.position, Point::new(102.0, 98.0));
    }

    #[test]
    fn opposite_keys_cancel_out() {
        let mut player = Player::new(Point::new(100.0, 100.0));
        player.walk(&Controls {
            left: true,
            right: true,
            up: true,
            down: true,
            ..Default::default()
        });
        assert_eq!(player.position, Point::new(100.0, 100.0));
    }

    #[test]
    fn clamp_is_inclusive_of_the_far_edge() {
        let mut player = Player::new(Point::new(-3.0, 250.0));
        player.clamp_to(240.0, 240.0);
        assert_eq!(player.position, Point::new(0.0, 240.0));
    }

    #[test]
    fn firing_spends_ammo_and_aims_at_target() {
        let mut player = Player::new(Point::new(10.0, 10.0));
        let bullet = player.try_fire(Point::new(0.0, 10.0)).unwrap();

        assert_eq!(player.ammo, MAX_AMMO - 1);
        assert_eq!(bullet.position, Point::new(10.0, 10.0));
        assert_abs_diff_eq!(bullet.angle, PI);
        assert_eq!(bullet.speed, BULLET_SPEED);
    }

    #[test]
    fn firing_empty_or_reloading_does_nothing() {
        let mut empty = Player::new(Point::new(10.0, 10.0));
        empty.ammo = 0;
        assert!(empty.try_fire(Point::new(0.0, 0.0)).is_none());
        assert_eq!(empty.ammo, 0);

        let mut reloading = Player::new(Point::new(10.0, 10.0));
        reloading.ammo = 4;
        reloading.reload_timer = 12;
        assert!(reloading.try_fire(Point::new(0.0, 0.0)).is_none());
        assert_eq!(reloading.ammo, 4);
    }

    #[test]
    fn reload_is_ignored_with_full_magazine() {
        let mut player = Player::new(Point::new(10.0, 10.0));
        player.update_reload(true);
        assert_eq!(player.reload_timer, 0);
        assert_eq!(player.ammo, MAX_AMMO);
    }

    #[test]
    fn reload_counts_starting_tick() {
        let mut player = Player::new(Point::new(10.0, 10.0));
        player.ammo = 2;
        player.update_reload(true);
        assert_eq!(player.reload_timer, RELOAD_TICKS - 1);

        // holding the key mid reload doesn't restart it
        player.update_reload(true);
        assert_eq!(player.reload_timer, RELOAD_TICKS - 2);
    }

    #[test]
    fn damage_can_overshoot_zero() {
        let mut player = Player::new(Point::new(10.0, 10.0));
        player.health = 2;
        player.take_hits(3);
        assert_eq!(player.health, -1);
        assert!(player.is_dead());
    }

    #[test]
    fn zombie_steps_toward_target() {
        let mut zombie = Zombie::new(Point::new(0.0, 0.0), 1.5, 0.0);
        zombie.pursue(Point::new(0.0, 10.0));
        assert_abs_diff_eq!(zombie.position.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(zombie.position.y, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(zombie.facing, PI / 2.0);
    }

    #[test]
    fn bullet_bounds_are_half_open() {
        let inside = Bullet::new(Point::new(0.0, 239.9), 0.0);
        assert!(inside.in_bounds(240.0, 240.0));

        let on_edge = Bullet::new(Point::new(240.0, 10.0), 0.0);
        assert!(!on_edge.in_bounds(240.0, 240.0));

        let negative = Bullet::new(Point::new(10.0, -0.1), 0.0);
        assert!(!negative.in_bounds(240.0, 240.0));
    }
}
