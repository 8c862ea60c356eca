use super::actors::Zombie;
use crate::engine::Point;
use rand::Rng;
use std::f64::consts::TAU;
use std::ops::Range;

pub const ZOMBIE_SPEED: Range<f64> = 0.5..1.5;

/// Append `count` zombies anywhere in the arena
/// - position uniform over [0, width) x [0, height)
/// - speed uniform over ZOMBIE_SPEED
/// - facing uniform over [0, TAU), replaced on the first pursuit step
pub fn spawn_zombies<R: Rng + ?Sized>(
    zombies: &mut Vec<Zombie>,
    count: usize,
    width: f64,
    height: f64,
    rng: &mut R,
) {
    zombies.reserve(count);
    for _ in 0..count {
        let position = Point::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height));
        let speed = rng.gen_range(ZOMBIE_SPEED);
        let facing = rng.gen_range(0.0..TAU);
        zombies.push(Zombie::new(position, speed, facing));
    }
}
