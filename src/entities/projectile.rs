use crate::config::{Physics, ProjectileParams};
use crate::vector::Vec2;

/// The falling payload. Attached to the drone until released, then sole
/// owner of its own trajectory until it reaches the ground plane.
#[derive(Debug, Clone, Copy)]
pub struct Projectile {
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    pub radius: f32,
    pub drag_coefficient: f32,
    pub cross_sectional_area: f32,
    pub terminal_velocity: f32,
    released: bool,
    hit_ground: bool,
}

impl Projectile {
    pub fn new(position: Vec2, params: &ProjectileParams, physics: &Physics) -> Self {
        let cross_sectional_area = std::f32::consts::PI * params.radius * params.radius;
        let terminal_velocity = (2.0 * params.mass * physics.gravity
            / (physics.air_density * params.drag_coefficient * cross_sectional_area))
            .sqrt();
        Self {
            position,
            velocity: Vec2::ZERO,
            mass: params.mass,
            radius: params.radius,
            drag_coefficient: params.drag_coefficient,
            cross_sectional_area,
            terminal_velocity,
            released: false,
            hit_ground: false,
        }
    }

    pub fn released(&self) -> bool {
        self.released
    }

    pub fn hit_ground(&self) -> bool {
        self.hit_ground
    }

    /// Irreversible for the rest of the episode; calling it again is a no-op.
    pub fn release(&mut self) {
        self.released = true;
    }

    /// Advances the projectile by one fixed time step. Only a released,
    /// airborne projectile integrates; otherwise this is a no-op.
    ///
    /// Forces: gravity plus quadratic drag opposing the wind-relative
    /// velocity. Speed is capped at the terminal velocity, then position
    /// advances semi-implicitly. Reaching the ground plane clamps position,
    /// zeroes the velocity (both components, modeling an inelastic impact),
    /// and latches `hit_ground`.
    pub fn update(&mut self, wind: Vec2, dt: f32, physics: &Physics, ground_y: f32) {
        if !self.released || self.hit_ground {
            return;
        }

        let gravity_force = Vec2::new(0.0, self.mass * physics.gravity);

        let relative_velocity = self.velocity - wind;
        let rel_speed_sq = relative_velocity.magnitude_squared();
        let drag_force = match relative_velocity.normalize() {
            Ok(direction) => {
                let magnitude = 0.5
                    * physics.air_density
                    * self.drag_coefficient
                    * self.cross_sectional_area
                    * rel_speed_sq;
                -direction * magnitude
            }
            // Still air relative to the projectile produces no drag.
            Err(_) => Vec2::ZERO,
        };

        let acceleration = (gravity_force + drag_force) * (1.0 / self.mass);
        self.velocity = self.velocity + acceleration * dt;

        let speed = self.velocity.magnitude();
        if speed > self.terminal_velocity {
            self.velocity = self.velocity * (self.terminal_velocity / speed);
        }

        self.position = self.position + self.velocity * dt;

        if self.position.y >= ground_y {
            self.position.y = ground_y;
            self.velocity = Vec2::ZERO;
            self.hit_ground = true;
        }
    }
}
