use crate::config::{DroneParams, Physics, ProjectileParams};
use crate::entities::projectile::Projectile;
use crate::environment::Action;
use crate::vector::Vec2;

/// Carrier platform. Moves laterally at a fixed speed and owns the
/// projectile it carries; vertical position is fixed for the episode.
#[derive(Debug, Clone, Copy)]
pub struct Drone {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    speed: f32,
    projectile: Projectile,
}

impl Drone {
    /// Spawns the drone with a fresh projectile attached one meter below it.
    pub fn new(
        position: Vec2,
        params: &DroneParams,
        projectile_params: &ProjectileParams,
        physics: &Physics,
    ) -> Self {
        let projectile = Projectile::new(
            Vec2::new(position.x, position.y + 1.0),
            projectile_params,
            physics,
        );
        Self {
            position,
            width: params.width,
            height: params.height,
            speed: params.speed,
            projectile,
        }
    }

    pub fn projectile(&self) -> &Projectile {
        &self.projectile
    }

    pub fn projectile_mut(&mut self) -> &mut Projectile {
        &mut self.projectile
    }

    /// Applies one action. Lateral moves carry the unreleased projectile
    /// along; once released, the drone no longer touches it. Releasing
    /// twice is a no-op.
    pub fn apply(&mut self, action: Action, dt: f32) {
        if self.projectile.released() {
            return;
        }
        match action {
            Action::MoveLeft => {
                self.position.x -= self.speed * dt;
                self.carry_projectile();
            }
            Action::MoveRight => {
                self.position.x += self.speed * dt;
                self.carry_projectile();
            }
            Action::Release => self.projectile.release(),
        }
    }

    fn carry_projectile(&mut self) {
        self.projectile.position = Vec2::new(self.position.x, self.position.y + 1.0);
    }
}
