pub mod drone;
pub mod projectile;
pub mod target;

pub use drone::Drone;
pub use projectile::Projectile;
pub use target::Target;
