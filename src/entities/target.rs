use crate::config::TargetParams;
use crate::vector::Vec2;

/// Static landing zone on the ground plane. Only its position enters the
/// reward computation; the footprint is render-only.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Target {
    pub fn new(x: f32, ground_y: f32, params: &TargetParams) -> Self {
        Self {
            position: Vec2::new(x, ground_y),
            width: params.width,
            height: params.height,
        }
    }
}
