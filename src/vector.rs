use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// 2D vector in world coordinates (meters, y grows downward).
///
/// All operations return a new vector; nothing mutates in place.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Invalid vector operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorError {
    /// Division of a vector by a zero scalar.
    ZeroDivision,
    /// Normalization of a zero-magnitude vector.
    ZeroNormalize,
}

impl fmt::Display for VectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorError::ZeroDivision => write!(f, "cannot divide a vector by zero"),
            VectorError::ZeroNormalize => write!(f, "cannot normalize a zero vector"),
        }
    }
}

impl std::error::Error for VectorError {}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Unit vector in the same direction. Zero vectors have no direction.
    pub fn normalize(&self) -> Result<Vec2, VectorError> {
        let mag = self.magnitude();
        if mag == 0.0 {
            return Err(VectorError::ZeroNormalize);
        }
        Ok(Vec2::new(self.x / mag, self.y / mag))
    }

    /// Component-wise division by a scalar. A zero divisor is a domain
    /// error, never a silent NaN.
    pub fn checked_div(&self, scalar: f32) -> Result<Vec2, VectorError> {
        if scalar == 0.0 {
            return Err(VectorError::ZeroDivision);
        }
        Ok(Vec2::new(self.x / scalar, self.y / scalar))
    }

    pub fn dot(&self, other: &Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, scalar: f32) -> Vec2 {
        Vec2::new(self.x * scalar, self.y * scalar)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -4.0);
        assert_eq!(a + b, Vec2::new(4.0, -2.0));
        assert_eq!(a - b, Vec2::new(-2.0, 6.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert_eq!(-b, Vec2::new(-3.0, 4.0));
        assert_eq!(a.dot(&b), -5.0);
    }

    #[test]
    fn magnitude_of_3_4_triangle() {
        assert_eq!(Vec2::new(3.0, 4.0).magnitude(), 5.0);
        assert_eq!(Vec2::new(3.0, 4.0).magnitude_squared(), 25.0);
    }

    #[test]
    fn normalize_yields_unit_length() {
        for v in [
            Vec2::new(3.0, 4.0),
            Vec2::new(-0.001, 17.0),
            Vec2::new(1e-3, -1e-3),
        ] {
            let n = v.normalize().unwrap();
            assert!((n.magnitude() - 1.0).abs() < 1e-6, "got {}", n.magnitude());
        }
    }

    #[test]
    fn normalize_zero_is_an_error() {
        assert_eq!(Vec2::ZERO.normalize(), Err(VectorError::ZeroNormalize));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(
            Vec2::new(1.0, 1.0).checked_div(0.0),
            Err(VectorError::ZeroDivision)
        );
        assert_eq!(
            Vec2::new(2.0, 4.0).checked_div(2.0),
            Ok(Vec2::new(1.0, 2.0))
        );
    }
}
