//! Pixel rectangles

use serde::{Deserialize, Serialize};
use std::fmt;

/// A rectangle in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub w: T,
    pub h: T,
}

impl<T> Rect<T> {
    pub const fn new(x: T, y: T, w: T, h: T) -> Self {
        Self { x, y, w, h }
    }
}

impl Rect<u32> {
    /// Rectangle at the origin with the given size
    pub const fn from_size(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Whether `other` lies entirely inside this rectangle
    pub fn contains(&self, other: &Rect<u32>) -> bool {
        let right = u64::from(self.x) + u64::from(self.w);
        let bottom = u64::from(self.y) + u64::from(self.h);
        other.x >= self.x
            && other.y >= self.y
            && u64::from(other.x) + u64::from(other.w) <= right
            && u64::from(other.y) + u64::from(other.h) <= bottom
    }
}

impl<T: fmt::Display> fmt::Display for Rect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{x={},y={},w={},h={}}}", self.x, self.y, self.w, self.h)
    }
}
