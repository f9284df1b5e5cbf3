use super::vec2::Vec2;

/// Axis-aligned bounding box, `min` inclusive, `max` inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Square box around a circle.
    pub fn around(center: Vec2, radius: f32) -> Self {
        Self::from_center(center, Vec2::new(radius, radius))
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::new(margin, margin),
            max: self.max + Vec2::new(margin, margin),
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// `true` when `other` lies entirely inside `self` (within `tolerance`).
    pub fn encloses(&self, other: &Aabb, tolerance: f32) -> bool {
        other.min.x >= self.min.x - tolerance
            && other.min.y >= self.min.y - tolerance
            && other.max.x <= self.max.x + tolerance
            && other.max.y <= self.max.y + tolerance
    }

    /// Move `center` so a box of half-size `half` fits inside. An axis too
    /// narrow for the box gets the midpoint.
    pub fn confine(&self, center: Vec2, half: Vec2) -> Vec2 {
        Vec2::new(
            confine_axis(center.x, half.x, self.min.x, self.max.x),
            confine_axis(center.y, half.y, self.min.y, self.max.y),
        )
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

fn confine_axis(v: f32, half: f32, lo: f32, hi: f32) -> f32 {
    if half * 2.0 >= hi - lo {
        (lo + hi) * 0.5
    } else {
        v.clamp(lo + half, hi - half)
    }
}
