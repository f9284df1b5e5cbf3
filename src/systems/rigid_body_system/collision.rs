use crate::core::Vec2;
use crate::systems::rigid_body::Body;

/// Contact set between bodies `a` and `b`, `normal` points from `a` to `b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Manifold {
    pub a: usize,
    pub b: usize,
    pub normal: Vec2,
    pub points: [Vec2; 2],
    pub depths: [f32; 2],
    pub count: usize,
}

impl Manifold {
    pub fn max_depth(&self) -> f32 {
        self.depths[..self.count].iter().copied().fold(0.0, f32::max)
    }

    pub fn contacts(&self) -> impl Iterator<Item = (Vec2, f32)> + '_ {
        self.points[..self.count].iter().copied().zip(self.depths[..self.count].iter().copied())
    }
}

// Prefer `a` as reference unless `b` separates clearly more.
const REFERENCE_BIAS: f32 = 0.98;
const REFERENCE_TOLERANCE: f32 = 0.001;

/// Separating-axis test on the four face normals, then reference/incident
/// face clipping. `None` when separated.
pub(super) fn collide(ia: usize, a: &Body, ib: usize, b: &Body) -> Option<Manifold> {
    let ca = a.corners();
    let na = a.normals();
    let cb = b.corners();
    let nb = b.normals();

    let (sep_a, face_a) = max_separation(&ca, &na, &cb);
    if sep_a > 0.0 {
        return None;
    }
    let (sep_b, face_b) = max_separation(&cb, &nb, &ca);
    if sep_b > 0.0 {
        return None;
    }

    let flip = sep_b > REFERENCE_BIAS * sep_a + REFERENCE_TOLERANCE;
    let (ref_c, ref_n, inc_c, inc_n, face) = if flip {
        (&cb, &nb, &ca, &na, face_b)
    } else {
        (&ca, &na, &cb, &nb, face_a)
    };

    let normal = ref_n[face];
    let v1 = ref_c[face];
    let v2 = ref_c[(face + 1) % 4];

    // Incident face: the one most anti-parallel to the reference normal.
    let inc_face = (0..4)
        .min_by(|&i, &j| normal.dot(inc_n[i]).total_cmp(&normal.dot(inc_n[j])))
        .unwrap_or(0);
    let incident = [inc_c[inc_face], inc_c[(inc_face + 1) % 4]];

    let tangent = (v2 - v1).try_normalize()?;
    let clipped = clip_segment(incident, -tangent, -tangent.dot(v1))?;
    let clipped = clip_segment(clipped, tangent, tangent.dot(v2))?;

    let front = normal.dot(v1);
    let mut manifold = Manifold {
        a: ia,
        b: ib,
        normal: if flip { -normal } else { normal },
        points: [Vec2::ZERO; 2],
        depths: [0.0; 2],
        count: 0,
    };
    for p in clipped {
        let separation = normal.dot(p) - front;
        if separation <= 0.0 {
            let depth = -separation;
            manifold.points[manifold.count] = p + normal * (depth * 0.5);
            manifold.depths[manifold.count] = depth;
            manifold.count += 1;
        }
    }

    if manifold.count == 0 {
        None
    } else {
        Some(manifold)
    }
}

/// Largest face separation of `poly` against `other`, with the face index.
fn max_separation(poly: &[Vec2; 4], normals: &[Vec2; 4], other: &[Vec2; 4]) -> (f32, usize) {
    let mut best = (f32::NEG_INFINITY, 0);
    for i in 0..4 {
        let n = normals[i];
        let v = poly[i];
        let s = other.iter().map(|&o| n.dot(o - v)).fold(f32::INFINITY, f32::min);
        if s > best.0 {
            best = (s, i);
        }
    }
    best
}

/// Keep the part of segment `seg` with `dot(n, p) <= offset`.
fn clip_segment(seg: [Vec2; 2], n: Vec2, offset: f32) -> Option<[Vec2; 2]> {
    let d0 = n.dot(seg[0]) - offset;
    let d1 = n.dot(seg[1]) - offset;

    match (d0 <= 0.0, d1 <= 0.0) {
        (true, true) => Some(seg),
        (false, false) => None,
        (in0, _) => {
            let t = d0 / (d0 - d1);
            let cut = seg[0] + (seg[1] - seg[0]) * t;
            if in0 {
                Some([seg[0], cut])
            } else {
                Some([cut, seg[1]])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::rigid_body::{BodyId, BodyParams};

    fn body(x: f32, y: f32, w: f32, h: f32, angle: f32) -> Body {
        let params = BodyParams::new(Vec2::new(x, y), w, h).with_angle(angle);
        Body::from_params(BodyId(0), &params)
    }

    #[test]
    fn separated_boxes_do_not_collide() {
        let a = body(0.0, 0.0, 10.0, 10.0, 0.0);
        let b = body(10.5, 0.0, 10.0, 10.0, 0.0);
        assert!(collide(0, &a, 1, &b).is_none());
    }

    #[test]
    fn stacked_boxes_get_two_points() {
        // Floor below (y grows down), box resting 0.5 into it.
        let floor = body(50.0, 100.0, 100.0, 20.0, 0.0);
        let top = body(50.0, 85.5, 10.0, 10.0, 0.0);
        let m = collide(0, &floor, 1, &top).expect("overlap");
        assert_eq!(m.count, 2);
        assert!((m.normal.y + 1.0).abs() < 1e-5, "normal {:?}", m.normal);
        for (_, depth) in m.contacts() {
            assert!((depth - 0.5).abs() < 1e-4);
        }
    }

    #[test]
    fn normal_points_from_a_to_b() {
        let a = body(0.0, 0.0, 10.0, 10.0, 0.0);
        let b = body(9.0, 1.0, 10.0, 10.0, 0.0);
        let m = collide(0, &a, 1, &b).expect("overlap");
        assert!(m.normal.x > 0.9);
        let m = collide(1, &b, 0, &a).expect("overlap");
        assert!(m.normal.x < -0.9);
    }

    #[test]
    fn rotated_corner_hits_face() {
        let floor = body(0.0, 20.0, 100.0, 20.0, 0.0);
        // Diamond whose lowest corner pokes 1 unit into the floor's top face at y = 10.
        let half_diag = 50.0f32.sqrt();
        let diamond = body(0.0, 11.0 - half_diag, 10.0, 10.0, std::f32::consts::FRAC_PI_4);
        let m = collide(0, &floor, 1, &diamond).expect("overlap");
        assert_eq!(m.count, 1);
        assert!((m.max_depth() - 1.0).abs() < 1e-3);
    }
}
