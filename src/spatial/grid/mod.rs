//! SpatialIndex - uniform grid broad-phase over bodies and particles
//!
//! Two layers share one cell geometry:
//! - body layer: each body covers every cell its bounding box touches
//! - particle layer: each particle sits in exactly one cell
//!
//! Both layers are flat counting-sorted arrays, rebuilt every sub-step
//! without per-cell allocations.

use crate::core::{Aabb, Vec2};
use crate::systems::fluid::Particle;
use crate::systems::rigid_body::Body;

mod layer;

pub use layer::CellQuery;
use layer::CellLayer;

/// Lower bound on the cell side, keeps degenerate arenas from producing huge grids.
const MIN_CELL_SIZE: f32 = 1.0;
const MAX_CELLS: usize = 1 << 20;

/// Reference to an entity found by a neighbor query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityHandle {
    Body(usize),
    Particle(usize),
}

/// Inclusive rectangle of cell coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct CellSpan {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl CellSpan {
    fn cells(self, cols: u32) -> impl Iterator<Item = usize> {
        (self.y0..=self.y1)
            .flat_map(move |y| (self.x0..=self.x1).map(move |x| (y * cols + x) as usize))
    }
}

pub struct SpatialIndex {
    arena: Aabb,
    cell_size: f32,
    cols: u32,
    rows: u32,
    bodies: CellLayer,
    particles: CellLayer,
    body_boxes: Vec<Aabb>,
    body_fixed: Vec<bool>,
    scratch: Vec<f32>,
}

impl SpatialIndex {
    pub fn new(width: f32, height: f32) -> Self {
        let mut index = Self {
            arena: Aabb::new(Vec2::ZERO, Vec2::new(width, height)),
            cell_size: MIN_CELL_SIZE,
            cols: 1,
            rows: 1,
            bodies: CellLayer::default(),
            particles: CellLayer::default(),
            body_boxes: Vec::new(),
            body_fixed: Vec::new(),
            scratch: Vec::new(),
        };
        index.set_cell_size(MIN_CELL_SIZE);
        index
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// Re-bucket every entity.
    ///
    /// Bodies are bucketed by the box their bounding circle sweeps over the
    /// motion the next integration of `dt` under `gravity` will apply, so the
    /// body pairs stay complete after integration.
    pub fn rebuild(
        &mut self,
        bodies: &[Body],
        particles: &[Particle],
        interaction_radius: f32,
        dt: f32,
        gravity: Vec2,
    ) {
        let size = self.pick_cell_size(bodies, interaction_radius);
        self.set_cell_size(size);

        self.body_boxes.clear();
        self.body_fixed.clear();
        for body in bodies {
            let r = body.half_diagonal();
            let here = Aabb::around(body.pos, r);
            let swept = if body.is_simulated() {
                let motion = (body.velocity + gravity * dt) * dt;
                if motion.is_finite() {
                    here.union(&Aabb::around(body.pos + motion, r))
                } else {
                    here
                }
            } else {
                here
            };
            self.body_boxes.push(swept);
            self.body_fixed.push(body.is_immovable());
        }
        self.bucket_bodies();

        self.particles.spans.clear();
        for p in particles {
            let span = self.span_of(&Aabb::from_center(p.pos, Vec2::ZERO));
            self.particles.spans.push(span.unwrap_or_default());
        }
        let cells = (self.cols * self.rows) as usize;
        self.particles.bucket(self.cols, cells);
    }

    /// Re-bucket only the body layer from current positions.
    pub fn refresh_bodies(&mut self, bodies: &[Body]) {
        self.body_boxes.clear();
        self.body_fixed.clear();
        for body in bodies {
            self.body_boxes.push(Aabb::around(body.pos, body.half_diagonal()));
            self.body_fixed.push(body.is_immovable());
        }
        self.bucket_bodies();
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.particles.clear();
        self.body_boxes.clear();
        self.body_fixed.clear();
    }

    /// Bodies whose cells intersect `area`.
    pub fn query_bodies(&self, area: &Aabb) -> CellQuery<'_> {
        CellQuery::new(&self.bodies, self.cols, self.span_of(area))
    }

    /// Particles whose cell intersects `area`.
    pub fn query_particles(&self, area: &Aabb) -> CellQuery<'_> {
        CellQuery::new(&self.particles, self.cols, self.span_of(area))
    }

    /// Every entity whose cell intersects `area`, bodies first.
    pub fn query_neighbors(&self, area: &Aabb) -> impl Iterator<Item = EntityHandle> + '_ {
        self.query_bodies(area)
            .map(EntityHandle::Body)
            .chain(self.query_particles(area).map(EntityHandle::Particle))
    }

    /// Candidate body pairs `(i, j)` with `i < j`, static pairs left out.
    pub fn body_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, span_i) in self.bodies.spans.iter().enumerate() {
            for c in span_i.cells(self.cols) {
                let (cx, cy) = ((c as u32) % self.cols, (c as u32) / self.cols);
                for &j in self.bodies.cell(c) {
                    let j = j as usize;
                    if j <= i || (self.body_fixed[i] && self.body_fixed[j]) {
                        continue;
                    }
                    // Report the pair only in the first cell both spans share.
                    let span_j = self.bodies.spans[j];
                    if span_i.x0.max(span_j.x0) != cx || span_i.y0.max(span_j.y0) != cy {
                        continue;
                    }
                    if self.body_boxes[i].overlaps(&self.body_boxes[j]) {
                        pairs.push((i, j));
                    }
                }
            }
        }
        pairs
    }

    fn bucket_bodies(&mut self) {
        self.bodies.spans.clear();
        for bx in &self.body_boxes {
            let span = if bx.is_finite() { self.span_of(bx) } else { None };
            self.bodies.spans.push(span.unwrap_or_default());
        }
        let cells = (self.cols * self.rows) as usize;
        self.bodies.bucket(self.cols, cells);
    }

    /// `max(interaction_radius, median body diameter)`, capped at a quarter
    /// of the smaller arena side.
    fn pick_cell_size(&mut self, bodies: &[Body], interaction_radius: f32) -> f32 {
        self.scratch.clear();
        self.scratch
            .extend(bodies.iter().map(|b| b.half_diagonal() * 2.0).filter(|d| d.is_finite()));
        let median = if self.scratch.is_empty() {
            0.0
        } else {
            let mid = self.scratch.len() / 2;
            let (_, m, _) = self.scratch.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
            *m
        };
        let cap = (self.arena.width().min(self.arena.height()) * 0.25).max(MIN_CELL_SIZE);
        interaction_radius.max(median).min(cap)
    }

    fn set_cell_size(&mut self, size: f32) {
        let mut size = if size.is_finite() { size.max(MIN_CELL_SIZE) } else { MIN_CELL_SIZE };
        loop {
            let cols = ((self.arena.width() / size).ceil() as u32).max(1);
            let rows = ((self.arena.height() / size).ceil() as u32).max(1);
            if (cols as usize) * (rows as usize) <= MAX_CELLS {
                self.cell_size = size;
                self.cols = cols;
                self.rows = rows;
                return;
            }
            size *= 2.0;
        }
    }

    /// Cell rectangle covering `area`. Entities outside the arena land in
    /// the border cells; `None` for non-finite boxes.
    fn span_of(&self, area: &Aabb) -> Option<CellSpan> {
        if !area.is_finite() {
            return None;
        }
        let cell = |v: f32, origin: f32, max: u32| -> u32 {
            let c = ((v - origin) / self.cell_size).floor();
            if c <= 0.0 {
                0
            } else {
                (c as u32).min(max - 1)
            }
        };
        Some(CellSpan {
            x0: cell(area.min.x, self.arena.min.x, self.cols),
            y0: cell(area.min.y, self.arena.min.y, self.rows),
            x1: cell(area.max.x, self.arena.min.x, self.cols),
            y1: cell(area.max.y, self.arena.min.y, self.rows),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::materials::DEFAULT_FLUID_COLOR;
    use crate::systems::rigid_body::{BodyId, BodyParams};

    fn body(id: u32, x: f32, y: f32, w: f32, h: f32) -> Body {
        Body::from_params(BodyId(id), &BodyParams::new(Vec2::new(x, y), w, h))
    }

    fn particle(x: f32, y: f32) -> Particle {
        Particle::new(Vec2::new(x, y), 1.0, DEFAULT_FLUID_COLOR, 0)
    }

    #[test]
    fn pairs_are_unique_and_ordered() {
        let mut index = SpatialIndex::new(400.0, 400.0);
        // Large bodies spanning many cells, overlapping each other.
        let bodies = vec![
            body(1, 100.0, 100.0, 80.0, 80.0),
            body(2, 130.0, 110.0, 80.0, 80.0),
            body(3, 350.0, 350.0, 10.0, 10.0),
        ];
        index.rebuild(&bodies, &[], 4.0, 0.0, Vec2::ZERO);
        assert_eq!(index.body_pairs(), vec![(0, 1)]);
    }

    #[test]
    fn static_pairs_are_skipped() {
        let mut index = SpatialIndex::new(200.0, 200.0);
        let mut a = body(1, 50.0, 50.0, 20.0, 20.0);
        let mut b = body(2, 60.0, 50.0, 20.0, 20.0);
        a.is_static = true;
        b.is_static = true;
        index.rebuild(&[a, b], &[], 12.0, 1.0 / 60.0, Vec2::new(0.0, 981.0));
        assert!(index.body_pairs().is_empty());
    }

    #[test]
    fn swept_box_catches_fast_bodies() {
        let mut index = SpatialIndex::new(1000.0, 1000.0);
        let mut fast = body(1, 100.0, 500.0, 10.0, 10.0);
        fast.velocity = Vec2::new(6000.0, 0.0);
        let target = body(2, 200.0, 500.0, 10.0, 10.0);
        index.rebuild(&[fast, target], &[], 12.0, 1.0 / 60.0, Vec2::ZERO);
        assert_eq!(index.body_pairs(), vec![(0, 1)]);
    }

    #[test]
    fn neighbor_query_has_no_false_negatives() {
        let mut index = SpatialIndex::new(300.0, 300.0);
        let particles: Vec<Particle> = (0..50)
            .map(|i| particle(5.0 + (i % 10) as f32 * 7.0, 5.0 + (i / 10) as f32 * 7.0))
            .collect();
        let bodies = vec![body(1, 30.0, 30.0, 20.0, 20.0)];
        index.rebuild(&bodies, &particles, 12.0, 0.0, Vec2::ZERO);

        let area = Aabb::around(Vec2::new(30.0, 20.0), 12.0);
        let found: Vec<EntityHandle> = index.query_neighbors(&area).collect();
        assert!(found.contains(&EntityHandle::Body(0)));
        for (i, p) in particles.iter().enumerate() {
            if area.contains(p.pos) {
                assert!(found.contains(&EntityHandle::Particle(i)), "missed particle {i}");
            }
        }
        let mut dedup = found.clone();
        dedup.sort_by_key(|h| format!("{h:?}"));
        dedup.dedup();
        assert_eq!(dedup.len(), found.len());
    }

    #[test]
    fn cell_size_tracks_median_body_and_cap() {
        let mut index = SpatialIndex::new(100.0, 80.0);
        let bodies = vec![body(1, 40.0, 40.0, 60.0, 60.0)];
        index.rebuild(&bodies, &[], 12.0, 0.0, Vec2::ZERO);
        assert_eq!(index.cell_size(), 20.0);

        index.rebuild(&[], &[], 12.0, 0.0, Vec2::ZERO);
        assert_eq!(index.cell_size(), 12.0);
    }

    #[test]
    fn outside_entities_land_in_border_cells() {
        let mut index = SpatialIndex::new(100.0, 100.0);
        let particles = vec![particle(-5.0, 150.0)];
        index.rebuild(&[], &particles, 10.0, 0.0, Vec2::ZERO);
        let area = Aabb::around(Vec2::new(0.0, 100.0), 1.0);
        assert_eq!(index.query_particles(&area).collect::<Vec<_>>(), vec![0]);
    }
}
