use super::CellSpan;

/// One layer of the uniform grid, stored as flat counting-sorted arrays.
///
/// `entries[starts[c]..starts[c + 1]]` are the entity indices whose span
/// covers cell `c`. `spans[i]` is the cell rectangle of entity `i`.
#[derive(Default)]
pub(super) struct CellLayer {
    starts: Vec<u32>,
    entries: Vec<u32>,
    pub(super) spans: Vec<CellSpan>,
}

impl CellLayer {
    /// Re-bucket from scratch. `spans` must already hold one span per entity.
    pub(super) fn bucket(&mut self, cols: u32, cells: usize) {
        self.starts.clear();
        self.starts.resize(cells + 1, 0);

        for span in &self.spans {
            for c in span.cells(cols) {
                self.starts[c + 1] += 1;
            }
        }
        for c in 0..cells {
            self.starts[c + 1] += self.starts[c];
        }

        let total = self.starts[cells] as usize;
        self.entries.clear();
        self.entries.resize(total, 0);

        // Fill using a moving cursor per cell, then restore the starts.
        let mut cursor = self.starts.clone();
        for (i, span) in self.spans.iter().enumerate() {
            for c in span.cells(cols) {
                let slot = cursor[c] as usize;
                self.entries[slot] = i as u32;
                cursor[c] += 1;
            }
        }
    }

    #[inline]
    pub(super) fn cell(&self, c: usize) -> &[u32] {
        match (self.starts.get(c), self.starts.get(c + 1)) {
            (Some(&s), Some(&e)) => &self.entries[s as usize..e as usize],
            _ => &[],
        }
    }

    pub(super) fn clear(&mut self) {
        self.starts.clear();
        self.entries.clear();
        self.spans.clear();
    }
}

/// Lazy walk over the cells of a query rectangle.
///
/// Multi-cell entities are reported once: only in the first cell shared by
/// their span and the query rectangle.
pub struct CellQuery<'a> {
    layer: &'a CellLayer,
    cols: u32,
    area: CellSpan,
    x: u32,
    y: u32,
    pos: usize,
}

impl<'a> CellQuery<'a> {
    pub(super) fn new(layer: &'a CellLayer, cols: u32, area: Option<CellSpan>) -> Self {
        match area {
            Some(area) => Self { layer, cols, area, x: area.x0, y: area.y0, pos: 0 },
            // Empty walk: start past the last row.
            None => Self {
                layer,
                cols,
                area: CellSpan::default(),
                x: 0,
                y: 1,
                pos: 0,
            },
        }
    }
}

impl Iterator for CellQuery<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.y <= self.area.y1 {
            let cell = (self.y * self.cols + self.x) as usize;
            let entries = self.layer.cell(cell);
            while self.pos < entries.len() {
                let idx = entries[self.pos] as usize;
                self.pos += 1;
                let span = self.layer.spans[idx];
                if span.x0.max(self.area.x0) == self.x && span.y0.max(self.area.y0) == self.y {
                    return Some(idx);
                }
            }
            self.pos = 0;
            if self.x < self.area.x1 {
                self.x += 1;
            } else {
                self.x = self.area.x0;
                self.y += 1;
            }
        }
        None
    }
}
