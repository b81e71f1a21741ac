//! Raw-to-dense label mapping for mask pixel values.
//!
//! Stored masks use sparse raw values; the model predicts over a dense
//! `[0, C)` class-index space. The mapping is total-or-fail: a raw value
//! with no table entry aborts the remap instead of leaking past `C - 1`
//! into the loss and metric.

/// Immutable lookup table from raw mask values to dense class indices.
#[derive(Debug, Clone)]
pub struct LabelMap {
    table: [i16; 256],
    classes: usize,
}

impl LabelMap {
    /// The six desert terrain classes: {0, 1, 2, 3, 27, 39} -> [0, 6).
    pub fn desert() -> Self {
        Self::new(&[(0, 0), (1, 1), (2, 2), (3, 3), (27, 4), (39, 5)])
    }

    pub fn new(pairs: &[(u8, u8)]) -> Self {
        let mut table = [-1i16; 256];
        let mut classes = 0;
        for &(raw, cls) in pairs {
            table[raw as usize] = cls as i16;
            classes = classes.max(cls as usize + 1);
        }
        Self { table, classes }
    }

    pub fn num_classes(&self) -> usize {
        self.classes
    }

    /// Substitute every raw value by its dense class index, shape-preserving.
    /// Returns the first unmapped raw value as the error.
    pub fn remap(&self, raw: &[u8]) -> Result<Vec<i32>, u8> {
        let mut out = Vec::with_capacity(raw.len());
        for &v in raw {
            let cls = self.table[v as usize];
            if cls < 0 {
                return Err(v);
            }
            out.push(cls as i32);
        }
        Ok(out)
    }
}
