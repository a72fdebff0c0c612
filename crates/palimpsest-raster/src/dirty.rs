#![forbid(unsafe_code)]

//! Sparse pixel diffs.
//!
//! A [`Dirty`] lists only the horizontal pixel runs touched by an edit,
//! grouped by row, together with the pixel data for each run. Keeping the
//! runs sparse makes the diff proportional to the edited area rather than
//! to the whole image.
//!
//! ```text
//! row y=3:  [x=2 w=4 | p p p p]   [x=10 w=1 | p]
//! row y=4:  [x=2 w=5 | p p p p p]
//! ```

use crate::error::{RasterError, Result};
use crate::image::{ColorMode, Image};

/// One pixel run inside a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyCol {
    pub x: usize,
    pub w: usize,
    /// Exactly `w` pixels of raw data.
    pub data: Vec<u8>,
}

/// All runs on one image row, sorted by `x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyRow {
    pub y: usize,
    pub cols: Vec<DirtyCol>,
}

/// A sparse set of pixel runs over an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirty {
    mode: ColorMode,
    x1: usize,
    y1: usize,
    x2: usize,
    y2: usize,
    rows: Vec<DirtyRow>,
}

impl Dirty {
    /// Create an empty diff with the given inclusive bounds.
    #[must_use]
    pub fn new(mode: ColorMode, x1: usize, y1: usize, x2: usize, y2: usize) -> Self {
        Self {
            mode,
            x1,
            y1,
            x2,
            y2,
            rows: Vec::new(),
        }
    }

    /// Rebuild a diff from decoded parts.
    #[must_use]
    pub fn from_parts(
        mode: ColorMode,
        (x1, y1, x2, y2): (usize, usize, usize, usize),
        rows: Vec<DirtyRow>,
    ) -> Self {
        Self {
            mode,
            x1,
            y1,
            x2,
            y2,
            rows,
        }
    }

    /// Collect the runs where `after` differs from `before`.
    ///
    /// Run data carries the `after` pixels. Both images must share mode and
    /// dimensions.
    pub fn from_diff(before: &Image, after: &Image) -> Result<Self> {
        if before.mode() != after.mode() {
            return Err(RasterError::ModeMismatch {
                expected: before.mode(),
                actual: after.mode(),
            });
        }
        if before.width() != after.width() || before.height() != after.height() {
            return Err(RasterError::OutOfBounds {
                x: 0,
                y: 0,
                width: after.width(),
                height: after.height(),
                bound_width: before.width(),
                bound_height: before.height(),
            });
        }

        let bpp = before.mode().bytes_per_pixel();
        let width = before.width();
        let mut dirty = Self::new(before.mode(), 0, 0, 0, 0);
        let mut bounds: Option<(usize, usize, usize, usize)> = None;

        for y in 0..before.height() {
            let old = before.row(0, y, width)?;
            let new = after.row(0, y, width)?;
            let mut cols = Vec::new();
            let mut x = 0;
            while x < width {
                if old[x * bpp..(x + 1) * bpp] == new[x * bpp..(x + 1) * bpp] {
                    x += 1;
                    continue;
                }
                let start = x;
                while x < width && old[x * bpp..(x + 1) * bpp] != new[x * bpp..(x + 1) * bpp] {
                    x += 1;
                }
                cols.push(DirtyCol {
                    x: start,
                    w: x - start,
                    data: new[start * bpp..x * bpp].to_vec(),
                });
                bounds = Some(match bounds {
                    None => (start, y, x - 1, y),
                    Some((bx1, by1, bx2, _)) => (bx1.min(start), by1, bx2.max(x - 1), y),
                });
            }
            if !cols.is_empty() {
                dirty.rows.push(DirtyRow { y, cols });
            }
        }

        if let Some((x1, y1, x2, y2)) = bounds {
            dirty.x1 = x1;
            dirty.y1 = y1;
            dirty.x2 = x2;
            dirty.y2 = y2;
        }
        Ok(dirty)
    }

    #[must_use]
    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    /// Inclusive bounds `(x1, y1, x2, y2)`.
    #[must_use]
    pub fn bounds(&self) -> (usize, usize, usize, usize) {
        (self.x1, self.y1, self.x2, self.y2)
    }

    #[must_use]
    pub fn rows(&self) -> &[DirtyRow] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bytes occupied by `w` pixels in this diff's mode.
    #[must_use]
    pub fn line_size(&self, w: usize) -> usize {
        w * self.mode.bytes_per_pixel()
    }

    /// Total number of pixels across all runs.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.cols.iter())
            .map(|col| col.w)
            .sum()
    }

    /// Mark `w` pixels starting at (`x`, `y`) as dirty.
    ///
    /// Overlapping or touching runs on the same row are merged. Run data is
    /// zero-filled until [`save_image_pixels`](Self::save_image_pixels).
    pub fn add_run(&mut self, y: usize, x: usize, w: usize) {
        if w == 0 {
            return;
        }
        if self.rows.is_empty() {
            self.x1 = x;
            self.y1 = y;
            self.x2 = x + w - 1;
            self.y2 = y;
        } else {
            self.x1 = self.x1.min(x);
            self.y1 = self.y1.min(y);
            self.x2 = self.x2.max(x + w - 1);
            self.y2 = self.y2.max(y);
        }

        let line = self.line_size(1);
        let row_idx = match self.rows.binary_search_by_key(&y, |row| row.y) {
            Ok(idx) => idx,
            Err(idx) => {
                self.rows.insert(idx, DirtyRow { y, cols: Vec::new() });
                idx
            }
        };
        let row = &mut self.rows[row_idx];

        let mut start = x;
        let mut end = x + w;
        row.cols.retain(|col| {
            let touches = col.x <= end && start <= col.x + col.w;
            if touches {
                start = start.min(col.x);
                end = end.max(col.x + col.w);
            }
            !touches
        });
        let pos = row.cols.partition_point(|col| col.x < start);
        row.cols.insert(
            pos,
            DirtyCol {
                x: start,
                w: end - start,
                data: vec![0; (end - start) * line],
            },
        );
    }

    fn check_against(&self, image: &Image) -> Result<()> {
        if image.mode() != self.mode {
            return Err(RasterError::ModeMismatch {
                expected: self.mode,
                actual: image.mode(),
            });
        }
        for row in &self.rows {
            for col in &row.cols {
                image.check_region(col.x, row.y, col.w, 1)?;
                if col.data.len() != self.line_size(col.w) {
                    return Err(RasterError::DataLength {
                        expected: self.line_size(col.w),
                        actual: col.data.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Copy the live pixels under every run into the diff.
    pub fn save_image_pixels(&mut self, image: &Image) -> Result<()> {
        self.check_against(image)?;
        for row in &mut self.rows {
            for col in &mut row.cols {
                col.data.copy_from_slice(image.row(col.x, row.y, col.w)?);
            }
        }
        Ok(())
    }

    /// Exchange every run's data with the live pixels, in place.
    ///
    /// All runs are validated before any pixel moves, so a failing call
    /// leaves both the image and the diff untouched.
    pub fn swap_image_pixels(&mut self, image: &mut Image) -> Result<()> {
        self.check_against(image)?;
        for row in &mut self.rows {
            for col in &mut row.cols {
                image
                    .row_mut(col.x, row.y, col.w)?
                    .swap_with_slice(&mut col.data);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_run_merges_touching_runs() {
        let mut dirty = Dirty::new(ColorMode::Indexed, 0, 0, 0, 0);
        dirty.add_run(2, 4, 2);
        dirty.add_run(2, 0, 2);
        dirty.add_run(2, 2, 2);
        dirty.add_run(1, 7, 1);

        assert_eq!(dirty.rows().len(), 2);
        assert_eq!(dirty.rows()[0].y, 1);
        let row = &dirty.rows()[1];
        assert_eq!(row.cols.len(), 1);
        assert_eq!((row.cols[0].x, row.cols[0].w), (0, 6));
        assert_eq!(dirty.bounds(), (0, 1, 7, 2));
    }

    #[test]
    fn add_run_keeps_disjoint_runs_sorted() {
        let mut dirty = Dirty::new(ColorMode::Rgb, 0, 0, 0, 0);
        dirty.add_run(0, 10, 1);
        dirty.add_run(0, 2, 3);
        let xs: Vec<_> = dirty.rows()[0].cols.iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![2, 10]);
        assert_eq!(dirty.rows()[0].cols[0].data.len(), 12);
    }

    #[test]
    fn from_diff_finds_changed_runs() {
        let before = Image::new(ColorMode::Indexed, 8, 3);
        let mut after = before.clone();
        after.put_pixel(1, 0, 9).unwrap();
        after.put_pixel(2, 0, 9).unwrap();
        after.put_pixel(6, 2, 4).unwrap();

        let dirty = Dirty::from_diff(&before, &after).unwrap();
        assert_eq!(dirty.pixel_count(), 3);
        assert_eq!(dirty.rows().len(), 2);
        assert_eq!(dirty.rows()[0].cols[0].data, vec![9, 9]);
        assert_eq!(dirty.bounds(), (1, 0, 6, 2));
    }

    #[test]
    fn swap_exchanges_pixels() {
        let before = Image::new(ColorMode::Grayscale, 4, 4);
        let mut after = before.clone();
        after.put_pixel(3, 3, 0xBEEF).unwrap();

        let mut dirty = Dirty::from_diff(&before, &after).unwrap();
        let mut live = before.clone();
        dirty.swap_image_pixels(&mut live).unwrap();
        assert_eq!(live, after);
        assert_eq!(dirty.rows()[0].cols[0].data, vec![0, 0]);

        dirty.swap_image_pixels(&mut live).unwrap();
        assert_eq!(live, before);
    }

    #[test]
    fn swap_rejects_runs_outside_image() {
        let mut dirty = Dirty::new(ColorMode::Indexed, 0, 0, 0, 0);
        dirty.add_run(0, 0, 1);
        dirty.add_run(9, 0, 1);
        let mut img = Image::new(ColorMode::Indexed, 2, 2);
        img.fill(7);
        assert!(dirty.swap_image_pixels(&mut img).is_err());
        assert!(img.data().iter().all(|&px| px == 7));
    }

    #[test]
    fn save_reads_live_pixels() {
        let mut img = Image::new(ColorMode::Indexed, 4, 1);
        img.fill(3);
        let mut dirty = Dirty::new(ColorMode::Indexed, 0, 0, 0, 0);
        dirty.add_run(0, 1, 2);
        dirty.save_image_pixels(&img).unwrap();
        assert_eq!(dirty.rows()[0].cols[0].data, vec![3, 3]);
    }
}
