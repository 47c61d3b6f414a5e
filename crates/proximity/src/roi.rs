//! Region-of-interest sampling of a depth grid

use ndarray::{s, ArrayView2};

/// Square region of the depth grid, centred at an offset from the grid centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionOfInterest {
    /// Side length (cells)
    pub size: usize,
    pub row_offset: i64,
    pub col_offset: i64,
}

impl RegionOfInterest {
    pub fn new(size: usize, row_offset: i64, col_offset: i64) -> Self {
        Self {
            size,
            row_offset,
            col_offset,
        }
    }

    /// Clamp one axis of the region to `0..len`
    fn span(&self, len: usize, offset: i64) -> Option<(usize, usize)> {
        let size = i64::try_from(self.size).unwrap_or(i64::MAX);
        let start = (len as i64 / 2).saturating_add(offset).saturating_sub(size / 2);
        let end = start.saturating_add(size);

        let lo = start.clamp(0, len as i64) as usize;
        let hi = end.clamp(0, len as i64) as usize;
        (lo < hi).then_some((lo, hi))
    }

    /// Median of the valid cells inside the region.
    ///
    /// Cells outside the grid and non-finite or negative values are skipped;
    /// `None` when nothing valid remains.
    pub fn median(&self, grid: ArrayView2<'_, f32>) -> Option<f32> {
        if self.size == 0 {
            return None;
        }
        let (r0, r1) = self.span(grid.nrows(), self.row_offset)?;
        let (c0, c1) = self.span(grid.ncols(), self.col_offset)?;

        let mut values: Vec<f32> = grid
            .slice(s![r0..r1, c0..c1])
            .iter()
            .copied()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .collect();

        if values.is_empty() {
            return None;
        }
        values.sort_by(f32::total_cmp);

        let mid = values.len() / 2;
        if values.len() % 2 == 1 {
            Some(values[mid])
        } else {
            Some((values[mid - 1] + values[mid]) / 2.0)
        }
    }
}

impl Default for RegionOfInterest {
    fn default() -> Self {
        Self::new(10, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_median_of_centre_region() {
        let grid = Array2::from_shape_fn((5, 5), |(r, c)| (r * 5 + c) as f32);
        let roi = RegionOfInterest::new(3, 0, 0);

        // rows 1..4, cols 1..4 -> 6,7,8,11,12,13,16,17,18
        assert_eq!(roi.median(grid.view()), Some(12.0));
    }

    #[test]
    fn test_even_count_averages_middle_pair() {
        let grid = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 10.0]).unwrap();
        let roi = RegionOfInterest::new(10, 0, 0);
        assert_eq!(roi.median(grid.view()), Some(2.5));
    }

    #[test]
    fn test_invalid_cells_skipped() {
        let grid = Array2::from_shape_vec(
            (2, 3),
            vec![f32::NAN, -1.0, 4.0, f32::INFINITY, 6.0, 8.0],
        )
        .unwrap();
        let roi = RegionOfInterest::default();
        assert_eq!(roi.median(grid.view()), Some(6.0));
    }

    #[test]
    fn test_region_outside_grid() {
        let grid = Array2::from_elem((4, 4), 3.0f32);
        let roi = RegionOfInterest::new(2, 100, 0);
        assert_eq!(roi.median(grid.view()), None);

        let partial = RegionOfInterest::new(4, 2, 2);
        assert_eq!(partial.median(grid.view()), Some(3.0));
    }

    #[test]
    fn test_extreme_offsets_clamp() {
        let grid = Array2::from_elem((4, 4), 3.0f32);
        assert_eq!(RegionOfInterest::new(2, i64::MAX, 0).median(grid.view()), None);
        assert_eq!(RegionOfInterest::new(2, 0, i64::MIN).median(grid.view()), None);
        assert_eq!(RegionOfInterest::new(usize::MAX, 0, 0).median(grid.view()), Some(3.0));
    }

    #[test]
    fn test_no_valid_cells() {
        let grid = Array2::from_elem((3, 3), f32::NAN);
        assert_eq!(RegionOfInterest::default().median(grid.view()), None);

        let empty = Array2::<f32>::zeros((0, 0));
        assert_eq!(RegionOfInterest::default().median(empty.view()), None);
    }

    #[test]
    fn test_offset_moves_region() {
        let grid = Array2::from_shape_fn((10, 10), |(_, c)| c as f32);
        let roi = RegionOfInterest::new(1, 0, 3);
        assert_eq!(roi.median(grid.view()), Some(8.0));
    }
}
