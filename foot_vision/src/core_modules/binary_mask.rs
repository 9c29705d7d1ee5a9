// THEORY:
// The `BinaryMask` is the working surface of the whole measurement engine: a 2D
// grid that says, for every pixel of the rectified image, "foot" or "not foot".
// Every geometric question the pipeline asks (where is the toe, how wide is this
// row, which pixels lie outside the heel ellipse) is answered by scanning it.
//
// Key architectural principles:
// 1.  **Dumb Data Container**: The mask only stores booleans and answers extent
//     queries about itself. It does not know about thresholds, ellipses or
//     millimetres; those belong to the stages that consume it.
// 2.  **Value Semantics**: Stages never edit a mask they were handed. They clone
//     it and return the new version, so the pre-correction mask stays intact for
//     diagnostics.
// 3.  **Isolated Morphology**: Erosion, dilation, closing and opening live in the
//     `morphology` submodule as small routines over the grid. They are tested on
//     their own, away from the rest of the pipeline.
// 4.  **Raster Boundary**: A mask converts to and from an 8-bit `GrayImage` so it
//     can be saved, viewed or fed back in by debugging collaborators.

use image::{GrayImage, Luma};

/// A 2D grid of foreground (`true`) / background (`false`) values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    /// Row-major storage, `width * height` entries.
    data: Vec<bool>,
}

impl BinaryMask {
    /// Creates a mask filled with the given value.
    pub fn new_filled(width: u32, height: u32, value: bool) -> Self {
        Self {
            width,
            height,
            data: vec![value; (width as usize) * (height as usize)],
        }
    }

    /// Creates a mask by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Reads a raster back in; any non-zero value is foreground.
    pub fn from_gray_image(image: &GrayImage) -> Self {
        Self::from_fn(image.width(), image.height(), |x, y| image.get_pixel(x, y).0[0] > 0)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// A single row as a slice.
    pub fn row(&self, y: u32) -> &[bool] {
        let start = y as usize * self.width as usize;
        &self.data[start..start + self.width as usize]
    }

    /// Number of foreground pixels.
    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Leftmost and rightmost foreground columns of row `y`, or `None` when the
    /// row has no foreground pixel (or lies outside the mask).
    pub fn row_extent(&self, y: u32) -> Option<(u32, u32)> {
        if y >= self.height {
            return None;
        }
        let row = self.row(y);
        let left = row.iter().position(|&v| v)?;
        let right = row.iter().rposition(|&v| v)?;
        Some((left as u32, right as u32))
    }

    /// Topmost and bottommost rows containing foreground, or `None` for an
    /// empty mask.
    pub fn vertical_extent(&self) -> Option<(u32, u32)> {
        let top = (0..self.height).find(|&y| self.row(y).iter().any(|&v| v))?;
        let bottom = (0..self.height).rev().find(|&y| self.row(y).iter().any(|&v| v))?;
        Some((top, bottom))
    }

    /// Exports the mask as an 8-bit raster: 255 for foreground, 0 for background.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x, y) { Luma([255u8]) } else { Luma([0u8]) }
        })
    }
}

pub mod morphology {
    // Square structuring element of side `k`, anchored at `k / 2`. A square is
    // separable, so each operation is a horizontal pass followed by a vertical
    // pass. Neighbours outside the grid are ignored: they can neither erode a
    // pixel nor dilate into one.
    use super::BinaryMask;

    #[derive(Clone, Copy)]
    enum Op {
        Erode,
        Dilate,
    }

    /// Inclusive neighbour window `[pos - a, pos + (k - 1 - a)]`, clipped to `[0, len)`.
    fn window(pos: u32, len: u32, kernel_size: u32) -> (u32, u32) {
        let anchor = kernel_size / 2;
        let lo = pos.saturating_sub(anchor);
        let hi = (pos + (kernel_size - 1 - anchor)).min(len - 1);
        (lo, hi)
    }

    fn reduce(op: Op, mut values: impl Iterator<Item = bool>) -> bool {
        match op {
            Op::Erode => values.all(|v| v),
            Op::Dilate => values.any(|v| v),
        }
    }

    fn apply(mask: &BinaryMask, kernel_size: u32, op: Op) -> BinaryMask {
        if kernel_size <= 1 || mask.width == 0 || mask.height == 0 {
            return mask.clone();
        }

        let horizontal = BinaryMask::from_fn(mask.width, mask.height, |x, y| {
            let (lo, hi) = window(x, mask.width, kernel_size);
            reduce(op, (lo..=hi).map(|nx| mask.get(nx, y)))
        });
        BinaryMask::from_fn(mask.width, mask.height, |x, y| {
            let (lo, hi) = window(y, mask.height, kernel_size);
            reduce(op, (lo..=hi).map(|ny| horizontal.get(x, ny)))
        })
    }

    pub fn erode(mask: &BinaryMask, kernel_size: u32) -> BinaryMask {
        apply(mask, kernel_size, Op::Erode)
    }

    pub fn dilate(mask: &BinaryMask, kernel_size: u32) -> BinaryMask {
        apply(mask, kernel_size, Op::Dilate)
    }

    /// Dilate then erode: fills holes smaller than the kernel.
    pub fn close(mask: &BinaryMask, kernel_size: u32) -> BinaryMask {
        erode(&dilate(mask, kernel_size), kernel_size)
    }

    /// Erode then dilate: removes specks smaller than the kernel.
    pub fn open(mask: &BinaryMask, kernel_size: u32) -> BinaryMask {
        dilate(&erode(mask, kernel_size), kernel_size)
    }
}

#[cfg(test)]
mod tests {
    use super::morphology::*;
    use super::*;

    fn rect(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> BinaryMask {
        BinaryMask::from_fn(width, height, |x, y| x >= x0 && x <= x1 && y >= y0 && y <= y1)
    }

    #[test]
    fn extents_of_a_rectangle() {
        let mask = rect(20, 30, 4, 6, 12, 25);
        assert_eq!(mask.vertical_extent(), Some((6, 25)));
        assert_eq!(mask.row_extent(10), Some((4, 12)));
        assert_eq!(mask.row_extent(2), None);
        assert_eq!(mask.row_extent(30), None);
        assert_eq!(mask.count_foreground(), 9 * 20);
    }

    #[test]
    fn empty_mask_has_no_extent() {
        let mask = BinaryMask::new_filled(8, 8, false);
        assert!(mask.is_empty());
        assert_eq!(mask.vertical_extent(), None);
    }

    #[test]
    fn gray_image_round_trip_preserves_pixels() {
        let mask = rect(9, 7, 2, 1, 5, 4);
        let gray = mask.to_gray_image();
        assert_eq!(gray.get_pixel(3, 2).0[0], 255);
        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
        assert_eq!(BinaryMask::from_gray_image(&gray), mask);
    }

    #[test]
    fn erode_shrinks_and_dilate_grows_by_half_kernel() {
        let mask = rect(30, 30, 10, 10, 19, 19);
        let eroded = erode(&mask, 5);
        assert_eq!(eroded.vertical_extent(), Some((12, 17)));
        assert_eq!(eroded.row_extent(15), Some((12, 17)));

        let dilated = dilate(&mask, 5);
        assert_eq!(dilated.vertical_extent(), Some((8, 21)));
        assert_eq!(dilated.row_extent(15), Some((8, 21)));
    }

    #[test]
    fn border_does_not_erode() {
        let mask = BinaryMask::new_filled(6, 6, true);
        assert_eq!(erode(&mask, 5), mask);
    }

    #[test]
    fn closing_fills_a_small_hole() {
        let mut mask = rect(30, 30, 5, 5, 24, 24);
        mask.set(14, 14, false);
        mask.set(15, 14, false);
        let closed = close(&mask, 5);
        assert!(closed.get(14, 14));
        assert!(closed.get(15, 14));
        assert_eq!(closed, rect(30, 30, 5, 5, 24, 24));
    }

    #[test]
    fn opening_removes_isolated_noise() {
        let mut mask = rect(40, 40, 10, 10, 29, 29);
        mask.set(2, 2, true);
        mask.set(37, 3, true);
        let opened = open(&mask, 5);
        assert!(!opened.get(2, 2));
        assert!(!opened.get(37, 3));
        assert_eq!(opened, rect(40, 40, 10, 10, 29, 29));
    }

    #[test]
    fn unit_kernel_is_identity() {
        let mask = rect(10, 10, 1, 2, 3, 4);
        assert_eq!(close(&mask, 1), mask);
        assert_eq!(open(&mask, 1), mask);
    }
}
