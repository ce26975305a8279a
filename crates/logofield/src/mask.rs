//! Binary masks over the working canvas.

use image::RgbaImage;

/// Row-major grid of booleans with out-of-canvas reads defined as `false`.
#[derive(Debug, Clone)]
pub struct MaskGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl MaskGrid {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Signed coordinates so neighborhood walks can step off the canvas;
    /// anything outside answers `false`.
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return false;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    pub(crate) fn set(&mut self, x: u32, y: u32, value: bool) {
        self.cells[y as usize * self.width as usize + x as usize] = value;
    }

    /// Number of set cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell).count()
    }
}

/// Marks every ink pixel: anything that is neither pure opaque white nor
/// fully transparent. Semi-transparent white still counts as ink.
pub fn shape_mask(canvas: &RgbaImage) -> MaskGrid {
    let mut mask = MaskGrid::new(canvas.width(), canvas.height());
    for (x, y, pixel) in canvas.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let opaque_white = r == 255 && g == 255 && b == 255 && a == 255;
        mask.set(x, y, !opaque_white && a != 0);
    }
    mask
}

/// Marks ink pixels touching the outside: any position in the 3x3
/// neighborhood that is off-canvas or not ink makes the pixel a boundary.
pub fn boundary_mask(shape: &MaskGrid) -> MaskGrid {
    let mut boundary = MaskGrid::new(shape.width(), shape.height());
    for y in 0..shape.height() {
        for x in 0..shape.width() {
            if !shape.get(i64::from(x), i64::from(y)) {
                continue;
            }
            let mut touches_outside = false;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if !shape.get(i64::from(x) + dx, i64::from(y) + dy) {
                        touches_outside = true;
                    }
                }
            }
            if touches_outside {
                boundary.set(x, y, true);
            }
        }
    }
    boundary
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    fn white_canvas(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn opaque_white_and_transparent_are_not_ink() {
        let mut canvas = white_canvas(3, 1);
        canvas.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        let shape = shape_mask(&canvas);
        assert_eq!(shape.count(), 0);
    }

    #[test]
    fn color_and_translucent_white_are_ink() {
        let mut canvas = white_canvas(4, 1);
        canvas.put_pixel(0, 0, Rgba([0, 128, 0, 255]));
        canvas.put_pixel(1, 0, Rgba([255, 255, 255, 254]));
        canvas.put_pixel(2, 0, Rgba([255, 255, 255, 1]));
        let shape = shape_mask(&canvas);
        assert!(shape.get(0, 0));
        assert!(shape.get(1, 0));
        assert!(shape.get(2, 0));
        assert!(!shape.get(3, 0));
    }

    #[test]
    fn out_of_canvas_reads_are_false() {
        let mut canvas = white_canvas(2, 2);
        canvas.put_pixel(0, 0, Rgba([10, 10, 10, 255]));
        let shape = shape_mask(&canvas);
        assert!(!shape.get(-1, 0));
        assert!(!shape.get(0, -1));
        assert!(!shape.get(2, 0));
        assert!(!shape.get(0, 2));
    }

    #[test]
    fn block_rim_is_boundary_and_center_is_not() {
        let mut canvas = white_canvas(5, 5);
        for y in 1..4 {
            for x in 1..4 {
                canvas.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let shape = shape_mask(&canvas);
        let boundary = boundary_mask(&shape);
        assert_eq!(boundary.count(), 8);
        assert!(!boundary.get(2, 2));
        assert!(boundary.get(1, 1));
        assert!(boundary.get(3, 2));
    }

    #[test]
    fn canvas_edge_counts_as_outside() {
        // Ink fills the whole canvas; every pixel touches the edge or an
        // interior neighbor, so only the outermost ring is boundary.
        let canvas = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        let shape = shape_mask(&canvas);
        let boundary = boundary_mask(&shape);
        assert_eq!(boundary.count(), 12);
        assert!(boundary.get(0, 0));
        assert!(boundary.get(3, 1));
        assert!(!boundary.get(1, 1));
        assert!(!boundary.get(2, 2));
    }
}
