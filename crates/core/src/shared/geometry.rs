/// An axis-aligned face bounding box in frame coordinates.
///
/// Stored as floats: boxes flow through the Kalman filter and the
/// smoothing estimators, which all work in f64; rounding happens only at
/// the rendering edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl FaceBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Builds from corner coordinates `(x1, y1, x2, y2)`.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: x1,
            y: y1,
            w: (x2 - x1).max(0.0),
            h: (y2 - y1).max(0.0),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn iou(&self, other: &FaceBox) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.w).min(other.x + other.w);
        let iy2 = (self.y + self.h).min(other.y + other.h);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Euclidean distance between box centers.
    pub fn center_distance(&self, other: &FaceBox) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    /// Clamps the box to lie within a `frame_w` x `frame_h` frame.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> FaceBox {
        let fw = frame_w as f64;
        let fh = frame_h as f64;
        let x = self.x.clamp(0.0, fw);
        let y = self.y.clamp(0.0, fh);
        FaceBox {
            x,
            y,
            w: self.w.min(fw - x),
            h: self.h.min(fh - y),
        }
    }

    /// Scales all coordinates by `factor` (maps between processing and
    /// display resolutions).
    pub fn scaled(&self, factor: f64) -> FaceBox {
        FaceBox {
            x: self.x * factor,
            y: self.y * factor,
            w: self.w * factor,
            h: self.h * factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_from_corners() {
        let b = FaceBox::from_corners(10.0, 20.0, 60.0, 100.0);
        assert_relative_eq!(b.w, 50.0);
        assert_relative_eq!(b.h, 80.0);
    }

    #[test]
    fn test_from_corners_inverted_clamps_to_zero() {
        let b = FaceBox::from_corners(60.0, 20.0, 10.0, 10.0);
        assert_relative_eq!(b.w, 0.0);
        assert_relative_eq!(b.h, 0.0);
    }

    #[test]
    fn test_center() {
        let b = FaceBox::new(10.0, 20.0, 40.0, 60.0);
        assert_eq!(b.center(), (30.0, 50.0));
    }

    #[test]
    fn test_iou_identical() {
        let b = FaceBox::new(0.0, 0.0, 10.0, 10.0);
        assert_relative_eq!(b.iou(&b), 1.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = FaceBox::new(0.0, 0.0, 10.0, 10.0);
        let b = FaceBox::new(5.0, 5.0, 10.0, 10.0);
        assert_relative_eq!(a.iou(&b), 25.0 / 175.0);
    }

    #[rstest]
    #[case::disjoint(FaceBox::new(0.0, 0.0, 10.0, 10.0), FaceBox::new(20.0, 20.0, 10.0, 10.0))]
    #[case::touching(FaceBox::new(0.0, 0.0, 10.0, 10.0), FaceBox::new(10.0, 0.0, 10.0, 10.0))]
    #[case::degenerate(FaceBox::new(0.0, 0.0, 0.0, 10.0), FaceBox::new(0.0, 0.0, 10.0, 10.0))]
    fn test_iou_zero(#[case] a: FaceBox, #[case] b: FaceBox) {
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_center_distance() {
        let a = FaceBox::new(0.0, 0.0, 10.0, 10.0);
        let b = FaceBox::new(3.0, 4.0, 10.0, 10.0);
        assert_relative_eq!(a.center_distance(&b), 5.0);
    }

    #[test]
    fn test_clamp_to_frame() {
        let b = FaceBox::new(-10.0, 90.0, 50.0, 50.0).clamp_to(100, 100);
        assert_relative_eq!(b.x, 0.0);
        assert_relative_eq!(b.y, 90.0);
        assert_relative_eq!(b.w, 50.0);
        assert_relative_eq!(b.h, 10.0);
    }

    #[test]
    fn test_scaled() {
        let b = FaceBox::new(10.0, 20.0, 30.0, 40.0).scaled(2.0);
        assert_eq!(b, FaceBox::new(20.0, 40.0, 60.0, 80.0));
    }
}
