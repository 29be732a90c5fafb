use ndarray::{ArrayView3, ArrayViewMut3};

/// A single captured frame: contiguous RGB bytes in row-major order.
///
/// `Clone` performs a deep copy; every cross-thread handoff in the pipeline
/// clones, so no two threads ever alias the same pixel buffer. `seq` is
/// assigned by the producing camera source and increases per source.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    seq: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, seq: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            seq,
        }
    }

    /// A black RGB frame, used by synthetic sources and tests.
    pub fn blank(width: u32, height: u32, seq: u64) -> Self {
        Self::new(
            vec![0u8; (width as usize) * (height as usize) * 3],
            width,
            height,
            3,
            seq,
        )
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Nearest-neighbour downscale to `target_width`, preserving aspect
    /// ratio. Returns the scaled frame and the scale factor applied, so
    /// detections on the small frame can be mapped back (`coord / scale`).
    ///
    /// Frames already at or below `target_width` are returned as a copy
    /// with scale 1.0.
    pub fn resize_to_width(&self, target_width: u32) -> (Frame, f64) {
        if self.width <= target_width || target_width == 0 {
            return (self.clone(), 1.0);
        }

        let scale = target_width as f64 / self.width as f64;
        let new_w = target_width;
        let new_h = ((self.height as f64 * scale).round() as u32).max(1);
        let ch = self.channels as usize;

        let mut out = vec![0u8; (new_w as usize) * (new_h as usize) * ch];
        for y in 0..new_h as usize {
            let src_y = ((y as f64 / scale) as usize).min(self.height as usize - 1);
            for x in 0..new_w as usize {
                let src_x = ((x as f64 / scale) as usize).min(self.width as usize - 1);
                let src = (src_y * self.width as usize + src_x) * ch;
                let dst = (y * new_w as usize + x) * ch;
                out[dst..dst + ch].copy_from_slice(&self.data[src..src + ch]);
            }
        }

        (Frame::new(out, new_w, new_h, self.channels, self.seq), scale)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 7);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.seq(), 7);
        assert_eq!(frame.data(), &data[..]);
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_clone_is_independent() {
        let frame = Frame::new(vec![100u8; 12], 2, 2, 3, 0);
        let mut cloned = frame.clone();
        cloned.data_mut()[0] = 0;
        assert_eq!(frame.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }

    #[test]
    fn test_blank_is_black() {
        let frame = Frame::blank(4, 2, 0);
        assert_eq!(frame.data().len(), 24);
        assert!(frame.data().iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = Frame::blank(4, 2, 0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]); // (h, w, c)
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let mut frame = Frame::blank(2, 2, 0);
        {
            let mut arr = frame.as_ndarray_mut();
            arr[[0, 1, 2]] = 128;
        }
        assert_eq!(frame.as_ndarray()[[0, 1, 2]], 128);
    }

    #[test]
    fn test_resize_halves_dimensions() {
        let frame = Frame::blank(100, 60, 0);
        let (small, scale) = frame.resize_to_width(50);
        assert_eq!(small.width(), 50);
        assert_eq!(small.height(), 30);
        assert_relative_eq!(scale, 0.5);
    }

    #[test]
    fn test_resize_noop_when_already_small() {
        let frame = Frame::blank(40, 30, 3);
        let (same, scale) = frame.resize_to_width(100);
        assert_eq!(same.width(), 40);
        assert_eq!(same.height(), 30);
        assert_relative_eq!(scale, 1.0);
    }

    #[test]
    fn test_resize_preserves_seq_and_samples_pixels() {
        let mut frame = Frame::blank(4, 4, 9);
        // Paint the right half white; the downscaled right column stays white.
        {
            let mut arr = frame.as_ndarray_mut();
            for y in 0..4 {
                for x in 2..4 {
                    for c in 0..3 {
                        arr[[y, x, c]] = 255;
                    }
                }
            }
        }
        let (small, _) = frame.resize_to_width(2);
        assert_eq!(small.seq(), 9);
        let arr = small.as_ndarray();
        assert_eq!(arr[[0, 0, 0]], 0);
        assert_eq!(arr[[0, 1, 0]], 255);
    }
}
