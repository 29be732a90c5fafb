use crate::recognition::domain::face_renderer::{FaceOverlay, FaceRenderer};
use crate::shared::frame::Frame;

const BOX_COLOR: [u8; 3] = [0, 220, 90];
const UNKNOWN_COLOR: [u8; 3] = [220, 60, 60];
const LANDMARK_COLOR: [u8; 3] = [255, 210, 0];
const LABEL_STRIP_HEIGHT: i64 = 14;

/// CPU renderer: rectangle outline per face, a filled strip above the box
/// (its width encodes recognition confidence) and optional landmark dots.
///
/// Text rendering is left to the GUI layer; the strip gives a glanceable
/// overlay even in headless runs.
pub struct BoxRenderer {
    thickness: i64,
}

impl BoxRenderer {
    pub fn new(thickness: u32) -> Self {
        Self {
            thickness: thickness.max(1) as i64,
        }
    }
}

impl Default for BoxRenderer {
    fn default() -> Self {
        Self::new(2)
    }
}

impl FaceRenderer for BoxRenderer {
    fn render(
        &self,
        frame: &mut Frame,
        faces: &[FaceOverlay],
        show_landmarks: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if frame.channels() != 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }

        for face in faces {
            let known = !face.label.is_empty();
            let color = if known { BOX_COLOR } else { UNKNOWN_COLOR };

            let x1 = face.bbox.x.round() as i64;
            let y1 = face.bbox.y.round() as i64;
            let x2 = (face.bbox.x + face.bbox.w).round() as i64;
            let y2 = (face.bbox.y + face.bbox.h).round() as i64;

            draw_rect_outline(frame, x1, y1, x2, y2, self.thickness, color);

            let strip_w = ((x2 - x1) as f64 * f64::from(face.confidence.clamp(0.0, 1.0))) as i64;
            fill_rect(
                frame,
                x1,
                y1 - LABEL_STRIP_HEIGHT,
                x1 + strip_w,
                y1 - self.thickness,
                color,
            );

            if show_landmarks {
                if let Some(points) = &face.landmarks {
                    for &(px, py) in points {
                        fill_rect(
                            frame,
                            px.round() as i64 - 1,
                            py.round() as i64 - 1,
                            px.round() as i64 + 1,
                            py.round() as i64 + 1,
                            LANDMARK_COLOR,
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

fn draw_rect_outline(frame: &mut Frame, x1: i64, y1: i64, x2: i64, y2: i64, t: i64, color: [u8; 3]) {
    fill_rect(frame, x1, y1, x2, y1 + t, color); // top
    fill_rect(frame, x1, y2 - t, x2, y2, color); // bottom
    fill_rect(frame, x1, y1, x1 + t, y2, color); // left
    fill_rect(frame, x2 - t, y1, x2, y2, color); // right
}

/// Fills `[x1, x2) x [y1, y2)`, silently clipping to frame bounds.
fn fill_rect(frame: &mut Frame, x1: i64, y1: i64, x2: i64, y2: i64, color: [u8; 3]) {
    let w = frame.width() as i64;
    let h = frame.height() as i64;
    let x1 = x1.clamp(0, w);
    let x2 = x2.clamp(0, w);
    let y1 = y1.clamp(0, h);
    let y2 = y2.clamp(0, h);

    let mut pixels = frame.as_ndarray_mut();
    for y in y1..y2 {
        for x in x1..x2 {
            for (c, &v) in color.iter().enumerate() {
                pixels[[y as usize, x as usize, c]] = v;
            }
        }
    }
}
