use std::collections::VecDeque;

use ndarray::{s, Array1, Array2};

use crate::shared::geometry::FaceBox;

const MAX_HISTORY: usize = 10;
const CONFIDENCE_FLOOR: f64 = 0.1;
/// Posterior position variance (trace over x, y) at which the uncertainty
/// term alone halves confidence.
const UNCERTAINTY_SCALE: f64 = 50.0;
/// Innovation magnitude (pixels) at which the error penalty halves
/// confidence.
const ERROR_SCALE: f64 = 10.0;

/// Per-face kinematic filter: a 6-state Kalman filter (position, velocity,
/// acceleration in 2D) with a constant-acceleration transition model.
///
/// Confidence stays in `[0.1, 1.0]` for every reachable state: each
/// measurement update recomputes it from the posterior position
/// uncertainty, penalized by the innovation magnitude, and clamps. A
/// settling covariance therefore raises confidence; surprising
/// measurements knock it down.
pub struct MotionPredictor {
    f: Array2<f64>,
    h: Array2<f64>,
    q: Array2<f64>,
    r: Array2<f64>,
    x: Array1<f64>,
    p: Array2<f64>,
    confidence: f64,
    history: VecDeque<(f64, f64)>,
}

impl MotionPredictor {
    /// `dt` is the expected time step between predict/update cycles.
    pub fn new(dt: f64) -> Self {
        let half_dt2 = 0.5 * dt * dt;
        // x' = x + vx*dt + 0.5*ax*dt^2, v' = v + a*dt, a' = a
        let f = Array2::from_shape_vec(
            (6, 6),
            vec![
                1.0, 0.0, dt, 0.0, half_dt2, 0.0, //
                0.0, 1.0, 0.0, dt, 0.0, half_dt2, //
                0.0, 0.0, 1.0, 0.0, dt, 0.0, //
                0.0, 0.0, 0.0, 1.0, 0.0, dt, //
                0.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
            ],
        )
        .expect("transition matrix shape");

        // Only position is measured.
        let mut h = Array2::zeros((2, 6));
        h[[0, 0]] = 1.0;
        h[[1, 1]] = 1.0;

        Self {
            f,
            h,
            q: Array2::eye(6) * 0.1,
            r: Array2::eye(2) * 10.0,
            x: Array1::zeros(6),
            p: Array2::eye(6) * 1000.0,
            confidence: 1.0,
            history: VecDeque::new(),
        }
    }

    /// Seeds the filter at a position with zero velocity and acceleration.
    pub fn initialize(&mut self, x: f64, y: f64) {
        self.x = Array1::from_vec(vec![x, y, 0.0, 0.0, 0.0, 0.0]);
        self.p = Array2::eye(6) * 1000.0;
        self.confidence = 1.0;
        self.history.clear();
        self.history.push_back((x, y));
    }

    /// Advances the state one step and returns the predicted position.
    pub fn predict(&mut self) -> (f64, f64) {
        self.x = self.f.dot(&self.x);
        self.p = self.f.dot(&self.p).dot(&self.f.t()) + &self.q;

        let predicted = (self.x[0], self.x[1]);
        self.history.push_back(predicted);
        if self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
        predicted
    }

    /// Incorporates a measurement and recomputes confidence from the
    /// posterior position uncertainty and the innovation magnitude.
    pub fn update(&mut self, mx: f64, my: f64) {
        let z = Array1::from_vec(vec![mx, my]);
        let innovation = &z - &self.h.dot(&self.x);

        // S = H P H' + R is 2x2; invert in closed form.
        let s_mat = self.h.dot(&self.p).dot(&self.h.t()) + &self.r;
        let det = s_mat[[0, 0]] * s_mat[[1, 1]] - s_mat[[0, 1]] * s_mat[[1, 0]];
        if det.abs() < f64::EPSILON {
            log::warn!("motion predictor: singular innovation covariance, skipping update");
            return;
        }
        let s_inv = Array2::from_shape_vec(
            (2, 2),
            vec![
                s_mat[[1, 1]] / det,
                -s_mat[[0, 1]] / det,
                -s_mat[[1, 0]] / det,
                s_mat[[0, 0]] / det,
            ],
        )
        .expect("2x2 shape");

        let gain = self.p.dot(&self.h.t()).dot(&s_inv);
        self.x = &self.x + &gain.dot(&innovation);
        self.p = (Array2::eye(6) - gain.dot(&self.h)).dot(&self.p);

        let position_variance = self.p[[0, 0]] + self.p[[1, 1]];
        let settled = 1.0 / (1.0 + position_variance / UNCERTAINTY_SCALE);
        let error = (innovation[0].powi(2) + innovation[1].powi(2)).sqrt();
        self.confidence = clamp_confidence(settled / (1.0 + error / ERROR_SCALE));
    }

    pub fn velocity(&self) -> (f64, f64) {
        (self.x[2], self.x[3])
    }

    pub fn acceleration(&self) -> (f64, f64) {
        (self.x[4], self.x[5])
    }

    /// Records a failed search in the predicted region. Repeated misses
    /// drive confidence toward the floor, widening subsequent searches.
    pub fn miss(&mut self) {
        self.confidence = clamp_confidence(self.confidence * 0.5);
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn position_uncertainty(&self) -> f64 {
        let block = self.p.slice(s![0..2, 0..2]);
        block[[0, 0]] + block[[1, 1]]
    }

    /// Square region around the next predicted position, sized up with
    /// velocity magnitude and down with confidence, clamped to the frame.
    ///
    /// Advances the filter by one prediction step. Callers must not treat
    /// the region as the sole search area when confidence is at or below
    /// 0.5, since low-confidence predictions can miss fast direction
    /// changes.
    pub fn search_region(&mut self, frame_w: u32, frame_h: u32) -> FaceBox {
        let (px, py) = self.predict();
        let (vx, vy) = self.velocity();
        let speed = (vx * vx + vy * vy).sqrt();
        let window = 100.0 * (1.0 + speed * (1.0 - self.confidence));

        FaceBox::new(px - window / 2.0, py - window / 2.0, window, window)
            .clamp_to(frame_w, frame_h)
    }
}

fn clamp_confidence(value: f64) -> f64 {
    value.clamp(CONFIDENCE_FLOOR, 1.0)
}
