// Shi-Tomasi "good features to track" corner detector:
// <https://doi.org/10.1109/CVPR.1994.323794>

use crate::all::*;

pub struct Detector {
  max_corners: usize,
  quality_level: f64,
  min_distance: f64,
  block_size: usize,
  // Workspace.
  response: Vec<f64>,
  integrals: [Vec<f64>; 3],
  candidates: Vec<(f64, usize)>,
}

impl Detector {
  pub fn new(p: &ParameterSet) -> Result<Detector> {
    if p.corner_block_size == 0 {
      bail!("Corner block size must be positive.");
    }
    if !(p.corner_quality > 0. && p.corner_quality <= 1.) {
      bail!("Corner quality level must be in (0, 1].");
    }
    Ok(Detector {
      max_corners: p.target_points,
      quality_level: p.corner_quality,
      min_distance: p.corner_min_distance,
      block_size: p.corner_block_size,
      response: vec![],
      integrals: [vec![], vec![], vec![]],
      candidates: vec![],
    })
  }

  // Strongest corners first. `max_corners` of zero means no limit.
  pub fn process(&mut self, image: &Image, detections: &mut Vec<Vector2d>) {
    detections.clear();
    self.compute_response(image);
    let max_response = self.response.iter().cloned().fold(0., f64::max);
    if max_response <= 0. { return }
    let threshold = self.quality_level * max_response;

    let w = image.width;
    self.candidates.clear();
    for y in 1..(image.height.saturating_sub(1)) {
      for x in 1..(w - 1) {
        let v = self.response[y * w + x];
        if v < threshold || !self.is_local_max(x, y, w) { continue }
        self.candidates.push((v, y * w + x));
      }
    }
    self.candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    let min_d2 = self.min_distance * self.min_distance;
    for (_, i) in &self.candidates {
      let p = Vector2d::new((i % w) as f64, (i / w) as f64);
      if detections.iter().any(|d| (d - p).norm_squared() < min_d2) { continue }
      detections.push(p);
      if self.max_corners > 0 && detections.len() >= self.max_corners { break }
    }
  }

  fn is_local_max(&self, x: usize, y: usize, w: usize) -> bool {
    let v = self.response[y * w + x];
    for dy in 0..3 {
      for dx in 0..3 {
        if self.response[(y + dy - 1) * w + x + dx - 1] > v { return false }
      }
    }
    true
  }

  // Minimum eigenvalue of the structure tensor summed over a block around each pixel.
  fn compute_response(&mut self, image: &Image) {
    let w = image.width;
    let h = image.height;
    self.response.clear();
    self.response.resize(w * h, 0.);
    let r = self.block_size / 2;
    // Gradients are defined for 1..w-1, the block must fit inside.
    if w < 2 * r + 3 || h < 2 * r + 3 { return }

    let iw = w + 1;
    for integral in self.integrals.iter_mut() {
      integral.clear();
      integral.resize(iw * (h + 1), 0.);
    }
    for y in 0..h {
      for x in 0..w {
        let (gx, gy) = if x > 0 && y > 0 && x + 1 < w && y + 1 < h {
          sobel(image, x, y)
        }
        else {
          (0., 0.)
        };
        let products = [gx * gx, gx * gy, gy * gy];
        for (integral, v) in self.integrals.iter_mut().zip(products) {
          integral[(y + 1) * iw + x + 1] = v
            + integral[y * iw + x + 1]
            + integral[(y + 1) * iw + x]
            - integral[y * iw + x];
        }
      }
    }

    for y in (1 + r)..(h - 1 - r) {
      for x in (1 + r)..(w - 1 - r) {
        let [a, b, c] = [0, 1, 2].map(|k| {
          let s = &self.integrals[k];
          s[(y + r + 1) * iw + x + r + 1] - s[(y - r) * iw + x + r + 1]
            - s[(y + r + 1) * iw + x - r] + s[(y - r) * iw + x - r]
        });
        self.response[y * w + x] = min_eigenvalue(a, b, c);
      }
    }
  }
}

#[inline(always)]
fn sobel(image: &Image, x: usize, y: usize) -> (f64, f64) {
  let v = |dx: usize, dy: usize| image.value(x + dx - 1, y + dy - 1) as f64;
  let gx = (v(2, 0) + 2. * v(2, 1) + v(2, 2) - v(0, 0) - 2. * v(0, 1) - v(0, 2)) / 8.;
  let gy = (v(0, 2) + 2. * v(1, 2) + v(2, 2) - v(0, 0) - 2. * v(1, 0) - v(2, 0)) / 8.;
  (gx, gy)
}

// Smaller eigenvalue of the symmetric matrix [a b; b c].
pub fn min_eigenvalue(a: f64, b: f64, c: f64) -> f64 {
  let half_trace = 0.5 * (a + c);
  let d = 0.5 * (a - c);
  half_trace - (d * d + b * b).sqrt()
}
