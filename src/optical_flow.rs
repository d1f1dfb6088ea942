// Pyramidal Lucas-Kanade tracker based on:
// <http://robots.stanford.edu/cs223b04/algo_tracking.pdf>
// “Pyramidal Implementation of the Lucas Kanade Feature Tracker
//   Description of the algorithm” by Jean-Yves Bouguet

use crate::all::*;

type Range = [[i16; 2]; 2];

// Per-point results, parallel to the input points.
#[derive(Debug, Default)]
pub struct FlowOutput {
  pub points: Vec<Vector2d>,
  pub statuses: Vec<bool>,
  // Mean absolute intensity difference over the window. Zero for lost points.
  pub errors: Vec<f64>,
}

impl FlowOutput {
  pub fn clear(&mut self) {
    self.points.clear();
    self.statuses.clear();
    self.errors.clear();
  }

  // Splits successfully tracked points into parallel old and new arrays.
  pub fn select_good(&self, points0: &[Vector2d], good_old: &mut Vec<Vector2d>, good_new: &mut Vec<Vector2d>) {
    assert_eq!(points0.len(), self.points.len());
    good_old.clear();
    good_new.clear();
    for i in 0..points0.len() {
      if !self.statuses[i] { continue }
      good_old.push(points0[i]);
      good_new.push(self.points[i]);
    }
  }
}

#[allow(non_snake_case)]
pub struct OpticalFlow {
  lk_iters: usize,
  lk_levels: usize,
  lk_win_size: usize,
  lk_epsilon: f64,
  lk_min_eigenvalue: f64,
  Ix: Matrixd,
  Iy: Matrixd,
  It: Matrixd,
  // Workspace.
  grid0: Matrixd,
}

impl OpticalFlow {
  pub fn new(p: &ParameterSet) -> Result<OpticalFlow> {
    if p.lk_win_size % 2 != 1 {
      bail!("Lucas-Kanade window size must be odd number.");
    }
    if p.lk_win_size < 3 {
      bail!("Lucas-Kanade window size must be at least 3.");
    }
    if p.lk_iters == 0 {
      bail!("Lucas-Kanade needs at least one iteration.");
    }
    Ok(OpticalFlow {
      lk_iters: p.lk_iters,
      lk_levels: p.lk_levels,
      lk_win_size: p.lk_win_size,
      lk_epsilon: p.lk_epsilon,
      lk_min_eigenvalue: p.lk_min_eigenvalue,
      Ix: DMatrix::zeros(p.lk_win_size, p.lk_win_size),
      Iy: DMatrix::zeros(p.lk_win_size, p.lk_win_size),
      It: DMatrix::zeros(p.lk_win_size, p.lk_win_size),
      grid0: DMatrix::zeros(p.lk_win_size, p.lk_win_size),
    })
  }

  pub fn process(
    &mut self,
    frame0: &Frame,
    frame1: &Frame,
    features0: &[Vector2d],
    output: &mut FlowOutput,
  ) {
    output.clear();
    for feature0 in features0 {
      if let Some((feature1, error)) = self.process_feature(frame0, frame1, *feature0) {
        output.points.push(feature1);
        output.statuses.push(true);
        output.errors.push(error);
      }
      else {
        output.points.push(*feature0);
        output.statuses.push(false);
        output.errors.push(0.);
      }
    }
  }

  #[allow(non_snake_case)]
  fn process_feature(
    &mut self,
    frame0: &Frame,
    frame1: &Frame,
    feature0: Vector2d,
  ) -> Option<(Vector2d, f64)> {
    let r = (self.lk_win_size - 1) / 2;
    let top = usize::min(self.lk_levels, usize::min(frame0.level_count(), frame1.level_count()) - 1);
    let mut g = Vector2d::zeros();
    let mut d = Vector2d::zeros();
    for L in (0..top + 1).rev() {
      let level0 = frame0.get_level(L);
      let level1 = frame1.get_level(L);
      let u = feature0 / u32::pow(2, L as u32) as f64;
      let range = integration_range(&level0, u, r, 1)?;
      scharr(&level0, u, range, &mut self.Ix, &mut self.Iy, &mut self.grid0);
      let G = spatial_gradient(range, &self.Ix, &self.Iy);
      let area = (self.Ix.nrows() * self.Ix.ncols()) as f64;
      if min_eigenvalue(G[(0, 0)], G[(0, 1)], G[(1, 1)]) / area < self.lk_min_eigenvalue {
        return None;
      }
      let mut nu = Vector2d::zeros();
      for _ in 0..self.lk_iters {
        image_difference(range, r, &self.grid0, &mut self.It, &level1, u + g + nu)?;
        let eta = flow_vector(&G, &self.Ix, &self.Iy, &self.It)?;
        nu += eta;
        if eta.norm() < self.lk_epsilon { break }
      }
      d = nu;
      if L > 0 { g = 2. * (g + d) }
    }
    let feature1 = feature0 + g + d;

    // Residual at the final position, also rejects points that drifted out of the image.
    let level1 = frame1.get_level(0);
    let range = integration_range(&frame0.get_level(0), feature0, r, 1)?;
    image_difference(range, r, &self.grid0, &mut self.It, &level1, feature1)?;
    let error = self.It.iter().map(|v| v.abs()).sum::<f64>() / self.It.len() as f64;
    Some((feature1, error))
  }
}

#[allow(non_snake_case)]
fn image_difference(
  prev_range: Range,
  r: usize,
  I0: &Matrixd,
  mut It: &mut Matrixd,
  level: &Level,
  center: Vector2d,
) -> Option<()> {
  let range = integration_range(level, center, r, 0)?;
  // The window around the source feature must fit in the new level.
  // TODO If the new range is smaller, could shrink the window and recompute G (refer to the PDF).
  for i in 0..2 {
    if range[i][0] > prev_range[i][0] || range[i][1] < prev_range[i][1] {
      return None;
    }
  }
  fill_grid(level, prev_range, center, &mut It);
  *It *= -1.;
  *It += I0.slice((1, 1), (It.nrows(), It.ncols()));
  Some(())
}

#[allow(non_snake_case)]
fn flow_vector(
  G: &Matrix2d,
  Ix: &Matrixd,
  Iy: &Matrixd,
  It: &Matrixd,
) -> Option<Vector2d> {
  let mut b = Vector2d::zeros();
  for y in 0..Ix.nrows() {
    for x in 0..Ix.ncols() {
      b[0] += It[(y, x)] * Ix[(y, x)];
      b[1] += It[(y, x)] * Iy[(y, x)];
    }
  }
  // Could instead solve the linear equation?
  G.try_inverse().map(|invG| invG * b)
}

#[allow(non_snake_case)]
fn spatial_gradient(
  // For now assuming range is the same as around the source feature.
  _range: Range,
  Ix: &Matrixd,
  Iy: &Matrixd,
) -> Matrix2d {
  assert_eq!(Ix.nrows(), Iy.nrows());
  assert_eq!(Ix.ncols(), Iy.ncols());
  let mut x2 = 0.;
  let mut y2 = 0.;
  let mut xy = 0.;
  for y in 0..Ix.nrows() {
    for x in 0..Ix.ncols() {
      x2 += Ix[(y, x)] * Ix[(y, x)];
      y2 += Iy[(y, x)] * Iy[(y, x)];
      xy += Ix[(y, x)] * Iy[(y, x)];
    }
  }
  Matrix2d::new(x2, xy, xy, y2)
}

// Returns closed range of integer steps that can be takes without going outside
// the image borders. Returns None if the center point is outside the level
// boundaries.
fn integration_range(
  level: &Level,
  center: Vector2d,
  r: usize,
  padding: i16,
) -> Option<Range> {
  let r = r as i16;
  let mut range = [[0, 0], [0, 0]];
  for i in 0..2 {
    let s = if i == 0 { level.width } else { level.height };
    if !(center[i] >= 0. && center[i] <= (s as f64 - 1.)) { return None; }
    let n = center[i] as i16;
    range[i] = [i16::max(-r, -n + padding), i16::min(r, s as i16 - n - padding - 2)];
    if range[i][0] > range[i][1] { return None; }
  }
  Some(range)
}

fn fill_grid(
  level: &Level,
  range: Range,
  center: Vector2d,
  grid: &mut Matrixd,
) {
  let rows = (range[1][1] - range[1][0] + 1) as usize;
  let cols = (range[0][1] - range[0][0] + 1) as usize;
  if grid.nrows() != rows || grid.ncols() != cols {
    *grid = DMatrix::zeros(rows, cols);
  }
  for (y_ind, y) in (range[1][0]..=range[1][1]).enumerate() {
    for (x_ind, x) in (range[0][0]..=range[0][1]).enumerate() {
      grid[(y_ind, x_ind)] = bilinear(level, center + Vector2d::new(x as f64, y as f64));
    }
  }
}

fn scharr(
  level: &Level,
  center: Vector2d,
  range: Range,
  out_x: &mut Matrixd,
  out_y: &mut Matrixd,
  // Workspace.
  mut grid: &mut Matrixd,
) {
  let grange = [[range[0][0] - 1, range[0][1] + 1], [range[1][0] - 1, range[1][1] + 1]];
  fill_grid(level, grange, center, &mut grid);
  *out_x = Matrixd::zeros(grid.nrows() - 2, grid.ncols() - 2);
  *out_y = Matrixd::zeros(grid.nrows() - 2, grid.ncols() - 2);
  for y in 1..(grid.nrows() - 1) {
    for x in 1..(grid.ncols() - 1) {
      out_x[(y - 1, x - 1)] = (10. * grid[(y, x + 1)]
        + 3. * grid[(y + 1, x + 1)]
        + 3. * grid[(y - 1, x + 1)]
        - 10. * grid[(y, x - 1)]
        - 3. * grid[(y + 1, x - 1)]
        - 3. * grid[(y - 1, x - 1)]
      ) / 32.;
      out_y[(y - 1, x - 1)] = (10. * grid[(y + 1, x)]
        + 3. * grid[(y + 1, x + 1)]
        + 3. * grid[(y + 1, x - 1)]
        - 10. * grid[(y - 1, x)]
        - 3. * grid[(y - 1, x + 1)]
        - 3. * grid[(y - 1, x - 1)]
      ) / 32.;
    }
  }
}

#[inline(always)]
fn bilinear(frame: &Level, u: Vector2d) -> f64 {
  debug_assert!(u[0] >= 0.0 && u[0] <= frame.width as f64 - 1.);
  debug_assert!(u[1] >= 0.0 && u[1] <= frame.height as f64 - 1.);
  let x0 = u[0] as usize;
  let y0 = u[1] as usize;
  let x1 = x0 + 1;
  let y1 = y0 + 1;
  let xa = u[0].fract();
  let ya = u[1].fract();
  // Besides improving computation speed, these allow to work one pixel
  // closer to the right and bottom edges when coordinates are integers.
  let eps = 1e-5;
  if xa < eps && ya < eps {
    frame.data[y0 * frame.width + x0] as f64
  }
  else if xa < eps {
    (1. - ya) * frame.data[y0 * frame.width + x0] as f64
      + ya * frame.data[y1 * frame.width + x0] as f64
  }
  else if ya < eps {
    (1. - xa) * frame.data[y0 * frame.width + x0] as f64
      + xa * frame.data[y0 * frame.width + x1] as f64
  }
  else {
    (1. - xa) * (1. - ya) * frame.data[y0 * frame.width + x0] as f64
      + xa * (1. - ya) * frame.data[y0 * frame.width + x1] as f64
      + (1. - xa) * ya * frame.data[y1 * frame.width + x0] as f64
      + xa * ya * frame.data[y1 * frame.width + x1] as f64
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use nalgebra::dmatrix;

  fn level_of(data: &[u8], width: usize, height: usize) -> Level {
    Level { data, width, height }
  }

  // Smooth blob pattern, translated by `shift`.
  fn blob_image(width: usize, height: usize, shift: Vector2d) -> Image {
    let mut data = vec![0; width * height];
    let centers = [(30., 30.), (45., 28.), (36., 44.)];
    for y in 0..height {
      for x in 0..width {
        let mut v = 20.;
        for (cx, cy) in centers {
          let dx = x as f64 - cx - shift[0];
          let dy = y as f64 - cy - shift[1];
          v += 200. * (-(dx * dx + dy * dy) / 40.).exp();
        }
        data[y * width + x] = v.min(255.) as u8;
      }
    }
    Image::new(data, width, height)
  }

  #[test]
  fn test_scharr() {
    let data = vec![0; 36];
    let level = level_of(&data, 6, 6);

    let mut out_x = dmatrix!();
    let mut out_y = dmatrix!();
    let mut grid = dmatrix!();
    let center = Vector2d::new(2.0, 2.0);
    let range = integration_range(&level, center, 1, 1).unwrap();
    assert_eq!(range, [[-1, 1], [-1, 1]]);
    scharr(&level, center, range, &mut out_x, &mut out_y, &mut grid);
    assert_eq!(out_x, DMatrix::zeros(3, 3));
    assert_eq!(out_y, DMatrix::zeros(3, 3));

    let data = vec![
      0, 1, 2, 3, 4, 5,
      1, 2, 3, 4, 5, 6,
      2, 3, 4, 5, 6, 7,
      3, 4, 5, 6, 7, 8,
      4, 5, 6, 7, 8, 9,
      5, 6, 7, 8, 9, 10,
    ];
    let level = level_of(&data, 6, 6);
    scharr(&level, center, range, &mut out_x, &mut out_y, &mut grid);
    assert_eq!(out_x, DMatrix::repeat(3, 3, 1.));
    assert_eq!(out_y, DMatrix::repeat(3, 3, 1.));

    let data = vec![
      0, 0, 5, 0, 0, 0,
      0, 0, 5, 0, 0, 0,
      0, 0, 5, 0, 0, 0,
      0, 0, 5, 0, 0, 0,
      0, 0, 5, 0, 0, 0,
      0, 0, 5, 0, 0, 0,
    ];
    let level = level_of(&data, 6, 6);
    scharr(&level, center, range, &mut out_x, &mut out_y, &mut grid);
    let answer_x = dmatrix!(
      2.5, 0., -2.5;
      2.5, 0., -2.5;
      2.5, 0., -2.5;
    );
    assert_eq!(out_x, answer_x);
    assert_eq!(out_y, DMatrix::zeros(3, 3));
  }

  #[test]
  fn test_integration_range() {
    // Width and height are pixels. Coordinate (0, 0) means center of top-left
    // pixel. Thus (9, 9) is the center of the bottom-right pixel for 10x10
    // image.
    let data = vec![0; 100];
    let level = level_of(&data, 10, 10);
    assert_eq!(integration_range(&level, Vector2d::new(4.5, 4.5), 3, 0).unwrap(), [[-3, 3], [-3, 3]]);
    assert_eq!(integration_range(&level, Vector2d::new(1.5, 2.5), 3, 0).unwrap(), [[-1, 3], [-2, 3]]);
    assert_eq!(integration_range(&level, Vector2d::new(0.9, 1.9), 3, 1).unwrap(), [[1, 3], [0, 3]]);
    assert_eq!(integration_range(&level, Vector2d::new(8.5, 2.0), 3, 0).unwrap(), [[-3, 0], [-2, 3]]);
    assert_eq!(integration_range(&level, Vector2d::new(8.9, 8.5), 3, 1).unwrap(), [[-3, -1], [-3, -1]]);
    assert!(integration_range(&level, Vector2d::new(-0.5, 4.), 3, 0).is_none());
    assert!(integration_range(&level, Vector2d::new(4., 9.5), 3, 0).is_none());
  }

  #[test]
  fn test_translation() {
    let p = ParameterSet::default();
    let shift = Vector2d::new(1.6, -1.2);
    let frame0 = Frame::from_image(blob_image(80, 80, Vector2d::zeros()), p.lk_levels);
    let frame1 = Frame::from_image(blob_image(80, 80, shift), p.lk_levels);
    let mut optical_flow = OpticalFlow::new(&p).unwrap();
    let mut output = FlowOutput::default();
    let features0 = [Vector2d::new(30., 33.), Vector2d::new(42., 30.), Vector2d::new(36., 40.)];
    optical_flow.process(&frame0, &frame1, &features0, &mut output);
    assert_eq!(output.points.len(), 3);
    for i in 0..features0.len() {
      assert!(output.statuses[i]);
      let flow = output.points[i] - features0[i];
      assert!((flow - shift).norm() < 0.3, "{:?}", flow);
      assert!(output.errors[i] < 10.);
    }
  }

  #[test]
  fn test_lost_points() {
    let p = ParameterSet::default();
    let frame0 = Frame::from_image(blob_image(80, 80, Vector2d::zeros()), p.lk_levels);
    let frame1 = Frame::from_image(blob_image(80, 80, Vector2d::zeros()), p.lk_levels);
    let mut optical_flow = OpticalFlow::new(&p).unwrap();
    let mut output = FlowOutput::default();
    // Near the border and in a textureless corner.
    let features0 = [Vector2d::new(1., 1.), Vector2d::new(72., 72.), Vector2d::new(30., 30.)];
    optical_flow.process(&frame0, &frame1, &features0, &mut output);
    assert_eq!(output.statuses, vec![false, false, true]);
    assert_eq!(output.points[0], features0[0]);

    let mut good_old = vec![];
    let mut good_new = vec![];
    output.select_good(&features0, &mut good_old, &mut good_new);
    assert_eq!(good_old, vec![features0[2]]);
    assert_eq!(good_new.len(), 1);
    assert!((good_new[0] - features0[2]).norm() < 0.1);
  }

  #[test]
  fn test_invalid_window() {
    let mut p = ParameterSet::default();
    p.lk_win_size = 8;
    assert!(OpticalFlow::new(&p).is_err());
    p.lk_win_size = 1;
    assert!(OpticalFlow::new(&p).is_err());
  }
}
