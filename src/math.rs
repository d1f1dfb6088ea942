use crate::all::*;

// Statistics of point sets. All functions expect a non-empty set.

pub fn mean(points: &[Vector2d]) -> Vector2d {
  assert!(!points.is_empty());
  points.iter().sum::<Vector2d>() / points.len() as f64
}

// Per-axis median. For even counts the two middle values are averaged.
pub fn median(points: &[Vector2d]) -> Vector2d {
  assert!(!points.is_empty());
  let mut values = Vec::with_capacity(points.len());
  let mut out = Vector2d::zeros();
  for i in 0..2 {
    values.clear();
    values.extend(points.iter().map(|p| p[i]));
    values.sort_by(f64::total_cmp);
    let n = values.len();
    out[i] = if n % 2 == 1 { values[n / 2] } else { 0.5 * (values[n / 2 - 1] + values[n / 2]) };
  }
  out
}

// Per-axis population standard deviation.
pub fn std_dev(points: &[Vector2d]) -> Vector2d {
  let m = mean(points);
  let var = points.iter()
    .map(|p| (p - m).component_mul(&(p - m)))
    .sum::<Vector2d>() / points.len() as f64;
  var.map(f64::sqrt)
}
