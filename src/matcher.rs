use crate::all::*;

// Association of a query point with the closest point of a set.
pub trait NearestNeighbor {
  // Index of the nearest point in `set` and the Euclidean distance to it.
  // None if the set is empty.
  fn nearest(&self, query: &Vector2d, set: &[Vector2d]) -> Option<(usize, f64)>;
}

pub struct BruteForceMatcher;

impl NearestNeighbor for BruteForceMatcher {
  fn nearest(&self, query: &Vector2d, set: &[Vector2d]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in set.iter().enumerate() {
      let d2 = (p - query).norm_squared();
      if best.map_or(true, |(_, b)| d2 < b) {
        best = Some((i, d2));
      }
    }
    best.map(|(i, d2)| (i, d2.sqrt()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_nearest() {
    let set = [Vector2d::new(0., 0.), Vector2d::new(10., 0.), Vector2d::new(3., 4.)];
    let m = BruteForceMatcher;
    assert_eq!(m.nearest(&Vector2d::new(9., 1.), &set), Some((1, 2f64.sqrt())));
    assert_eq!(m.nearest(&Vector2d::new(3., 9.), &set), Some((2, 5.)));
    assert_eq!(m.nearest(&Vector2d::new(0., 0.), &set), Some((0, 0.)));
    assert_eq!(m.nearest(&Vector2d::new(1., 1.), &[]), None);
  }

  #[test]
  fn test_ties_pick_first() {
    let set = [Vector2d::new(-1., 0.), Vector2d::new(1., 0.)];
    assert_eq!(BruteForceMatcher.nearest(&Vector2d::zeros(), &set), Some((0, 1.)));
  }
}
