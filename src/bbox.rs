use crate::all::*;

// Axis-aligned box in pixel coordinates. Not normalized: the size may be
// negative and the box may leave the frame until it is clipped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
  pub origin: Vector2d,
  pub size: Vector2d,
}

impl BoundingBox {
  pub fn new(x: f64, y: f64, width: f64, height: f64) -> BoundingBox {
    BoundingBox {
      origin: Vector2d::new(x, y),
      size: Vector2d::new(width, height),
    }
  }

  pub fn x(&self) -> f64 { self.origin[0] }
  pub fn y(&self) -> f64 { self.origin[1] }
  pub fn width(&self) -> f64 { self.size[0] }
  pub fn height(&self) -> f64 { self.size[1] }

  pub fn center(&self) -> Vector2d {
    self.origin + self.size / 2.
  }

  // Edges are inclusive.
  pub fn contains(&self, p: &Vector2d) -> bool {
    p[0] >= self.origin[0] && p[1] >= self.origin[1]
      && p[0] <= self.origin[0] + self.size[0]
      && p[1] <= self.origin[1] + self.size[1]
  }

  // Constrains the box to a frame of size `extent`. Overflow on either side
  // is taken from the size, which never goes below zero.
  pub fn clip(&self, extent: [usize; 2]) -> BoundingBox {
    let mut clipped = *self;
    for i in 0..2 {
      let s = extent[i] as f64;
      if clipped.origin[i] < 0. {
        clipped.size[i] += clipped.origin[i];
        clipped.origin[i] = 0.;
      }
      if clipped.origin[i] > s {
        clipped.origin[i] = s;
      }
      // Compared as remaining space so that clipping twice changes nothing.
      let room = s - clipped.origin[i];
      if clipped.size[i] > room {
        clipped.size[i] = room;
      }
      clipped.size[i] = clipped.size[i].max(0.);
    }
    clipped
  }

  pub fn is_degenerate(&self) -> bool {
    !(self.size[0] > 0. && self.size[1] > 0.)
  }

  // Integer x, y, width, height for output.
  pub fn rounded(&self) -> [i64; 4] {
    [self.x(), self.y(), self.width(), self.height()].map(|v| v.round() as i64)
  }
}

// Smallest pixel-aligned box covering all points. A point inside pixel `i`
// covers `[i, i + 1)`, so a single point gives a 1x1 box.
pub fn enclosing_rect(points: &[Vector2d]) -> Option<BoundingBox> {
  let first = points.first()?;
  let mut min = *first;
  let mut max = *first;
  for p in points {
    min = min.inf(p);
    max = max.sup(p);
  }
  let min = min.map(f64::floor);
  let max = max.map(f64::floor);
  Some(BoundingBox {
    origin: min,
    size: max - min + Vector2d::new(1., 1.),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  use rand::{Rng, SeedableRng};
  use rand_xoshiro::Xoshiro256PlusPlus;

  #[test]
  fn test_clip_inside_frame() {
    let bb = BoundingBox::new(10., 20., 30., 40.);
    assert_eq!(bb.clip([100, 100]), bb);
  }

  #[test]
  fn test_clip_far_edge() {
    let bb = BoundingBox::new(0., 0., 100., 100.);
    assert_eq!(bb.clip([80, 80]), BoundingBox::new(0., 0., 80., 80.));
  }

  #[test]
  fn test_clip_negative_origin() {
    let bb = BoundingBox::new(-5., -10., 30., 40.);
    assert_eq!(bb.clip([100, 100]), BoundingBox::new(0., 0., 25., 30.));
    // Both sides overflow.
    let bb = BoundingBox::new(-5., 10., 120., 20.);
    assert_eq!(bb.clip([100, 100]), BoundingBox::new(0., 10., 100., 20.));
  }

  #[test]
  fn test_clip_degenerate() {
    let bb = BoundingBox::new(-50., 10., 20., 20.);
    let clipped = bb.clip([100, 100]);
    assert_eq!(clipped, BoundingBox::new(0., 10., 0., 20.));
    assert!(clipped.is_degenerate());

    let bb = BoundingBox::new(150., 10., 20., -5.);
    let clipped = bb.clip([100, 100]);
    assert_eq!(clipped, BoundingBox::new(100., 10., 0., 0.));
    assert!(clipped.is_degenerate());
    assert!(!BoundingBox::new(0., 0., 1., 1.).is_degenerate());
  }

  #[test]
  fn test_clip_idempotent() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    for _ in 0..1000 {
      let bb = BoundingBox::new(
        rng.gen_range(-200. .. 300.),
        rng.gen_range(-200. .. 300.),
        rng.gen_range(-50. .. 400.),
        rng.gen_range(-50. .. 400.),
      );
      let extent = [rng.gen_range(1..200), rng.gen_range(1..200)];
      let once = bb.clip(extent);
      assert_eq!(once.clip(extent), once);
      assert!(once.width() >= 0. && once.height() >= 0.);
      assert!(once.x() >= 0. && once.y() >= 0.);
      assert!(once.x() + once.width() <= extent[0] as f64 + 1e-9);
      assert!(once.y() + once.height() <= extent[1] as f64 + 1e-9);
    }
  }

  #[test]
  fn test_contains() {
    let bb = BoundingBox::new(10., 10., 50., 50.);
    assert!(bb.contains(&Vector2d::new(10., 10.)));
    assert!(bb.contains(&Vector2d::new(60., 60.)));
    assert!(bb.contains(&Vector2d::new(35., 12.)));
    assert!(!bb.contains(&Vector2d::new(60.1, 30.)));
    assert!(!bb.contains(&Vector2d::new(30., 9.9)));
  }

  #[test]
  fn test_center_and_rounded() {
    let bb = BoundingBox::new(10., 10., 50., 50.);
    assert_eq!(bb.center(), Vector2d::new(35., 35.));
    assert_eq!(BoundingBox::new(1.4, 2.6, 10.5, -0.4).rounded(), [1, 3, 11, 0]);
  }

  #[test]
  fn test_enclosing_rect() {
    assert_eq!(enclosing_rect(&[]), None);
    let points = [Vector2d::new(10.2, 30.), Vector2d::new(59.9, 10.7), Vector2d::new(20., 59.)];
    assert_eq!(enclosing_rect(&points), Some(BoundingBox::new(10., 10., 50., 50.)));
    assert_eq!(enclosing_rect(&points[..1]), Some(BoundingBox::new(10., 30., 1., 1.)));
  }
}
