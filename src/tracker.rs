use crate::all::*;

// Everything carried from one frame to the next.
#[derive(Clone, Debug)]
pub struct TrackerState {
  pub points: Vec<Vector2d>,
  // Unclipped. Clipping is applied to outputs only so that it does not feed back.
  pub bbox: BoundingBox,
  // Average point motion of the previous frame.
  pub velocity: Vector2d,
  // Index of the video frame the points and box refer to.
  pub frame_number: usize,
}

// Result of advancing the tracker by one frame.
pub struct FrameUpdate {
  pub state: TrackerState,
  pub clipped: BoundingBox,
  // Previous positions of the surviving points, parallel to `state.points`.
  pub good_old: Vec<Vector2d>,
  pub centroid: Vector2d,
  // Box center after the motion translation, before re-centering.
  pub translated_center: Vector2d,
}

// Three exponential smoothing signals of different speeds: instant translation
// by the point motion, slow re-centering on the point centroid and slow
// resizing towards the box enclosing the points.
#[derive(Clone, Copy, Debug)]
pub struct BoxFilter {
  pub centroid_f: f64,
  pub tgtbb_f: f64,
}

impl BoxFilter {
  pub fn update(
    &self,
    bbox: &BoundingBox,
    avg_vel: Vector2d,
    centroid: Vector2d,
    target: &BoundingBox,
  ) -> BoundingBox {
    let mut bb = *bbox;
    bb.origin += avg_vel;
    let dc_xy = centroid - bb.center();
    bb.origin += self.centroid_f * dc_xy;
    // The |dc_xy| term makes room for the centering lag.
    bb.size = (1. - self.tgtbb_f) * bb.size + self.tgtbb_f * (target.size + dc_xy.abs());
    bb
  }
}

pub struct Tracker {
  detector: Detector,
  optical_flow: OpticalFlow,
  matcher: Box<dyn NearestNeighbor>,
  filter: BoxFilter,
  target_points: usize,
  min_new_point_distance: f64,
  velocity_smoothing: f64,
  prune_factor: f64,
  // Workspace.
  candidates: Vec<Vector2d>,
  flow: FlowOutput,
}

impl Tracker {
  pub fn new(p: &ParameterSet) -> Result<Tracker> {
    for (name, v) in [("centroid-f", p.centroid_f), ("tgtbb-f", p.tgtbb_f), ("velocity-smoothing", p.velocity_smoothing)] {
      if !(0. ..= 1.).contains(&v) {
        bail!("Blending weight --{} must be in [0, 1], got {}.", name, v);
      }
    }
    if p.prune_factor < 0. {
      bail!("Prune factor must not be negative.");
    }
    Ok(Tracker {
      detector: Detector::new(p)?,
      optical_flow: OpticalFlow::new(p)?,
      matcher: Box::new(BruteForceMatcher),
      filter: BoxFilter {
        centroid_f: p.centroid_f,
        tgtbb_f: p.tgtbb_f,
      },
      target_points: p.target_points,
      min_new_point_distance: p.min_new_point_distance,
      velocity_smoothing: p.velocity_smoothing,
      prune_factor: p.prune_factor,
      candidates: vec![],
      flow: FlowOutput::default(),
    })
  }

  // Starts tracking the corners of the first frame, boxed by their enclosing rectangle.
  pub fn init(&mut self, frame: &Frame) -> Result<TrackerState, TrackingError> {
    let mut points = vec![];
    self.detector.process(&frame.image, &mut points);
    let bbox = enclosing_rect(&points).ok_or(TrackingError::NoFeatures)?;
    info!("Tracking {} points, initial box {:?}.", points.len(), bbox.rounded());
    Ok(TrackerState {
      points,
      bbox,
      velocity: Vector2d::zeros(),
      frame_number: 0,
    })
  }

  // Moves the state from `frame0` to the next frame `frame1`.
  pub fn advance_frame(
    &mut self,
    state: TrackerState,
    frame0: &Frame,
    frame1: &Frame,
  ) -> Result<FrameUpdate, TrackingError> {
    let expected = [frame0.width(), frame0.height()];
    let got = [frame1.width(), frame1.height()];
    if expected != got {
      return Err(TrackingError::FrameSizeMismatch { expected, got });
    }
    let TrackerState { mut points, bbox, velocity, frame_number } = state;
    let lost = TrackingError::PointsLost { frame_number: frame_number + 1 };
    if points.is_empty() {
      return Err(lost);
    }

    let centroid = median(&points);
    let std = std_dev(&points);

    if points.len() < self.target_points {
      self.detector.process(&frame0.image, &mut self.candidates);
      let added = replenish(
        &mut points,
        &self.candidates,
        &bbox,
        &centroid,
        &std,
        self.min_new_point_distance,
        self.matcher.as_ref(),
      );
      debug!("Finding new points: added {} of {} proposed.", added, self.candidates.len());
    }
    if self.prune_factor > 0. {
      let removed = prune(&mut points, &bbox, &centroid, &std, self.prune_factor);
      if removed > 0 { debug!("Pruned {} distant points.", removed) }
    }

    self.optical_flow.process(frame0, frame1, &points, &mut self.flow);
    let mut good_old = vec![];
    let mut good_new = vec![];
    self.flow.select_good(&points, &mut good_old, &mut good_new);
    let target = match enclosing_rect(&good_new) {
      Some(target) => target,
      None => return Err(lost),
    };

    let mut avg_vel = mean(&good_new) - mean(&good_old);
    if self.velocity_smoothing > 0. {
      avg_vel = (1. - self.velocity_smoothing) * avg_vel + self.velocity_smoothing * velocity;
    }
    let flow_error = self.flow.errors.iter().zip(&self.flow.statuses)
      .filter(|(_, ok)| **ok)
      .map(|(e, _)| e)
      .sum::<f64>() / good_new.len() as f64;
    debug!("std: {:?} centroid: {:?} avg_vel: {:?} flow error: {:.2}",
      std.as_slice(), centroid.as_slice(), avg_vel.as_slice(), flow_error);

    let translated_center = bbox.center() + avg_vel;
    let bbox = self.filter.update(&bbox, avg_vel, centroid, &target);
    let clipped = bbox.clip(got);
    if clipped.is_degenerate() {
      warn!("Bounding box {:?} has no area inside frame {}.", bbox.rounded(), frame_number + 1);
    }

    Ok(FrameUpdate {
      state: TrackerState {
        points: good_new,
        bbox,
        velocity: avg_vel,
        frame_number: frame_number + 1,
      },
      clipped,
      good_old,
      centroid,
      translated_center,
    })
  }
}

// Appends candidates that are not near-duplicates of tracked points and lie in
// the box or near the point centroid. Returns the number of points added.
pub fn replenish(
  points: &mut Vec<Vector2d>,
  candidates: &[Vector2d],
  bbox: &BoundingBox,
  centroid: &Vector2d,
  std: &Vector2d,
  min_distance: f64,
  matcher: &dyn NearestNeighbor,
) -> usize {
  let n = points.len();
  let max_centroid_distance = 2. * std.norm();
  for candidate in candidates {
    let distance = match matcher.nearest(candidate, &points[..n]) {
      Some((_, distance)) => distance,
      None => continue,
    };
    if distance <= min_distance { continue }
    if bbox.contains(candidate) || (candidate - centroid).norm() < max_centroid_distance {
      points.push(*candidate);
    }
  }
  points.len() - n
}

// Drops points outside the box that are far from the centroid. Never empties the set.
pub fn prune(
  points: &mut Vec<Vector2d>,
  bbox: &BoundingBox,
  centroid: &Vector2d,
  std: &Vector2d,
  factor: f64,
) -> usize {
  let max_distance = factor * std.norm();
  let keep = |p: &Vector2d| bbox.contains(p) || (p - centroid).norm() < max_distance;
  if !points.iter().any(keep) { return 0 }
  let n = points.len();
  points.retain(keep);
  n - points.len()
}
