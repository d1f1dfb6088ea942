use crate::all::*;

use clap::Parser;

lazy_static! {
  pub static ref PARAMETER_SET: Mutex<ParameterSet> = Mutex::new(ParameterSet::default());
}

#[derive(Clone, Debug)]
#[derive(clap::Parser)]
pub struct ParameterSet {
  // Bounding box filter.
  /// Blending weight for how quickly the box moves towards the feature centroid.
  #[clap(long, default_value = "0.1")]
  pub centroid_f: f64,
  /// Blending weight for how quickly the box size moves towards the box enclosing all points.
  #[clap(long, default_value = "0.1")]
  pub tgtbb_f: f64,
  /// Weight of the previous frame velocity. Zero disables the smoothing.
  #[clap(long, default_value = "0")]
  pub velocity_smoothing: f64,
  /// Drop points outside the box and farther than this many std norms from the centroid. Zero disables.
  #[clap(long, default_value = "0")]
  pub prune_factor: f64,

  // Point set maintenance.
  #[clap(long, default_value = "50")]
  pub target_points: usize,
  /// Candidates closer than this to a tracked point are duplicates.
  #[clap(long, default_value = "10")]
  pub min_new_point_distance: f64,

  // Shi-Tomasi corner detector.
  #[clap(long, default_value = "0.3")]
  pub corner_quality: f64,
  #[clap(long, default_value = "7")]
  pub corner_min_distance: f64,
  #[clap(long, default_value = "7")]
  pub corner_block_size: usize,

  // Pyramidal Lucas-Kanade feature tracker.
  #[clap(long, default_value = "2")]
  pub lk_levels: usize,
  #[clap(long, default_value = "10")]
  pub lk_iters: usize,
  #[clap(long, default_value = "15")]
  pub lk_win_size: usize,
  #[clap(long, default_value = "0.03")]
  pub lk_epsilon: f64,
  /// Minimum eigenvalue of the spatial gradient matrix per window pixel.
  #[clap(long, default_value = "1.0")]
  pub lk_min_eigenvalue: f64,

  // Visualizations.
  #[clap(long)]
  pub show_flow: bool,
}

impl Default for ParameterSet {
  // Defaults live in the clap attributes only.
  fn default() -> ParameterSet {
    ParameterSet::parse_from(["boxtrack"])
  }
}
