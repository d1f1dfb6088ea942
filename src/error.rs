use thiserror::Error;

// Failures of the tracking loop itself. End of the video is not an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
  #[error("No trackable corners found in the first frame.")]
  NoFeatures,
  #[error("All tracked points were lost at frame {frame_number}.")]
  PointsLost { frame_number: usize },
  #[error("Frame size {got:?} does not match the tracked video size {expected:?}.")]
  FrameSizeMismatch { expected: [usize; 2], got: [usize; 2] },
}
