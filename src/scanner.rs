use crate::all::*;

// Where decoded frames come from.
pub trait FrameSource {
  // End of data is signaled by `Result::Ok(Option::None)`.
  fn read(&mut self) -> Result<Option<&VideoFrame>>;
}

impl FrameSource for VideoInput {
  fn read(&mut self) -> Result<Option<&VideoFrame>> {
    VideoInput::read(self)
  }
}

pub struct ScanOptions {
  // Directory to save the processed frames to.
  pub output_images: Option<PathBuf>,
  // How `output_images` is referred to in the annotations.
  pub annotation_images_path: PathBuf,
  // Prepended to the frame file names.
  pub prefix: String,
  pub output_visualization: Option<PathBuf>,
}

#[derive(Debug, PartialEq)]
pub enum ScanEnd {
  EndOfStream,
  TrackingFailed(TrackingError),
}

// Runs the tracker over a video and collects one annotation per processed frame.
pub struct Scanner {
  tracker: Tracker,
  options: ScanOptions,
  lk_levels: usize,
  colors: Vec<Color>,
  annotations: Vec<AnnotationRecord>,
}

impl Scanner {
  pub fn new(p: &ParameterSet, options: ScanOptions) -> Result<Scanner> {
    Ok(Scanner {
      tracker: Tracker::new(p)?,
      options,
      lk_levels: p.lk_levels,
      colors: point_colors(p.target_points),
      annotations: vec![],
    })
  }

  pub fn annotations(&self) -> &[AnnotationRecord] {
    &self.annotations
  }

  // I/O problems are returned as errors, tracking failures as `ScanEnd`.
  pub fn run(&mut self, source: &mut dyn FrameSource) -> Result<ScanEnd> {
    let mut frame0 = match source.read()? {
      Some(video_frame) => Frame::new(video_frame, None, self.lk_levels),
      None => {
        info!("No frames grabbed!");
        return Ok(ScanEnd::EndOfStream);
      },
    };
    let mut state = match self.tracker.init(&frame0) {
      Ok(state) => state,
      Err(err) => return Ok(ScanEnd::TrackingFailed(err)),
    };

    let mut unused_frame = None;
    loop {
      let video_frame = match source.read()? {
        Some(video_frame) => video_frame,
        None => {
          info!("End of video after {} annotated frames.", self.annotations.len());
          return Ok(ScanEnd::EndOfStream);
        },
      };
      let frame1 = Frame::new(video_frame, unused_frame.take(), self.lk_levels);
      let update = match self.tracker.advance_frame(state, &frame0, &frame1) {
        Ok(update) => update,
        Err(err) => {
          error!("{}", err);
          return Ok(ScanEnd::TrackingFailed(err));
        },
      };

      // Frame numbering of the outputs starts from the first tracked frame.
      let frame_id = update.state.frame_number - 1;
      let file_name = format!("{}{}.png", self.options.prefix, frame_id);
      let mut annotation_path = String::new();
      if let Some(dir) = &self.options.output_images {
        let path = dir.join(&file_name);
        annotation_path = self.options.annotation_images_path.join(&file_name).to_string_lossy().into_owned();
        info!("Saving frame {} ({})", path.display(), annotation_path);
        save_frame(&path, video_frame)?;
      }
      if let Some(dir) = &self.options.output_visualization {
        let path = dir.join(&file_name);
        visualize(video_frame, &update, &self.colors)?
          .save(&path)
          .context(format!("Failed to save visualization {}.", path.display()))?;
      }
      self.annotations.push(AnnotationRecord {
        path: annotation_path,
        bbox: update.clipped,
      });

      state = update.state;
      unused_frame = Some(frame0);
      frame0 = frame1;
    }
  }
}

fn save_frame(path: &Path, video_frame: &VideoFrame) -> Result<()> {
  ::image::save_buffer(
    path,
    &video_frame.data,
    video_frame.width as u32,
    video_frame.height as u32,
    ::image::ColorType::Rgb8,
  ).context(format!("Failed to save frame {}.", path.display()))
}
