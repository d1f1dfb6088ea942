mod all;
mod annotation;
mod bbox;
mod detector;
mod error;
mod frame;
mod gray_image;
mod matcher;
mod math;
mod optical_flow;
mod parameters;
mod pyramid;
mod scanner;
mod tracker;
mod types;
mod util;
mod video;
mod visualize;

use all::*;

#[macro_use] extern crate lazy_static;
use clap::Parser;

/// Tracks an object through a video and writes bounding box annotations for
/// training an object detector.
#[derive(Parser)]
struct Args {
  /// Input video file.
  video: String,
  /// Directory to save the video frames to.
  #[clap(long)]
  output_images: Option<String>,
  /// Annotation file listing the saved frames and their boxes. Requires --output-images.
  #[clap(long)]
  output_annotations: Option<String>,
  /// Prefix of the saved frame file names.
  #[clap(long, default_value = "")]
  prefix: String,
  /// Append to the annotation file instead of overwriting it.
  #[clap(long)]
  append: bool,
  #[clap(long, default_value = "1")]
  class_id: i64,
  /// Directory to save frames with the tracked points and box drawn on them.
  #[clap(long)]
  output_visualization: Option<String>,
  #[clap(flatten)]
  parameters: ParameterSet,
}

fn handle_error(err: &anyhow::Error) {
  for (i, e) in err.chain().enumerate() {
    println!("  {}: {}", i + 1, e);
  }
}

fn main() {
  if let Err(err) = run() {
    handle_error(&err);
    std::process::exit(1);
  }
}

fn require_dir(path: &str, flag: &str) -> Result<PathBuf> {
  let path = PathBuf::from(path);
  if !path.is_dir() {
    bail!("{} must be a directory, {} is not.", flag, path.display());
  }
  Ok(path)
}

fn run() -> Result<()> {
  let args = Args::parse();

  env_logger::Builder::new()
    .filter_level(LevelFilter::Info)
    .parse_default_env()
    .format(util::format_log)
    .init();

  *PARAMETER_SET.lock().unwrap() = args.parameters.clone();

  let output_images = args.output_images.as_deref()
    .map(|x| require_dir(x, "--output-images"))
    .transpose()?;
  let output_visualization = args.output_visualization.as_deref()
    .map(|x| require_dir(x, "--output-visualization"))
    .transpose()?;

  let annotation_images_path = match (&args.output_annotations, &output_images) {
    (Some(_), None) => bail!("--output-images must be used with --output-annotations."),
    (Some(annotations), Some(images)) => {
      let annotations_dir = Path::new(annotations).parent().unwrap_or(Path::new(""));
      let cwd = std::env::current_dir().context("Failed to read current directory.")?;
      let path = relative_path(images, annotations_dir, &cwd);
      info!("Annotations relative file path is {}", path.display());
      path
    },
    (None, Some(images)) => images.clone(),
    (None, None) => PathBuf::new(),
  };

  let mut input = VideoInput::new(Path::new(&args.video))?;
  let mut scanner = Scanner::new(&args.parameters, ScanOptions {
    output_images,
    annotation_images_path,
    prefix: args.prefix.clone(),
    output_visualization,
  })?;
  let end = scanner.run(&mut input)?;

  if let Some(path) = &args.output_annotations {
    write_annotations(Path::new(path), scanner.annotations(), args.class_id, args.append)?;
    info!("Wrote {} annotations to {}.", scanner.annotations().len(), path);
  }

  match end {
    ScanEnd::EndOfStream => Ok(()),
    ScanEnd::TrackingFailed(err) => Err(anyhow::Error::new(err).context("Tracking stopped.")),
  }
}
