// NOTE This kind of import-all file isn't a common Rust idiom.

pub use crate::{
  annotation::*,
  bbox::*,
  detector::*,
  error::*,
  frame::*,
  gray_image::*,
  matcher::*,
  math::*,
  optical_flow::*,
  parameters::*,
  pyramid::*,
  scanner::*,
  tracker::*,
  types::*,
  util::*,
  video::*,
  visualize::*,
};

pub use {
  std::{
    io::{BufWriter, Read, Write},
    path::{Path, PathBuf},
    sync::Mutex,
  },
  log::{debug, error, info, warn, LevelFilter},
  nalgebra::DMatrix,
  anyhow::{anyhow, bail, Context as AnyhowContext, Result},
};
