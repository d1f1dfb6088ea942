use crate::all::*;

// Grayscale data derived from a single decoded video frame.
pub struct Frame {
  pub image: Image,
  pub pyramid: Pyramid,
}

pub struct Level<'a> {
  pub data: &'a[u8],
  pub width: usize,
  pub height: usize,
}

impl Frame {
  pub fn new(
    video_frame: &VideoFrame,
    unused_frame: Option<Frame>,
    lk_levels: usize,
  ) -> Frame {
    let (mut image, unused_pyramid) = match unused_frame {
      // Move buffers from old unused frame to the new frame to avoid allocation.
      Some(unused_frame) => (unused_frame.image, Some(unused_frame.pyramid)),
      None => (Image::empty(), None),
    };
    image.set_from_rgb(&video_frame.data, video_frame.width, video_frame.height);
    Frame {
      pyramid: Pyramid::new(&image, unused_pyramid, lk_levels),
      image,
    }
  }

  #[allow(dead_code)]
  pub fn from_image(image: Image, lk_levels: usize) -> Frame {
    Frame {
      pyramid: Pyramid::new(&image, None, lk_levels),
      image,
    }
  }

  pub fn width(&self) -> usize {
    self.image.width
  }

  pub fn height(&self) -> usize {
    self.image.height
  }

  pub fn level_count(&self) -> usize {
    self.pyramid.levels.len() + 1
  }

  pub fn get_level(&self, level: usize) -> Level {
    let image = if level == 0 { &self.image } else { &self.pyramid.levels[level - 1] };
    Level {
      data: &image.data,
      width: image.width,
      height: image.height,
    }
  }
}
