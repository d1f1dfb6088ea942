use crate::all::*;

// Row-major grayscale image storage.
// Could also have used nalebgra::DMatrix, but the added complexity
// only seems to help with algorithms like the optical flow.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
  pub data: Vec<u8>,
  pub width: usize,
  pub height: usize,
}

impl Image {
  pub fn empty() -> Image {
    Image {
      data: vec![],
      width: 0,
      height: 0,
    }
  }

  #[allow(dead_code)]
  pub fn new(data: Vec<u8>, width: usize, height: usize) -> Image {
    assert_eq!(data.len(), width * height);
    Image { data, width, height }
  }

  #[inline(always)]
  pub fn value(&self, x: usize, y: usize) -> u8 {
    self.data[y * self.width + x]
  }

  // Out-of-range coordinates read the nearest border pixel.
  #[inline(always)]
  pub fn value_clamped(&self, x: i32, y: i32) -> u8 {
    let x = x.clamp(0, self.width as i32 - 1) as usize;
    let y = y.clamp(0, self.height as i32 - 1) as usize;
    self.data[y * self.width + x]
  }

  // Fills `self` with the luma of packed RGB bytes, reusing the buffer.
  pub fn set_from_rgb(&mut self, rgb: &[u8], width: usize, height: usize) {
    assert_eq!(rgb.len(), 3 * width * height);
    self.data.clear();
    self.data.extend(rgb.chunks_exact(3).map(|c| luma(c[0], c[1], c[2])));
    self.width = width;
    self.height = height;
  }
}

// ITU-R BT.601 weights.
#[inline(always)]
fn luma(r: u8, g: u8, b: u8) -> u8 {
  (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64).round().min(255.) as u8
}
