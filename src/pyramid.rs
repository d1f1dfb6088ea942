use crate::all::*;

// Binomial approximation of a Gaussian.
const KERNEL: [u32; 5] = [1, 4, 6, 4, 1];

// Downscaled copies of a frame. `levels[0]` is half the size of the frame.
pub struct Pyramid {
  pub levels: Vec<Image>,
}

impl Pyramid {
  pub fn new(
    base: &Image,
    unused_pyramid: Option<Pyramid>,
    level_count: usize,
  ) -> Pyramid {
    let mut levels = unused_pyramid.map(|x| x.levels).unwrap_or_default();
    levels.resize_with(level_count, Image::empty);
    for level_ind in 0..level_count {
      // Split to borrow the parent level while writing the child.
      let (parents, children) = levels.split_at_mut(level_ind);
      let parent = if level_ind > 0 { &parents[level_ind - 1] } else { base };
      downscale(parent, &mut children[0]);
    }
    Pyramid { levels }
  }
}

fn downscale(parent: &Image, child: &mut Image) {
  let w = (parent.width + 1) / 2;
  let h = (parent.height + 1) / 2;
  child.data.clear();
  child.data.resize(w * h, 0);
  child.width = w;
  child.height = h;
  for y in 0..h {
    for x in 0..w {
      let mut sum = 0;
      for (j, ky) in KERNEL.iter().enumerate() {
        for (i, kx) in KERNEL.iter().enumerate() {
          let px = 2 * x as i32 + i as i32 - 2;
          let py = 2 * y as i32 + j as i32 - 2;
          sum += ky * kx * parent.value_clamped(px, py) as u32;
        }
      }
      // Kernel weights sum to 256.
      child.data[y * w + x] = ((sum + 128) / 256) as u8;
    }
  }
}
