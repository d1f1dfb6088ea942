use crate::all::*;

use ::image::RgbImage;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

const RED: Color = [255, 0, 0];
const BLUE: Color = [0, 12, 255];
const BOX_COLOR: Color = [0, 0, 255];

// Fixed random colors so that a point index keeps its color across frames.
pub fn point_colors(n: usize) -> Vec<Color> {
  let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
  (0..n.max(1)).map(|_| [rng.gen(), rng.gen(), rng.gen()]).collect()
}

#[inline(always)]
fn draw_pixel(image: &mut RgbImage, p: &Vector2i, v: Color) {
  if p[0] < 0 || p[0] >= image.width() as i32 { return }
  if p[1] < 0 || p[1] >= image.height() as i32 { return }
  image.put_pixel(p[0] as u32, p[1] as u32, ::image::Rgb(v));
}

fn draw_square(image: &mut RgbImage, p: &Vector2i, v: Color, r: i32) {
  for z in (-r)..(r+1) {
    draw_pixel(image, &(p + Vector2i::new(z, -r)), v);
    draw_pixel(image, &(p + Vector2i::new(z, r)), v);
    draw_pixel(image, &(p + Vector2i::new(-r, z)), v);
    draw_pixel(image, &(p + Vector2i::new(r, z)), v);
  }
}

fn draw_line(image: &mut RgbImage, mut p0: Vector2i, mut p1: Vector2i, v: Color) {
  let dx = p1[0] - p0[0];
  let dy = p1[1] - p0[1];
  if dx == 0 && dy == 0 {
    draw_pixel(image, &p0, v);
  }
  else if dx.abs() < dy.abs() {
    if p0[1] > p1[1] { (p0, p1) = (p1, p0); }
    let k = dx as f32 / dy as f32;
    for y in p0[1] ..= p1[1] {
      let x = p0[0] + (k * (y - p0[1]) as f32).round() as i32;
      draw_pixel(image, &Vector2i::new(x, y), v);
    }
  }
  else {
    if p0[0] > p1[0] { (p0, p1) = (p1, p0); }
    let k = dy as f32 / dx as f32;
    for x in p0[0] ..= p1[0] {
      let y = p0[1] + (k * (x - p0[0]) as f32).round() as i32;
      draw_pixel(image, &Vector2i::new(x, y), v);
    }
  }
}

fn draw_box(image: &mut RgbImage, bbox: &BoundingBox, v: Color) {
  let [x, y, w, h] = bbox.rounded().map(|c| c as i32);
  let corners = [
    Vector2i::new(x, y), Vector2i::new(x + w, y),
    Vector2i::new(x + w, y + h), Vector2i::new(x, y + h),
  ];
  for i in 0..4 {
    draw_line(image, corners[i], corners[(i + 1) % 4], v);
  }
}

// Draws the tracked points, the centroid, the translated box center and the clipped box
// over the color frame.
pub fn visualize(video_frame: &VideoFrame, update: &FrameUpdate, colors: &[Color]) -> Result<RgbImage> {
  let mut image = RgbImage::from_raw(video_frame.width as u32, video_frame.height as u32, video_frame.data.clone())
    .ok_or(anyhow!("Video frame buffer does not match its size."))?;

  let show_flow = PARAMETER_SET.lock().unwrap().show_flow;
  for (i, (new, old)) in update.state.points.iter().zip(&update.good_old).enumerate() {
    let color = colors[i % colors.len()];
    if show_flow {
      draw_line(&mut image, from_f64(old), from_f64(new), color);
    }
    draw_square(&mut image, &from_f64(new), color, 3);
  }
  draw_square(&mut image, &from_f64(&update.centroid), RED, 6);
  draw_square(&mut image, &from_f64(&update.translated_center), BLUE, 6);
  draw_box(&mut image, &update.clipped, BOX_COLOR);
  Ok(image)
}
