// Eigen-like aliases.
pub type Vector2d = nalgebra::Vector2::<f64>;
pub type Vector2i = nalgebra::Vector2::<i32>;
pub type Matrix2d = nalgebra::Matrix2::<f64>;
pub type Matrixd = nalgebra::DMatrix::<f64>;

pub fn from_f64(p: &Vector2d) -> Vector2i {
  Vector2i::new(p[0].round() as i32, p[1].round() as i32)
}

// Packed 8-bit RGB color.
pub type Color = [u8; 3];
