use std::path::{Component, Path, PathBuf};

pub fn format_log(
  buf: &mut env_logger::fmt::Formatter,
  record: &log::Record,
) -> std::io::Result<()> {
  use std::io::Write;
  let mut style = buf.style();
  use env_logger::fmt::Color::*;
  use log::Level::*;
  style.set_color(match record.level() {
    Error => Red,
    Warn => Yellow,
    Info => Green,
    Debug => Magenta,
    Trace => Blue,
  });

  let s = format!("{:30}{}",
    format!("{}:{}",
      record.file().unwrap_or("?"),
      record.line().unwrap_or(0),
    ),
    record.args()
  );
  writeln!(buf, "{}", style.value(s))
}

// Resolves `.` and `..` without touching the file system.
fn normalize(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for c in path.components() {
    match c {
      Component::CurDir => {},
      Component::ParentDir => match out.components().next_back() {
        Some(Component::Normal(_)) => { out.pop(); },
        // `..` of the root is the root.
        Some(Component::RootDir) | Some(Component::Prefix(_)) => {},
        _ => out.push(".."),
      },
      c => out.push(c.as_os_str()),
    }
  }
  out
}

// Path of `target` as seen from directory `base`. Relative inputs are taken
// relative to `cwd`.
pub fn relative_path(target: &Path, base: &Path, cwd: &Path) -> PathBuf {
  let target = normalize(&cwd.join(target));
  let base = normalize(&cwd.join(base));
  let t: Vec<_> = target.components().collect();
  let b: Vec<_> = base.components().collect();
  let common = t.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
  let mut out = PathBuf::new();
  for _ in common..b.len() {
    out.push("..");
  }
  for c in &t[common..] {
    out.push(c.as_os_str());
  }
  if out.as_os_str().is_empty() {
    out.push(".");
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_relative_path() {
    let cwd = Path::new("/work");
    assert_eq!(relative_path(Path::new("images"), Path::new(""), cwd), PathBuf::from("images"));
    assert_eq!(relative_path(Path::new("data/images"), Path::new("data/labels"), cwd), PathBuf::from("../images"));
    assert_eq!(relative_path(Path::new("/data/images"), Path::new("labels"), cwd), PathBuf::from("../../data/images"));
    assert_eq!(relative_path(Path::new("./a/../b"), Path::new("b"), cwd), PathBuf::from("."));
    assert_eq!(relative_path(Path::new("/../data/images"), Path::new("/labels"), cwd), PathBuf::from("../data/images"));
  }

  #[test]
  fn test_normalize() {
    assert_eq!(normalize(Path::new("/../../a")), PathBuf::from("/a"));
    assert_eq!(normalize(Path::new("../../a/./b/..")), PathBuf::from("../../a"));
    assert_eq!(normalize(Path::new("a/../..")), PathBuf::from(".."));
  }
}
