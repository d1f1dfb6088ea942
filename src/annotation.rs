use crate::all::*;

use std::fs::OpenOptions;

// One processed frame: where its image was saved and the clipped box.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationRecord {
  // Relative to the annotation file. Empty if frames are not saved.
  pub path: String,
  pub bbox: BoundingBox,
}

pub fn annotation_line(record: &AnnotationRecord, class_id: i64) -> String {
  let [x, y, w, h] = record.bbox.rounded();
  format!("{} {} {} {} {} {} \n", record.path, class_id, x, y, w, h)
}

pub fn write_annotations(
  path: &Path,
  records: &[AnnotationRecord],
  class_id: i64,
  append: bool,
) -> Result<()> {
  let file = OpenOptions::new()
    .write(true)
    .create(true)
    .append(append)
    .truncate(!append)
    .open(path)
    .context(format!("Failed to open annotation file {}.", path.display()))?;
  let mut writer = BufWriter::new(file);
  for record in records {
    writer.write_all(annotation_line(record, class_id).as_bytes())?;
  }
  writer.flush().context(format!("Failed to write annotation file {}.", path.display()))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(path: &str, x: f64, y: f64, w: f64, h: f64) -> AnnotationRecord {
    AnnotationRecord {
      path: path.to_string(),
      bbox: BoundingBox::new(x, y, w, h),
    }
  }

  #[test]
  fn test_annotation_line() {
    let r = record("../images/3.png", 10.4, 20.6, 30., 40.5);
    assert_eq!(annotation_line(&r, 1), "../images/3.png 1 10 21 30 41 \n");
    let r = record("", 0., 0., 0., 0.);
    assert_eq!(annotation_line(&r, 2), " 2 0 0 0 0 \n");
  }

  #[test]
  fn test_write_modes() {
    let dir = std::env::temp_dir().join(format!("boxtrack-annotation-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("train.txt");
    let first = [record("a/0.png", 1., 2., 3., 4.)];
    let second = [record("a/1.png", 5., 6., 7., 8.)];

    write_annotations(&path, &first, 1, false).unwrap();
    write_annotations(&path, &second, 1, true).unwrap();
    let s = std::fs::read_to_string(&path).unwrap();
    assert_eq!(s, "a/0.png 1 1 2 3 4 \na/1.png 1 5 6 7 8 \n");

    write_annotations(&path, &second, 1, false).unwrap();
    let s = std::fs::read_to_string(&path).unwrap();
    assert_eq!(s, "a/1.png 1 5 6 7 8 \n");
    std::fs::remove_dir_all(&dir).unwrap();
  }
}
