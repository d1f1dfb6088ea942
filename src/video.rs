use crate::all::*;

use serde::Deserialize;
use std::process::{Child, ChildStdout, Command, Stdio};

pub struct VideoInput {
  child: Child,
  child_stdout: ChildStdout,
  video_frame: VideoFrame,
}

// Packed RGB pixels of one decoded frame.
pub struct VideoFrame {
  pub data: Vec<u8>,
  pub width: usize,
  pub height: usize,
}

#[derive(Deserialize)]
struct ProbeStream {
  width: usize,
  height: usize,
}

#[derive(Deserialize)]
struct ProbeRoot {
  streams: Vec<ProbeStream>,
}

impl VideoInput {
  pub fn new(path: &Path) -> Result<VideoInput> {
    if !path.exists() {
      bail!("Video file {} does not exist.", path.display());
    }
    let [width, height] = probe_size(path)?;
    info!("Decoding {} ({}x{}).", path.display(), width, height);
    let mut child = Command::new("ffmpeg")
      .arg("-i").arg(path)
      .args(["-f", "rawvideo", "-vcodec", "rawvideo", "-vsync", "vfr", "-pix_fmt", "rgb24", "-"])
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::null())
      .spawn()
      .context("Failed to start ffmpeg. Is it installed?")?;
    let child_stdout = child.stdout.take().ok_or(anyhow!("Failed to capture ffmpeg output."))?;
    Ok(VideoInput {
      child,
      child_stdout,
      video_frame: VideoFrame {
        data: vec![0; 3 * width * height],
        width,
        height,
      },
    })
  }

  // Not using `impl Iterator` to allow returning `Result`.
  // End of data is signaled by `Result::Ok(Option::None)`.
  pub fn read(&mut self) -> Result<Option<&VideoFrame>> {
    let n = read_full(&mut self.child_stdout, &mut self.video_frame.data)
      .context("Reading bytes from video input failed.")?;
    if n == 0 {
      return Ok(None);
    }
    if n < self.video_frame.data.len() {
      warn!("Ignoring truncated last frame ({} of {} bytes).", n, self.video_frame.data.len());
      return Ok(None);
    }
    Ok(Some(&self.video_frame))
  }
}

impl Drop for VideoInput {
  fn drop(&mut self) {
    // The decoder may still be running if reading stopped early.
    let _ = self.child.kill();
    let _ = self.child.wait();
  }
}

// Like `read_exact()`, but reports how many bytes were read before end of stream.
fn read_full<R: Read>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<usize> {
  let mut n = 0;
  while n < buffer.len() {
    match reader.read(&mut buffer[n..]) {
      Ok(0) => break,
      Ok(k) => n += k,
      Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {},
      Err(err) => return Err(err),
    }
  }
  Ok(n)
}

fn probe_size(path: &Path) -> Result<[usize; 2]> {
  let output = Command::new("ffprobe")
    .args(["-v", "error", "-select_streams", "v:0", "-show_entries", "stream=width,height", "-of", "json"])
    .arg(path)
    .output()
    .context("Failed to start ffprobe. Is it installed?")?;
  if !output.status.success() {
    bail!("ffprobe failed for {}: {}", path.display(), String::from_utf8_lossy(&output.stderr).trim());
  }
  parse_probe(&output.stdout)
    .context(format!("Failed to parse ffprobe output for {}.", path.display()))
}

fn parse_probe(json: &[u8]) -> Result<[usize; 2]> {
  let root: ProbeRoot = serde_json::from_slice(json)?;
  let stream = root.streams.first().ok_or(anyhow!("No video stream found."))?;
  if stream.width == 0 || stream.height == 0 {
    bail!("Video stream has zero size.");
  }
  Ok([stream.width, stream.height])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_probe() {
    let json = br#"{ "programs": [], "streams": [ { "width": 640, "height": 360 } ] }"#;
    assert_eq!(parse_probe(json).unwrap(), [640, 360]);
    assert!(parse_probe(br#"{ "streams": [] }"#).is_err());
    assert!(parse_probe(b"not json").is_err());
  }

  #[test]
  fn test_read_full() {
    let data = [1u8, 2, 3, 4, 5];
    let mut buffer = [0u8; 4];
    let mut reader = &data[..];
    assert_eq!(read_full(&mut reader, &mut buffer).unwrap(), 4);
    assert_eq!(buffer, [1, 2, 3, 4]);
    assert_eq!(read_full(&mut reader, &mut buffer).unwrap(), 1);
    assert_eq!(read_full(&mut reader, &mut buffer).unwrap(), 0);
  }
}
