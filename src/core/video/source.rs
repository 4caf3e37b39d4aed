use std::collections::VecDeque;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use image::RgbImage;
use log::debug;

use crate::core::error::ScanError;
use crate::core::video::frame::Frame;

/// Lazy, finite, forward-only frame sequence. Not restartable; a second
/// scan needs a new source bound to the same path.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, ScanError>;

    fn fps(&self) -> u32;
}

/// 通过 ffmpeg 子进程按顺序解码视频帧（rawvideo rgb24 管道）
#[derive(Debug)]
pub struct VideoFrameSource {
    path: PathBuf,
    child: Child,
    stdout: BufReader<ChildStdout>,
    width: u32,
    height: u32,
    fps: u32,
    step: u64,
    next_index: u64,
    finished: bool,
}

impl VideoFrameSource {
    pub fn open(path: &Path) -> Result<Self, ScanError> {
        Self::open_with_step(path, 1)
    }

    /// Open a source yielding every `step`-th frame; the reported frame
    /// indices stay the true physical indices.
    pub fn open_with_step(path: &Path, step: u64) -> Result<Self, ScanError> {
        if !path.is_file() {
            return Err(unavailable(path, "file not found"));
        }

        let (width, height, fps) = probe(path)?;
        debug!(
            "🎞 {}: {}x{} @ {} fps",
            path.display(),
            width,
            height,
            fps
        );

        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| unavailable(path, &format!("ffmpeg failed to start: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| unavailable(path, "ffmpeg stdout unavailable"))?;

        Ok(Self {
            path: path.to_path_buf(),
            child,
            stdout: BufReader::new(stdout),
            width,
            height,
            fps,
            step: step.max(1),
            next_index: 0,
            finished: false,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_physical_frame(&mut self) -> Result<Option<RgbImage>, ScanError> {
        let frame_size = (self.width * self.height * 3) as usize;
        let mut buffer = vec![0u8; frame_size];
        match self.stdout.read_exact(&mut buffer) {
            Ok(()) => {
                let image = RgbImage::from_raw(self.width, self.height, buffer)
                    .ok_or_else(|| unavailable(&self.path, "decoded frame has wrong size"))?;
                Ok(Some(image))
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.finished = true;
                let _ = self.child.wait();
                Ok(None)
            }
            Err(e) => Err(ScanError::Io(e)),
        }
    }
}

impl FrameSource for VideoFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, ScanError> {
        if self.finished {
            return Ok(None);
        }
        loop {
            let index = self.next_index;
            match self.read_physical_frame()? {
                None => return Ok(None),
                Some(image) => {
                    self.next_index += 1;
                    if index % self.step == 0 {
                        return Ok(Some(Frame::new(index, image, self.fps)));
                    }
                }
            }
        }
    }

    fn fps(&self) -> u32 {
        self.fps
    }
}

impl Drop for VideoFrameSource {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

fn unavailable(path: &Path, reason: &str) -> ScanError {
    ScanError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn probe(path: &Path) -> Result<(u32, u32, u32), ScanError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| unavailable(path, &format!("ffprobe failed to start: {e}")))?;

    if !output.status.success() {
        return Err(unavailable(
            path,
            &format!("ffprobe exited with {}", output.status),
        ));
    }

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| unavailable(path, &format!("unreadable ffprobe output: {e}")))?;
    let stream = value["streams"]
        .get(0)
        .ok_or_else(|| unavailable(path, "no video stream"))?;

    let width = stream["width"].as_u64().unwrap_or(0) as u32;
    let height = stream["height"].as_u64().unwrap_or(0) as u32;
    if width == 0 || height == 0 {
        return Err(unavailable(path, "missing stream dimensions"));
    }

    let fps = stream["r_frame_rate"]
        .as_str()
        .and_then(parse_frame_rate)
        .unwrap_or(30);

    Ok((width, height, fps))
}

fn parse_frame_rate(raw: &str) -> Option<u32> {
    let (num, den) = raw.split_once('/')?;
    let num: u64 = num.trim().parse().ok()?;
    let den: u64 = den.trim().parse().ok()?;
    if num == 0 || den == 0 {
        return None;
    }
    Some((num / den).max(1) as u32)
}

/// In-memory source for tests and synthetic sequences.
pub struct MemoryFrameSource {
    frames: VecDeque<RgbImage>,
    fps: u32,
    step: u64,
    next_index: u64,
}

impl MemoryFrameSource {
    pub fn new(frames: Vec<RgbImage>, fps: u32) -> Self {
        Self::with_step(frames, fps, 1)
    }

    pub fn with_step(frames: Vec<RgbImage>, fps: u32, step: u64) -> Self {
        Self {
            frames: frames.into(),
            fps,
            step: step.max(1),
            next_index: 0,
        }
    }
}

impl FrameSource for MemoryFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, ScanError> {
        while let Some(image) = self.frames.pop_front() {
            let index = self.next_index;
            self.next_index += 1;
            if index % self.step == 0 {
                return Ok(Some(Frame::new(index, image, self.fps)));
            }
        }
        Ok(None)
    }

    fn fps(&self) -> u32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(value: u8) -> RgbImage {
        RgbImage::from_pixel(4, 4, image::Rgb([value, value, value]))
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let err = VideoFrameSource::open(Path::new("/nonexistent/clip.mp4")).unwrap_err();
        assert!(matches!(err, ScanError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_memory_source_sequential_indices() {
        let mut source = MemoryFrameSource::new(vec![solid(1), solid(2), solid(3)], 30);
        let mut indices = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            indices.push(frame.index);
        }
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_memory_source_step_keeps_true_indices() {
        let frames = (0..7).map(solid).collect();
        let mut source = MemoryFrameSource::with_step(frames, 30, 3);
        let mut indices = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            indices.push(frame.index);
        }
        assert_eq!(indices, vec![0, 3, 6]);
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30));
        assert_eq!(parse_frame_rate("60000/1001"), Some(59));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("garbage"), None);
    }
}
