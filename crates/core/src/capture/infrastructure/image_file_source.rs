use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Adapts still images to the [`FrameSource`] interface.
///
/// A single file becomes a one-frame stream; a directory is served as the
/// lexicographically sorted sequence of its image files, one per tick.
/// Decoding happens lazily at each pull so the source never holds more than
/// the frame currently in flight.
pub struct ImageFileSource {
    pending: VecDeque<PathBuf>,
    next_index: usize,
}

impl ImageFileSource {
    pub fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let mut pending: VecDeque<PathBuf> = VecDeque::new();

        if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| is_image_file(p))
                .collect();
            files.sort();
            if files.is_empty() {
                return Err(format!("no image files in {}", path.display()).into());
            }
            pending.extend(files);
        } else if path.is_file() {
            pending.push_back(path.to_path_buf());
        } else {
            return Err(format!("no such input: {}", path.display()).into());
        }

        Ok(Self {
            pending,
            next_index: 0,
        })
    }

    /// Frames not yet served.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

impl FrameSource for ImageFileSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let rgb = image::open(&path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        let frame = Frame::new(rgb.into_raw(), width, height, 3, self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_image(dir: &Path, name: &str, w: u32, h: u32, rgb: [u8; 3]) -> PathBuf {
        let path = dir.join(name);
        let mut img = image::RgbImage::new(w, h);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb(rgb);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_single_file_yields_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "only.png", 8, 6, [10, 20, 30]);

        let mut source = ImageFileSource::open(&path).unwrap();
        assert_eq!(source.remaining(), 1);

        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.width(), 8);
        assert_eq!(frame.height(), 6);
        assert_eq!(frame.index(), 0);
        assert_eq!(frame.pixel(0, 0), &[10, 20, 30]);

        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_directory_served_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "b.png", 4, 4, [2, 2, 2]);
        write_image(dir.path(), "a.png", 4, 4, [1, 1, 1]);
        write_image(dir.path(), "c.png", 4, 4, [3, 3, 3]);

        let mut source = ImageFileSource::open(dir.path()).unwrap();
        assert_eq!(source.remaining(), 3);

        let first = source.next_frame().unwrap().unwrap();
        let second = source.next_frame().unwrap().unwrap();
        let third = source.next_frame().unwrap().unwrap();
        assert_eq!(first.pixel(0, 0), &[1, 1, 1]);
        assert_eq!(second.pixel(0, 0), &[2, 2, 2]);
        assert_eq!(third.pixel(0, 0), &[3, 3, 3]);
        assert_eq!(third.index(), 2);
    }

    #[test]
    fn test_non_image_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "frame.png", 4, 4, [1, 1, 1]);
        std::fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();

        let source = ImageFileSource::open(dir.path()).unwrap();
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageFileSource::open(dir.path()).is_err());
    }

    #[test]
    fn test_missing_path_is_an_error() {
        assert!(ImageFileSource::open(Path::new("/nonexistent/frames")).is_err());
    }

    #[test]
    fn test_exhausted_source_keeps_returning_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "only.png", 4, 4, [1, 1, 1]);

        let mut source = ImageFileSource::open(&path).unwrap();
        let _ = source.next_frame().unwrap();
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_undecodable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"this is not a png").unwrap();

        let mut source = ImageFileSource::open(&path).unwrap();
        assert!(source.next_frame().is_err());
    }
}
