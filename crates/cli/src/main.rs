use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde::Serialize;

use facefind_core::capture::infrastructure::image_file_source::ImageFileSource;
use facefind_core::detection::domain::detection_config::{DetectionConfig, DetectionFlags};
use facefind_core::detection::infrastructure::cascade_detector::CascadeFaceDetector;
use facefind_core::pipeline::capture_loop::CaptureLoop;
use facefind_core::pipeline::detect_faces_use_case::DetectFacesUseCase;
use facefind_core::pipeline::detection_result::DetectionResult;
use facefind_core::shared::constants::{
    DEFAULT_DOWNSCALE, DEFAULT_MIN_NEIGHBORS, DEFAULT_MIN_SIZE, DEFAULT_SCALE_FACTOR,
};
use facefind_core::shared::frame::Frame;

/// Face localization over an image or a directory of frames.
#[derive(Parser)]
#[command(name = "facefind")]
struct Cli {
    /// Input image, or a directory of frames processed in sorted order.
    input: PathBuf,

    /// Output image, or output directory when the input is a directory.
    /// Omit to skip writing annotated frames.
    output: Option<PathBuf>,

    /// Cascade classifier description (JSON).
    #[arg(long)]
    cascade: PathBuf,

    /// Frame shrink factor applied before searching.
    #[arg(long, default_value_t = DEFAULT_DOWNSCALE)]
    downscale: f64,

    /// Step between successive search window sizes (> 1.0).
    #[arg(long, default_value_t = DEFAULT_SCALE_FACTOR)]
    scale_factor: f64,

    /// Raw hits a neighborhood needs to count as a detection.
    #[arg(long, default_value_t = DEFAULT_MIN_NEIGHBORS)]
    min_neighbors: u32,

    /// Smallest window edge searched, in downscaled pixels.
    #[arg(long, default_value_t = DEFAULT_MIN_SIZE)]
    min_size: u32,

    /// Largest window edge searched; defaults to the frame bounds.
    #[arg(long)]
    max_size: Option<u32>,

    /// Report only the largest detection.
    #[arg(long)]
    biggest_only: bool,

    /// Stop searching further scales once an object qualifies
    /// (requires --biggest-only and min-neighbors > 0).
    #[arg(long)]
    rough_search: bool,

    /// Skip windows with implausible edge density.
    #[arg(long)]
    canny_pruning: bool,

    /// Downscale the image per search scale instead of zooming features
    /// (exclusive with the other flags).
    #[arg(long)]
    scale_image: bool,

    /// Append one JSON record per processed frame to this file.
    #[arg(long)]
    log_json: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    config.validate()?;

    let mut detector = CascadeFaceDetector::from_file(&cli.cascade, cli.downscale)?;
    detector.set_config(config);

    let multi_frame = cli.input.is_dir();
    let source = ImageFileSource::open(&cli.input)?;
    let use_case = DetectFacesUseCase::new(Box::new(detector));
    let mut capture = CaptureLoop::new(Box::new(source), use_case);

    if let Some(ref dir) = cli.output {
        if multi_frame {
            std::fs::create_dir_all(dir)?;
        }
    }
    let mut json_logger = match cli.log_json {
        Some(ref path) => Some(JsonLogger::create(path)?),
        None => None,
    };

    let mut sink_err: Option<Box<dyn std::error::Error>> = None;
    let processed = capture.run(|frame, result| {
        match handle_frame(&frame, result, cli.output.as_deref(), multi_frame, &mut json_logger) {
            Ok(()) => true,
            Err(e) => {
                sink_err = Some(e);
                false
            }
        }
    })?;
    if let Some(e) = sink_err {
        return Err(e);
    }

    if let Some(logger) = json_logger.as_mut() {
        logger.flush()?;
    }
    log::info!("processed {processed} frame(s)");
    Ok(())
}

fn build_config(cli: &Cli) -> DetectionConfig {
    let mut flags = DetectionFlags::empty();
    if cli.scale_image {
        flags = flags | DetectionFlags::SCALE_IMAGE;
    }
    if cli.canny_pruning {
        flags = flags | DetectionFlags::CANNY_PRUNING;
    }
    if cli.biggest_only {
        flags = flags | DetectionFlags::BIGGEST_OBJECT_ONLY;
    }
    if cli.rough_search {
        flags = flags | DetectionFlags::ROUGH_SEARCH;
    }
    DetectionConfig {
        scale_factor: cli.scale_factor,
        min_neighbors: cli.min_neighbors,
        flags,
        min_size: (cli.min_size, cli.min_size),
        max_size: cli.max_size.map(|edge| (edge, edge)),
    }
}

fn handle_frame(
    frame: &Frame,
    result: &DetectionResult,
    output: Option<&Path>,
    multi_frame: bool,
    json_logger: &mut Option<JsonLogger>,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("frame {}: {} face(s)", frame.index(), result.len());

    if let Some(logger) = json_logger.as_mut() {
        logger.write_event(&FrameRecord {
            event: "frame",
            frame: frame.index(),
            faces: result.len(),
            detections: result,
        })?;
    }

    if let Some(output) = output {
        let path = output_path_for(output, multi_frame, frame.index());
        save_frame(frame, &path)?;
    }
    Ok(())
}

/// Single images write straight to `output`; frame sequences get numbered
/// files inside it.
fn output_path_for(output: &Path, multi_frame: bool, index: usize) -> PathBuf {
    if multi_frame {
        output.join(format!("frame_{index:05}.png"))
    } else {
        output.to_path_buf()
    }
}

fn save_frame(frame: &Frame, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or("frame buffer does not match its dimensions")?;
    img.save(path)?;
    Ok(())
}

#[derive(Serialize)]
struct FrameRecord<'a> {
    event: &'static str,
    frame: usize,
    faces: usize,
    detections: &'a DetectionResult,
}

/// Newline-delimited JSON detection log.
struct JsonLogger {
    writer: BufWriter<File>,
}

impl JsonLogger {
    fn create(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn write_event<T: Serialize>(&mut self, event: &T) -> Result<(), Box<dyn std::error::Error>> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli::parse_from(["facefind", "input.png", "--cascade", "cascade.json"])
    }

    #[test]
    fn test_default_config_matches_library_defaults() {
        let cli = base_cli();
        let config = build_config(&cli);
        assert_eq!(config, DetectionConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = Cli::parse_from([
            "facefind",
            "input.png",
            "--cascade",
            "cascade.json",
            "--biggest-only",
            "--rough-search",
            "--min-neighbors",
            "3",
            "--min-size",
            "40",
            "--max-size",
            "120",
        ]);
        let config = build_config(&cli);
        assert!(config.flags.contains(DetectionFlags::BIGGEST_OBJECT_ONLY));
        assert!(config.flags.contains(DetectionFlags::ROUGH_SEARCH));
        assert_eq!(config.min_neighbors, 3);
        assert_eq!(config.min_size, (40, 40));
        assert_eq!(config.max_size, Some((120, 120)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scale_image_with_other_flags_fails_validation() {
        let cli = Cli::parse_from([
            "facefind",
            "input.png",
            "--cascade",
            "cascade.json",
            "--scale-image",
            "--biggest-only",
        ]);
        assert!(build_config(&cli).validate().is_err());
    }

    #[test]
    fn test_output_path_single_frame_is_verbatim() {
        let path = output_path_for(Path::new("out.png"), false, 7);
        assert_eq!(path, PathBuf::from("out.png"));
    }

    #[test]
    fn test_output_path_sequence_is_numbered() {
        let path = output_path_for(Path::new("out"), true, 7);
        assert_eq!(path, PathBuf::from("out/frame_00007.png"));
    }

    #[test]
    fn test_json_logger_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let mut logger = JsonLogger::create(&path).unwrap();

        let result: DetectionResult = Vec::new();
        logger
            .write_event(&FrameRecord {
                event: "frame",
                frame: 0,
                faces: 0,
                detections: &result,
            })
            .unwrap();
        logger
            .write_event(&FrameRecord {
                event: "frame",
                frame: 1,
                faces: 0,
                detections: &result,
            })
            .unwrap();
        logger.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"event\":\"frame\""));
        assert!(lines[1].contains("\"frame\":1"));
    }
}
