use ffmpeg_cmdline_utils::FfmpegFrameReaderBuilder;
use image::RgbImage;
use log::info;

use std::path::Path;

use crate::error::WatchError;

/// Sequential frames pulled from a video file through the ffmpeg command
/// line tools. One decoder child process lives behind the iterator and dies
/// with it.
pub struct VideoSource {
    frames: Box<dyn Iterator<Item = RgbImage>>,
}

impl VideoSource {

    /// Spawn the decoder. Fails when ffprobe does not recognize the path as
    /// a video, or when the reader cannot be started.
    pub fn open(path: impl AsRef<Path>, fps: Option<&str>) -> Result<Self, WatchError> {
        let path = path.as_ref();
        if let Err(e) = ffmpeg_cmdline_utils::is_video_file(path) {
            return Err(e.into());
        }

        let mut builder = FfmpegFrameReaderBuilder::new(path.to_owned());
        if let Some(fps) = fps {
            builder.fps(fps.to_string());
        }
        let (frames, info) = match builder.spawn() {
            Ok(spawned) => spawned,
            Err(e) => return Err(e.into()),
        };
        let (width, height) = info.resolution();
        info!(
            "opened video {:?}: {}x{}, {:.1}s",
            path,
            width,
            height,
            info.duration()
        );

        Ok(Self { frames: Box::new(frames) })
    }
}

impl Iterator for VideoSource {
    type Item = RgbImage;

    fn next(&mut self) -> Option<RgbImage> {
        self.frames.next()
    }
}
