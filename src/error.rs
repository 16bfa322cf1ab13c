use ffmpeg_cmdline_utils::FfmpegErrorKind;
use image::ImageError;
#[cfg(feature = "display")]
use opencv::Error as CvError;
use tensorflow::Status;

use std::error::Error;
use std::fmt;
use std::io::Error as IOError;
use std::path::PathBuf;

#[derive(Debug)]
pub struct WatchError(WatchErrorKind);

#[derive(Debug)]
pub enum WatchErrorKind {
    IOError(IOError),
    TensorflowError(Status),
    ImageError(ImageError),
    VideoError(FfmpegErrorKind),
    FontError(PathBuf),
    /// confidence from the OCR graph was NaN or infinite, refuse to format it
    Confidence(f32),
    #[cfg(feature = "display")]
    DisplayError(CvError),
}

impl WatchError {
    fn kind(&self) -> &WatchErrorKind {
        &self.0
    }

    pub fn bad_font(path: impl Into<PathBuf>) -> Self {
        Self(WatchErrorKind::FontError(path.into()))
    }

    pub fn bad_confidence(value: f32) -> Self {
        Self(WatchErrorKind::Confidence(value))
    }
}

impl<T> From<T> for WatchError
where T: Into<WatchErrorKind>
{
    fn from(e: T) -> Self {
        Self(e.into())
    }
}

impl fmt::Display for WatchError {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            WatchErrorKind::IOError(e) => e.fmt(f),
            WatchErrorKind::TensorflowError(e) => e.fmt(f),
            WatchErrorKind::ImageError(e) => e.fmt(f),
            WatchErrorKind::VideoError(e) => write!(f, "video decode failed: {}", e),
            WatchErrorKind::FontError(path) => write!(f, "not a usable ttf font: {:?}", path),
            WatchErrorKind::Confidence(v) => write!(f, "confidence is not a finite number: {}", v),
            #[cfg(feature = "display")]
            WatchErrorKind::DisplayError(e) => e.fmt(f),
        }
    }
}

impl Error for WatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.kind() {
            WatchErrorKind::IOError(e) => e.source(),
            WatchErrorKind::TensorflowError(e) => e.source(),
            WatchErrorKind::ImageError(e) => e.source(),
            WatchErrorKind::VideoError(_) => None,
            WatchErrorKind::FontError(_) => None,
            WatchErrorKind::Confidence(_) => None,
            #[cfg(feature = "display")]
            WatchErrorKind::DisplayError(e) => e.source(),
        }
    }
}

impl From<IOError> for WatchErrorKind {
    fn from(e: IOError) -> Self {
        Self::IOError(e)
    }
}

impl From<Status> for WatchErrorKind {
    fn from(e: Status) -> Self {
        Self::TensorflowError(e)
    }
}

impl From<ImageError> for WatchErrorKind {
    fn from(e: ImageError) -> Self {
        Self::ImageError(e)
    }
}

impl From<FfmpegErrorKind> for WatchErrorKind {
    fn from(e: FfmpegErrorKind) -> Self {
        Self::VideoError(e)
    }
}

#[cfg(feature = "display")]
impl From<CvError> for WatchErrorKind {
    fn from(e: CvError) -> Self {
        Self::DisplayError(e)
    }
}
