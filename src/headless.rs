use image::RgbImage;
use log::info;

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use plate_watch::error::WatchError;
use plate_watch::LoopControl;

/// Output sink for builds without the `display` feature: annotated frames go
/// to numbered png files, Ctrl-C ends the run after the current frame.
pub struct FrameWriter {
    out_dir: PathBuf,
    quit: Arc<AtomicBool>,
}

impl FrameWriter {

    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self, Box<dyn Error>> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)?;

        let quit = Arc::new(AtomicBool::new(false));
        let handler_flag = quit.clone();
        ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))?;

        info!("writing annotated frames into {:?}", out_dir);
        Ok(Self { out_dir, quit })
    }

    pub fn write(&self, index: u64, frame: &RgbImage) -> Result<LoopControl, WatchError> {
        let path = self.out_dir.join(format!("frame_{:05}.png", index));
        frame.save(&path)?;
        if self.quit.load(Ordering::SeqCst) {
            info!("interrupted, stopping after frame {}", index);
            Ok(LoopControl::Quit)
        } else {
            Ok(LoopControl::Continue)
        }
    }
}
