use image::RgbImage;
use opencv::{core::Mat, highgui, imgproc, prelude::*};

use plate_watch::error::WatchError;
use plate_watch::LoopControl;

const WINDOW_TITLE: &str = "plate-watch";

/// Show one annotated frame and poll the keyboard; `q` requests shutdown.
/// The frame buffer is RGB, highgui wants BGR.
pub fn show(frame: &RgbImage) -> Result<LoopControl, WatchError> {
    let mat = Mat::from_slice(frame.as_raw())?;
    let mat = mat.reshape(3, frame.height() as i32)?;
    let mut bgr = Mat::default();
    imgproc::cvt_color(&mat, &mut bgr, imgproc::COLOR_RGB2BGR, 0)?;

    highgui::imshow(WINDOW_TITLE, &bgr)?;
    let key = highgui::wait_key(1)?;
    if key == 'q' as i32 {
        Ok(LoopControl::Quit)
    } else {
        Ok(LoopControl::Continue)
    }
}

pub fn close() -> Result<(), WatchError> {
    highgui::destroy_all_windows()?;
    Ok(())
}
