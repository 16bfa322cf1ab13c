//! Pipes video frames through an ALPR model, overlays boxes and recognized
//! text, flags plates on a watchlist, and renders a strip of the classic
//! morphology steps for every detected plate region.

use image::RgbImage;
use log::{info, warn};

pub mod alpr;
pub mod error;
pub mod morphology;
pub mod overlay;
pub mod utils;
pub mod video;
pub mod watchlist;

use alpr::PlateReader;
use error::WatchError;
use overlay::AnnotateFrame;
use watchlist::Watchlist;

/// What the frame sink wants the loop to do next.
pub enum LoopControl {
    Continue,
    Quit,
}

/// The whole demo: pull frames until the stream ends or the sink asks to
/// quit; per frame run the reader, annotate every plate, hand the finished
/// frame to the sink. The sink owns output and the quit signal, so the same
/// loop drives the interactive window and the headless file writer.
pub fn run_frame_loop<R, A, F>(
    frames: impl IntoIterator<Item = RgbImage>,
    reader: &R,
    watchlist: &Watchlist,
    annotator: &A,
    mut sink: F,
) -> Result<(), WatchError>
where
    R: PlateReader,
    A: AnnotateFrame,
    F: FnMut(u64, &RgbImage) -> Result<LoopControl, WatchError>,
{
    for (index, mut frame) in frames.into_iter().enumerate() {
        let readings = reader.read_plates(&frame)?;
        if !readings.is_empty() {
            info!("frame {}: {} plate(s)", index, readings.len());
        }
        for reading in &readings {
            if watchlist.contains(&reading.text) {
                warn!("watchlisted plate {} in frame {}", reading.text, index);
            }
            annotator.annotate(&mut frame, reading, watchlist)?;
        }
        match sink(index as u64, &frame)? {
            LoopControl::Continue => {}
            LoopControl::Quit => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {

    use image::RgbImage;

    use std::cell::Cell;

    use crate::alpr::{BoundingBox, PlateReader, PlateReading};
    use crate::error::WatchError;
    use crate::overlay::AnnotateFrame;
    use crate::watchlist::Watchlist;

    use super::{run_frame_loop, LoopControl};

    struct OneReadingPerFrame;

    impl PlateReader for OneReadingPerFrame {
        fn read_plates(&self, _frame: &RgbImage) -> Result<Vec<PlateReading>, WatchError> {
            Ok(vec![PlateReading {
                bbox: BoundingBox { x1: 1.0, y1: 1.0, x2: 5.0, y2: 5.0 },
                text: "ABC123".to_string(),
                confidence: 0.5,
            }])
        }
    }

    struct CountingAnnotator {
        calls: Cell<usize>,
    }

    impl AnnotateFrame for CountingAnnotator {
        fn annotate(
            &self,
            _frame: &mut RgbImage,
            _reading: &PlateReading,
            _watchlist: &Watchlist,
        ) -> Result<(), WatchError> {
            self.calls.set(self.calls.get() + 1);
            Ok(())
        }
    }

    fn frames(count: usize) -> Vec<RgbImage> {
        (0..count).map(|_| RgbImage::new(8, 8)).collect()
    }

    #[test]
    fn loop_visits_every_frame_until_the_stream_ends() {
        let annotator = CountingAnnotator { calls: Cell::new(0) };
        let mut seen = Vec::new();

        run_frame_loop(
            frames(3),
            &OneReadingPerFrame,
            &Watchlist::demo(),
            &annotator,
            |index, _frame| {
                seen.push(index);
                Ok(LoopControl::Continue)
            },
        )
        .unwrap();

        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(annotator.calls.get(), 3);
    }

    #[test]
    fn loop_stops_when_the_sink_asks_to_quit() {
        let annotator = CountingAnnotator { calls: Cell::new(0) };
        let mut visited = 0;

        run_frame_loop(
            frames(5),
            &OneReadingPerFrame,
            &Watchlist::demo(),
            &annotator,
            |_, _| {
                visited += 1;
                Ok(LoopControl::Quit)
            },
        )
        .unwrap();

        assert_eq!(visited, 1);
        assert_eq!(annotator.calls.get(), 1);
    }
}
