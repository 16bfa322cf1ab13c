use clap::{App, Arg};
use log::info;

use std::error::Error;
use std::process;

use plate_watch::alpr::Alpr;
use plate_watch::overlay::Annotator;
use plate_watch::video::VideoSource;
use plate_watch::watchlist::Watchlist;
use plate_watch::run_frame_loop;

#[cfg(feature = "display")]
mod display;
#[cfg(not(feature = "display"))]
mod headless;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("plate-watch")
        .version("0.1.0")
        .about("Overlays ALPR readings and a morphology step strip on a video")
        .arg(Arg::with_name("VIDEO")
            .help("video file to scan")
            .required(true)
            .index(1))
        .arg(Arg::with_name("detect-model")
            .long("detect-model")
            .takes_value(true)
            .default_value("./models/detect.pb")
            .help("frozen plate detection graph"))
        .arg(Arg::with_name("ocr-model")
            .long("ocr-model")
            .takes_value(true)
            .default_value("./models/ocr_plate.pb")
            .help("frozen plate OCR graph"))
        .arg(Arg::with_name("font")
            .long("font")
            .takes_value(true)
            .default_value("./fonts/DejaVuSans.ttf")
            .help("ttf font for the overlay labels"))
        .arg(Arg::with_name("watch")
            .long("watch")
            .takes_value(true)
            .multiple(true)
            .number_of_values(1)
            .help("plate to flag, repeatable; defaults to the demo pair"))
        .arg(Arg::with_name("fps")
            .long("fps")
            .takes_value(true)
            .help("frame sample rate handed to ffmpeg, e.g. 5 or 30000/1001"))
        .arg(Arg::with_name("out")
            .long("out")
            .takes_value(true)
            .default_value("out")
            .help("directory for annotated frames when built without a display"))
        .get_matches();

    let video_path = matches.value_of("VIDEO").ok_or("video file is required")?;
    let source = match VideoSource::open(video_path, matches.value_of("fps")) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error opening video {}: {}", video_path, e);
            process::exit(1);
        }
    };

    let watchlist = match matches.values_of("watch") {
        Some(plates) => Watchlist::new(plates),
        None => Watchlist::demo(),
    };
    info!("watching for {} plate(s)", watchlist.len());

    let detect_pb = matches.value_of("detect-model").ok_or("detection model path is required")?;
    let ocr_pb = matches.value_of("ocr-model").ok_or("ocr model path is required")?;
    let alpr = Alpr::new(detect_pb, ocr_pb)?;

    let font_path = matches.value_of("font").ok_or("font path is required")?;
    let annotator = Annotator::from_font_file(font_path)?;

    #[cfg(feature = "display")]
    {
        run_frame_loop(source, &alpr, &watchlist, &annotator, |_, frame| display::show(frame))?;
        display::close()?;
    }

    #[cfg(not(feature = "display"))]
    {
        let out_dir = matches.value_of("out").ok_or("output directory is required")?;
        let sink = headless::FrameWriter::new(out_dir)?;
        run_frame_loop(source, &alpr, &watchlist, &annotator, |index, frame| {
            sink.write(index, frame)
        })?;
    }

    Ok(())
}
