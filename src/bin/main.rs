use anyhow::Context;
use landmark_detection::config::usage;
use landmark_detection::{
    app, CascadeFaceDetector, DetectorConfig, Error, HighguiViewer, Invocation, KazemiPredictor,
    LandmarkSession, OpencvMedia,
};
use log::{error, info};

const WINDOW: &str = "Landmark detection";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Invocation::from_env() {
        Invocation::Run(config) => config,
        Invocation::Exit(err) => {
            // help goes to stdout, argument errors to stderr; both exit 0
            _ = err.print();
            std::process::exit(0);
        }
    };

    // everything opened by run() is dropped before exiting
    let code = match run(&config) {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            let err = e.downcast_ref::<Error>();
            if matches!(
                err,
                Some(Error::CascadeLoad(_) | Error::ModelOpen { .. } | Error::ModelLoad { .. })
            ) {
                eprintln!("{}", usage());
            }
            err.map_or(1, Error::exit_code)
        }
    };
    std::process::exit(code);
}

fn run(config: &DetectorConfig) -> anyhow::Result<()> {
    let detector = CascadeFaceDetector::from_file(&config.cascade)?;
    let predictor = KazemiPredictor::from_file(&config.model)?;
    let viewer = HighguiViewer::new(WINDOW).context("Failed to open display window")?;

    let mut session = LandmarkSession::new(Box::new(detector), Box::new(predictor), Box::new(viewer))
        .with_style(config.render_style())
        .with_canonical_size(config.canonical_size)
        .with_stream_wait(config.stream_key_wait());

    let summary = app::run(config, &OpencvMedia, &mut session)?;
    info!(
        "Done: {} rendered, {} skipped{}",
        summary.rendered,
        summary.skipped,
        if summary.cancelled { ", stopped by user" } else { "" }
    );
    Ok(())
}
