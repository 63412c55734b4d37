use log::{error, info};

use crate::config::DetectorConfig;
use crate::input::{resolve, InputTarget, Resolved};
use crate::manifest::Manifest;
use crate::media::MediaOpener;
use crate::session::{LandmarkSession, RunSummary};
use crate::Result;

/// Resolves the configured input and drives `session` over it.
///
/// Inputs that turn out to be unusable (no camera, unreadable manifest) are
/// reported and produce an empty summary rather than an error.
pub fn run(
    config: &DetectorConfig,
    media: &dyn MediaOpener,
    session: &mut LandmarkSession,
) -> Result<RunSummary> {
    let target = InputTarget::parse(&config.input);
    match resolve(&target, &config.fallback_image, media)? {
        Resolved::Stream { mut source, label } => {
            info!("Video capturing from {} has been started ...", label);
            session.run_stream(source.as_mut())
        }
        Resolved::Image { path, image } => {
            info!("Detecting landmarks in {}", path.display());
            session.run_image(&image)
        }
        Resolved::Manifest(path) => {
            info!("Detecting landmarks in images listed in {}", path.display());
            match Manifest::open(&path) {
                Ok(manifest) => session.run_manifest(manifest, media),
                Err(e) => {
                    error!("Could not read {}: {}", path.display(), e);
                    Ok(RunSummary::default())
                }
            }
        }
        Resolved::Unavailable(reason) => {
            error!("{}", reason);
            Ok(RunSummary::default())
        }
    }
}
