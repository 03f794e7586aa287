use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mpr_volume::{
    config::Config,
    session::Viewer,
    volume_loader::{DirectorySource, VolumeLoader},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = Config::parse();
    init_logging(config.verbose);

    let descriptor = match VolumeLoader::load_descriptor(&config.descriptor).await {
        Ok(descriptor) => descriptor,
        Err(e) => {
            error!("Failed to read descriptor {}: {}", config.descriptor.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let point = config.point(&descriptor);

    let mut viewer = Viewer::new();
    viewer.load(descriptor);

    let source = DirectorySource::new(&config.base);
    let report = match VolumeLoader::load_slices(&source, &mut viewer).await {
        Ok(report) => report,
        Err(e) => {
            error!("Failed to load slices: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Loaded {} slice(s)", report.stored);
    if !report.failed.is_empty() {
        warn!("Missing slices: {:?}", report.failed);
    }

    viewer.set_point(point);
    let windowing = config
        .windowing(viewer.windowing())
        .and_then(|windowing| viewer.set_windowing(windowing.level(), windowing.width()));
    if let Err(e) = windowing {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = viewer.set_plane(config.plane) {
        error!("Cannot show {} view: {}", config.plane, e);
        return ExitCode::FAILURE;
    }

    let frame = match viewer.render(config.canvas()) {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            error!("View is not ready: {:?}", viewer.status());
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("Failed to render view: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Rendered {} view {}x{}, placed at {:?}",
        frame.plane,
        frame.buffer.width(),
        frame.buffer.height(),
        frame.geometry
    );

    let Some(image) = frame.buffer.into_image() else {
        error!("Rendered buffer has an inconsistent size");
        return ExitCode::FAILURE;
    };
    if let Err(e) = image.save(&config.output) {
        error!("Failed to write {}: {}", config.output.display(), e);
        return ExitCode::FAILURE;
    }
    info!("Wrote {}", config.output.display());

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "mpr_volume=debug"
    } else {
        "mpr_volume=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
