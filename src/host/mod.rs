//! Headless Hosts
//!
//! Thin adapters that stand in for a window toolkit: they own a display
//! surface, turn their input into triggers and report the outcomes.

pub mod file_surface;
pub mod stdio;
pub mod watch;

use std::path::Path;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncWriteExt;

use crate::config::{Command, Config};
use crate::render::{
    ChannelSurface, CommonMarkConverter, DeliveryReport, DisplaySurface, HtmlTemplate, ReadyWait,
    RenderQueue, Renderer, surface_ready,
};
use crate::session::{EditController, Outcome, Trigger};

pub use file_surface::FileSurface;
pub use stdio::{HostEvent, HostMessage, serve};
pub use watch::{MarkdownWatcher, WatchEvent, watch_markdown};

/// Controller delivering to `surface` once `ready` fires
pub fn preview_controller<S: DisplaySurface>(
    config: &Config,
    surface: S,
    ready: ReadyWait,
) -> EditController {
    let queue = RenderQueue::spawn(surface, ready, config.asset_mapping());
    let renderer = Renderer::new(
        CommonMarkConverter::new(),
        HtmlTemplate::new(&config.virtual_host),
    );
    EditController::from_config(config, renderer, queue)
}

/// Run a command from the command line
pub async fn run(config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Render { file, output } => render_file(config, &file, output.as_deref()).await,
        Command::Watch { file, output } => watch_file(config, &file, &output).await,
        Command::Serve => serve(config).await,
    }
}

/// Render a markdown file once, to `output` or to standard output
pub async fn render_file(config: &Config, file: &Path, output: Option<&Path>) -> Result<()> {
    match output {
        Some(output) => load_and_display(config, FileSurface::new(output), file).await,
        None => {
            let (surface, mut documents) = ChannelSurface::new();
            load_and_display(config, surface, file).await?;
            let html = documents
                .recv()
                .await
                .context("Preview document was not produced")?;

            let mut stdout = tokio::io::stdout();
            stdout.write_all(html.as_bytes()).await?;
            stdout.flush().await?;
            Ok(())
        }
    }
}

async fn load_and_display<S: DisplaySurface>(
    config: &Config,
    surface: S,
    file: &Path,
) -> Result<()> {
    let (signal, ready) = surface_ready();
    let mut controller = preview_controller(config, surface, ready);
    let mut reports = controller
        .queue_mut()
        .take_reports()
        .context("Delivery reports already taken")?;
    signal.mark_ready();

    match controller.dispatch(Trigger::FilesDropped(vec![file.to_path_buf()])) {
        Outcome::Failed(e) => return Err(e.into()),
        Outcome::RenderFailed { message } => bail!(message),
        Outcome::Refreshed { rendered: true } => {}
        other => bail!("Nothing rendered for {}: {:?}", file.display(), other),
    }

    match reports.recv().await {
        Some(DeliveryReport::Delivered { .. }) => Ok(()),
        Some(DeliveryReport::Failed { message, .. }) => bail!(message),
        None => bail!("Preview delivery stopped unexpectedly"),
    }
}

/// Re-render `file` into `output` every time it changes on disk
pub async fn watch_file(config: &Config, file: &Path, output: &Path) -> Result<()> {
    let (signal, ready) = surface_ready();
    let mut controller = preview_controller(config, FileSurface::new(output), ready);
    let mut reports = controller
        .queue_mut()
        .take_reports()
        .context("Delivery reports already taken")?;
    signal.mark_ready();

    let output_name = output.display().to_string();
    tokio::spawn(async move {
        while let Some(report) = reports.recv().await {
            match report {
                DeliveryReport::Delivered { generation } => {
                    log::info!("Preview {} written to {}", generation, output_name)
                }
                DeliveryReport::Failed { message, .. } => log::error!("{}", message),
            }
        }
    });

    let mut watcher = watch_markdown(file)?;
    let reload = || Trigger::FilesDropped(vec![file.to_path_buf()]);

    log_outcome(controller.dispatch(reload()));
    while let Some(event) = watcher.next().await {
        match event {
            WatchEvent::Changed => log_outcome(controller.dispatch(reload())),
            WatchEvent::Error(e) => log::error!("File watcher error: {}", e),
        }
    }
    Ok(())
}

fn log_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Failed(e) => log::error!("{}", e),
        Outcome::RenderFailed { message } => log::warn!("Preview not updated: {}", message),
        Outcome::Refreshed { rendered: false } => log::debug!("Preview unchanged"),
        other => log::debug!("{:?}", other),
    }
}
