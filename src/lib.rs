pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;

use std::sync::Arc;

use anyhow::{Context, Result};
use app::{
    clock::{Clock, FixedClock, SystemClock},
    context::EngineContext,
    events::ScreenEvent,
    poller::{PollState, Screen, ScreenController},
    report::{render_locations, render_report},
    settings::{ServiceSettings, initial_params},
};
use cli::{AddArgs, Cli, Command};
use data::{
    measurements::HttpMeasurementClient,
    registry::LocationRegistry,
    store::{FileStore, KeyValueStore},
};
use domain::location::Coordinate;
use log::{info, warn};
use tokio::sync::mpsc;

pub async fn run(cli: Cli) -> Result<()> {
    cli.validate()?;
    let settings = ServiceSettings::from_cli(&cli)?;

    let mut registry = LocationRegistry::new(FileStore::new(settings.config_dir.clone()));
    registry.load().await;
    let mut ctx = EngineContext::new(initial_params(&cli), registry);

    match &cli.command {
        Command::Locations => {
            print!("{}", render_locations(ctx.registry.locations()));
            Ok(())
        }
        Command::Add(args) => add_location(&mut ctx, args).await,
        Command::Forecast(args) => {
            let mut controller = build_controller(&cli, &settings, args.screen())?;
            let result = fetch_once(&mut controller, &ctx).await;
            print!("{}", render_report(&controller, &ctx.params));
            result
        }
        Command::Watch(args) => {
            let mut controller = build_controller(&cli, &settings, args.screen())?;
            watch(&mut controller, &ctx).await
        }
    }
}

fn build_controller(
    cli: &Cli,
    settings: &ServiceSettings,
    screen: Screen,
) -> Result<ScreenController> {
    let endpoint = settings
        .api_url
        .clone()
        .context("no measurement service endpoint configured")?;
    let client = HttpMeasurementClient::new(endpoint, settings.credentials.clone())?;
    let clock: Arc<dyn Clock> = match cli.today {
        Some(today) => Arc::new(FixedClock::new(today)),
        None => Arc::new(SystemClock),
    };
    Ok(ScreenController::new(screen, Arc::new(client), clock))
}

async fn add_location<S: KeyValueStore>(ctx: &mut EngineContext<S>, args: &AddArgs) -> Result<()> {
    let created = ctx
        .registry
        .create(
            &args.name,
            &args.description,
            Coordinate::new(args.lat, args.lon),
        )
        .await?;
    println!(
        "{}  {}",
        created.location.id,
        created.location.display_name()
    );
    match created.persist_error {
        Some(err) => Err(anyhow::Error::new(err).context("location was not written to disk")),
        None => Ok(()),
    }
}

/// Makes the screen visible, waits for its first fetch to settle and hides
/// it again. Fails when no request could be built or the fetch failed.
pub async fn fetch_once<S: KeyValueStore>(
    controller: &mut ScreenController,
    ctx: &EngineContext<S>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(16);
    controller.handle_event(ScreenEvent::BecameVisible, ctx, &tx);

    while controller.state() == PollState::Fetching {
        let Some(event) = rx.recv().await else {
            break;
        };
        controller.handle_event(event, ctx, &tx);
    }
    controller.handle_event(ScreenEvent::LostVisibility, ctx, &tx);

    match controller.last_error() {
        Some(err) => Err(err.clone().into()),
        None => Ok(()),
    }
}

/// Keeps the screen visible until Ctrl-C, printing a report after every
/// fetch result.
pub async fn watch<S: KeyValueStore>(
    controller: &mut ScreenController,
    ctx: &EngineContext<S>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(16);
    controller.handle_event(ScreenEvent::BecameVisible, ctx, &tx);
    if controller.state() != PollState::Fetching
        && let Some(err) = controller.last_error().cloned()
    {
        controller.handle_event(ScreenEvent::LostVisibility, ctx, &tx);
        return Err(err.into());
    }

    loop {
        tokio::select! {
            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else {
                    break;
                };
                let settled = matches!(
                    event,
                    ScreenEvent::FetchSucceeded { .. } | ScreenEvent::FetchFailed { .. }
                );
                controller.handle_event(event, ctx, &tx);
                if settled {
                    print!("{}", render_report(controller, &ctx.params));
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!("listening for Ctrl-C failed: {err}");
                }
                info!("stopping watch on {}", controller.screen().label());
                break;
            }
        }
    }

    controller.handle_event(ScreenEvent::LostVisibility, ctx, &tx);
    Ok(())
}
