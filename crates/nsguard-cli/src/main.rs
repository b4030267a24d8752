//! Main entry point for the nsguard CLI.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use nsguard_client::PortalProviders;
use nsguard_cli::{
    Cli, Command, Configuration, DeleteSession, SessionOutcome, TerminalNotifier,
    TerminalPresentation, TerminalPrompt, exit_status, init_logging,
    shutdown::{ShutdownSignal, wait_for_signal},
};
use nsguard_common::GuardError;
use nsguard_core::{DeletionGuard, EventBus, GuardProviders};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let configuration = Configuration::new(&cli)?;
    let logging_guard = init_logging(&configuration.logging_config())?;

    let Command::Delete(args) = cli.command;

    let portal = Arc::new(PortalProviders::new(configuration.portal_client_config())?);
    let (presentation, dialogs) = TerminalPresentation::new();
    let guard_config = configuration.guard_config();
    let guard = Arc::new(DeletionGuard::new(
        GuardProviders {
            users: portal.clone(),
            permissions: portal.clone(),
            namespaces: portal.clone(),
            notifier: Arc::new(TerminalNotifier),
            presentation: Arc::new(presentation),
        },
        &guard_config,
        EventBus::new(guard_config.event_capacity),
    ));

    let shutdown = ShutdownSignal::new();
    let guard_task = tokio::spawn(guard.clone().run(shutdown.subscribe()));

    let session = DeleteSession::new(
        guard,
        portal,
        dialogs,
        Arc::new(TerminalPrompt::new(args.yes)),
    );
    let result = tokio::select! {
        result = session.run(&args.app, args.env, &args.cluster, &args.namespace) => Some(result),
        _ = wait_for_signal() => None,
    };

    shutdown.shutdown();
    if let Err(e) = guard_task.await {
        error!("Guard task failed: {}", e);
    }

    let Some(result) = result else {
        warn!("Interrupted, namespace kept");
        // An open stdin read would keep the runtime from shutting down
        drop(logging_guard);
        std::process::exit(130);
    };

    match result {
        Ok(SessionOutcome::Refused(err)) => {
            report(&err);
            Ok(ExitCode::from(exit_status(&err)))
        }
        Ok(outcome) => {
            info!(?outcome, "Session finished");
            Ok(ExitCode::from(outcome.exit_status()))
        }
        Err(e) => match e.downcast_ref::<GuardError>() {
            Some(err) => {
                report(err);
                Ok(ExitCode::from(exit_status(err)))
            }
            None => Err(e),
        },
    }
}

fn report(err: &GuardError) {
    let code = err.code();
    if err.is_rejection() {
        warn!(code = code.code, "Deletion refused: {}", err);
        eprintln!("Refused [{}]: {}", code.code, err);
    } else {
        error!(code = code.code, "Deletion failed: {}", err);
        eprintln!("Failed [{}]: {}", code.code, err);
    }
}
