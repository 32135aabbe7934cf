//! Serve command - run the HTTP tile server until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};
use crate::server;

/// Arguments for the serve command.
pub struct ServeArgs {
    pub bind: Option<SocketAddr>,
}

/// Run the serve command.
pub fn run(args: ServeArgs, options: &GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("serve");

    // CLI > config
    let bind = args.bind.unwrap_or(runner.config().server.bind);

    let app = Arc::new(runner.start_app()?);
    let runtime = runner.runtime()?;

    let result = runtime.block_on(server::serve(Arc::clone(&app), bind));

    app.shutdown();
    info!(telemetry = %app.telemetry_snapshot(), "Tile server stopped");

    // Workers hold the runtime; the app owns a blocking HTTP client that
    // must be dropped outside of it.
    drop(runtime);
    drop(app);

    result
}
