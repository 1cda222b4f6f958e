//! pgscript - run a SQL script through psql and report a JSON result.

use pgscript::cli::Cli;
use pgscript::config::{Config, ConnectionParams};
use pgscript::error::Result;
use pgscript::result::ExecutionResult;
use pgscript::runner::{check_client, SqlRunner};
use pgscript::{host, logging};
use tracing::{error, info};

fn main() {
    // Load .env before clap reads env-backed flags
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!(category = e.category(), "{e}");
            std::process::exit(2);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let (runner, params) = match prepare(cli) {
        Ok(prepared) => prepared,
        // A host reads its result from stdout, so setup errors become a failed result
        Err(e) if cli.args_file.is_some() => {
            error!(category = e.category(), "{e}");
            let result = ExecutionResult::setup_failure(&ConnectionParams::new(""), &e);
            host::emit(&result, cli.pretty, std::io::stdout().lock())?;
            return Ok(result.exit_code());
        }
        Err(e) => return Err(e),
    };

    let result = runner.run(&params);

    host::emit(&result, cli.pretty, std::io::stdout().lock())?;
    Ok(result.exit_code())
}

/// Loads config, resolves the parameters and builds the runner.
fn prepare(cli: &Cli) -> Result<(SqlRunner, ConnectionParams)> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let client = cli.client(&config);
    check_client(&client)?;

    let params = cli.resolve_params(&config)?;

    let runner = SqlRunner::new()
        .client(client)
        .mode(cli.classification_mode(&config));
    Ok((runner, params))
}
