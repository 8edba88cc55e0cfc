use clap::{value_parser, Arg, ArgMatches, Command};
use mo_kernel::client::MongoConnector;
use mo_kernel::config::{DriverConfig, LogFormat};
use mo_kernel::executor::{CommandExecutor, MongoOrchestrationService};
use mo_kernel::runner::TestRunner;
use mo_kernel::{logging, DriverError};
use mo_spec::TestSpecification;
use std::path::PathBuf;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("mo-driver")
        .version(mo_kernel::VERSION)
        .about("Run a topology test specification against mongo-orchestration")
        .arg(
            Arg::new("test")
                .value_name("TEST")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Test specification file (extended JSON)"),
        )
        .arg(
            Arg::new("orchestration-uri")
                .value_name("ORCHESTRATION_URI")
                .help("Orchestration service URI [default: mongodb://127.0.0.1/]"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .value_name("NAME")
                .help("Default database for client operations"),
        )
        .arg(
            Arg::new("collection")
                .long("collection")
                .value_name("NAME")
                .help("Default collection for client operations"),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .value_name("MS")
                .value_parser(value_parser!(u64))
                .help("Bound on every orchestration and database call"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_parser(["compact", "json"])
                .help("Log line layout"),
        )
}

/// Defaults, then the TOML file, then flags
fn build_config(args: &ArgMatches) -> Result<DriverConfig, DriverError> {
    let mut config = DriverConfig::load(args.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    if let Some(uri) = args.get_one::<String>("orchestration-uri") {
        config = config.with_orchestration_uri(uri);
    }
    if let Some(database) = args.get_one::<String>("database") {
        config = config.with_database(database);
    }
    if let Some(collection) = args.get_one::<String>("collection") {
        config = config.with_collection(collection);
    }
    if let Some(timeout_ms) = args.get_one::<u64>("timeout-ms") {
        config = config.with_command_timeout_ms(*timeout_ms);
    }
    if let Some(format) = args.get_one::<String>("log-format") {
        config = config.with_log_format(format.parse::<LogFormat>()?);
    }

    config.validate()?;
    Ok(config)
}

async fn run(config: DriverConfig, test: PathBuf) -> Result<(), DriverError> {
    let spec = TestSpecification::load(&test)?;

    let service = MongoOrchestrationService::connect(
        &config.orchestration_uri,
        &config.orchestration_database,
    )
    .await?;
    let executor = Arc::new(CommandExecutor::new(Arc::new(service), config.command_timeout()));
    let runner = TestRunner::new(config, executor, Arc::new(MongoConnector));

    let summary = runner.run(&spec).await?;
    tracing::info!(
        description = %summary.description,
        deployment = %summary.deployment_id,
        phases = summary.phases.total(),
        "test passed"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let config = match build_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mo-driver: {e}");
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = logging::init(config.log_format) {
        eprintln!("mo-driver: failed to initialize logging: {e:#}");
        std::process::exit(2);
    }

    let Some(test) = matches.get_one::<PathBuf>("test").cloned() else {
        eprintln!("mo-driver: missing test specification");
        std::process::exit(2);
    };

    if let Err(e) = run(config, test).await {
        tracing::error!(error = %e, "test run failed");
        if let Some(reply) = e.reply() {
            tracing::error!("reply: {}", mo_spec::document::to_relaxed_json(reply));
        }
        std::process::exit(e.exit_code());
    }
}
