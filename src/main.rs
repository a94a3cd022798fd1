//! rowshift - row materialization for database-to-database transfer.

use rowshift::cli::{Cli, OutputFormat};
use rowshift::config::Config;
use rowshift::db::{self, schema, ResultSet, SourceDatabase};
use rowshift::error::Result;
use rowshift::logging;
use rowshift::query::{Materializer, NormalizeOptions, TracingObserver};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    match cli.log_file.as_deref() {
        Some(path) => logging::init_file_logging(Some(path)),
        None => logging::init_stderr_logging(),
    }

    if let Err(e) = run(&cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let descriptor = config.resolve_descriptor(cli.descriptor.as_deref())?;
    let sql = cli.query_text()?;
    let format = cli.output_format()?;

    let mut options = config.normalize;
    if cli.escape_quotes {
        options.escape_quotes = true;
    }

    let source = db::provision(&descriptor, &config.pool).await?;
    let outcome = execute(source.as_ref(), cli, &sql, options, format).await;
    source.close().await;
    outcome
}

async fn execute(
    source: &dyn SourceDatabase,
    cli: &Cli,
    sql: &str,
    options: NormalizeOptions,
    format: OutputFormat,
) -> Result<()> {
    if let Some(schema_name) = cli.schema.as_deref() {
        if cli.tables.is_empty() {
            schema::ensure_schema_exists(source, schema_name, &TracingObserver).await?;
        } else {
            schema::ensure_tables_exist(source, schema_name, &cli.tables, &TracingObserver)
                .await?;
        }
    }

    let materializer = Materializer::new(source).with_options(options);
    match materializer.materialize(sql).await {
        Ok(result) => {
            info!(rows = result.row_count(), "materialized result");
            print_result(&result, format);
            Ok(())
        }
        Err(err) => {
            let (err, partial) = err.into_parts();
            if err.is_mid_iteration() {
                warn!(
                    rows = partial.row_count(),
                    "printing partial result; rows after the failure are missing"
                );
                print_result(&partial, format);
            }
            Err(err)
        }
    }
}

fn print_result(result: &ResultSet, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("{}", result.column_names().join(", "));
            for row in &result.rows {
                println!("{}", row.join(", "));
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(result) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!("Failed to encode result as JSON: {e}"),
        },
    }
}
