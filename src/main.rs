use clap::Parser;
use columnardemo::types::{DEFAULT_KV_TIMEOUT_SECS, DEFAULT_QUERY_TIMEOUT_SECS};
use columnardemo::{AppState, ConnectionConfig, QueryResult};
use comfy_table::Table;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Customer dashboard queries against a Couchbase Columnar cluster.
///
/// `-h` selects the host, so help is only available as `--help`.
#[derive(Parser, Debug)]
#[command(name = "columnardemo", version, disable_help_flag = true)]
struct Args {
    /// User Name
    #[arg(short = 'u', long = "user", default_value = "Administrator")]
    user: String,

    /// User Password
    #[arg(short = 'p', long, default_value = "password")]
    password: String,

    /// Cluster Node Name
    #[arg(short = 'h', long = "host", default_value = "localhost")]
    host: String,

    /// Bucket
    #[arg(short = 'b', long, default_value = "cbdocs")]
    bucket: String,

    /// Scope
    #[arg(short = 's', long, default_value = "_default")]
    scope: String,

    /// Connect without TLS
    #[arg(long)]
    plaintext: bool,

    /// Key-value timeout in seconds
    #[arg(long, default_value_t = DEFAULT_KV_TIMEOUT_SECS)]
    kv_timeout: u64,

    /// Query timeout in seconds
    #[arg(long, default_value_t = DEFAULT_QUERY_TIMEOUT_SECS)]
    query_timeout: u64,

    /// Load connection settings from a TOML file instead of the flags above
    #[cfg(feature = "toml")]
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Also show spend for this transaction category
    #[arg(long)]
    category: Option<String>,

    /// Only map customers in this state
    #[arg(long)]
    state: Option<String>,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    help: Option<bool>,
}

impl Args {
    #[cfg(feature = "toml")]
    fn file_config(&self) -> columnardemo::Result<Option<ConnectionConfig>> {
        self.config
            .as_ref()
            .map(ConnectionConfig::from_toml_file)
            .transpose()
    }

    #[cfg(not(feature = "toml"))]
    fn file_config(&self) -> columnardemo::Result<Option<ConnectionConfig>> {
        Ok(None)
    }

    fn connection_config(&self) -> Result<ConnectionConfig, Box<dyn std::error::Error>> {
        if let Some(config) = self.file_config()? {
            return Ok(config);
        }

        Ok(
            ConnectionConfig::new(&self.host, &self.user, &self.password)
                .with_encryption(!self.plaintext)
                .with_kv_timeout(self.kv_timeout)
                .with_query_timeout(self.query_timeout),
        )
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.connection_config()?;

    let mut state = AppState::new();
    if let Err(e) = state.login(config, &args.bucket, &args.scope) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
    state.select_category(args.category.clone());
    state.select_state(args.state.clone());

    let snapshot = state.refresh()?;

    println!("Top Customers by Spend");
    println!("{}", render_table(&snapshot.top_spenders));

    if let (Some(category), Some(result)) = (&args.category, &snapshot.category_spend) {
        println!("\nSpend in category {}", category);
        println!("{}", render_table(result));
    }

    match snapshot.map_center {
        Some(center) => println!(
            "\nMap centre for {} customers: {}",
            snapshot.locations.len(),
            center
        ),
        None => println!("\nNo customer locations available"),
    }

    Ok(())
}

fn render_table(result: &QueryResult) -> Table {
    let columns = result.columns();
    let mut table = Table::new();
    table.set_header(columns.clone());

    for row in result {
        table.add_row(
            columns
                .iter()
                .map(|column| display_value(row.get(*column).unwrap_or(&Value::Null)))
                .collect::<Vec<_>>(),
        );
    }
    table
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
