mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use custeio_core::auth::CallContext;
use custeio_core::config::{load_config, validate_config, SyncConfig};
use custeio_core::error::CusteioError;

#[derive(Parser)]
#[command(
    name = "custeio",
    version,
    about = "Recipe costing back office: sync prices and recipes from a spreadsheet"
)]
struct Cli {
    /// JSON config file
    #[arg(long, env = "CUSTEIO_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Spreadsheet file (.xlsx, .xls, .ods), overrides the config
    #[arg(long, global = true)]
    workbook: Option<PathBuf>,

    /// JSON store file, overrides the config
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Identity of the operator triggering a sync
    #[arg(long, env = "CUSTEIO_OPERATOR", global = true)]
    operator: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the latest quotation prices into the ingredient collection
    Precos {
        #[arg(short, long, value_enum, default_value = "table")]
        output: Format,
    },
    /// Import or list recipes
    Receitas {
        #[command(subcommand)]
        action: RecipesAction,
    },
    /// List ingredients with their current prices
    Insumos {
        /// Accent-insensitive search on name, unit, price or date
        #[arg(short, long)]
        busca: Option<String>,

        #[arg(short, long, value_enum, default_value = "table")]
        output: Format,
    },
    /// Show the cost breakdown of one recipe
    Custo {
        /// Recipe name or key
        receita: String,

        #[arg(short, long, value_enum, default_value = "table")]
        output: Format,
    },
    /// Parse a sheet and show what would be written, without writing
    Parse {
        #[arg(value_enum)]
        sheet: SheetKind,

        #[arg(short, long, value_enum, default_value = "table")]
        output: Format,

        /// Write parsed output to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum RecipesAction {
    /// Import recipes from the recipe sheet
    Importar {
        #[arg(short, long, value_enum, default_value = "table")]
        output: Format,
    },
    /// List stored recipes
    Listar {
        #[arg(short, long, value_enum, default_value = "table")]
        output: Format,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SheetKind {
    Cotacoes,
    Receitas,
}

/// Config and caller identity resolved from flags, env and config file.
pub struct Settings {
    pub config: SyncConfig,
    pub ctx: CallContext,
}

impl Settings {
    pub fn workbook(&self) -> Result<&std::path::Path, CusteioError> {
        self.config.workbook.as_deref().ok_or_else(|| {
            CusteioError::ConfigInvalid(
                "no workbook configured; pass --workbook or set it in the config file".into(),
            )
        })
    }
}

fn resolve_settings(cli: &Cli) -> Result<Settings, CusteioError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SyncConfig::default(),
    };
    if let Some(workbook) = &cli.workbook {
        config.workbook = Some(workbook.clone());
    }
    if let Some(store) = &cli.store {
        config.store = store.clone();
    }
    validate_config(&config)?;
    tracing::debug!(store = %config.store.display(), workbook = ?config.workbook, "settings resolved");

    let ctx = match cli.operator.as_deref().map(str::trim) {
        Some(uid) if !uid.is_empty() => CallContext::authenticated(uid),
        _ => CallContext::anonymous(),
    };
    Ok(Settings { config, ctx })
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<(), CusteioError> {
    let settings = resolve_settings(&cli)?;

    match cli.command {
        Commands::Precos { output } => commands::sync::prices(&settings, output).await,
        Commands::Receitas { action } => match action {
            RecipesAction::Importar { output } => commands::sync::recipes(&settings, output).await,
            RecipesAction::Listar { output } => commands::browse::recipes(&settings, output).await,
        },
        Commands::Insumos { busca, output } => {
            commands::browse::ingredients(&settings, busca.as_deref(), output).await
        }
        Commands::Custo { receita, output } => {
            commands::browse::cost(&settings, &receita, output).await
        }
        Commands::Parse { sheet, output, out } => {
            commands::parse::run(&settings, sheet, output, out).await
        }
        Commands::Config => output::json::print(&settings.config),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli).await {
        let call = e.to_call_error();
        eprintln!("Error: {}", call.message);
        if let Some(details) = call.details {
            eprintln!("  {details}");
        }
        std::process::exit(1);
    }
}
