use std::fmt::Display;

use clap::Parser;

use typeconv_api::{TypeKey, Value};
use typeconv_engine::config::TypeconvConfig;

#[derive(Parser)]
#[command(name = "typeconv", about = "Convert a value between registered types")]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(long, env = "TYPECONV_CONFIG")]
    config: Option<String>,

    /// Type the input text is read as before converting.
    #[arg(long, default_value = "text")]
    from: TypeKey,

    /// Target type.
    #[arg(long, required_unless_present = "list_types")]
    to: Option<TypeKey>,

    /// Print the result as JSON (`{"type": ..., "value": ...}`).
    #[arg(long)]
    json: bool,

    /// List the participating types and exit.
    #[arg(long)]
    list_types: bool,

    /// Input value, given as text.
    #[arg(required_unless_present = "list_types")]
    value: Option<String>,
}

fn fail(what: &str, e: impl Display) -> ! {
    tracing::error!(error = %e, "{what}");
    std::process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            tracing::info!(config = %path, "loading configuration");
            TypeconvConfig::load(path).unwrap_or_else(|e| fail("failed to load config", e))
        }
        None => TypeconvConfig::default(),
    };

    let registry = typeconv_engine::build_registry(&config)
        .unwrap_or_else(|e| fail("failed to build registry", e));
    tracing::info!(types = registry.types().len(), zone = %registry.zone(), "registry ready");

    if cli.list_types {
        for key in registry.types() {
            println!("{key}");
        }
        return;
    }

    let (Some(to), Some(input)) = (&cli.to, &cli.value) else {
        fail("missing arguments", "--to and a value are required");
    };

    let source = registry
        .convert(&cli.from, Some(&Value::text(input.as_str())))
        .unwrap_or_else(|e| fail("failed to read input", e));
    let result = registry
        .convert(to, source.as_ref())
        .unwrap_or_else(|e| fail("conversion failed", e));

    match (result, cli.json) {
        (Some(value), true) => match serde_json::to_string(&value) {
            Ok(json) => println!("{json}"),
            Err(e) => fail("failed to encode result", e),
        },
        (Some(value), false) => println!("{value}"),
        (None, true) => println!("null"),
        (None, false) => tracing::warn!(from = %cli.from, to = %to, "conversion produced no value"),
    }
}
