use clap::Parser;
use kroki_a11y::{Dialect, describe_diagram, model_json};
use std::path::PathBuf;
use tracing::Level;

/// Describe a single diagram
#[derive(Parser, Debug)]
#[command(name = "kroki-a11y-describe")]
#[command(version)]
#[command(
    about = "Print the accessible description of one PlantUML or Mermaid diagram",
    long_about = None
)]
struct Args {
    /// Input diagram file (use "-" for stdin)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Diagram type hint, e.g. "class", "sequence" or "c4"
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    kind: Option<String>,

    /// Source dialect: plantuml or mermaid (guessed when omitted)
    #[arg(short, long, value_name = "DIALECT")]
    dialect: Option<String>,

    /// Description language
    #[arg(short, long, default_value = "en")]
    locale: String,

    /// Print the detected kind and parsed model as JSON instead
    #[arg(long)]
    json: bool,

    /// Log detection and parser diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), String> {
    let args = Args::parse();
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let dialect = match args.dialect.as_deref() {
        Some(name) => Some(
            Dialect::from_name(name)
                .ok_or_else(|| format!("Unknown dialect '{}' (use plantuml or mermaid)", name))?,
        ),
        None => None,
    };

    let source = if args.input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        buffer
    } else {
        std::fs::read_to_string(&args.input)
            .map_err(|e| format!("Failed to read input file: {}", e))?
    };

    if args.json {
        let json = model_json(&source, args.kind.as_deref(), dialect)
            .map_err(|e| format!("Failed to build JSON: {}", e))?;
        println!("{json}");
    } else {
        println!(
            "{}",
            describe_diagram(&source, args.kind.as_deref(), dialect, &args.locale)
        );
    }

    Ok(())
}
