use clap::Parser;
use kroki_a11y::{Options, markdown};
use std::path::PathBuf;
use tracing::Level;

/// Add accessible descriptions to the diagrams in a Markdown document
#[derive(Parser, Debug)]
#[command(name = "kroki-a11y")]
#[command(version)]
#[command(
    about = "Annotate Kroki, PlantUML and Mermaid diagrams in Markdown with accessible descriptions",
    long_about = None
)]
struct Args {
    /// Input markdown file (use "-" for stdin)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Options file (TOML or YAML) or a built-in preset name ("en", "nl")
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Description language, overrides the config
    #[arg(short, long, value_name = "LOCALE")]
    locale: Option<String>,

    /// Log detection and parser diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), String> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut options = load_options(args.config.as_ref())?;
    if let Some(locale) = args.locale {
        options.locale = locale;
    }

    let markdown = if args.input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        buffer
    } else {
        std::fs::read_to_string(&args.input)
            .map_err(|e| format!("Failed to read input file: {}", e))?
    };

    let annotated = markdown::annotate(&markdown, &options);

    match args.output {
        Some(path) => {
            std::fs::write(&path, annotated)
                .map_err(|e| format!("Failed to write output: {}", e))?;
            eprintln!("Annotated markdown saved to: {}", path.display());
        }
        None => print!("{annotated}"),
    }

    Ok(())
}

fn load_options(config: Option<&PathBuf>) -> Result<Options, String> {
    let Some(path) = config else {
        return Ok(Options::default());
    };
    if path.is_file() {
        return Options::from_file(path).map_err(|e| format!("Failed to load config: {}", e));
    }
    match path.to_str() {
        Some(name) => Options::from_builtin(name).map_err(|e| e.to_string()),
        None => Err(format!("Config file not found: {}", path.display())),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
