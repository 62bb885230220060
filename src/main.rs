//! remail - MJML-style email template compiler

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use remail::include::LocalIncludeLoader;
use remail::{CompileOutput, ParserOptions, RenderOptions};

#[derive(Parser)]
#[command(name = "remail")]
#[command(version, about = "Compile email template markup to HTML", long_about = None)]
#[command(after_help = "EXAMPLES:
    remail newsletter.mjml                  Compile to stdout
    remail newsletter.mjml -o out.html      Compile to a file
    remail --json newsletter.mjml           Emit HTML and warnings as JSON")]
struct Cli {
    /// Input template file
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<String>,

    /// Directory includes may be loaded from (defaults to the input's parent)
    #[arg(long, value_name = "DIR")]
    include_root: Option<PathBuf>,

    /// Strip source comments from the output
    #[arg(long)]
    disable_comments: bool,

    /// Base URL for default social network icons
    #[arg(long, value_name = "URL")]
    social_icon_origin: Option<String>,

    /// Emit a JSON object with content, title, preview, and warnings
    #[arg(long)]
    json: bool,

    /// Suppress warning messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let markup = fs::read_to_string(&cli.input)
        .map_err(|e| format!("{}: {e}", cli.input))?;

    let parser_options = parser_options(cli);
    let mut render_options = RenderOptions::builder().disable_comments(cli.disable_comments);
    if let Some(origin) = &cli.social_icon_origin {
        render_options = render_options.social_icon_origin(origin);
    }

    let output = remail::compile(&markup, &parser_options, &render_options.build())
        .map_err(|e| e.to_string())?;

    if !cli.quiet && !cli.json {
        for warning in &output.warnings {
            eprintln!("warning: {} at {}", warning.kind, warning.span);
        }
    }

    let rendered = if cli.json {
        to_json(&output)?
    } else {
        output.content
    };

    match &cli.output {
        Some(path) => fs::write(path, rendered).map_err(|e| format!("{path}: {e}"))?,
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Includes resolve relative to the input file's directory unless
/// `--include-root` says otherwise.
fn parser_options(cli: &Cli) -> ParserOptions {
    let root = match &cli.include_root {
        Some(root) => root.clone(),
        None => PathBuf::from(&cli.input)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    ParserOptions::new(Box::new(LocalIncludeLoader::new(root)))
}

fn to_json(output: &CompileOutput) -> Result<String, String> {
    let value = serde_json::json!({
        "content": output.content,
        "title": output.title,
        "preview": output.preview,
        "warnings": output.warnings,
    });
    serde_json::to_string_pretty(&value).map_err(|e| e.to_string())
}
