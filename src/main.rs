mod debug_report;

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use routebind::{BindingError, Param, build_graph, parse_route, validate_token};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ROUTEBIND_LOG";

/// Print the parameter graph of a route pattern.
///
/// Exit codes: 0 on success, 1 on internal errors, 2 on invalid input or a
/// route whose parameters cannot be bound.
#[derive(Debug, Parser)]
#[command(name = "routebind", version)]
struct Cli {
    /// Route pattern, e.g. "/posts/:post(slug)/comments/:>comment".
    #[arg(required_unless_present = "tokens")]
    pattern: Option<String>,

    /// Raw parameter token, in route order. Repeat instead of giving a pattern.
    #[arg(short, long = "token", value_name = "TOKEN", conflicts_with = "pattern")]
    tokens: Vec<String>,

    /// Print the graph as JSON.
    #[arg(long)]
    json: bool,

    /// Force ANSI color output.
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output.
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let (label, params) = match cli.pattern.as_deref() {
        Some(pattern) => (pattern.to_string(), parse_route(pattern)),
        None => {
            let label = cli.tokens.join(" ");
            let params = graph_from_tokens(&label, &cli.tokens);
            (label, params)
        }
    };

    let params = match params {
        Ok(params) => params,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&params) {
            Ok(out) => println!("{out}"),
            Err(err) => {
                eprintln!("error: failed to encode graph: {err}");
                return ExitCode::from(1);
            }
        }
    } else {
        let color = if cli.no_color { false } else { cli.color || io::stdout().is_terminal() };
        debug_report::print_graph(&label, &params, color);
    }

    ExitCode::SUCCESS
}

fn graph_from_tokens(label: &str, tokens: &[String]) -> Result<Vec<Param>, BindingError> {
    for token in tokens {
        validate_token(token)?;
    }
    build_graph(label, tokens)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}
