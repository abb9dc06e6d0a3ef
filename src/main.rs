use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use colored::{ColoredString, Colorize};
use miette::{IntoDiagnostic, Result};

use graphql_schema_diff::{
    compare, ChangeRecord, DiffOptions, DiffResult, Headers, IntrospectionOptions, SchemaOptions,
};

#[derive(Parser, Debug)]
#[command(name = "graphql-schema-diff")]
#[command(about = "Compare two GraphQL schemas and report dangerous and breaking changes")]
struct Cli {
    /// Left (old) schema: URL, SDL file, introspection JSON file or glob
    left: String,

    /// Right (new) schema: URL, SDL file, introspection JSON file or glob
    right: String,

    /// Exit with code 1 on dangerous changes
    #[arg(long)]
    fail_on_dangerous_changes: bool,

    /// Exit with code 1 on breaking changes
    #[arg(long)]
    fail_on_breaking_changes: bool,

    /// Exit with code 1 on any change
    #[arg(long)]
    fail_on_all_changes: bool,

    /// Header sent to both sides, as 'Name: value'
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Header sent to the left side only
    #[arg(long = "left-schema-header")]
    left_schema_headers: Vec<String>,

    /// Header sent to the right side only
    #[arg(long = "right-schema-header")]
    right_schema_headers: Vec<String>,

    /// Sort schemas prior to diffing
    #[arg(short, long)]
    sort_schema: bool,

    /// Include deprecated input values in remote introspection
    #[arg(long)]
    input_value_deprecation: bool,

    /// Always color the output
    #[arg(long, conflicts_with = "no_color")]
    use_colors: bool,

    /// Never color the output
    #[arg(long)]
    no_color: bool,

    /// Print the change lists as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            headers: parse_headers(&self.headers),
            left_schema: SchemaOptions {
                headers: parse_headers(&self.left_schema_headers),
            },
            right_schema: SchemaOptions {
                headers: parse_headers(&self.right_schema_headers),
            },
            sort_schema: self.sort_schema,
            introspection: IntrospectionOptions {
                input_value_deprecation: self.input_value_deprecation,
                ..Default::default()
            },
        }
    }

    fn color(&self) -> bool {
        self.use_colors || (!self.no_color && io::stdout().is_terminal())
    }

    fn should_fail(&self, result: &DiffResult) -> bool {
        self.fail_on_all_changes
            || (self.fail_on_dangerous_changes && result.has_dangerous_changes())
            || (self.fail_on_breaking_changes && result.has_breaking_changes())
    }
}

/// `Name: value` pairs split on the first colon. Malformed entries are dropped.
fn parse_headers(raw: &[String]) -> Headers {
    raw.iter()
        .filter_map(|header| {
            let (name, value) = header.split_once(':')?;
            let (name, value) = (name.trim(), value.trim());
            (!name.is_empty() && !value.is_empty()).then(|| (name.to_owned(), value.to_owned()))
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Severity {
    Dangerous,
    Breaking,
}

impl Severity {
    fn title(self) -> &'static str {
        match self {
            Severity::Dangerous => "Dangerous changes",
            Severity::Breaking => "BREAKING CHANGES",
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Severity::Dangerous => "⚠",
            Severity::Breaking => "✖",
        }
    }

    fn paint(self, text: &str) -> ColoredString {
        match self {
            Severity::Dangerous => text.yellow(),
            Severity::Breaking => text.red(),
        }
    }
}

fn change_section(severity: Severity, changes: &[ChangeRecord], color: bool) -> Option<String> {
    if changes.is_empty() {
        return None;
    }
    let title = if color {
        severity.paint(severity.title()).bold().underline().to_string()
    } else {
        severity.title().to_owned()
    };
    let mut out = format!("{title}\n");
    for change in changes {
        let entry = format!("  {} {}", severity.marker(), change.description);
        if color {
            out.push_str(&severity.paint(&entry).to_string());
        } else {
            out.push_str(&entry);
        }
        out.push('\n');
    }
    Some(out)
}

/// Dangerous then breaking changes, separated by a blank line.
fn change_report(result: &DiffResult, color: bool) -> String {
    [
        change_section(Severity::Dangerous, &result.dangerous_changes, color),
        change_section(Severity::Breaking, &result.breaking_changes, color),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join("\n")
}

fn report(cli: &Cli, result: &DiffResult) -> Result<()> {
    if cli.json {
        let json = serde_json::json!({
            "dangerousChanges": result.dangerous_changes,
            "breakingChanges": result.breaking_changes,
        });
        println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        return Ok(());
    }

    let color = cli.color();
    if color {
        println!("{}", result.diff);
    } else {
        println!("{}", result.diff_plain);
    }
    eprint!("{}", change_report(result, color));
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    colored::control::set_override(cli.color());

    let Some(result) = compare(&cli.left, &cli.right, &cli.diff_options()).await? else {
        eprintln!("{}", "✔ No changes".green());
        return Ok(ExitCode::SUCCESS);
    };

    report(&cli, &result)?;

    if cli.should_fail(&result) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().build())
    }))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    run(Cli::parse()).await
}
