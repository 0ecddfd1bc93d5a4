//! `cui-utils`: look up CUI categories and format banner markings.
//!
//! With bare identifiers the binary prints the canonical banner
//! (`cui-utils SP-PRIV --control NOFORN` prints `CUI//SP-PRIV//NOFORN`).
//! Subcommands expose lookup, validation, listing, and banner parsing. Errors
//! about the request itself go to stdout with exit status 1; failures to load
//! the registry go to stderr.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cui_utils::{
    BasicCategories, CategoryFilter, CategoryRecord, CategoryRegistry, CuiError, Marking,
    MarkingRequest, Organizations, RegistrySource, SpecifiedCategories, split_list,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn init_logging() {
    let default_level = "warn";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "cui-utils",
    version,
    about = "Look up CUI categories and format banner markings",
    args_conflicts_with_subcommands = true,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    mark: MarkArgs,
}

#[derive(Args)]
struct CommonArgs {
    /// Registry document to load instead of the built-in database.
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct MarkArgs {
    /// Category codes or markings (comma-separated lists accepted).
    #[arg(value_name = "IDENTIFIER")]
    identifiers: Vec<String>,

    /// Limited dissemination control to add (repeatable, `FED_ONLY` works for `FED ONLY`).
    #[arg(short, long = "control", value_name = "CONTROL")]
    controls: Vec<String>,

    /// Leave basic categories out of the banner.
    #[arg(long)]
    no_basic: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Format a banner marking (same as passing identifiers directly).
    Mark(MarkArgs),
    /// Show one category.
    Lookup {
        identifier: String,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Check that every identifier names a known category.
    Validate {
        #[arg(value_name = "IDENTIFIER", required = true)]
        identifiers: Vec<String>,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// List categories sorted by code.
    List {
        /// Only basic categories.
        #[arg(long, conflicts_with = "specified")]
        basic: bool,
        /// Only specified categories.
        #[arg(long)]
        specified: bool,
        /// Only categories in this organization.
        #[arg(long, value_name = "ORG")]
        organization: Option<String>,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// List organization (index group) codes.
    Organizations {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// List limited dissemination controls.
    Controls {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Parse a banner, validate it, and print its canonical form.
    Parse {
        banner: String,
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn run() -> Result<bool> {
    let cli = Cli::parse();
    match cli.command {
        None => mark(&cli.mark),
        Some(Command::Mark(args)) => mark(&args),
        Some(Command::Lookup { identifier, common }) => {
            let registry = load_registry(&common)?;
            lookup(&registry, &identifier, common.json)
        }
        Some(Command::Validate {
            identifiers,
            common,
        }) => {
            let registry = load_registry(&common)?;
            validate(&registry, &identifiers, common.json)
        }
        Some(Command::List {
            basic,
            specified,
            organization,
            common,
        }) => {
            let registry = load_registry(&common)?;
            list(&registry, basic, specified, organization.as_deref(), common.json)
        }
        Some(Command::Organizations { common }) => {
            let registry = load_registry(&common)?;
            organizations(&registry, common.json)
        }
        Some(Command::Controls { common }) => {
            let registry = load_registry(&common)?;
            controls(&registry, common.json)
        }
        Some(Command::Parse { banner, common }) => {
            let registry = load_registry(&common)?;
            parse(&registry, &banner, common.json)
        }
    }
}

fn load_registry(common: &CommonArgs) -> Result<CategoryRegistry> {
    RegistrySource::from_env(common.database.clone()).load()
}

fn mark(args: &MarkArgs) -> Result<bool> {
    let registry = load_registry(&args.common)?;
    let request = MarkingRequest::new(expand(&args.identifiers))
        .with_controls(expand(&args.controls))
        .include_basic(!args.no_basic);

    match registry.resolve_marking(&request) {
        Ok(marking) => {
            if args.common.json {
                print_json(&marking_json(&marking))?;
            } else {
                println!("{marking}");
            }
            Ok(true)
        }
        Err(err) => report_error(&err, args.common.json),
    }
}

fn lookup(registry: &CategoryRegistry, identifier: &str, json: bool) -> Result<bool> {
    let record = match registry.lookup(identifier) {
        Ok(record) => record,
        Err(err) => return report_error(&err, json),
    };
    if json {
        print_json(&serde_json::to_value(record)?)?;
        return Ok(true);
    }

    println!("{} ({})", record.name(), record.code());
    println!("  marking:      {}", record.marking());
    println!("  designation:  {}", record.designation().as_str());
    let organization = record.organization();
    match registry.organization_name(&organization.0) {
        Some(name) => println!("  organization: {organization} ({name})"),
        None => println!("  organization: {organization}"),
    }
    if !record.authorities().is_empty() {
        println!("  authorities:  {}", record.authorities().join("; "));
    }
    let controls: Vec<&str> = registry
        .controls()
        .iter()
        .filter(|control| record.permits(&control.code))
        .map(|control| control.code.0.as_str())
        .collect();
    println!("  controls:     {}", controls.join(", "));
    if !record.description().is_empty() {
        println!("  {}", record.description());
    }
    Ok(true)
}

fn validate(registry: &CategoryRegistry, identifiers: &[String], json: bool) -> Result<bool> {
    let report = registry.validate(expand(identifiers));
    let valid = report.is_valid();
    if json {
        let mut value = serde_json::to_value(&report)?;
        value["valid"] = Value::Bool(valid);
        print_json(&value)?;
    } else if valid {
        let codes: Vec<&str> = report.known.iter().map(|c| c.0.as_str()).collect();
        println!("valid: {}", codes.join(", "));
    } else {
        println!("unknown: {}", report.unknown.join(", "));
    }
    Ok(valid)
}

fn list(
    registry: &CategoryRegistry,
    basic: bool,
    specified: bool,
    organization: Option<&str>,
    json: bool,
) -> Result<bool> {
    let basic_filter = BasicCategories::new(registry);
    let specified_filter = SpecifiedCategories::new(registry);
    let in_organization: Option<Vec<&CategoryRecord>> =
        organization.map(|org| registry.get_by_organization(org));
    let records: Vec<&CategoryRecord> = registry
        .list_categories()
        .into_iter()
        .filter(|record| !basic || basic_filter.matches(record))
        .filter(|record| !specified || specified_filter.matches(record))
        .filter(|record| match &in_organization {
            Some(members) => members.iter().any(|member| std::ptr::eq(*member, *record)),
            None => true,
        })
        .collect();

    if json {
        print_json(&serde_json::to_value(&records)?)?;
    } else {
        for record in records {
            println!("{}\t{}\t{}", record.code(), record.marking(), record.name());
        }
    }
    Ok(true)
}

fn organizations(registry: &CategoryRegistry, json: bool) -> Result<bool> {
    let organizations = Organizations::new(registry);
    let rows: Vec<Value> = organizations
        .all()
        .iter()
        .map(|code| {
            json!({
                "code": code,
                "name": organizations.name(&code.0),
                "categories": organizations.categories(&code.0).len(),
            })
        })
        .collect();

    if json {
        print_json(&Value::Array(rows))?;
    } else {
        for row in rows {
            println!(
                "{}\t{}\t{}",
                row["code"].as_str().unwrap_or_default(),
                row["name"].as_str().unwrap_or_default(),
                row["categories"]
            );
        }
    }
    Ok(true)
}

fn controls(registry: &CategoryRegistry, json: bool) -> Result<bool> {
    if json {
        print_json(&serde_json::to_value(registry.controls())?)?;
    } else {
        for control in registry.controls() {
            println!("{}\t{}", control.code, control.name);
        }
    }
    Ok(true)
}

fn parse(registry: &CategoryRegistry, banner: &str, json: bool) -> Result<bool> {
    match registry.parse_marking(banner) {
        Ok(marking) => {
            let canonical = marking.banner() == banner.trim();
            if json {
                let mut value = marking_json(&marking);
                value["canonical"] = Value::Bool(canonical);
                print_json(&value)?;
            } else if canonical {
                println!("{marking}");
            } else {
                println!("{marking} (canonical form of '{}')", banner.trim());
            }
            Ok(true)
        }
        Err(err) => report_error(&err, json),
    }
}

fn marking_json(marking: &Marking<'_>) -> Value {
    let categories: Vec<&str> = marking
        .categories()
        .iter()
        .map(|record| record.code().0.as_str())
        .collect();
    let controls: Vec<&str> = marking
        .controls()
        .iter()
        .map(|control| control.code.0.as_str())
        .collect();
    json!({
        "banner": marking.banner(),
        "categories": categories,
        "controls": controls,
    })
}

/// Print a request error on stdout and signal failure to `main`.
fn report_error(err: &CuiError, json: bool) -> Result<bool> {
    if json {
        let mut value = json!({
            "error": {
                "kind": err.kind(),
                "message": err.to_string(),
            }
        });
        if let CuiError::UnknownCategory { identifiers } | CuiError::UnknownControl { identifiers } =
            err
        {
            value["error"]["identifiers"] = json!(identifiers);
        }
        print_json(&value)?;
    } else {
        println!("error: {err}");
    }
    Ok(false)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn expand(values: &[String]) -> Vec<String> {
    values.iter().flat_map(|value| split_list(value)).collect()
}
