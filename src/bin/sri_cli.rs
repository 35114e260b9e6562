//! SRI CLI: query the SRI API from the command line
//!
//! Usage:
//!   sri-cli nsz <id>                         Show one occupational standard
//!   sri-cli organization <id>                Show one organization
//!   sri-cli search [--type N] [--group N]    Search organizations
//!   sri-cli graphql <query>                  Run a raw GraphQL query

use anyhow::{anyhow, bail, Context};
use serde_json::Value;
use sri_client::{ClientConfig, SriClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sri_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "version" | "--version" | "-V" => cmd_version(),
        "help" | "--help" | "-h" => print_usage(),
        command => {
            if let Err(e) = run(command, &args[2..]).await {
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
        }
    }
}

fn print_usage() {
    println!(
        r#"sri-cli: SRI occupational standards API client

USAGE:
    sri-cli [--config <file.yaml>] <COMMAND> [OPTIONS]

COMMANDS:
    nsz <id>                                  Show one occupational standard
    organization <id>                         Show one organization
    crn <ico>                                 Find an organization by registration number
    search [--type N] [--group N] [--title T] Search organizations
    categories [--level N] [--parent N]       List organization categories
    activities <focus|year|sector-councils> [--organization N]
                                              Organization activity summaries
    timeline [--fields a,b]                   Activities timeline
    activity <id> [--fields a,b]              One activity
    graphql <query>                           Run a raw GraphQL query
    version                                   Show version information
    help                                      Show this help message

ENVIRONMENT:
    SRI_URL, SRI_API_KEY                      API base URL and key (required without --config)
    SRI_LANGUAGE, SRI_CACHE_TTL               Optional overrides
    RUST_LOG                                  Log filter (default sri_client=info)"#
    );
}

fn cmd_version() {
    println!("sri-cli {}", env!("CARGO_PKG_VERSION"));
}

async fn run(command: &str, args: &[String]) -> anyhow::Result<()> {
    let (config_path, command, args) = if command == "--config" {
        let path = args.first().ok_or_else(|| anyhow!("--config needs a file"))?;
        let command = args.get(1).ok_or_else(|| anyhow!("missing command"))?;
        (Some(path.as_str()), command.as_str(), &args[2..])
    } else {
        (None, command, args)
    };

    let config = match config_path {
        Some(path) => ClientConfig::from_yaml_file(path)
            .with_context(|| format!("loading {path}"))?,
        None => ClientConfig::from_env().context("reading SRI_* environment")?,
    };
    let client = SriClient::new(config).await?;

    let output = match command {
        "nsz" => client.get_nsz_by_id(required_int(args, "id")?).await?,
        "organization" => client.get_organization_by_id(required_int(args, "id")?).await?,
        "crn" => {
            let crn = args.first().ok_or_else(|| anyhow!("missing <ico>"))?;
            client
                .get_organization_by_crn(crn)
                .await?
                .unwrap_or(Value::Null)
        }
        "search" => {
            client
                .search_organization(
                    int_flag(args, "--type")?,
                    int_flag(args, "--group")?,
                    flag(args, "--title"),
                )
                .await?
        }
        "categories" => {
            client
                .get_strategy_organization_categories(
                    int_flag(args, "--level")?,
                    int_flag(args, "--parent")?,
                )
                .await?
        }
        "activities" => {
            let organization = int_flag(args, "--organization")?;
            match args.first().map(String::as_str) {
                Some("focus") => client.get_organization_activities_by_focus(organization).await?,
                Some("year") => client.get_organization_activities_by_year(organization).await?,
                Some("sector-councils") => {
                    client
                        .get_organization_activities_by_sector_councils(organization)
                        .await?
                }
                other => bail!("unknown activity summary: {}", other.unwrap_or("<none>")),
            }
        }
        "timeline" => {
            let fields = fields_flag(args);
            let fields: Option<Vec<&str>> = fields.as_deref().map(|f| f.split(',').collect());
            client.get_activities_timeline(fields.as_deref()).await?
        }
        "activity" => {
            let id = args.first().ok_or_else(|| anyhow!("missing <id>"))?;
            let fields = fields_flag(args);
            let fields: Option<Vec<&str>> = fields.as_deref().map(|f| f.split(',').collect());
            client.get_activity_detail(id, fields.as_deref()).await?
        }
        "graphql" => {
            let query = args.first().ok_or_else(|| anyhow!("missing <query>"))?;
            client.graphql(query).await?
        }
        other => {
            print_usage();
            bail!("unknown command: {other}");
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn int_flag(args: &[String], name: &str) -> anyhow::Result<Option<i64>> {
    flag(args, name)
        .map(|v| v.parse::<i64>().with_context(|| format!("{name} expects a number")))
        .transpose()
}

fn fields_flag(args: &[String]) -> Option<String> {
    flag(args, "--fields").map(str::to_string)
}

fn required_int(args: &[String], what: &str) -> anyhow::Result<i64> {
    let raw = args.first().ok_or_else(|| anyhow!("missing <{what}>"))?;
    raw.parse()
        .with_context(|| format!("<{what}> expects a number, got '{raw}'"))
}
