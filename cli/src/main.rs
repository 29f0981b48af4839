use std::sync::Arc;

use clap::{Parser, Subcommand};
use proplans::filter::names;
use proplans::{
    AccountLevel, DurationTag, ErrorCode, GatewayOption, LoaderConfig, PlanCatalog, PlanError, PlanLoader, PlanRecord,
    PlanSummary, UserType, gateway_name, payment_event_id,
};
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Plan(#[from] PlanError),
    #[error("no plan found for {0}")]
    NotFound(String),
    #[error("unknown filter `{0}`")]
    UnknownFilter(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "pro-cli", about = "Plan catalog CLI")]
struct Cli {
    /// Overrides `PRO_API_URL`.
    #[arg(long)]
    api_url: Option<String>,

    /// Login state: 0 for anonymous, greater than 0 when logged in.
    #[arg(long, default_value_t = 0)]
    user_type: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the names of a payment gateway.
    Gateway {
        id: u32,
        /// Gateway option object as returned by the API.
        #[arg(long)]
        option: Option<String>,
        #[arg(long, default_value_t = false)]
        via: bool,
    },
    /// Print the click-tracking event id for a gateway code.
    EventId { code: String },
    #[command(flatten)]
    Catalog(CatalogCommand),
}

/// Commands answered from the loaded plan catalog.
#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Print the plans of a filter.
    Plans {
        #[arg(long, default_value = names::ALL)]
        filter: String,
        #[arg(long, default_value = "any")]
        duration: DurationTag,
    },
    /// Print one plan by level and term.
    Plan {
        level: u32,
        #[arg(long, default_value_t = 1)]
        months: u32,
    },
    /// Tell whether a level is in a filter.
    InFilter {
        level: u32,
        #[arg(long)]
        filter: Option<String>,
    },
    /// Print the cheapest monthly plan holding the given usage.
    Lowest {
        #[arg(long)]
        used_bytes: u64,
        #[arg(long, default_value_t = 0)]
        current_level: u32,
        #[arg(long)]
        filter: Option<String>,
    },
    /// Print catalog-wide facts: conversion rate and boundary plans.
    Info,
    /// Print every filter and its levels.
    Filters,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run(Cli::parse()).await {
        let code = match &e {
            CliError::Plan(plan) => plan.error_code(),
            _ => "E_CLI",
        };
        eprintln!("error [{code}]: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = LoaderConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.set_api_url(&api_url);
    }

    match cli.command {
        Command::Gateway { id, option, via } => {
            let option = option.map(|raw| serde_json::from_str::<GatewayOption>(&raw)).transpose()?;
            let gateway = gateway_name(id, option.as_ref(), via || config.debug);
            print_json(&serde_json::to_value(gateway)?)
        }
        Command::EventId { code } => {
            let event_id = payment_event_id(&code);
            print_json(&json!({ "code": code, "event_id": event_id }))
        }
        Command::Catalog(command) => {
            tracing::debug!(api_url = %config.api_url, user_type = cli.user_type, "loading plans");
            let loader = PlanLoader::from_config(config)?;
            let catalog = loader.load(UserType(cli.user_type)).await?;
            run_catalog(&catalog, command)
        }
    }
}

fn run_catalog(catalog: &Arc<PlanCatalog>, command: CatalogCommand) -> Result<(), CliError> {
    match command {
        CatalogCommand::Plans { filter, duration } => {
            let records = catalog
                .filters()
                .plans(&filter, duration)
                .ok_or_else(|| CliError::UnknownFilter(filter.clone()))?;
            let summaries: Vec<PlanSummary> = records.iter().filter_map(|r| summarize(catalog, r)).collect();
            print_json(&serde_json::to_value(summaries)?)
        }
        CatalogCommand::Plan { level, months } => {
            let plan = catalog
                .plan_by_level(AccountLevel(level), months)
                .ok_or_else(|| CliError::NotFound(format!("level {level}, {months} months")))?;
            print_json(&serde_json::to_value(plan.summary())?)
        }
        CatalogCommand::InFilter { level, filter } => {
            let filter = filter.as_deref();
            let member = catalog.plan_in_filter(AccountLevel(level), filter);
            print_json(&json!({
                "level": level,
                "filter": filter.unwrap_or(names::ALL),
                "member": member,
            }))
        }
        CatalogCommand::Lowest { used_bytes, current_level, filter } => {
            let record = catalog
                .filters()
                .lowest_required(used_bytes, AccountLevel(current_level), filter.as_deref())
                .ok_or_else(|| CliError::NotFound(format!("{used_bytes} bytes")))?;
            print_json(&serde_json::to_value(summarize(catalog, record))?)
        }
        CatalogCommand::Info => {
            let ids = |record: Option<&Arc<PlanRecord>>| record.map(|r| r.id.clone());
            print_json(&json!({
                "records": catalog.records().len(),
                "conversion_rate": catalog.conversion_rate(),
                "min_plan": ids(catalog.min_plan()),
                "max_plan": ids(catalog.max_plan()),
                "aff_min": ids(catalog.filters().aff_min()),
                "mini_min": ids(catalog.filters().mini_min()),
            }))
        }
        CatalogCommand::Filters => {
            let registry = catalog.registry();
            let filters: serde_json::Map<String, Value> = registry
                .names()
                .filter_map(|name| Some((name.to_owned(), serde_json::to_value(registry.get(name)?).ok()?)))
                .collect();
            print_json(&Value::Object(filters))
        }
    }
}

fn summarize(catalog: &PlanCatalog, record: &PlanRecord) -> Option<PlanSummary> {
    catalog.plan_for_record(record).map(|plan| plan.summary())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
