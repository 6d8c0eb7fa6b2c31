use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

use relay_registry::{CapabilityRegistry, HttpSettings, parse_manifest_file};
use relay_types::FailurePolicy;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("run", sub)) => run_workflow(sub).await,
        Some(("preview", sub)) => preview_workflow(sub),
        Some(("tools", sub)) => list_tools(sub),
        _ => unreachable!("clap enforces a subcommand"),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .try_init();
}

fn build_cli() -> Command {
    let manifest_arg = Arg::new("manifest")
        .long("manifest")
        .short('m')
        .action(ArgAction::Set)
        .required(true)
        .help("Path to the capability manifest (YAML or JSON)");
    let base_url_arg = Arg::new("base-url")
        .long("base-url")
        .action(ArgAction::Set)
        .help("Base URL for HTTP-backed capabilities");
    let file_arg = Arg::new("file")
        .long("file")
        .short('f')
        .action(ArgAction::Set)
        .required(true)
        .help("Path to the workflow document (YAML or JSON)");

    Command::new("relay")
        .about("Execute declarative workflows against a capability registry")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Run a workflow and print the execution response")
                .arg(file_arg.clone())
                .arg(manifest_arg.clone())
                .arg(base_url_arg.clone())
                .arg(
                    Arg::new("fail-fast")
                        .long("fail-fast")
                        .action(ArgAction::SetTrue)
                        .help("Abort the run on the first failing action instead of collecting per-step errors"),
                )
                .arg(
                    Arg::new("debug")
                        .long("debug")
                        .action(ArgAction::SetTrue)
                        .help("Retain failing parameters in error details and print the timing report"),
                ),
        )
        .subcommand(
            Command::new("preview")
                .about("Validate a workflow and print its plan without invoking anything")
                .arg(file_arg)
                .arg(manifest_arg.clone())
                .arg(base_url_arg.clone()),
        )
        .subcommand(
            Command::new("tools")
                .about("List the capabilities a manifest exposes")
                .arg(manifest_arg)
                .arg(base_url_arg),
        )
}

fn load_registry(matches: &ArgMatches) -> Result<CapabilityRegistry> {
    let manifest_path = matches.get_one::<String>("manifest").expect("clap marks --manifest required");
    let manifest = parse_manifest_file(manifest_path)?;
    let settings = matches
        .get_one::<String>("base-url")
        .map(|base_url| HttpSettings::new(base_url.clone()));
    CapabilityRegistry::from_manifest(manifest, settings).context("failed to build capability registry")
}

async fn run_workflow(matches: &ArgMatches) -> Result<()> {
    let registry = load_registry(matches)?;
    let file = matches.get_one::<String>("file").expect("clap marks --file required");
    let mut workflow = relay_engine::parse_workflow_file(file)?;

    if matches.get_flag("fail-fast") {
        workflow.options.policy = FailurePolicy::FailFast;
    }
    if matches.get_flag("debug") {
        workflow.options.debug = true;
    }

    let (response, report) = relay_engine::execute_workflow_with_report(&workflow, &registry).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    if workflow.options.debug {
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn preview_workflow(matches: &ArgMatches) -> Result<()> {
    let registry = load_registry(matches)?;
    let file = matches.get_one::<String>("file").expect("clap marks --file required");
    let workflow = relay_engine::parse_workflow_file(file)?;

    let plan = relay_engine::plan_workflow(&workflow, &registry)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn list_tools(matches: &ArgMatches) -> Result<()> {
    let registry = load_registry(matches)?;
    for descriptor in registry.descriptors() {
        let confirmation = if descriptor.needs_confirmation { " (requires confirmation)" } else { "" };
        println!("{}{}  {}", descriptor.name, confirmation, descriptor.summary);
    }
    Ok(())
}
