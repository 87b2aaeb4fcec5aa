use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use collector_app::{background, logging, panel, persistence};
use collector_core::FormValues;
use collector_engine::{CdpRuntime, EngineHandle, SharedStore};

struct CliArgs {
    query: String,
    search_base: String,
    scroll_count: u32,
    exclude: String,
    unique: bool,
    store_path: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    logging::initialize(logging::LogDestination::Both);

    let store_path = args
        .store_path
        .clone()
        .unwrap_or_else(persistence::default_store_path);
    let data = persistence::load_store(&store_path);
    let store = SharedStore::file_backed(data, store_path);

    let runtime = Arc::new(CdpRuntime::launch().context("launching browser runtime")?);
    let engine = EngineHandle::new(runtime, store.clone());
    let mut orchestrator = background::Orchestrator::new(engine, store);

    let form = FormValues {
        keywords: args.query.clone(),
        scroll_count: args.scroll_count,
        exclude_keywords: args.exclude.clone(),
        include_unique: args.unique,
    };
    let view = panel::run_panel_flow(&mut orchestrator, form, &args.search_base)?;

    if view.addresses.is_empty() {
        println!("{}", view.status);
    } else {
        println!("Found {} addresses:", view.count);
        println!("{}", panel::copy_payload(&view));
    }
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut parsed = CliArgs {
        query: String::new(),
        search_base: String::new(),
        scroll_count: 20,
        exclude: String::new(),
        unique: false,
        store_path: None,
    };

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--query" | "-q" => parsed.query = required(&mut args, &flag)?,
            "--search-base" => parsed.search_base = required(&mut args, &flag)?,
            "--scrolls" => {
                parsed.scroll_count = required(&mut args, &flag)?
                    .parse()
                    .context("--scrolls expects a number")?;
            }
            "--exclude" => parsed.exclude = required(&mut args, &flag)?,
            "--unique" => parsed.unique = true,
            "--store" => parsed.store_path = Some(PathBuf::from(required(&mut args, &flag)?)),
            other => bail!("unknown argument: {other}"),
        }
    }

    if parsed.query.is_empty() {
        bail!("--query is required (comma-separated terms)");
    }
    if parsed.search_base.is_empty() {
        bail!("--search-base is required (search page URL)");
    }
    Ok(parsed)
}

fn required(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    args.next()
        .with_context(|| format!("{flag} expects a value"))
}
