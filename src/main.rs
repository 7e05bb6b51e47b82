use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use metastore::web::{RestSaveService, router};
use metastore::{
    AttributeConfig, AttributeModel, AttributeStore, DocumentSubject, InMemoryStorage,
    InMemorySubjectStore, SubjectId, form_input_name,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Parser)]
#[command(name = "metastore")]
#[command(about = "Attribute side tables for subject records")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse an attribute config and list its inputs in display order
    Check {
        #[arg(long)]
        config: PathBuf,
    },
    /// Serve the single-attribute save endpoint over in-memory storage
    Serve {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
        #[arg(long, default_value = "user")]
        subjects: String,
        /// Attribute table, `<subjects>_meta` when omitted
        #[arg(long)]
        table: Option<String>,
        /// Pre-create subjects with ids 1..=N
        #[arg(long, default_value_t = 0)]
        seed_subjects: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check { config } => check(&config),
        Command::Serve {
            config,
            addr,
            subjects,
            table,
            seed_subjects,
        } => {
            let table = table.unwrap_or_else(|| format!("{subjects}_meta"));
            serve(&config, &addr, &subjects, &table, seed_subjects).await
        }
    }
}

fn load_config(path: &Path) -> Result<AttributeConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config '{}'", path.display()))?;
    AttributeConfig::from_json(&raw)
        .with_context(|| format!("Invalid attribute config '{}'", path.display()))
}

fn check(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    println!("{} attribute(s):", config.len());
    for (key, options) in config.by_position() {
        let label = if options.label.is_empty() {
            "-"
        } else {
            options.label.as_str()
        };
        println!(
            "  {:>4}  {:<24} {:<32} {:?}{}",
            options.position,
            key,
            form_input_name(key),
            options.input.kind,
            if options.save_empty { "  saveEmpty" } else { "" }
        );
        println!("        label: {label}, rules: {}", options.rules.len());
    }
    Ok(())
}

async fn serve(
    config_path: &Path,
    addr: &str,
    subjects_table: &str,
    table: &str,
    seed_subjects: u64,
) -> Result<()> {
    let config = load_config(config_path)?;

    let storage = Arc::new(InMemoryStorage::with_tables([table])?);
    let subjects = Arc::new(InMemorySubjectStore::<DocumentSubject>::new(subjects_table));
    for id in 1..=seed_subjects {
        subjects
            .insert_with_id(SubjectId(id), DocumentSubject::new())
            .await;
    }

    let store = AttributeStore::new(storage, subjects, AttributeModel::new(table, subjects_table))?;
    let service = Arc::new(RestSaveService::new(store).with_config(config));

    let app = router(service).layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_methods([Method::POST])
            .allow_origin(Any),
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("saving '{table}' attributes of '{subjects_table}' on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
