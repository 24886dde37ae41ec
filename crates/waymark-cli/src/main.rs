use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use waymark_workflow_service::constants::{defaults, env};
use waymark_workflow_service::{ServiceConfig, StoreConfig, WorkflowService, WorkflowServiceError};
use workflow_graph::{
    extract_references, NodeCategory, NodeRegistry, ValidationReport, Validator, WorkflowGraph,
};

/// Inspect and validate Waymark workflow files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Service configuration file used by the store commands
    #[arg(long, global = true, default_value = defaults::CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a workflow JSON file; exits with status 1 on any error
    Validate {
        /// Path to the workflow JSON file
        path: String,
        /// Print the issue list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the {{...}} references in a piece of text
    Refs {
        /// Text to scan
        text: String,
    },
    /// List registered node types
    Types {
        /// Only list one category
        #[arg(short, long, value_enum)]
        category: Option<CategoryCli>,
    },
    /// Print the default configuration of a node type
    #[command(name = "default")]
    ShowDefault {
        /// Node type tag, e.g. "navigate"
        node_type: String,
    },
    /// List the workflows in the configured store
    List,
    /// Validate a workflow file and add it to the configured store
    Import {
        /// Path to the workflow JSON file
        path: String,
    },
    /// Print a stored workflow as JSON
    Export {
        /// Workflow id as printed by `import` or `list`
        id: String,
    },
}

/// CLI-side mirror of the registry categories
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryCli {
    Trigger,
    Browser,
    Logic,
    Data,
    Integration,
    Ai,
}

impl From<CategoryCli> for NodeCategory {
    fn from(category: CategoryCli) -> Self {
        match category {
            CategoryCli::Trigger => NodeCategory::Trigger,
            CategoryCli::Browser => NodeCategory::Browser,
            CategoryCli::Logic => NodeCategory::Logic,
            CategoryCli::Data => NodeCategory::Data,
            CategoryCli::Integration => NodeCategory::Integration,
            CategoryCli::Ai => NodeCategory::Ai,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { path, json } => run_validate(&path, json),
        Command::Refs { text } => run_refs(&text),
        Command::Types { category } => run_types(category.map(NodeCategory::from)),
        Command::ShowDefault { node_type } => run_default(&node_type),
        Command::List => report(run_list(&cli.config).await),
        Command::Import { path } => report(run_import(&cli.config, &path).await),
        Command::Export { id } => report(run_export(&cli.config, &id).await),
    }
}

fn read_graph(path: &str) -> WorkflowGraph {
    let contents = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read '{}': {}", path, e)));
    WorkflowGraph::from_json(&contents)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse '{}': {}", path, e)))
}

fn run_validate(path: &str, json: bool) -> ExitCode {
    let graph = read_graph(path);
    log::debug!(
        "Loaded '{}': {} nodes, {} edges, v{}",
        path,
        graph.nodes().len(),
        graph.edges().len(),
        graph.version()
    );

    let issues = Validator::new(NodeRegistry::builtin())
        .validate(&graph)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    if json {
        let rendered = serde_json::to_string_pretty(&issues)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
        println!("{}", rendered);
    } else if issues.is_empty() {
        println!("{}: no issues", path);
    } else {
        for issue in &issues {
            println!("{}", issue);
        }
        println!(
            "\n{} error(s), {} warning(s)",
            issues.errors().len(),
            issues.warnings().len()
        );
    }

    if issues.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_refs(text: &str) -> ExitCode {
    match extract_references(text) {
        Ok(references) if references.is_empty() => {
            println!("No references");
            ExitCode::SUCCESS
        }
        Ok(references) => {
            for reference in &references {
                println!(
                    "{:>4}..{:<4} {:<7} {}",
                    reference.span.start,
                    reference.span.end,
                    reference.scope.as_str(),
                    reference.path_string()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_types(category: Option<NodeCategory>) -> ExitCode {
    let registry = NodeRegistry::builtin();
    let definitions: Vec<_> = match category {
        Some(category) => registry.list_by_category(category),
        None => registry.definitions().collect(),
    };

    for definition in definitions {
        println!(
            "{:<14} {:<12} {}",
            definition.node_type.as_str(),
            format!("{:?}", definition.category).to_lowercase(),
            definition.description
        );
    }
    ExitCode::SUCCESS
}

fn run_default(tag: &str) -> ExitCode {
    let definition = NodeRegistry::builtin()
        .lookup_tag(tag)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let rendered = serde_json::to_string_pretty(&definition.default_config)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    println!("{}", rendered);
    ExitCode::SUCCESS
}

/// Load the service configuration, then apply `WAYMARK_*` overrides
async fn load_config(path: &Path) -> Result<ServiceConfig, WorkflowServiceError> {
    let config = ServiceConfig::load(path).await?.apply_env()?;
    if config.store == StoreConfig::Memory {
        log::warn!(
            "No file store configured in {:?} or {}; workflows last for this run only",
            path,
            env::STORE_DIR
        );
    }
    Ok(config)
}

async fn run_list(config: &Path) -> Result<ExitCode, WorkflowServiceError> {
    let service = WorkflowService::from_config(load_config(config).await?);
    let summaries = service.list().await?;
    if summaries.is_empty() {
        println!("No workflows");
    }
    for summary in summaries {
        println!(
            "{}  v{:<4} {:>3} nodes {:>3} edges  updated {}",
            summary.id,
            summary.version,
            summary.node_count,
            summary.edge_count,
            summary.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_import(config: &Path, path: &str) -> Result<ExitCode, WorkflowServiceError> {
    let service = WorkflowService::from_config(load_config(config).await?);
    let graph = read_graph(path);

    let issues = service.validate(&graph)?;
    for issue in &issues {
        println!("{}", issue);
    }
    if issues.has_errors() {
        eprintln!("Not imported: {} error(s)", issues.errors().len());
        return Ok(ExitCode::FAILURE);
    }

    let id = service.create(&graph).await?;
    println!("{}", id);
    Ok(ExitCode::SUCCESS)
}

async fn run_export(config: &Path, id: &str) -> Result<ExitCode, WorkflowServiceError> {
    let service = WorkflowService::from_config(load_config(config).await?);
    let graph = service.load(id).await?;
    println!("{}", graph.to_json_pretty()?);
    Ok(ExitCode::SUCCESS)
}

fn report(result: Result<ExitCode, WorkflowServiceError>) -> ExitCode {
    result.unwrap_or_else(|e| exit_with_error(&e.to_string()))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["waymark", "validate", "flow.json", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Validate { json: true, .. }));

        let cli = Cli::try_parse_from(["waymark", "types", "--category", "browser"]).unwrap();
        match cli.command {
            Command::Types { category: Some(c) } => {
                assert_eq!(NodeCategory::from(c), NodeCategory::Browser)
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["waymark", "types", "--category", "robots"]).is_err());
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::try_parse_from(["waymark", "list"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(defaults::CONFIG_FILE));

        let cli =
            Cli::try_parse_from(["waymark", "export", "abc", "--config", "/etc/waymark.json"])
                .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/waymark.json"));
        assert!(matches!(cli.command, Command::Export { ref id } if id == "abc"));
    }

    #[tokio::test]
    async fn test_store_commands_use_the_configured_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let config_path = temp.path().join(defaults::CONFIG_FILE);
        let store_dir = temp.path().join("workflows");
        ServiceConfig {
            store: StoreConfig::File {
                dir: store_dir.clone(),
            },
            ..ServiceConfig::default()
        }
        .save(&config_path)
        .await
        .unwrap();

        let flow = temp.path().join("flow.json");
        fs::write(
            &flow,
            r#"{
                "nodes": [
                    {"id": "start", "type": "manualTrigger", "position": {"x": 0, "y": 0}, "data": {}}
                ],
                "edges": [],
                "variables": {},
                "version": 0
            }"#,
        )
        .unwrap();

        run_import(&config_path, flow.to_str().unwrap()).await.unwrap();

        let config = load_config(&config_path).await.unwrap();
        let summaries = WorkflowService::from_config(config).list().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert!(store_dir
            .join(format!("{}.json", summaries[0].id))
            .exists());

        run_export(&config_path, &summaries[0].id).await.unwrap();
        assert!(matches!(
            run_export(&config_path, "absent").await,
            Err(WorkflowServiceError::NotFound(_))
        ));
    }
}
