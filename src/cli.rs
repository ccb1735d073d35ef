use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::codegen::{self, GeneratorOptions};
use crate::config::{Config, DatabaseConfig};
use crate::db::{DatabaseManager, Params, Value};
use crate::query::{QueryKind, QuerySpec};

#[derive(Debug, Parser)]
#[command(
    name = "sqlite-query-gen",
    version,
    about = "Generate typed SQLite query functions from a query catalog"
)]
pub struct Cli {
    /// Configuration file (defaults to $QUERY_GEN_CONFIG, then query-gen.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Query catalog in YAML; the built-in catalog is used when omitted
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate source code for a target
    Generate(GenerateArgs),
    /// List the queries of the catalog
    List,
    /// Validate the catalog
    Check,
    /// Create missing catalog tables in a database
    Migrate {
        /// Database path or sqlite:// URL
        #[arg(long)]
        database: Option<String>,
    },
    /// Run one catalog query against a database
    Exec {
        /// Query name
        query: String,
        /// Database path or sqlite:// URL
        #[arg(long)]
        database: Option<String>,
        /// Parameter as name=value, repeatable
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Stop a select after this many rows
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// C++ functions over the SQLite C API
    Core,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    pub target: Target,
    /// Output file name
    #[arg(short, long)]
    pub file: PathBuf,
    /// Output directory, created when missing
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
    /// Base indentation level
    #[arg(short = 'p', long)]
    pub indent: Option<usize>,
    /// Template whose `%%` line is replaced by the generated code
    #[arg(short, long)]
    pub template: Option<PathBuf>,
    /// Emit declarations only
    #[arg(long)]
    pub decl: bool,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().trim_start_matches(':').to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let mut stdout = std::io::stdout();
    run_with_output(cli, config, &mut stdout).await
}

/// Runs `cli`, writing the command's report to `out`.
pub async fn run_with_output<W: Write>(cli: Cli, config: Config, out: &mut W) -> Result<()> {
    let catalog_path = cli
        .catalog
        .clone()
        .or_else(|| config.catalog.as_ref().map(PathBuf::from));
    let catalog = Catalog::load_or_builtin(catalog_path.as_deref())
        .context("failed to load query catalog")?;

    match cli.command {
        Command::Generate(args) => {
            generate(&args, &config, &catalog)?;
        }
        Command::List => {
            for query in catalog.iter() {
                let params = query
                    .def
                    .parameters()
                    .iter()
                    .map(|p| format!("{} {}", p.name, p.ty))
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(out, "{} [{}] ({})", query.name, query.def.kind(), params)?;
                for line in query.def.sql().lines() {
                    writeln!(out, "    {line}")?;
                }
            }
        }
        Command::Check => {
            catalog.validate()?;
            catalog.check_statement_name(&config.generator.statement)?;
            if catalog.is_empty() {
                warn!("catalog has no queries");
            }
            writeln!(out, "catalog ok: {} queries", catalog.len())?;
        }
        Command::Migrate { database } => {
            let manager = DatabaseManager::new(&database_config(database, &config))?;
            let created = manager.migrate(&catalog).await?;
            info!(path = manager.path(), created = created.len(), "migration finished");
            for table in created {
                writeln!(out, "created {table}")?;
            }
        }
        Command::Exec {
            query,
            database,
            params,
            limit,
        } => {
            let spec = catalog
                .get(&query)
                .ok_or_else(|| anyhow!("no query named {query} in the catalog"))?;
            let params = resolve_params(spec, &params)?;
            let manager = DatabaseManager::new(&database_config(database, &config))?;

            if spec.def.kind() == QueryKind::Select {
                for row in manager.select_rows(spec, &params, limit).await? {
                    writeln!(out, "{}", serde_json::to_string(&row)?)?;
                }
            } else {
                let affected = manager.execute(spec, &params).await?;
                writeln!(out, "{affected}")?;
            }
        }
    }

    Ok(())
}

fn database_config(flag: Option<String>, config: &Config) -> DatabaseConfig {
    match flag {
        Some(url) => DatabaseConfig::from_url(url),
        None => config.database.clone(),
    }
}

/// Generates output for `args` and returns the path written.
pub fn generate(args: &GenerateArgs, config: &Config, catalog: &Catalog) -> Result<PathBuf> {
    let mut options = GeneratorOptions::from(&config.generator);
    options.declarations_only = args.decl;
    if let Some(indent) = args.indent {
        options.indent = indent;
    }

    let contents = match args.target {
        Target::Core => codegen::render(catalog, &options, args.template.as_deref())?,
    };
    let path = codegen::write_output(args.dir.as_deref(), &args.file, &contents)?;
    Ok(path)
}

/// Types raw `name=value` pairs by the query's declared parameters.
pub fn resolve_params(spec: &QuerySpec, raw: &[(String, String)]) -> Result<Params> {
    let declared = spec.def.parameters();
    let mut params = Params::new();
    for (name, value) in raw {
        let Some(column) = declared.iter().find(|c| &c.name == name) else {
            bail!("query {} has no parameter :{name}", spec.name);
        };
        let value = Value::parse(column.ty, value)
            .with_context(|| format!("parameter :{name} expects {}", column.ty))?;
        params.insert(name.clone(), value);
    }
    Ok(params)
}
