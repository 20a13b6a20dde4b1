mod settings;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pkg_constants::paths::DEFAULT_CONFIG_PATH;
use pkg_constants::sensor::{EXIT_NOT_READY, EXIT_READY, PARAM_DATASET};
use pkg_metadata::connect;
use pkg_sensor::{DatasetReadySensor, PokeReport, Sensor, poke_once};
use pkg_types::config::{DsgateConfigFile, load_config_file};
use pkg_types::quota::ResourceQuota;
use pkg_types::sensor::SensorContext;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::settings::{MetadataOverrides, resolve};

#[derive(Parser)]
#[command(
    name = "dsgate",
    about = "Validate namespace quota manifests and check dataset readiness"
)]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log output format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with ResourceQuota manifests
    Quota {
        #[command(subcommand)]
        action: QuotaAction,
    },
    /// Run readiness sensors
    Sensor {
        #[command(subcommand)]
        action: SensorAction,
    },
}

#[derive(Subcommand)]
enum QuotaAction {
    /// Parse and validate a manifest
    Validate {
        /// Manifest file (.yaml/.yml or .json)
        file: PathBuf,
    },
    /// Print the manifest in normalized form
    Render {
        /// Manifest file (.yaml/.yml or .json)
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = ManifestFormat::Yaml)]
        output: ManifestFormat,
    },
}

#[derive(Subcommand)]
enum SensorAction {
    /// Check dataset readiness once. Exit 0 = ready, 2 = not ready, 1 = error.
    Poke(PokeArgs),
}

#[derive(Args)]
struct PokeArgs {
    /// Dataset to check (overrides params.dataset from --context)
    #[arg(long)]
    dataset: Option<String>,

    /// JSON run context, e.g. {"params": {"dataset": "sales.orders"}}
    #[arg(long)]
    context: Option<PathBuf>,

    /// Task id reported in logs and output
    #[arg(long)]
    task_id: Option<String>,

    /// Metadata service base URL
    #[arg(long)]
    metadata_url: Option<String>,

    /// YAML table of `dataset: ready` to answer from instead of the service
    #[arg(long)]
    metadata_file: Option<String>,

    /// Bearer token for the metadata service
    #[arg(long)]
    token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    output: ReportFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ManifestFormat {
    Yaml,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    match cli.command {
        Commands::Quota { action } => match action {
            QuotaAction::Validate { file } => validate_quota(&file),
            QuotaAction::Render { file, output } => render_quota(&file, output),
        },
        Commands::Sensor { action } => match action {
            SensorAction::Poke(args) => {
                let report = poke(&cli.config, args).await?;
                std::process::exit(exit_code(&report))
            }
        },
    }
}

fn validate_quota(file: &Path) -> Result<()> {
    let quota = ResourceQuota::load(file)?;
    quota.validate()?;
    let rows = quota_rows(&quota)?;
    info!(
        "Quota {}/{} is valid ({})",
        quota.namespace(),
        quota.metadata.name,
        file.display()
    );

    println!("Name:       {}", quota.metadata.name);
    println!("Namespace:  {}", quota.namespace());
    println!();
    println!("{:<20} {:<12} {}", "RESOURCE", "HARD", "NORMALIZED");
    for row in rows {
        println!("{}", row);
    }
    Ok(())
}

/// Table rows for `quota validate`, one per hard limit.
fn quota_rows(quota: &ResourceQuota) -> Result<Vec<String>> {
    Ok(quota
        .resource_values()?
        .into_iter()
        .map(|(resource, quantity, value)| format!("{:<20} {:<12} {}", resource, quantity, value))
        .collect())
}

fn render_quota(file: &Path, output: ManifestFormat) -> Result<()> {
    let quota = ResourceQuota::load(file)?;
    quota.validate()?;
    print!("{}", render_manifest(&quota, output)?);
    Ok(())
}

fn render_manifest(quota: &ResourceQuota, output: ManifestFormat) -> Result<String> {
    let mut rendered = match output {
        ManifestFormat::Yaml => quota.to_yaml()?,
        ManifestFormat::Json => quota.to_json_pretty()?,
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}

fn exit_code(report: &PokeReport) -> i32 {
    if report.ready {
        EXIT_READY
    } else {
        EXIT_NOT_READY
    }
}

/// Run context for a poke: the `--context` file with `--dataset` laid over
/// `params.dataset`, or one rendered from the sensor alone.
fn build_context(sensor: &DatasetReadySensor, context: Option<&Path>) -> Result<SensorContext> {
    let Some(path) = context else {
        return Ok(sensor.context());
    };
    let mut ctx = SensorContext::load(path)?;
    if let Some(dataset) = sensor.dataset() {
        ctx.params.insert(
            PARAM_DATASET.to_string(),
            serde_json::Value::String(dataset.to_string()),
        );
    }
    if ctx.task_id.is_none() {
        ctx.task_id = Some(sensor.name().to_string());
    }
    Ok(ctx)
}

async fn poke(config_path: &str, args: PokeArgs) -> Result<PokeReport> {
    let file_cfg: DsgateConfigFile = load_config_file(config_path)?;
    info!("Config file: {}", config_path);

    let settings = resolve(
        MetadataOverrides {
            url: args.metadata_url,
            token: args.token,
            timeout_secs: args.timeout_secs,
            file: args.metadata_file,
        },
        file_cfg,
    );
    let metadata = connect(&settings)?;

    let mut sensor = DatasetReadySensor::new(metadata);
    if let Some(task_id) = args.task_id {
        sensor = sensor.with_task_id(task_id);
    }
    if let Some(dataset) = args.dataset {
        sensor = sensor.with_dataset(dataset);
    }

    let ctx = build_context(&sensor, args.context.as_deref())?;

    let report = poke_once(&sensor, &ctx).await?;
    match args.output {
        ReportFormat::Text => println!(
            "{} {} ({})",
            report.task_id,
            if report.ready { "READY" } else { "NOT READY" },
            report.checked_at.format("%Y-%m-%d %H:%M:%S")
        ),
        ReportFormat::Json => println!("{}", serde_json::to_string(&report)?),
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_metadata::memory::StaticMetadataService;
    use std::sync::Arc;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("dsgate-cli-{}-{}", std::process::id(), name))
    }

    #[test]
    fn quota_rows_by_resource_family() {
        let quota = ResourceQuota::from_yaml_str(
            r#"
apiVersion: v1
kind: ResourceQuota
metadata:
  name: tenanta-quota
spec:
  hard:
    limits.cpu: "200"
    limits.memory: 512Gi
    pods: "100"
    services: "0.5"
"#,
        )
        .unwrap();
        let rows = quota_rows(&quota).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].starts_with("limits.cpu"));
        assert!(rows[0].ends_with(" 200000m"));
        assert!(rows[1].ends_with(" 549755813888 bytes"));
        assert!(rows[2].ends_with(" 100"));
        assert!(rows[3].starts_with("services"));
        assert!(rows[3].ends_with(" -"));
    }

    #[test]
    fn oversized_extra_limit_fails_before_any_row() {
        let quota = ResourceQuota::from_yaml_str(
            r#"
apiVersion: v1
kind: ResourceQuota
metadata:
  name: big
spec:
  hard:
    pods: "10"
    requests.memory: 100Ei
"#,
        )
        .unwrap();
        assert!(quota.validate().is_err());
        assert!(quota_rows(&quota).is_err());
    }

    #[test]
    fn renders_manifest_as_yaml_and_json() {
        let path = temp_path("quota.yaml");
        std::fs::write(
            &path,
            "apiVersion: v1\nkind: ResourceQuota\nmetadata:\n  name: tenanta-quota\nspec:\n  hard:\n    limits.cpu: \"200\"\n    limits.memory: 512Gi\n    pods: \"100\"\n",
        )
        .unwrap();
        let quota = ResourceQuota::load(&path).unwrap();

        let yaml = render_manifest(&quota, ManifestFormat::Yaml).unwrap();
        assert!(yaml.ends_with('\n'));
        assert!(yaml.contains("limits.memory: 512Gi"));
        assert_eq!(ResourceQuota::from_yaml_str(&yaml).unwrap(), quota);

        let json = render_manifest(&quota, ManifestFormat::Json).unwrap();
        assert!(json.ends_with('\n'));
        assert!(json.contains("\"limits.cpu\": \"200\""));
        assert_eq!(ResourceQuota::from_json_str(&json).unwrap(), quota);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn exit_code_follows_readiness() {
        let mut report = PokeReport {
            task_id: "wait".to_string(),
            run_id: None,
            params: serde_json::json!({ "dataset": "sales.orders" }),
            ready: true,
            checked_at: chrono::Utc::now(),
        };
        assert_eq!(exit_code(&report), 0);
        report.ready = false;
        assert_eq!(exit_code(&report), 2);
    }

    #[tokio::test]
    async fn context_file_with_dataset_override() {
        let metadata = Arc::new(StaticMetadataService::new());
        metadata.set_ready("sales.orders", true).await;
        metadata.set_ready("events", false).await;

        let path = temp_path("context.json");
        std::fs::write(
            &path,
            r#"{"params": {"dataset": "events", "owner": "etl"}, "run_id": "r-7"}"#,
        )
        .unwrap();

        let sensor = DatasetReadySensor::new(metadata.clone());
        let ctx = build_context(&sensor, Some(path.as_path())).unwrap();
        assert_eq!(ctx.dataset().unwrap(), "events");
        assert_eq!(ctx.task_id.as_deref(), Some(sensor.name()));
        assert_eq!(ctx.run_id.as_deref(), Some("r-7"));
        assert_eq!(ctx.params["owner"], "etl");
        assert!(!poke_once(&sensor, &ctx).await.unwrap().ready);

        let sensor = DatasetReadySensor::new(metadata.clone())
            .with_task_id("wait_orders")
            .with_dataset("sales.orders");
        let ctx = build_context(&sensor, Some(path.as_path())).unwrap();
        assert_eq!(ctx.dataset().unwrap(), "sales.orders");
        assert_eq!(ctx.task_id.as_deref(), Some("wait_orders"));
        let report = poke_once(&sensor, &ctx).await.unwrap();
        assert!(report.ready);
        assert_eq!(report.task_id, "wait_orders");
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn context_file_without_dataset_fails() {
        let table = temp_path("ctx-table.yaml");
        std::fs::write(&table, "sales.orders: true\n").unwrap();
        let path = temp_path("no-dataset.json");
        std::fs::write(&path, r#"{"params": {"owner": "etl"}}"#).unwrap();

        let args = PokeArgs {
            dataset: None,
            context: Some(path.clone()),
            task_id: None,
            metadata_url: None,
            metadata_file: Some(table.to_string_lossy().into_owned()),
            token: None,
            timeout_secs: None,
            output: ReportFormat::Text,
        };
        let err = poke("/nonexistent/dsgate.yaml", args).await.unwrap_err();
        assert!(format!("{:#}", err).contains(PARAM_DATASET));
        std::fs::remove_file(path).ok();
        std::fs::remove_file(table).ok();
    }

    #[test]
    fn cli_parses_poke() {
        let cli = Cli::try_parse_from([
            "dsgate",
            "sensor",
            "poke",
            "--dataset",
            "sales.orders",
            "--metadata-file",
            "deploy/datasets.yaml",
            "--output",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.config, DEFAULT_CONFIG_PATH);
        let Commands::Sensor {
            action: SensorAction::Poke(args),
        } = cli.command
        else {
            panic!("expected sensor poke");
        };
        assert_eq!(args.dataset.as_deref(), Some("sales.orders"));
        assert_eq!(args.metadata_file.as_deref(), Some("deploy/datasets.yaml"));
        assert!(matches!(args.output, ReportFormat::Json));
    }

    #[test]
    fn cli_parses_quota_render() {
        let cli = Cli::try_parse_from([
            "dsgate",
            "--log-format",
            "json",
            "quota",
            "render",
            "quota.yaml",
            "--output",
            "json",
        ])
        .unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(
            cli.command,
            Commands::Quota {
                action: QuotaAction::Render {
                    output: ManifestFormat::Json,
                    ..
                }
            }
        ));
    }

    #[tokio::test]
    async fn poke_against_static_table() {
        let table = std::env::temp_dir().join(format!("dsgate-cli-{}.yaml", std::process::id()));
        std::fs::write(&table, "sales.orders: true\nevents: false\n").unwrap();
        let args = |dataset: &str| PokeArgs {
            dataset: Some(dataset.to_string()),
            context: None,
            task_id: Some("wait".to_string()),
            metadata_url: None,
            metadata_file: Some(table.to_string_lossy().into_owned()),
            token: None,
            timeout_secs: None,
            output: ReportFormat::Json,
        };

        let report = poke("/nonexistent/dsgate.yaml", args("sales.orders")).await.unwrap();
        assert!(report.ready);
        assert_eq!(report.task_id, "wait");

        let report = poke("/nonexistent/dsgate.yaml", args("events")).await.unwrap();
        assert!(!report.ready);

        let mut no_dataset = args("x");
        no_dataset.dataset = None;
        assert!(poke("/nonexistent/dsgate.yaml", no_dataset).await.is_err());
        std::fs::remove_file(table).ok();
    }
}
