use anyhow::{Context, Result};
use devsync::cli::{Args, ComponentConfig, ExecutionMode, env as env_cmd};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_filter = if args.verbose { "devsync=debug" } else { "devsync=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let mode = match args.mode(&cwd) {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match mode {
        ExecutionMode::Push(config) => run_push(config).await,
        ExecutionMode::Check(config) => run_check(config).await,
        ExecutionMode::EnvInit { context, name } => env_cmd::init(&context, &name),
        ExecutionMode::EnvSet(config) => {
            env_cmd::set(&config, env_cmd::prompt_confirmation).map(|_| ())
        }
        ExecutionMode::EnvView { context } => {
            print!("{}", env_cmd::view(&context)?);
            Ok(())
        }
    }
}

#[cfg(feature = "containers")]
async fn connect(
    config: &ComponentConfig,
) -> Result<devsync::ComponentAdapter<devsync::runtime::DockerRuntime>> {
    let manifest = devsync::ComponentManifest::from_toml_file(&config.manifest)
        .with_context(|| format!("failed to load manifest {:?}", config.manifest))?;
    let runtime = devsync::runtime::DockerRuntime::with_config(manifest.runtime_config())
        .await
        .context("failed to connect to the container runtime")?;
    Ok(devsync::ComponentAdapter::new(runtime, manifest))
}

#[cfg(feature = "containers")]
async fn run_push(config: ComponentConfig) -> Result<()> {
    let adapter = connect(&config).await?;
    let report = match adapter.push().await {
        Ok(report) => report,
        Err(e) => {
            error!("Push of {} failed: {}", adapter.component(), e);
            return Err(e.into());
        }
    };

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Component {} (project volume {})",
        report.component, report.project_volume
    );
    for (alias, action) in &report.actions {
        match action {
            devsync::PushAction::Created { id } => {
                println!("  {}: created {}", alias, short_id(id))
            }
            devsync::PushAction::Recreated { id, reason } => {
                println!("  {}: recreated {} ({})", alias, short_id(id), reason)
            }
            devsync::PushAction::Started { id } => {
                println!("  {}: started {}", alias, short_id(id))
            }
            devsync::PushAction::Unchanged { id } => {
                println!("  {}: unchanged {}", alias, short_id(id))
            }
        }
    }
    info!("Push of {} complete", report.component);
    Ok(())
}

#[cfg(feature = "containers")]
async fn run_check(config: ComponentConfig) -> Result<()> {
    let adapter = connect(&config).await?;
    let statuses = adapter.check().await?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    for (alias, status) in &statuses {
        match status {
            devsync::ContainerStatus::Missing => println!("{}: missing", alias),
            devsync::ContainerStatus::InSync { id } => {
                println!("{}: in sync ({})", alias, short_id(id))
            }
            devsync::ContainerStatus::Stopped { id } => {
                println!("{}: stopped ({})", alias, short_id(id))
            }
            devsync::ContainerStatus::Stale { id, reason } => {
                println!("{}: needs recreation ({}): {}", alias, short_id(id), reason)
            }
        }
    }
    Ok(())
}

#[cfg(not(feature = "containers"))]
async fn run_push(_config: ComponentConfig) -> Result<()> {
    anyhow::bail!("devsync was built without container runtime support")
}

#[cfg(not(feature = "containers"))]
async fn run_check(_config: ComponentConfig) -> Result<()> {
    anyhow::bail!("devsync was built without container runtime support")
}

#[cfg(feature = "containers")]
fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
