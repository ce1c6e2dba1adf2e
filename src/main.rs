//! ms - microservice stack runner
//!
//! This is the main CLI entry point for ms.

use clap::{Parser, Subcommand};
use ms::compose::{Artifact, ComposeOrchestrator, DescriptorBuilder, Targets};
use ms::container::ContainerManager;
use ms::error::{MsError, Result};
use ms::runtime::Completion;
use ms::settings::{Settings, SettingsStore};
use ms::vcs::GitRepo;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// ms - develop microservices with docker-compose
#[derive(Parser)]
#[command(name = "ms")]
#[command(version)]
#[command(about = "CLI for developing microservices with Docker", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level: (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the aggregate docker-compose file
    Init {
        /// Service directories or a single constellation
        services: Vec<String>,
    },

    /// Start services in the foreground
    Start {
        /// Service directories or a single constellation
        services: Vec<String>,
        /// Space separated list of services to ignore
        #[arg(long, num_args = 0..)]
        ignore: Vec<String>,
    },

    /// Stop and remove services
    Down {
        /// Service directories or a single constellation
        services: Vec<String>,
        /// Space separated list of services to ignore
        #[arg(long, num_args = 0..)]
        ignore: Vec<String>,
    },

    /// Display the running processes for each service
    Top {
        /// Service names
        services: Vec<String>,
    },

    /// Pull images for the specified (or all) services
    Pull {
        /// Service directories or a single constellation
        services: Vec<String>,
    },

    /// Pull master in the specified (or all) service repositories
    Gitpull {
        /// Return to the original branch after pulling
        #[arg(long)]
        keep: bool,
        /// Service directories or a single constellation
        services: Vec<String>,
    },

    /// Run a command inside a one-off container
    Run {
        /// The name of the service to run the command (e.g. web, worker)
        #[arg(long)]
        service: Option<String>,
        /// Service directory
        directory: String,
        /// Command to run
        #[arg(trailing_var_arg = true)]
        command: Vec<String>,
    },

    /// Drop into a bash shell on a running service
    Attach {
        /// Service name
        service: String,
    },

    /// Restart a running service
    Restart {
        /// Service name
        service: String,
    },

    /// Display logs for one or more running services
    Logs {
        /// Continuously tail the log
        #[arg(short = 'f')]
        follow: bool,
        /// Number of lines to show from the end of the logs of each container
        #[arg(short = 't')]
        tail: Option<usize>,
        /// Service names
        services: Vec<String>,
    },

    /// Show container info like "docker ps" but formatted
    List {
        /// Filter listed containers by name
        #[arg(long)]
        filter: Option<String>,
    },

    /// Kill running containers and remove the aggregate file
    Kill {
        /// Keep the aggregate docker-compose file around
        #[arg(long)]
        keep: bool,
        /// Only kill this docker-compose service
        #[arg(long)]
        service: Option<String>,
    },

    /// Stop running containers and remove the aggregate file
    Stop,

    /// Print the generated aggregate docker-compose file
    Config,

    /// Inspect or change persisted settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print the settings file
    Show,
    /// Set a key; the value is parsed as JSON, or taken as a plain string
    Set {
        /// Settings key, e.g. BASE_DIR
        key: String,
        /// New value
        value: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(cli.verbose, cli.log_level.as_deref())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn log_directive(verbose: bool, level: Option<&str>) -> String {
    let level = match level.map(str::to_ascii_uppercase).as_deref() {
        Some("DEBUG") => "debug",
        Some("INFO") => "info",
        Some("WARNING") | Some("WARN") => "warn",
        Some("ERROR") | Some("CRITICAL") => "error",
        Some(_) | None if verbose => "debug",
        _ => "info",
    };
    format!("ms={},{}", level, level)
}

async fn run(command: Commands) -> Result<()> {
    let store = SettingsStore::open_default()?;
    let settings = store.load()?;

    match command {
        Commands::Init { services } => {
            let builder = DescriptorBuilder::new(&settings)?;
            builder.build_requested(&services)?;
            println!("{}", builder.artifact().path().display());
        }

        Commands::Start { services, ignore } => {
            let builder = DescriptorBuilder::new(&settings)?;
            let names = builder.build_requested(&services)?;
            let targets = Targets::select(names, &ignore);

            let orchestrator = ComposeOrchestrator::new(builder.artifact().path().to_path_buf());
            let completion = builder
                .artifact()
                .cleanup_after(false, &settings, orchestrator.up_targets(&targets))
                .await?;
            if completion == Some(Completion::Interrupted) {
                tracing::info!("Interrupted, shutting down");
            }
        }

        Commands::Down { services, ignore } => {
            let builder = DescriptorBuilder::new(&settings)?;
            let names = builder.build_requested(&services)?;
            let targets = Targets::select(names, &ignore);

            let orchestrator = ComposeOrchestrator::new(builder.artifact().path().to_path_buf());
            builder
                .artifact()
                .cleanup_after(false, &settings, orchestrator.down_targets(&targets))
                .await?;
        }

        Commands::Top { services } => {
            let orchestrator = running_stack(&settings)?;
            orchestrator.top(&services).await?;
        }

        Commands::Pull { services } => {
            let builder = DescriptorBuilder::new(&settings)?;
            let names = builder.build_requested(&services)?;

            let orchestrator = ComposeOrchestrator::new(builder.artifact().path().to_path_buf());
            builder
                .artifact()
                .cleanup_after(false, &settings, orchestrator.pull(&names))
                .await?;
        }

        Commands::Gitpull { keep, services } => {
            let builder = DescriptorBuilder::new(&settings)?;
            let directories = builder.resolve_directories(&services)?;
            builder.validate(&directories)?;

            for directory in directories {
                tracing::info!("[{}] pulling master", directory);
                GitRepo::open(builder.loader().directory(&directory))
                    .pull_master(keep)
                    .await?;
            }
        }

        Commands::Run {
            service,
            directory,
            command,
        } => {
            let builder = DescriptorBuilder::new(&settings)?;
            if builder.artifact().exists() {
                tracing::info!(
                    "docker-compose already running, consider attaching to a running container"
                );
                return Ok(());
            }

            let names = builder.build(std::slice::from_ref(&directory))?;
            let target = builder.run_target(&directory, service.as_deref(), &names);

            let orchestrator = ComposeOrchestrator::new(builder.artifact().path().to_path_buf());
            let exit = builder
                .artifact()
                .cleanup_after(false, &settings, orchestrator.run(&target, &command))
                .await?;
            if !exit.success() {
                tracing::warn!("{} exited with {}", target, exit);
            }
        }

        Commands::Attach { service } => {
            let orchestrator = running_stack(&settings)?;
            orchestrator.exec(&service, &["bash"]).await.map_err(|e| {
                tracing::error!("Could not attach to [{}] service, is it running?", service);
                e
            })?;
        }

        Commands::Restart { service } => {
            let orchestrator = ComposeOrchestrator::new(settings.artifact_path()?);
            orchestrator.restart(&service).await.map_err(|e| {
                tracing::error!("Could not restart [{}] service", service);
                e
            })?;
        }

        Commands::Logs {
            follow,
            tail,
            services,
        } => {
            let orchestrator = ComposeOrchestrator::new(settings.artifact_path()?);
            if let Completion::Exited(exit) = orchestrator.logs(&services, follow, tail).await? {
                if !exit.success() {
                    tracing::warn!("docker-compose logs exited with {}", exit);
                }
            }
        }

        Commands::List { filter } => {
            let containers = ContainerManager::new().list(filter.as_deref()).await?;

            println!(
                "{:<14} {:<40} {:<30} {:<12} {:<25}",
                "CONTAINER ID", "NAME", "IMAGE", "STATE", "STATUS"
            );
            for c in containers {
                println!(
                    "{:<14} {:<40} {:<30} {:<12} {:<25}",
                    c.id,
                    c.names,
                    c.image,
                    c.state.to_string(),
                    c.status
                );
            }
        }

        Commands::Kill { keep, service } => {
            let artifact_path = settings.artifact_path()?;
            let orchestrator = ComposeOrchestrator::new(artifact_path.clone());
            let kill = async {
                match service {
                    Some(service) => orchestrator.kill(&service).await.map(|_| ()),
                    None => ContainerManager::new().kill_all().await.map(|_| ()),
                }
            };

            Artifact::new(artifact_path)
                .cleanup_after(keep, &settings, kill)
                .await?;
        }

        Commands::Stop => {
            Artifact::new(settings.artifact_path()?)
                .cleanup_after(false, &settings, ContainerManager::new().stop_all())
                .await?;
        }

        Commands::Config => {
            let artifact = Artifact::new(settings.artifact_path()?);
            print!("{}", artifact.contents()?);
        }

        Commands::Settings { command } => match command {
            SettingsCommands::Show => {
                let data = store.read()?;
                println!("{}", serde_json::to_string_pretty(&data)?);
            }
            SettingsCommands::Set { key, value } => {
                let parsed = serde_json::from_str(&value)
                    .unwrap_or_else(|_| serde_json::Value::String(value.clone()));

                let mut data = store.read()?;
                data.insert(key.clone(), parsed.clone());
                Settings::from_value(serde_json::Value::Object(data))?;

                store.set(&key, parsed)?;
                println!("{} updated in {}", key, store.path().display());
            }
        },
    }

    Ok(())
}

/// Orchestrator for a stack whose aggregate file already exists
fn running_stack(settings: &Settings) -> Result<ComposeOrchestrator> {
    let path = settings.artifact_path()?;
    if !path.is_file() {
        return Err(MsError::ArtifactMissing(path));
    }
    Ok(ComposeOrchestrator::new(path))
}
