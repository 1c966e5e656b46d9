use std::{io::Write, path::PathBuf, process::exit};

use clap::{Parser, Subcommand};
use compact_str::{format_compact, ToCompactString};
use drone_scm::{
    client::ClientConfig,
    config::{default_config_path, load_config, ScmConfig},
    id::ProjectId,
    logging::{init_logging, LoggingConfig},
    result::{AppError, Result},
    GitLabClient, Repo, ScmClient,
};
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use uuid::Uuid;

/// Read files and changes from a GitLab project the way a Drone config plugin does
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Alternate path to the configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the path to the configuration file and exit.
    #[arg(short, long)]
    print_config_path: bool,
    /// Numeric project id or `namespace/name`; overrides the config file.
    #[arg(long, value_name = "ID_OR_SLUG")]
    project: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the raw contents of a file
    Cat {
        path: String,
        #[arg(long = "ref", default_value = "HEAD")]
        git_ref: String,
    },
    /// List the immediate children of a directory
    Ls {
        #[arg(default_value = "")]
        path: String,
        #[arg(long = "ref", default_value = "HEAD")]
        git_ref: String,
    },
    /// List the files changed between two revisions
    Diff { from: String, to: String },
    /// List the files changed by a merge request
    Mr { iid: u64 },
}

fn main() {
    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(default_config_path);

    if args.print_config_path {
        println!("{}", config_path.display());
        exit(0);
    }

    if let Err(e) = run(args, config_path) {
        eprintln!("Error: {e}");
        exit(e.exit_code());
    }
}

fn run(args: Args, config_path: PathBuf) -> Result<()> {
    color_eyre::install()
        .map_err(|e| AppError::GeneralError(format_compact!("failed to install color_eyre: {e}")))?;

    let Some(command) = args.command else {
        return Err(AppError::GeneralError("no command given, see --help".into()));
    };

    let config = load_config(&config_path)?;
    config
        .validate()
        .map_err(|e| AppError::InvalidConfig(e.to_compact_string()))?;

    let _log_guard = initialize_logging(&config)?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "drone-scm starting up");

    let project = args.project.or_else(|| config.project.clone()).ok_or_else(|| {
        AppError::InvalidConfig("no project given; set `project` or pass --project".into())
    })?;

    let debug = std::env::var("DRONE_SCM_DEBUG").is_ok();
    let client_config = ClientConfig::from(&config).with_debug_logging(debug);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| AppError::GeneralError(format_compact!("Failed to create runtime: {e}")))?;

    rt.block_on(async {
        let ctx = CancellationToken::new();
        let on_interrupt = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let correlation_id = Uuid::new_v4();
        let client: Box<dyn ScmClient> = Box::new(
            GitLabClient::from_config(&ctx, correlation_id, client_config, repo_for(&project))
                .await?,
        );

        execute(&ctx, client.as_ref(), command).await
    })
}

fn initialize_logging(config: &ScmConfig) -> Result<Option<WorkerGuard>> {
    let mut logging_config = LoggingConfig::from_env();

    // config file wins over the environment
    if let Some(log_level) = &config.log_level {
        logging_config.apply_level(log_level);
    }

    init_logging(logging_config)
        .map_err(|e| AppError::GeneralError(format_compact!("Failed to initialize logging: {e}")))
}

/// Numeric ids are used as-is, anything else is looked up as `namespace/name`
fn repo_for(project: &str) -> Repo {
    let project = project.trim().trim_matches('/');
    if ProjectId::parse(project).is_some() {
        return Repo { uid: project.into(), ..Repo::default() };
    }

    let (namespace, name) = project.rsplit_once('/').unwrap_or(("", project));
    Repo {
        uid: "".into(),
        namespace: namespace.into(),
        name: name.into(),
        slug: project.into(),
    }
}

async fn execute(ctx: &CancellationToken, client: &dyn ScmClient, command: Command) -> Result<()> {
    let mut out = std::io::stdout().lock();

    match command {
        Command::Cat { path, git_ref } => {
            let content = client.get_file_contents(ctx, &path, &git_ref).await?;
            out.write_all(&content).map_err(io_error)?;
        },
        Command::Ls { path, git_ref } => {
            for entry in client.get_file_listing(ctx, &path, &git_ref).await? {
                writeln!(out, "{}\t{}", entry.kind, entry.path).map_err(io_error)?;
            }
        },
        Command::Diff { from, to } => {
            let files = client.changed_files_in_diff(ctx, &from, &to).await?;
            print_changes(&mut out, &files)?;
        },
        Command::Mr { iid } => {
            let files = client.changed_files_in_pull_request(ctx, iid).await?;
            print_changes(&mut out, &files)?;
        },
    }

    out.flush().map_err(io_error)
}

fn print_changes(out: &mut impl Write, files: &[drone_scm::domain::ChangedFile]) -> Result<()> {
    for file in files {
        let written = match &file.previous_path {
            Some(previous) => writeln!(out, "{}\t{}\t{}", file.kind.code(), file.path, previous),
            None => writeln!(out, "{}\t{}", file.kind.code(), file.path),
        };
        written.map_err(io_error)?;
    }
    Ok(())
}

fn io_error(e: std::io::Error) -> AppError {
    AppError::GeneralError(format_compact!("failed to write output: {e}"))
}
