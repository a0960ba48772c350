//! sadstate - command-line client for the club service.

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sadstate_client::config::ConfigLoader;
use sadstate_client::{
    AuthTicket, ClientConfig, CombineOp, ConfigResolver, PeerId, PermissionSet, PermissionTable,
    ProjectPermissions, Response, Session,
};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// sadstate CLI - talk to a club-management server
#[derive(Parser, Debug)]
#[command(name = "sadstate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Server address (overrides config and SADSTATE_HOST)
    #[arg(long, value_name = "URL")]
    host: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Create a fresh identity with this password before running the command
    #[arg(long, value_name = "PW")]
    password: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authentication
    #[command(subcommand)]
    Auth(AuthCommand),

    /// Projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Profiles within a project
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Create a new identity
    New { password: String },

    /// Authenticate as an existing identity
    Set { id: AuthTicket, password: String },
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    /// Fetch a project by name
    Get { name: String },

    /// List every profile of a project
    Profiles { name: String },

    /// Register a new project owned by the current identity
    Register {
        name: String,

        /// Grant a peer project permissions, e.g. `17=view,edit`; a bare
        /// peer gets VIEW
        #[arg(long = "grant", value_name = "PEER[=FLAGS]", value_parser = parse_grant)]
        grants: Vec<(PeerId, ProjectPermissions)>,
    },
}

/// Parses `PEER[=FLAG,FLAG...]` for `--grant`.
fn parse_grant(text: &str) -> Result<(PeerId, ProjectPermissions), String> {
    let (peer, flags) = match text.split_once('=') {
        Some((peer, flags)) => (peer, Some(flags)),
        None => (text, None),
    };
    let peer = PeerId::parse(peer).map_err(|e| e.to_string())?;
    let set = match flags {
        None => ProjectPermissions::DEFAULT,
        Some(flags) => flags
            .split(',')
            .try_fold(ProjectPermissions::empty(), |acc, name| {
                ProjectPermissions::parse(name)
                    .map(|flag| acc.combine(flag, CombineOp::Or))
                    .ok_or_else(|| format!("unknown project permission '{}'", name.trim()))
            })?,
    };
    Ok((peer, set))
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Fetch a profile
    Get { project: String, profile: String },

    /// Print a profile's stored content
    Read { project: String, profile: String },
}

/// Applies CLI flags on top of the file and environment layers.
#[derive(Debug)]
struct CliConfigResolver {
    host: Option<String>,
    timeout: Option<u64>,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        Self {
            host: args.host.clone(),
            timeout: args.timeout,
        }
    }
}

impl ConfigResolver for CliConfigResolver {
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(ref host) = self.host {
            config.host.clone_from(host);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // --debug > SADSTATE_LOG > default "warn"
    let filter = if args.debug {
        EnvFilter::new("debug,ureq=warn,ureq_proto=warn,rustls=warn")
    } else {
        EnvFilter::try_from_env("SADSTATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // stdout is reserved for the result document
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();

    let project_root = match args.project.clone() {
        Some(root) => root,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let mut config = ConfigLoader::new()
        .with_project_root(&project_root)
        .load()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
    CliConfigResolver::from_args(&args).apply(&mut config);

    info!(host = %config.host, timeout_secs = config.timeout_secs, "Resolved config");

    let session = Session::new(&config);

    if let Some(ref password) = args.password {
        let response = session.new_auth(password);
        if !response.is_success() {
            return emit(&response, |ticket| Value::from(ticket.get()));
        }
        debug!(ticket = ?session.ticket(), "Authenticated before command");
    }

    run(&session, args.command)
}

fn run(session: &Session, command: Command) -> Result<ExitCode> {
    match command {
        Command::Auth(AuthCommand::New { password }) => {
            emit(&session.new_auth(&password), |ticket| Value::from(ticket.get()))
        }
        Command::Auth(AuthCommand::Set { id, password }) => emit(
            &session.authenticate(id, &password),
            |ticket| Value::from(ticket.get()),
        ),
        Command::Project(ProjectCommand::Get { name }) => {
            emit(&session.get_project(&name), output::project)
        }
        Command::Project(ProjectCommand::Profiles { name }) => {
            let fetched = session.get_project(&name);
            let Some(project) = fetched.success() else {
                return emit(&fetched, output::project);
            };
            emit(&project.get_all_profiles(), |profiles| {
                profiles.iter().map(output::profile).collect()
            })
        }
        Command::Project(ProjectCommand::Register { name, grants }) => {
            let table: PermissionTable<ProjectPermissions> = grants.into_iter().collect();
            let permissions = (!table.is_empty()).then_some(&table);
            emit(
                &session.register_project(&name, permissions, Map::new()),
                |_| Value::Null,
            )
        }
        Command::Profile(ProfileCommand::Get { project, profile }) => {
            let fetched = session.get_project(&project);
            let Some(project) = fetched.success() else {
                return emit(&fetched, output::project);
            };
            emit(&project.get_profile(&profile), output::profile)
        }
        Command::Profile(ProfileCommand::Read { project, profile }) => {
            let fetched = session.get_project(&project);
            let Some(project) = fetched.success() else {
                return emit(&fetched, output::project);
            };
            let fetched = project.get_profile(&profile);
            let Some(profile) = fetched.success() else {
                return emit(&fetched, output::profile);
            };
            emit(&profile.read(), |bytes| output::content(bytes))
        }
    }
}

/// Prints the result document and maps the outcome to an exit status.
fn emit<T>(response: &Response<T>, render: impl FnOnce(&T) -> Value) -> Result<ExitCode> {
    let doc = output::document(response, render);
    println!(
        "{}",
        serde_json::to_string_pretty(&doc).context("cannot render result")?
    );
    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
