// crates/civic-comments-cli/src/main.rs
// ============================================================================
// Module: Civic Comments CLI Entry Point
// Description: Command dispatcher for the comments server and operator tools.
// Purpose: Provide a safe, localized CLI for serving, seeding, and signing.
// Dependencies: clap, civic-comments-config, civic-comments-core,
//               civic-comments-http, ed25519-dalek, tokio, tracing.
// ============================================================================

//! ## Overview
//! The `civic-comments` binary starts the HTTP server and offers the operator
//! tasks the server itself does not expose: validating configuration, seeding
//! spaces from a fixtures file, issuing session tokens, and signing or
//! locating global ids. All user-facing strings are routed through the i18n
//! catalog. Inputs are untrusted; file reads are size-bounded.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use civic_comments_cli::i18n::Locale;
use civic_comments_cli::i18n::set_locale;
use civic_comments_cli::logging::init_tracing;
use civic_comments_cli::t;
use civic_comments_config::CommentsConfig;
use civic_comments_config::StoreType;
use civic_comments_core::FixtureSet;
use civic_comments_core::GlobalIdSigner;
use civic_comments_core::GlobalModel;
use civic_comments_core::SessionStore;
use civic_comments_core::SharedCommentsStore;
use civic_comments_core::UserId;
use civic_comments_http::CommentsServer;
use civic_comments_http::build_signer;
use civic_comments_http::build_store;
use civic_comments_http::server::now_ms;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use ed25519_dalek::SigningKey;
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a fixtures JSON input.
const MAX_FIXTURE_BYTES: usize = 8 * 1024 * 1024;
/// Length of a raw ed25519 secret key.
const SIGNING_KEY_LEN: usize = 32;
/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "CIVIC_COMMENTS_LANG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "civic-comments", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `CIVIC_COMMENTS_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Increase log verbosity (repeatable).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the comments HTTP server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Seed organizations, spaces, resources, and users from a fixtures file.
    Seed(SeedCommand),
    /// Session utilities.
    Session {
        /// Selected session subcommand.
        #[command(subcommand)]
        command: SessionCommand,
    },
    /// Signed global id utilities.
    Gid {
        /// Selected global id subcommand.
        #[command(subcommand)]
        command: GidCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to civic-comments.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a comments configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to civic-comments.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for fixture seeding.
#[derive(Args, Debug)]
struct SeedCommand {
    /// Path to the fixtures JSON file.
    #[arg(long, value_name = "PATH")]
    fixtures: PathBuf,
    /// Optional config file path (defaults to civic-comments.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Session subcommands.
#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Issue a session token for a seeded user.
    Issue(SessionIssueCommand),
}

/// Arguments for session issuance.
#[derive(Args, Debug)]
struct SessionIssueCommand {
    /// User identifier.
    #[arg(long, value_name = "ID")]
    user_id: u64,
    /// Optional config file path (defaults to civic-comments.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Global id subcommands.
#[derive(Subcommand, Debug)]
enum GidCommand {
    /// Sign a global id for use as `commentable_gid`.
    Sign(GidSignCommand),
    /// Verify a signed global id and print its URI.
    Locate(GidLocateCommand),
    /// Generate a new signing key file.
    Keygen(GidKeygenCommand),
}

/// Addressable record kinds.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ModelArg {
    /// Commentable resource.
    #[value(name = "DummyResource")]
    DummyResource,
    /// Comment (for replies).
    #[value(name = "Comment")]
    Comment,
}

impl From<ModelArg> for GlobalModel {
    fn from(value: ModelArg) -> Self {
        match value {
            ModelArg::DummyResource => Self::DummyResource,
            ModelArg::Comment => Self::Comment,
        }
    }
}

/// Arguments for global id signing.
#[derive(Args, Debug)]
struct GidSignCommand {
    /// Record kind.
    #[arg(long, value_enum, value_name = "MODEL")]
    model: ModelArg,
    /// Record identifier.
    #[arg(long, value_name = "ID")]
    id: u64,
    /// Optional config file path (defaults to civic-comments.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for global id location.
#[derive(Args, Debug)]
struct GidLocateCommand {
    /// Signed global id token.
    #[arg(long, value_name = "TOKEN")]
    token: String,
    /// Optional config file path (defaults to civic-comments.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for signing key generation.
#[derive(Args, Debug)]
struct GidKeygenCommand {
    /// Output path for the base64 signing key.
    #[arg(long, value_name = "PATH")]
    output: PathBuf,
    /// Overwrite an existing key file.
    #[arg(long, action = ArgAction::SetTrue)]
    force: bool,
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Catalan.
    Ca,
    /// Spanish.
    Es,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Ca => Self::Ca,
            LangArg::Es => Self::Es,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    init_tracing(cli.verbose)
        .map_err(|err| CliError::new(t!("logging.init_failed", error = err)))?;

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(&command),
        Commands::Seed(command) => command_seed(&command),
        Commands::Session {
            command,
        } => command_session(&command),
        Commands::Gid {
            command,
        } => command_gid(&command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let server = tokio::task::spawn_blocking(move || CommentsServer::from_config(&config))
        .await
        .map_err(|err| {
            CliError::new(t!("serve.init_failed", error = format!("init join failed: {err}")))
        })?
        .map_err(|err| CliError::new(t!("serve.init_failed", error = err)))?;
    server.serve().await.map_err(|err| CliError::new(t!("serve.failed", error = err)))?;

    Ok(ExitCode::SUCCESS)
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = load_config(command.config.as_deref())?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<CommentsConfig> {
    CommentsConfig::load(path).map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

// ============================================================================
// SECTION: Store Commands
// ============================================================================

/// Executes the `seed` command.
fn command_seed(command: &SeedCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let store = open_persistent_store(&config, "seed")?;
    let kind = t!("input.kind.fixtures");
    let bytes = read_bytes_with_limit(&command.fixtures, MAX_FIXTURE_BYTES)
        .map_err(|err| read_limit_error(&kind, &command.fixtures, err))?;
    let fixtures = FixtureSet::from_json_slice(&bytes).map_err(|err| {
        CliError::new(t!("seed.parse_failed", path = command.fixtures.display(), error = err))
    })?;
    let summary = fixtures
        .apply(&store)
        .map_err(|err| CliError::new(t!("seed.apply_failed", error = err)))?;
    tracing::info!(
        organizations = summary.organizations,
        users = summary.users,
        processes = summary.processes,
        components = summary.components,
        resources = summary.resources,
        "fixtures seeded"
    );
    let rendered = serde_json::to_string_pretty(&summary)
        .map_err(|err| CliError::new(t!("seed.summary_failed", error = err)))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Dispatches session subcommands.
fn command_session(command: &SessionCommand) -> CliResult<ExitCode> {
    match command {
        SessionCommand::Issue(command) => command_session_issue(command),
    }
}

/// Executes the `session issue` command.
fn command_session_issue(command: &SessionIssueCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let store = open_persistent_store(&config, "session issue")?;
    let token = store.issue_session(UserId::new(command.user_id), now_ms()).map_err(|err| {
        CliError::new(t!("session.issue_failed", user_id = command.user_id, error = err))
    })?;
    write_stdout_line(&token).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Opens the configured store, refusing backends that vanish on exit.
fn open_persistent_store(config: &CommentsConfig, command: &str) -> CliResult<SharedCommentsStore> {
    if config.store.store_type == StoreType::Memory {
        return Err(CliError::new(t!("store.memory_not_persistent", command = command)));
    }
    build_store(config).map_err(|err| CliError::new(t!("store.init_failed", error = err)))
}

// ============================================================================
// SECTION: Global Id Commands
// ============================================================================

/// Dispatches global id subcommands.
fn command_gid(command: &GidCommand) -> CliResult<ExitCode> {
    match command {
        GidCommand::Sign(command) => command_gid_sign(command),
        GidCommand::Locate(command) => command_gid_locate(command),
        GidCommand::Keygen(command) => command_gid_keygen(command),
    }
}

/// Executes the `gid sign` command.
fn command_gid_sign(command: &GidSignCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let signer = persistent_signer(&config, "gid sign")?;
    let gid = signer.global_id(command.model.into(), command.id);
    let token = signer
        .sign(&gid, now_ms())
        .map_err(|err| CliError::new(t!("gid.sign_failed", error = err)))?;
    write_stdout_line(&token).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `gid locate` command.
fn command_gid_locate(command: &GidLocateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let signer = persistent_signer(&config, "gid locate")?;
    let gid = signer
        .locate_signed(command.token.trim(), now_ms())
        .map_err(|err| CliError::new(t!("gid.locate_failed", error = err)))?;
    write_stdout_line(&gid.to_uri()).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `gid keygen` command.
fn command_gid_keygen(command: &GidKeygenCommand) -> CliResult<ExitCode> {
    if command.output.exists() && !command.force {
        return Err(CliError::new(t!("gid.keygen.exists", path = command.output.display())));
    }
    let mut secret = [0_u8; SIGNING_KEY_LEN];
    OsRng.fill_bytes(&mut secret);
    let signing_key = SigningKey::from_bytes(&secret);
    let encoded = format!("{}\n", STANDARD.encode(signing_key.to_bytes()));
    write_key_file(&command.output, encoded.as_bytes()).map_err(|err| {
        CliError::new(t!("gid.keygen.write_failed", path = command.output.display(), error = err))
    })?;
    let verifying_key = STANDARD.encode(signing_key.verifying_key().to_bytes());
    write_stdout_line(&t!(
        "gid.keygen.ok",
        path = command.output.display(),
        verifying_key = verifying_key
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the configured signer, refusing ephemeral keys.
fn persistent_signer(config: &CommentsConfig, command: &str) -> CliResult<GlobalIdSigner> {
    if config.global_id.signing_key_path.is_none() {
        return Err(CliError::new(t!("gid.key_required", command = command)));
    }
    build_signer(config).map_err(|err| CliError::new(t!("gid.signer_failed", error = err)))
}

/// Writes a key file readable only by its owner.
fn write_key_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Converts a bounded read failure into a localized CLI error.
fn read_limit_error(kind: &str, path: &Path, error: ReadLimitError) -> CliError {
    match error {
        ReadLimitError::Io(err) => {
            CliError::new(t!("input.read_failed", kind = kind, path = path.display(), error = err))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(t!(
            "input.read_too_large",
            kind = kind,
            path = path.display(),
            size = size,
            limit = limit
        )),
    }
}

/// Resolves the CLI locale from flag or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
