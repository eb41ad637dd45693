//! Command-line interface.

pub mod completions;
pub mod diff;
pub mod doctor;
pub mod export;
pub mod import;
pub mod init;
pub mod log;
pub mod member;
pub mod output;
pub mod rotate;
pub mod run;
pub mod secrets;
pub mod verify;

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};

use crate::core::config::{Config, IdentitySource};
use crate::core::constants;
use crate::core::document::Role;
use crate::core::ExportFormat;
use crate::error::Result;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default())
    .valid(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .invalid(AnsiColor::Red.on_default().effects(Effects::BOLD))
    .error(AnsiColor::Red.on_default().effects(Effects::BOLD));

/// envkey - secrets without servers.
#[derive(Parser)]
#[command(
    name = "envkey",
    about = "Secrets without servers: one encrypted file in your repo",
    version,
    styles = STYLES
)]
pub struct Cli {
    /// Enable verbose logging output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Treat identity-permission warnings as fatal
    #[arg(long, global = true)]
    pub strict: bool,

    /// Identity file path (overrides ENVKEY_IDENTITY and the default)
    #[arg(long, global = true, value_name = "PATH")]
    pub identity: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Generate an identity and initialize the secrets document
    Init {
        /// Regenerate the identity even if one exists
        #[arg(long)]
        force: bool,
        /// Your member name (defaults to the OS username)
        #[arg(long)]
        name: Option<String>,
    },

    /// Encrypt and store a secret (upsert)
    Set {
        /// Secret name (e.g., DATABASE_URL)
        key: String,
        /// Secret value (omit when using --file)
        #[arg(required_unless_present = "from_file", conflicts_with = "from_file")]
        value: Option<String>,
        #[arg(short = 'e', long = "env", default_value = constants::DEFAULT_ENV, env = constants::ENV_ENV)]
        env: String,
        /// Read the value from a file and mark the secret file-valued
        #[arg(long = "file", value_name = "PATH")]
        from_file: Option<PathBuf>,
    },

    /// Decrypt and print a secret value
    Get {
        /// Secret name
        key: String,
        #[arg(short = 'e', long = "env", default_value = constants::DEFAULT_ENV, env = constants::ENV_ENV)]
        env: String,
        /// Write the plaintext to a file (mode 0600) instead of stdout
        #[arg(long = "file", value_name = "PATH")]
        to_file: Option<PathBuf>,
    },

    /// List secret names and metadata
    Ls {
        #[arg(short = 'e', long = "env", default_value = constants::DEFAULT_ENV, env = constants::ENV_ENV)]
        env: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a secret
    Rm {
        /// Secret name
        key: String,
        #[arg(short = 'e', long = "env", default_value = constants::DEFAULT_ENV, env = constants::ENV_ENV)]
        env: String,
        /// Skip confirmation prompts (also prunes an emptied environment)
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Manage team members
    #[command(subcommand)]
    Member(MemberAction),

    /// Rotate secret values or refresh encryption keys
    Rotate {
        /// Secret name (omit with --all)
        key: Option<String>,
        /// New value (omit with --generate or --all)
        value: Option<String>,
        #[arg(short = 'e', long = "env", default_value = constants::DEFAULT_ENV, env = constants::ENV_ENV)]
        env: String,
        /// Generate a random value of N characters
        #[arg(long, value_name = "N", conflicts_with_all = ["value", "all"])]
        generate: Option<usize>,
        /// Alphabet for --generate
        #[arg(long, value_enum, default_value = "base64")]
        alphabet: AlphabetArg,
        /// Re-encrypt every reachable entry with fresh file keys
        #[arg(long, conflicts_with = "key")]
        all: bool,
    },

    /// Run a command with decrypted secrets in its environment
    Run {
        #[arg(short = 'e', long = "env", default_value = constants::DEFAULT_ENV, env = constants::ENV_ENV)]
        env: String,
        /// Directory for file-valued secrets (default: secure temp dir)
        #[arg(long, value_name = "DIR")]
        secrets_dir: Option<PathBuf>,
        /// Command and arguments to run
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },

    /// Print decrypted secrets in an export format
    Export {
        #[arg(short = 'e', long = "env", default_value = constants::DEFAULT_ENV, env = constants::ENV_ENV)]
        env: String,
        #[arg(long, value_enum, default_value = "env")]
        format: FormatArg,
    },

    /// Encrypt every entry of a .env file into an environment
    Import {
        /// Path to the .env file
        #[arg(default_value = ".env")]
        path: PathBuf,
        #[arg(short = 'e', long = "env", default_value = constants::DEFAULT_ENV, env = constants::ENV_ENV)]
        env: String,
    },

    /// Compare an environment against a local .env file
    Diff {
        /// Path to the .env file
        #[arg(default_value = ".env")]
        path: PathBuf,
        #[arg(short = 'e', long = "env", default_value = constants::DEFAULT_ENV, env = constants::ENV_ENV)]
        env: String,
    },

    /// Show who changed what, newest first
    Log,

    /// Check every ciphertext against the derived recipient sets
    Verify {
        /// Re-key drifted environments (admin)
        #[arg(long)]
        fix: bool,
    },

    /// Diagnose the document, identity, and access setup
    Doctor,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Team subcommands.
#[derive(Subcommand)]
pub enum MemberAction {
    /// Add a member by their age public key and re-key their environments
    Add {
        /// Member name
        name: String,
        /// age public key (age1...)
        key: String,
        /// Role in the team
        #[arg(long, value_enum, default_value = "member")]
        role: RoleArg,
        /// Environment entitlements (required for --role ci)
        #[arg(short = 'e', long = "env", value_name = "ENV")]
        environments: Vec<String>,
    },

    /// Remove a member and re-key everything they could read
    Rm {
        /// Member name
        name: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Entitle a member to an environment
    Grant {
        /// Member name
        name: String,
        #[arg(short = 'e', long = "env", required = true)]
        env: String,
    },

    /// Withdraw an environment from a member
    Revoke {
        /// Member name
        name: String,
        #[arg(short = 'e', long = "env", required = true)]
        env: String,
    },

    /// Replace a member's public key and re-key their environments
    Update {
        /// Member name
        name: String,
        /// New age public key
        key: String,
    },

    /// List team members
    Ls {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum RoleArg {
    Admin,
    Member,
    Ci,
    Readonly,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Role::Admin,
            RoleArg::Member => Role::Member,
            RoleArg::Ci => Role::Ci,
            RoleArg::Readonly => Role::Readonly,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Env,
    Json,
    Docker,
    #[value(name = "k8s-secret")]
    K8sSecret,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Env => ExportFormat::Env,
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Docker => ExportFormat::Docker,
            FormatArg::K8sSecret => ExportFormat::K8sSecret,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum AlphabetArg {
    Base64,
    Hex,
    Alnum,
}

impl From<AlphabetArg> for crate::core::cipher::Alphabet {
    fn from(alphabet: AlphabetArg) -> Self {
        use crate::core::cipher::Alphabet;
        match alphabet {
            AlphabetArg::Base64 => Alphabet::Base64,
            AlphabetArg::Hex => Alphabet::Hex,
            AlphabetArg::Alnum => Alphabet::Alnum,
        }
    }
}

/// Build the core config from the parsed globals and environment.
pub fn config_from(cli: &Cli) -> Config {
    let identity = if let Some(path) = &cli.identity {
        IdentitySource::Path(path.clone())
    } else if let Ok(value) = std::env::var(constants::ENV_IDENTITY) {
        if value.trim_start().starts_with("AGE-SECRET-KEY-") {
            IdentitySource::Raw(value)
        } else {
            IdentitySource::Path(PathBuf::from(value))
        }
    } else {
        IdentitySource::Default
    };

    Config {
        document_path: std::env::var_os(constants::ENV_FILE).map(PathBuf::from),
        identity,
        strict: cli.strict,
    }
}

/// Dispatch a parsed command.
pub fn execute(cli: Cli) -> Result<()> {
    let config = config_from(&cli);

    match cli.command {
        Command::Init { force, name } => init::execute(&config, force, name),
        Command::Set {
            key,
            value,
            env,
            from_file,
        } => secrets::set(&config, &env, &key, value, from_file.as_deref()),
        Command::Get { key, env, to_file } => {
            secrets::get(&config, &env, &key, to_file.as_deref())
        }
        Command::Ls { env, json } => secrets::ls(&config, &env, json),
        Command::Rm { key, env, yes } => secrets::rm(&config, &env, &key, yes),
        Command::Member(action) => member::execute(&config, action),
        Command::Rotate {
            key,
            value,
            env,
            generate,
            alphabet,
            all,
        } => rotate::execute(&config, &env, key.as_deref(), value, generate, alphabet, all),
        Command::Run {
            env,
            secrets_dir,
            command,
        } => run::execute(&config, &env, &command, secrets_dir.as_deref()),
        Command::Export { env, format } => export::execute(&config, &env, format.into()),
        Command::Import { path, env } => import::execute(&config, &env, &path),
        Command::Diff { path, env } => diff::execute(&config, &env, &path),
        Command::Log => log::execute(&config),
        Command::Verify { fix } => verify::execute(&config, fix),
        Command::Doctor => doctor::execute(&config),
        Command::Completions { shell } => {
            completions::execute(shell);
            Ok(())
        }
    }
}
