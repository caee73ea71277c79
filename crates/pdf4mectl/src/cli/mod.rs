//! CLI structure and command definitions
//!
//! Three layers, the same way the API is used:
//! 1. Catalog operations (`run`) - named PDF4me operations with file inputs
//! 2. Raw endpoint access (`call`, `poll`) - any endpoint, any JSON body
//! 3. Local management (`profile`, `operations`, `completions`)

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use pdf4me_core::config::BackoffKind;
use pdf4me_core::{AuthScheme, Category, Operation};

/// PDF4me document API from the command line
#[derive(Parser, Debug)]
#[command(name = "pdf4mectl")]
#[command(version, about = "Command-line client for the PDF4me document API")]
#[command(long_about = "
Command-line client for the PDF4me document API

Every operation is submitted as a job. Short jobs answer immediately; long
ones are polled until the document is ready.

EXAMPLES:
    # Set up a profile
    pdf4mectl profile set default --api-key KEY

    # Compress a PDF
    pdf4mectl run compress-pdf report.pdf

    # Convert many Word files, four at a time
    pdf4mectl run convert-to-pdf *.docx --out converted/ --concurrency 4

    # Split a PDF and write every part into a directory
    pdf4mectl run split-pdf report.pdf \\
        --set splitAction=RecurringSplitAfterPage --set splitActionNumber=2

    # Call any endpoint with a raw JSON body
    pdf4mectl call api/v2/ConvertToPdf --data @body.json --out result.pdf

    # List available operations
    pdf4mectl operations --category convert

For more help on a specific command, run:
    pdf4mectl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "PDF4ME_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "PDF4ME_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Automatically choose format based on command and context
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a catalog operation on local files
    #[command(visible_alias = "r")]
    #[command(after_help = "EXAMPLES:
    # Compress a PDF, writing report.compress-pdf.pdf next to it
    pdf4mectl run compress-pdf report.pdf

    # Pick the output file
    pdf4mectl run convert-to-pdf letter.docx --out letter.pdf

    # Merge several PDFs into one
    pdf4mectl run merge a.pdf b.pdf c.pdf --out merged.pdf

    # Pass operation options (values are parsed as JSON when they can be)
    pdf4mectl run rotate-document scan.pdf --set rotationType=Clockwise

    # Pass a whole options object
    pdf4mectl run add-text-stamp doc.pdf --options '{\"text\":\"DRAFT\",\"alignX\":\"center\"}'

    # Attach a second file as a base64 option
    pdf4mectl run add-image-stamp doc.pdf --set-file imageFile=logo.png

    # Submit without waiting; resume later with `pdf4mectl poll`
    pdf4mectl run create-pdfa big.pdf --no-wait
")]
    Run(RunArgs),

    /// Call an endpoint with a raw JSON body
    #[command(after_help = "EXAMPLES:
    # Body from a file, binary result to a file
    pdf4mectl call api/v2/ConvertToPdf --data @body.json --out result.pdf

    # Inline body, JSON result printed
    pdf4mectl call api/v2/GetPdfMetadata --data '{\"docContent\":\"...\",\"docName\":\"a.pdf\"}'
")]
    Call {
        /// Endpoint path relative to the base URL, or an absolute URL
        endpoint: String,

        /// JSON body (use @filename to read from file)
        #[arg(long, short = 'd')]
        data: Option<String>,

        /// Write the result to this file
        #[arg(long = "out", short = 'O')]
        out: Option<PathBuf>,

        /// Decode a JSON document envelope into this directory
        #[arg(long, conflicts_with = "out")]
        extract: Option<PathBuf>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Poll a job Location until its result is ready
    #[command(after_help = "EXAMPLES:
    # Resume a job submitted with --no-wait
    pdf4mectl poll https://api.pdf4me.com/api/v2/JobStatus/abc123 --out result.pdf
")]
    Poll {
        /// Location URL returned when the job was accepted
        location: String,

        /// Write the result to this file
        #[arg(long = "out", short = 'O')]
        out: Option<PathBuf>,

        /// Decode a JSON document envelope into this directory
        #[arg(long, conflicts_with = "out")]
        extract: Option<PathBuf>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// List catalog operations
    #[command(visible_alias = "ops")]
    #[command(after_help = "EXAMPLES:
    # Every operation
    pdf4mectl operations

    # Only conversions, as JSON
    pdf4mectl operations --category convert -o json
")]
    Operations {
        /// Only show operations in this category
        #[arg(long, short, value_enum)]
        category: Option<Category>,
    },

    /// Profile management
    #[command(subcommand, visible_alias = "prof", visible_alias = "pr")]
    #[command(after_help = "EXAMPLES:
    # Create a profile (the API key is prompted for when omitted)
    pdf4mectl profile set default --api-key KEY

    # Profile for a self-hosted gateway with slower polling
    pdf4mectl profile set gateway --base-url https://pdf.example.com/ --poll-interval 20

    # List all profiles
    pdf4mectl profile list

    # Show profile details
    pdf4mectl profile show default

    # Set the default profile
    pdf4mectl profile default gateway
")]
    Profile(ProfileCommands),

    /// Version information
    #[command(visible_alias = "ver", visible_alias = "v")]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments for `run`
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Operation name (see `pdf4mectl operations`)
    #[arg(value_parser = parse_operation)]
    pub operation: Operation,

    /// Input files
    pub files: Vec<PathBuf>,

    /// Operation option as KEY=VALUE (repeatable)
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// File sent base64-encoded under an option key, as KEY=PATH (repeatable)
    #[arg(long = "set-file", value_name = "KEY=PATH")]
    pub set_file: Vec<String>,

    /// Options object as JSON (use @filename to read from file)
    #[arg(long)]
    pub options: Option<String>,

    /// Override the document name sent to the server
    #[arg(long)]
    pub doc_name: Option<String>,

    /// Output file, or output directory when several files are processed
    #[arg(long = "out", short = 'O')]
    pub out: Option<PathBuf>,

    /// Decode a JSON document envelope into separate files
    #[arg(long)]
    pub extract: bool,

    /// Files processed at the same time when running a batch
    #[arg(long, default_value = "4", value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Ask the server to answer synchronously
    #[arg(long)]
    pub sync: bool,

    /// Submit only and print the Location to poll
    #[arg(long, conflicts_with = "sync")]
    pub no_wait: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Per-command connection overrides
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// API key (overrides profile and PDF4ME_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// API base URL (overrides profile and PDF4ME_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Seconds to wait before each status check
    #[arg(long, value_name = "SECS", value_parser = parse_seconds)]
    pub poll_interval: Option<Duration>,

    /// Status checks before giving up
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub request_timeout: Option<u64>,

    /// Do not draw a progress spinner
    #[arg(long)]
    pub no_progress: bool,
}

/// Profile management commands
#[derive(Subcommand, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls", visible_alias = "l")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "sh", visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    #[command(after_help = "EXAMPLES:
    # Create a profile (key prompted for)
    pdf4mectl profile set default

    # Create a profile with the key inline
    pdf4mectl profile set work --api-key KEY --default

    # Gateway that expects the raw key instead of Basic
    pdf4mectl profile set gateway --api-key KEY \\
        --base-url http://localhost:9000/pdf4me/ \\
        --auth-scheme raw

    # Slow jobs: poll every 5s, back off up to 60s, give up after 40 checks
    pdf4mectl profile set batch --api-key KEY \\
        --poll-interval 5 --backoff exponential --max-attempts 40
")]
    Set {
        /// Profile name
        name: String,

        /// API key (prompted for when omitted)
        #[arg(long)]
        api_key: Option<String>,

        /// API base URL
        #[arg(long)]
        base_url: Option<String>,

        /// How the API key is sent in the Authorization header
        #[arg(long, value_enum)]
        auth_scheme: Option<AuthScheme>,

        /// Seconds to wait before each status check
        #[arg(long, value_name = "SECS")]
        poll_interval: Option<u64>,

        /// Status checks before giving up
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_attempts: Option<u32>,

        /// Delay growth between status checks
        #[arg(long, value_enum)]
        backoff: Option<BackoffKind>,

        /// Per-request HTTP timeout in seconds
        #[arg(long, value_name = "SECS")]
        request_timeout: Option<u64>,

        /// Poll the JobStatus endpoint when a 202 carries a job id but no Location
        #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
        job_status_fallback: Option<bool>,

        /// Store the API key in the OS keyring instead of the config file
        #[cfg(feature = "secure-storage")]
        #[arg(long)]
        use_keyring: bool,

        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "del", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Set the default profile
    #[command(visible_alias = "def")]
    Default {
        /// Profile name to use by default
        name: String,
    },
}

fn parse_operation(s: &str) -> Result<Operation, String> {
    Operation::from_name(s).ok_or_else(|| {
        format!(
            "unknown operation '{}' (run `pdf4mectl operations` to list them)",
            s
        )
    })
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("invalid number of seconds: {}", s))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("seconds must be a non-negative number: {}", s));
    }
    Ok(Duration::from_secs_f64(secs))
}
