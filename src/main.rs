use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use prflow::commands::validators;
use prflow::github::{DEFAULT_SOURCE_BRANCH, GitHubClient, cancellation};
use prflow::{commands::*, config::Config, constants};
use tracing_subscriber::EnvFilter;

/// Exit status after Ctrl-C, as a shell reports SIGINT
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(name = "prflow")]
#[command(about = "Publish a file to one of your GitHub repositories as a pull request")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value_t = constants::config::DEFAULT_CONFIG_FILE.to_string())]
    config: String,

    /// Per-request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List your repositories with the index used for selection
    Ls {
        /// Output in JSON format for machine consumption
        #[arg(long)]
        json: bool,
    },

    /// Create a branch, commit one file to it and open a pull request
    Publish {
        /// Repository name or owner/name (prompts for a selection if neither --repo nor --index is given)
        #[arg(long)]
        repo: Option<String>,

        /// Repository index as shown by `ls`
        #[arg(long)]
        index: Option<usize>,

        /// Branch to create
        #[arg(long, default_value_t = constants::publish::DEFAULT_BRANCH.to_string())]
        branch: String,

        /// Branch to fork from and open the pull request against
        #[arg(long, default_value_t = DEFAULT_SOURCE_BRANCH.to_string())]
        base: String,

        /// Path of the file inside the repository
        #[arg(long, default_value_t = constants::publish::DEFAULT_PATH.to_string())]
        path: String,

        /// File content (defaults to "Hello world")
        #[arg(long)]
        content: Option<String>,

        /// Read the file content from a local file
        #[arg(long)]
        file: Option<String>,

        /// Commit message (defaults to "Add <path>")
        #[arg(long)]
        message: Option<String>,

        /// Pull request title (defaults to the commit message)
        #[arg(long)]
        title: Option<String>,

        /// Pull request body
        #[arg(long)]
        body: Option<String>,

        /// Create PR as draft
        #[arg(long)]
        draft: bool,

        /// Reuse an existing branch and an already-open pull request
        #[arg(long)]
        resume: bool,

        /// Replace the file if it already exists on the branch
        #[arg(long)]
        update_existing: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    validators::validate_timeout(&cli.timeout)?;
    let command = build_command(cli.command)?;

    let config = Config::load(&cli.config)?;
    let (cancel, token) = cancellation();
    let client = GitHubClient::new(config.credentials(), config.client_options(cli.timeout))
        .context("Failed to create GitHub client")?
        .with_cancellation(token);

    let interrupted = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, cancelling outstanding requests".yellow());
            cancel.cancel();
        }
    });

    let context = CommandContext::new(config, client);
    let result = command.execute(&context).await;

    // A prompt may still be blocked reading stdin; skip the runtime shutdown
    if interrupted.is_cancelled() {
        if let Err(error) = &result {
            eprintln!("Error: {:?}", error);
        }
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }
    result
}

/// Validate arguments and build the command before any config or network access
fn build_command(command: Commands) -> Result<Box<dyn Command + Send + Sync>> {
    match command {
        Commands::Ls { json } => Ok(Box::new(ListCommand { json })),
        Commands::Publish {
            repo,
            index,
            branch,
            base,
            path,
            content,
            file,
            message,
            title,
            body,
            draft,
            resume,
            update_existing,
        } => {
            validators::validate_repository_choice(&repo, &index)?;
            validators::validate_content_source(&content, &file)?;
            validators::validate_branch_name("branch", &branch)?;
            validators::validate_branch_name("base", &base)?;
            validators::validate_file_path(&path)?;
            validators::validate_commit_message(&message)?;
            validators::validate_title(&title)?;

            let content = match (content, file) {
                (_, Some(file)) => std::fs::read(&file)
                    .with_context(|| format!("Failed to read content file '{}'", file))?,
                (Some(content), None) => content.into_bytes(),
                (None, None) => constants::publish::DEFAULT_CONTENT.as_bytes().to_vec(),
            };

            let repository = match (repo, index) {
                (Some(name), _) => RepositoryChoice::Name(name),
                (None, Some(index)) => RepositoryChoice::Index(index),
                (None, None) => RepositoryChoice::Prompt,
            };

            Ok(Box::new(PublishCommand {
                repository,
                branch,
                base,
                path,
                content,
                message,
                title,
                body,
                draft,
                resume,
                update_existing,
            }))
        }
    }
}
