//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Weft - AI-assisted development with role-based agents
///
/// Features are developed in isolated git worktrees by a pipeline of agents
/// that communicate through file queues in a separate AI history repository.
#[derive(Parser, Debug)]
#[command(name = "weft")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Environment file to load instead of the project's .env
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Initialize a weft project in the current git repository
    ///
    /// Creates .weftrc.yaml, the .weft/ runtime directory, the prompt specs
    /// and the AI history repository.
    ///
    /// Examples:
    ///   weft init
    ///   weft init --name shop --type backend
    ///   weft init --history-path ../shop-ai-history --force
    Init {
        /// Project name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,

        /// Project type
        #[arg(long = "type", value_name = "TYPE", default_value = "fullstack")]
        project_type: String,

        /// AI history repository path, relative to the project
        #[arg(long)]
        history_path: Option<String>,

        /// Overwrite an existing .weftrc.yaml
        #[arg(short, long)]
        force: bool,

        /// Prompt for each setting
        #[arg(short, long)]
        interactive: bool,
    },

    /// Start the agent watchers with docker compose
    Up {
        /// Rebuild images before starting
        #[arg(long)]
        build: bool,

        /// Run in the background
        #[arg(short, long)]
        detach: bool,
    },

    /// Stop the agent watchers
    Down {
        /// Remove named volumes
        #[arg(long)]
        volumes: bool,
    },

    /// Show watcher logs
    Logs {
        /// Only this agent (e.g. architect, 01-architect)
        agent: Option<String>,

        /// Follow log output
        #[arg(short, long)]
        follow: bool,

        /// Number of lines from the end
        #[arg(long)]
        tail: Option<u32>,
    },

    /// Run agent watchers in this process
    ///
    /// Without --agent, every enabled agent is watched.
    Watch {
        /// Only watch this feature
        #[arg(long)]
        feature: Option<String>,

        /// Only run this agent
        #[arg(short, long)]
        agent: Option<String>,

        /// Process pending prompts once and exit
        #[arg(long)]
        once: bool,
    },

    /// Manage features (create, start, list, status, review, drop)
    Feature {
        #[command(subcommand)]
        action: FeatureAction,
    },
}

/// Feature subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum FeatureAction {
    /// Create a feature and agree on its brief with the Meta agent
    ///
    /// Examples:
    ///   weft feature create user-auth
    ///   weft feature create user-auth --spec-file docs/auth.md --yes
    Create {
        /// Feature id (letters, digits, '-' and '_', starting with a letter)
        id: String,

        /// Read the feature description from a file
        #[arg(long)]
        spec_file: Option<PathBuf>,

        /// Feature description (prompted for when neither this nor --spec-file is given)
        #[arg(short, long)]
        description: Option<String>,

        /// Accept the first brief without asking
        #[arg(short, long)]
        yes: bool,

        /// Submit the description and return without waiting for Meta
        #[arg(long)]
        no_wait: bool,

        /// Seconds to wait for Meta
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Run the agent pipeline for a feature
    ///
    /// Examples:
    ///   weft feature start user-auth
    ///   weft feature start user-auth --agent architect
    Start {
        id: String,

        /// Run only this agent
        #[arg(short, long)]
        agent: Option<String>,

        /// Seconds to wait for each agent
        #[arg(long)]
        timeout: Option<u64>,

        /// What to do when an agent times out, instead of asking
        #[arg(long, value_enum)]
        on_failure: Option<FailureChoice>,
    },

    /// List features
    List {
        /// Include completed and dropped features
        #[arg(short, long)]
        all: bool,

        /// Sort order
        #[arg(long, value_enum, default_value = "activity")]
        sort_by: SortBy,
    },

    /// Show queue status per agent
    ///
    /// With --verbose, the pending and completed task files are listed.
    Status {
        /// Feature id (all active features when omitted)
        id: Option<String>,

        /// Only this agent
        #[arg(short, long)]
        agent: Option<String>,
    },

    /// Review agent output and accept, drop or continue
    Review {
        id: String,

        /// Decision to take without prompting
        #[arg(long, value_enum)]
        action: Option<ReviewAction>,

        /// Reason recorded when dropping
        #[arg(short, long)]
        reason: Option<String>,

        /// Delete the AI history when dropping
        #[arg(long)]
        delete_history: bool,

        /// Skip confirmations
        #[arg(short, long)]
        yes: bool,
    },

    /// Abandon a feature without merging
    Drop {
        id: String,

        /// Reason recorded in DROPPED.md
        #[arg(short, long)]
        reason: Option<String>,

        /// Delete the AI history instead of marking it dropped
        #[arg(long)]
        delete_history: bool,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Name,
    Status,
    Activity,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Accept,
    Drop,
    Continue,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureChoice {
    Retry,
    Skip,
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_args() {
        let cli = Cli::parse_from(["weft"]);
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_init_defaults() {
        let cli = Cli::parse_from(["weft", "init"]);
        assert_eq!(
            cli.command,
            Some(Commands::Init {
                name: None,
                project_type: "fullstack".to_string(),
                history_path: None,
                force: false,
                interactive: false,
            })
        );
    }

    #[test]
    fn parse_feature_review_action() {
        let cli = Cli::parse_from(["weft", "feature", "review", "login", "--action", "accept"]);
        let Some(Commands::Feature {
            action: FeatureAction::Review { id, action, .. },
        }) = cli.command
        else {
            panic!("expected feature review");
        };
        assert_eq!(id, "login");
        assert_eq!(action, Some(ReviewAction::Accept));
    }

    #[test]
    fn parse_list_sort() {
        let cli = Cli::parse_from(["weft", "feature", "list", "--all", "--sort-by", "name"]);
        assert_eq!(
            cli.command,
            Some(Commands::Feature {
                action: FeatureAction::List {
                    all: true,
                    sort_by: SortBy::Name,
                },
            })
        );
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["weft", "feature", "list", "-v"]);
        assert!(cli.verbose);
    }
}
