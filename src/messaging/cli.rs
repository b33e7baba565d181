// CLI definition for the chat record manager

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// File name of the stored message list inside the state directory
pub const STORED_FILE_NAME: &str = "storedMessages.json";

/// Chat record manager CLI
#[derive(Debug, Parser)]
#[command(name = "chatapp")]
#[command(about = "Compose, file and search short text messages")]
pub struct ChatCli {
    /// Path of the stored message file
    #[arg(long, global = true, env = "CHATAPP_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<ChatCommand>,
}

/// Chat record manager subcommands
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ChatCommand {
    /// Register, log in and use the interactive menu (default)
    Run,

    /// Load the demonstration messages and print every report
    ///
    /// Replaces everything in the stored message file. Pass --data-file
    /// to run the demo against a scratch file.
    Demo,

    /// Print the messages in the stored file
    ListStored,

    /// Delete a stored message by its hash
    Delete {
        /// Message hash (e.g. HASH123456789)
        #[arg(long)]
        hash: String,
    },
}

impl ChatCli {
    /// Parse from command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Resolve the data file, falling back to the state directory
    pub fn data_file(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| Self::state_dir().join(STORED_FILE_NAME))
    }

    /// Command to execute, `run` when none was given
    pub fn command(&self) -> ChatCommand {
        self.command.clone().unwrap_or(ChatCommand::Run)
    }

    /// Get the state directory
    pub fn state_dir() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home).join(".chatapp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = ChatCli::try_parse_from(["chatapp", "--data-file", "/tmp/x.json", "demo"]).unwrap();
        assert_eq!(cli.command(), ChatCommand::Demo);
        assert_eq!(cli.data_file(), PathBuf::from("/tmp/x.json"));

        let cli = ChatCli::try_parse_from(["chatapp", "delete", "--hash", "HASH42"]).unwrap();
        assert_eq!(
            cli.command(),
            ChatCommand::Delete {
                hash: "HASH42".to_string()
            }
        );

        // Delete needs a hash
        assert!(ChatCli::try_parse_from(["chatapp", "delete"]).is_err());
    }

    #[test]
    fn test_demo_help_warns_about_replacing_data() {
        let command = <ChatCli as clap::CommandFactory>::command();
        let demo = command.find_subcommand("demo").unwrap();
        let help = demo.get_long_about().unwrap().to_string();
        assert!(help.contains("Replaces everything in the stored message file"));
    }

    #[test]
    fn test_default_command_is_run() {
        let cli = ChatCli::try_parse_from(["chatapp"]).unwrap();
        assert_eq!(cli.command(), ChatCommand::Run);
    }

    #[test]
    fn test_state_dir() {
        let dir = ChatCli::state_dir();
        assert!(dir.ends_with(".chatapp"));
    }
}
