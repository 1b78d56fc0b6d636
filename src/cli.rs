use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kruzhok")]
#[command(author, version, about = "Telegram bot that turns photos and videos into round video notes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Check that ffmpeg and ffprobe can be executed
    CheckFfmpeg,

    /// Print a user's recent kruzhoks from the database
    History {
        /// Telegram user id
        #[arg(short, long)]
        user_id: i64,

        /// Number of entries to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["kruzhok"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_history_args() {
        let cli = Cli::try_parse_from(["kruzhok", "history", "--user-id", "42", "--limit", "3"]).unwrap();
        assert_eq!(cli.command, Some(Commands::History { user_id: 42, limit: 3 }));

        let cli = Cli::try_parse_from(["kruzhok", "history", "-u", "7"]).unwrap();
        assert_eq!(cli.command, Some(Commands::History { user_id: 7, limit: 10 }));
    }

    #[test]
    fn test_check_ffmpeg() {
        let cli = Cli::try_parse_from(["kruzhok", "check-ffmpeg"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckFfmpeg));
    }
}
