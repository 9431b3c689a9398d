pub mod chat;
pub mod generate;

pub use chat::ChatCommand;
pub use generate::GenerateCommand;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a single response and print its metrics
    Generate(GenerateCommand),
    /// Chat interactively, one request per input line
    Chat(ChatCommand),
}
