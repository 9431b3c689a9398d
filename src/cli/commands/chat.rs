use clap::Args;

#[derive(Args)]
pub struct ChatCommand {
    /// Print the metrics report after every response
    #[arg(long)]
    pub metrics: bool,
}
