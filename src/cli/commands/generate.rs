use clap::Args;

#[derive(Args)]
pub struct GenerateCommand {
    /// Prompt text
    pub prompt: String,

    /// Print metrics as JSON instead of the text report
    #[arg(long)]
    pub json: bool,
}
