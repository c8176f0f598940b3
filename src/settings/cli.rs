use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "tandem", about = "Friend request and friendship service")]
pub struct Cli {
    /// Path to a settings TOML file
    #[arg(long)]
    pub settings: Option<String>,
}
