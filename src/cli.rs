//! Command line arguments and parameters management/parsing.
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "latinum", about = "Latin-English parallel corpus preparation tool.")]
/// Holds the optional mode given on the `latinum` command line.
///
/// Without a mode, every stage runs in order
/// (download, then extract, then preprocess).
pub struct Latinum {
    #[structopt(subcommand)]
    pub mode: Option<Mode>,
}

#[derive(Debug, StructOpt)]
/// Stages runnable on their own.
pub enum Mode {
    #[structopt(about = "Download aligned XML documents from the Perseus archive")]
    Download,
    #[structopt(about = "Extract parallel sentences from the downloaded documents")]
    Extract,
    #[structopt(about = "Normalize extracted sentences into model-ready lines")]
    Preprocess,
}
