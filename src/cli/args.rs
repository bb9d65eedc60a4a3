use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about,
    help_template(
        "{before-help}{name} {version}\n{author-with-newline}{about-with-newline}\n{usage-heading} {usage}\n\n{all-args}{after-help}"
    )
)]
pub struct Args {
    /// Path to TOML configuration file. Defaults to `mmigen.toml` if it exists,
    /// otherwise the built-in 3x3 width/length sweep is used.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory to which GDS files should be saved.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Stop at the first design that fails to build.
    #[arg(long)]
    pub fail_fast: bool,

    /// Print the planned file names without building anything.
    #[arg(long)]
    pub dry_run: bool,
}
