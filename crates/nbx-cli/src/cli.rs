use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use nbx_sdk::BundleKind;

#[derive(Parser)]
#[command(
    name = "nbx",
    about = "NBX: content-addressed nested bundle exchange",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (defaults to ./nbx.config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store root, overriding the configuration file
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Encode a working directory into a bundle file
    Pack(PackArgs),
    /// Expand a bundle file into a working directory
    Unpack(UnpackArgs),
    /// Assemble a bundle file into the store
    Save(SaveArgs),
    /// Reconstitute a stored bundle
    Fetch(FetchArgs),
    /// Verify a stored entry and everything beneath it
    Verify(VerifyArgs),
    /// Describe a bundle file or a stored entry
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct PackArgs {
    /// Manifest file, or a directory containing nbx.toml
    pub path: PathBuf,
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct UnpackArgs {
    pub bundle: PathBuf,
    pub dir: PathBuf,
}

#[derive(Args)]
pub struct SaveArgs {
    pub bundle: PathBuf,
    /// Required bundle kind; defaults to the kind in the bundle header
    #[arg(long)]
    pub kind: Option<BundleKind>,
}

#[derive(Args)]
pub struct FetchArgs {
    pub address: String,
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub address: String,
    /// Only recompute the entry's own tokens
    #[arg(long)]
    pub shallow: bool,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Bundle file path or entry address
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pack() {
        let cli = Cli::try_parse_from(["nbx", "pack", "app", "-o", "app.nbx"]).unwrap();
        if let Command::Pack(args) = cli.command {
            assert_eq!(args.path, PathBuf::from("app"));
            assert_eq!(args.output, PathBuf::from("app.nbx"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_save_with_kind() {
        let cli =
            Cli::try_parse_from(["nbx", "save", "web.nbx", "--kind", "web-application"]).unwrap();
        if let Command::Save(args) = cli.command {
            assert_eq!(args.kind, Some(BundleKind::WebApplication));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_save_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["nbx", "save", "x.nbx", "--kind", "dna"]).is_err());
    }

    #[test]
    fn parse_fetch() {
        let cli = Cli::try_parse_from(["nbx", "fetch", "abcd", "--output", "out.nbx"]).unwrap();
        if let Command::Fetch(args) = cli.command {
            assert_eq!(args.address, "abcd");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verify_shallow() {
        let cli = Cli::try_parse_from(["nbx", "verify", "abcd", "--shallow"]).unwrap();
        if let Command::Verify(args) = cli.command {
            assert!(args.shallow);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "nbx", "--verbose", "--root", "/tmp/nbx", "--format", "json", "inspect", "x",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/nbx")));
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
