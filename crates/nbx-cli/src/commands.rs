use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use nbx_sdk::{
    pack_dir, unpack_dir, Address, BundleCodec, Entry, Location, Nbx, NbxConfig, SdkError,
};
use serde_json::json;

use crate::cli::*;

/// Looked up in the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "nbx.config.toml";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.root.as_deref())?;
    let json = matches!(cli.format, OutputFormat::Json);
    match cli.command {
        Command::Pack(args) => cmd_pack(args, json),
        Command::Unpack(args) => cmd_unpack(args, json),
        Command::Save(args) => cmd_save(args, config, json),
        Command::Fetch(args) => cmd_fetch(args, config, json),
        Command::Verify(args) => cmd_verify(args, config, json),
        Command::Inspect(args) => cmd_inspect(args, config, json),
    }
}

fn load_config(path: Option<&Path>, root: Option<&Path>) -> anyhow::Result<NbxConfig> {
    let config = match path {
        Some(path) => NbxConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            NbxConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => NbxConfig::default(),
    };
    let config = match root {
        Some(root) => config.with_root(root),
        None => config,
    };
    tracing::debug!(root = %config.root.display(), "loaded configuration");
    Ok(config)
}

fn parse_address(s: &str) -> anyhow::Result<Address> {
    s.parse::<Address>()
        .with_context(|| format!("'{s}' is not a valid entry address"))
}

fn cmd_pack(args: PackArgs, json: bool) -> anyhow::Result<()> {
    let manifest = if args.path.is_dir() {
        args.path.join(nbx_sdk::MANIFEST_FILE)
    } else {
        args.path.clone()
    };
    let bundle = pack_dir(&manifest)
        .with_context(|| format!("packing {}", manifest.display()))?;
    let bytes = BundleCodec::encode(&bundle)?;
    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("writing {}", args.output.display()))?;

    if json {
        println!(
            "{}",
            json!({
                "output": args.output,
                "kind": bundle.manifest.kind,
                "name": bundle.manifest.name,
                "resources": bundle.resources.len(),
                "bytes": bytes.len(),
            })
        );
    } else {
        println!(
            "{} Packed {} bundle {} into {}",
            "✓".green().bold(),
            bundle.manifest.kind.to_string().cyan(),
            bundle.manifest.name.bold(),
            args.output.display()
        );
        println!("  Resources: {}  Size: {} bytes", bundle.resources.len(), bytes.len());
    }
    Ok(())
}

fn cmd_unpack(args: UnpackArgs, json: bool) -> anyhow::Result<()> {
    let bytes = read_file(&args.bundle)?;
    let bundle = BundleCodec::decode_any(&bytes)?;
    let manifest = unpack_dir(&bundle, &args.dir)?;

    if json {
        println!("{}", json!({ "manifest": manifest, "resources": bundle.resources.len() }));
    } else {
        println!(
            "{} Unpacked {} bundle {} into {}",
            "✓".green().bold(),
            bundle.manifest.kind.to_string().cyan(),
            bundle.manifest.name.bold(),
            args.dir.display()
        );
    }
    Ok(())
}

fn cmd_save(args: SaveArgs, config: NbxConfig, json: bool) -> anyhow::Result<()> {
    let bytes = read_file(&args.bundle)?;
    let kind = match args.kind {
        Some(kind) => kind,
        None => BundleCodec::peek_kind(&bytes)?,
    };
    let nbx = Nbx::open(config)?;
    let entry = nbx.save(&bytes, kind)?;

    if json {
        println!("{}", entry_summary(&entry));
    } else {
        println!(
            "{} Saved {} bundle {}",
            "✓".green().bold(),
            kind.to_string().cyan(),
            entry.manifest.name.bold()
        );
        println!("  Entry: {}", entry.address.to_hex().yellow());
        println!("  Token: {}", entry.root_token().to_hex().dimmed());
    }
    Ok(())
}

fn cmd_fetch(args: FetchArgs, config: NbxConfig, json: bool) -> anyhow::Result<()> {
    let address = parse_address(&args.address)?;
    let nbx = Nbx::open(config)?;
    let bytes = nbx.fetch(&address)?;
    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("writing {}", args.output.display()))?;

    if json {
        println!(
            "{}",
            json!({
                "address": address.to_hex(),
                "output": args.output,
                "bytes": bytes.len(),
            })
        );
    } else {
        println!(
            "{} Fetched {} into {} ({} bytes)",
            "✓".green().bold(),
            address.short_hex().yellow(),
            args.output.display(),
            bytes.len()
        );
    }
    Ok(())
}

fn cmd_verify(args: VerifyArgs, config: NbxConfig, json: bool) -> anyhow::Result<()> {
    let address = parse_address(&args.address)?;
    let nbx = Nbx::open(config)?;
    let result: Result<(), SdkError> = if args.shallow {
        nbx.entry(&address).and_then(|entry| nbx.verify(&entry))
    } else {
        nbx.verify_deep(&address)
    };

    if json {
        let level = result.as_ref().err().and_then(SdkError::invalid_level);
        println!(
            "{}",
            json!({
                "address": address.to_hex(),
                "valid": result.is_ok(),
                "level": level.map(|l| l.to_string()),
                "error": result.as_ref().err().map(|e| e.to_string()),
            })
        );
    }
    match result {
        Ok(()) => {
            if !json {
                let scope = if args.shallow { "entry" } else { "entry tree" };
                println!(
                    "{} {} {} verified",
                    "✓".green().bold(),
                    scope,
                    address.short_hex().yellow()
                );
            }
            Ok(())
        }
        Err(e) => {
            if !json {
                println!("{} {}", "✗".red().bold(), e.to_string().red());
                if let Some(level) = e.invalid_level() {
                    println!("  Failing level: {}", level.to_string().yellow());
                }
            }
            Err(e.into())
        }
    }
}

fn cmd_inspect(args: InspectArgs, config: NbxConfig, json: bool) -> anyhow::Result<()> {
    let path = PathBuf::from(&args.target);
    if path.is_file() {
        let bytes = read_file(&path)?;
        let bundle = BundleCodec::decode_any(&bytes)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&bundle.manifest)?);
            return Ok(());
        }
        println!("Bundle {} ({} bytes)", path.display().to_string().bold(), bytes.len());
        print_manifest_header(&bundle.manifest);
        for slot in &bundle.manifest.slots {
            let size = bundle.resource(slot.location.path()).map_or(0, <[u8]>::len);
            println!(
                "  {} {:<18} {} ({size} bytes)",
                "•".dimmed(),
                slot.name.bold(),
                slot.kind.to_string().cyan()
            );
        }
        return Ok(());
    }

    let address = parse_address(&args.target)?;
    let entry = Nbx::open(config)?.entry(&address)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }
    println!("Entry {}", entry.address.to_hex().yellow().bold());
    println!("  Created: {}", entry.created_at.to_rfc3339());
    println!("  Token: {}", entry.root_token().to_hex().dimmed());
    print_manifest_header(&entry.manifest);
    for slot in &entry.manifest.slots {
        let target = match &slot.location {
            Location::Resolved { address, .. } => address.short_hex(),
            Location::Bundled { path } => path.clone(),
        };
        println!(
            "  {} {:<18} {:<20} {}",
            "•".dimmed(),
            slot.name.bold(),
            slot.kind.to_string().cyan(),
            target.yellow()
        );
    }
    Ok(())
}

fn print_manifest_header(manifest: &nbx_sdk::Manifest) {
    println!("  Kind: {}", manifest.kind.to_string().cyan());
    println!("  Name: {}", manifest.name.bold());
    if !manifest.description.is_empty() {
        println!("  Description: {}", manifest.description);
    }
    for (key, value) in &manifest.properties {
        println!("  {key} = {value}");
    }
}

fn entry_summary(entry: &Entry) -> serde_json::Value {
    json!({
        "address": entry.address.to_hex(),
        "kind": entry.kind(),
        "name": entry.manifest.name,
        "token": entry.root_token().to_hex(),
    })
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const COMPONENT_TOML: &str = r#"
kind = "component"
name = "profiles"

[[slots]]
name = "integrity"
kind = "module"
location = { bundled = { path = "integrity.wasm" } }
"#;

    fn run(root: &Path, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["nbx", "--root", root.to_str().unwrap()];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn pack_save_fetch_verify() {
        let work = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        std::fs::write(work.path().join("nbx.toml"), COMPONENT_TOML).unwrap();
        std::fs::write(work.path().join("integrity.wasm"), b"\0asm").unwrap();

        let packed = work.path().join("profiles.nbx");
        let packed_str = packed.to_str().unwrap();
        run(store.path(), &["pack", work.path().to_str().unwrap(), "-o", packed_str]).unwrap();
        run(store.path(), &["save", packed_str]).unwrap();

        let bytes = std::fs::read(&packed).unwrap();
        let config = NbxConfig::default().with_root(store.path());
        let nbx = Nbx::open(config).unwrap();
        let entry = nbx.save(&bytes, nbx_sdk::BundleKind::Component).unwrap();
        let address = entry.address.to_hex();

        let fetched = work.path().join("fetched.nbx");
        run(store.path(), &["fetch", &address, "-o", fetched.to_str().unwrap()]).unwrap();
        assert_eq!(std::fs::read(&fetched).unwrap(), bytes);

        run(store.path(), &["verify", &address]).unwrap();
        run(store.path(), &["verify", &address, "--shallow"]).unwrap();
        run(store.path(), &["inspect", &address]).unwrap();
        run(store.path(), &["inspect", packed_str]).unwrap();

        let out = work.path().join("out");
        run(store.path(), &["unpack", packed_str, out.to_str().unwrap()]).unwrap();
        assert_eq!(std::fs::read(out.join("integrity.wasm")).unwrap(), b"\0asm");
    }

    #[test]
    fn save_with_wrong_kind_fails() {
        let work = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        std::fs::write(work.path().join("nbx.toml"), COMPONENT_TOML).unwrap();
        std::fs::write(work.path().join("integrity.wasm"), b"\0asm").unwrap();
        let packed = work.path().join("c.nbx");
        let packed_str = packed.to_str().unwrap();
        run(store.path(), &["pack", work.path().to_str().unwrap(), "-o", packed_str]).unwrap();
        assert!(run(store.path(), &["save", packed_str, "--kind", "application"]).is_err());
    }

    #[test]
    fn bad_address_is_reported() {
        let store = tempfile::tempdir().unwrap();
        let err = run(store.path(), &["verify", "not-hex"]).unwrap_err();
        assert!(err.to_string().contains("not a valid entry address"));
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "root = \"/srv/nbx\"\n[assembler]\nmax_depth = 3\n").unwrap();
        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.assembler.max_depth, 3);
        assert_eq!(config.root, PathBuf::from("/srv/nbx"));

        let overridden = load_config(Some(&path), Some(Path::new("/elsewhere"))).unwrap();
        assert_eq!(overridden.root, PathBuf::from("/elsewhere"));
    }
}
