use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use dfs_server::{DfsServer, ServerConfig};
use dfs_store::LocalStore;
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Put(args) => cmd_put(args, &format),
        Command::Get(args) => cmd_get(args, &format),
        Command::Ls(args) => cmd_ls(args, &format),
    }
}

fn serve_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind:?}"))?;
    }
    if let Some(root) = &args.root {
        config.root_dir = root.clone();
    }
    Ok(config)
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = serve_config(&args)?;
    println!(
        "DFS server on {} (root: {})",
        config.bind_addr.to_string().bold(),
        config.root_dir.display()
    );
    let server = DfsServer::new(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_put(args: PutArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let name = match args.name {
        Some(name) => name,
        None => args
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("cannot derive a name from {}", args.path.display()))?,
    };
    let file = File::open(&args.path)
        .with_context(|| format!("cannot open {}", args.path.display()))?;

    let store = LocalStore::with_root(&args.root)?;
    let stored = store.save(&name, file)?;
    tracing::debug!(path = %stored.path.display(), "stored");

    match format {
        OutputFormat::Json => println!("{}", json!({ "name": stored.name, "size": stored.size })),
        OutputFormat::Text => println!(
            "{} Stored {} ({} bytes)",
            "✓".green().bold(),
            stored.name.as_str().yellow(),
            stored.size
        ),
    }
    Ok(())
}

fn cmd_get(args: GetArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let store = LocalStore::with_root(&args.root)?;
    let Some((mut file, stored)) = store.open_file(&args.name)? else {
        bail!("{} not found", args.name);
    };

    let output = args.output.unwrap_or_else(|| PathBuf::from(&args.name));
    copy_to(&mut file, &output)?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "name": stored.name, "size": stored.size, "output": output })
        ),
        OutputFormat::Text => println!(
            "{} Wrote {} to {} ({} bytes)",
            "✓".green().bold(),
            stored.name.as_str().yellow(),
            output.display(),
            stored.size
        ),
    }
    Ok(())
}

fn copy_to(source: &mut File, output: &Path) -> anyhow::Result<u64> {
    let mut dest =
        File::create(output).with_context(|| format!("cannot create {}", output.display()))?;
    Ok(io::copy(source, &mut dest)?)
}

fn cmd_ls(args: LsArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let store = LocalStore::with_root(&args.root)?;
    let names = store.list()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&names)?),
        OutputFormat::Text => {
            if names.is_empty() {
                println!("No files stored.");
            }
            for name in &names {
                // A file removed since the listing is simply skipped.
                if let Some(stored) = store.resolve(name)? {
                    println!("{:>12}  {}", stored.size.to_string().dimmed(), name);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_ls_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let source = dir.path().join("input.bin");
        std::fs::write(&source, b"payload bytes").unwrap();

        cmd_put(
            PutArgs { path: source, name: None, root: root.clone() },
            &OutputFormat::Text,
        )
        .unwrap();
        assert_eq!(LocalStore::with_root(&root).unwrap().list().unwrap(), vec!["input.bin"]);

        let output = dir.path().join("out.bin");
        cmd_get(
            GetArgs { name: "input.bin".into(), output: Some(output.clone()), root: root.clone() },
            &OutputFormat::Json,
        )
        .unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"payload bytes");

        cmd_ls(LsArgs { root }, &OutputFormat::Text).unwrap();
    }

    #[test]
    fn put_with_explicit_name() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("input.bin");
        std::fs::write(&source, b"x").unwrap();
        let root = dir.path().join("store");

        cmd_put(
            PutArgs { path: source, name: Some("renamed".into()), root: root.clone() },
            &OutputFormat::Json,
        )
        .unwrap();
        assert_eq!(LocalStore::with_root(&root).unwrap().list().unwrap(), vec!["renamed"]);
    }

    #[test]
    fn put_rejects_invalid_name() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("input.bin");
        std::fs::write(&source, b"x").unwrap();

        let err = cmd_put(
            PutArgs { path: source, name: Some("../up".into()), root: dir.path().join("store") },
            &OutputFormat::Text,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid file name"));
        assert!(!dir.path().join("up").exists());
    }

    #[test]
    fn get_missing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_get(
            GetArgs { name: "nothing".into(), output: None, root: dir.path().to_path_buf() },
            &OutputFormat::Text,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "nothing not found");
    }

    #[test]
    fn ls_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        cmd_ls(LsArgs { root: dir.path().join("fresh") }, &OutputFormat::Json).unwrap();
    }

    #[test]
    fn serve_config_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dfs.toml");
        std::fs::write(&path, "bind_addr = \"127.0.0.1:7000\"\nroot_dir = \"from-file\"\n").unwrap();

        let config = serve_config(&ServeArgs {
            config: Some(path.clone()),
            bind: None,
            root: Some(PathBuf::from("from-flag")),
        })
        .unwrap();
        assert_eq!(config.bind_addr.port(), 7000);
        assert_eq!(config.root_dir, PathBuf::from("from-flag"));

        let err = serve_config(&ServeArgs { config: None, bind: Some("nope".into()), root: None });
        assert!(err.is_err());
    }
}
