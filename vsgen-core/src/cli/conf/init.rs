use anyhow::{Context, Result, bail};
use rust_embed::RustEmbed;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(RustEmbed)]
#[folder = "config-templates/"]
pub struct ConfigTemplates;

pub fn init(path: PathBuf) -> Result<()> {
    let written = write_templates(&path)?;

    println!("✔ Initialized vsgen bundle in {}", path.display());
    println!("✔ Created:");
    for file in &written {
        println!("  - {file}");
    }
    println!();
    println!("Next steps:");
    println!("  vsgen check {}", path.display());
    println!("  vsgen dump {}", path.display());

    Ok(())
}

/// Writes every embedded template below `path` and returns their relative
/// paths in sorted order.
pub fn write_templates(path: &Path) -> Result<Vec<String>> {
    // Refuse to overwrite an existing non-empty directory
    if path.exists() {
        if path.is_file() {
            bail!("{} exists and is not a directory", path.display());
        }

        let is_empty = fs::read_dir(path)?.next().is_none();
        if !is_empty {
            bail!(
                "bundle directory '{}' already exists and is not empty",
                path.display()
            );
        }
    }

    let mut files: Vec<String> = ConfigTemplates::iter().map(|f| f.into_owned()).collect();
    files.sort();

    for file in &files {
        let target = path.join(file);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        write_file(&target, &template(file)?)?;
    }

    Ok(files)
}

/// Fetch an embedded template as UTF-8 text
fn template(path: &str) -> Result<String> {
    let file = ConfigTemplates::get(path)
        .with_context(|| format!("missing embedded config template: {path}"))?;

    let s =
        std::str::from_utf8(file.data.as_ref()).context("config template is not valid UTF-8")?;

    Ok(s.to_owned())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let mut f =
        fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    f.write_all(contents.trim_start().as_bytes())?;
    Ok(())
}
