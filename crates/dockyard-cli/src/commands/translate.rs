//! `dockyard translate` — Resolve image configurations from a compose file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use dockyard_common::config::{ComposeExternalConfig, ImageConfiguration};
use dockyard_compose::{FileLoader, Translator};

/// Arguments for the `translate` subcommand.
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Baseline image configuration (JSON) supplying defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Project root the compose base directory is relative to.
    #[arg(short, long, default_value = ".")]
    pub project_root: PathBuf,

    /// Compose file, overriding the baseline's `composeFile`.
    #[arg(long)]
    pub compose: Option<String>,

    /// Compose base directory, overriding the baseline's `basedir`.
    #[arg(long)]
    pub basedir: Option<String>,

    /// Template variable for `${name}` placeholders, as `NAME=VALUE`.
    #[arg(short = 's', long = "set", value_name = "NAME=VALUE", value_parser = parse_variable)]
    pub variables: Vec<(String, String)>,

    /// Make process environment variables available as placeholders.
    #[arg(long)]
    pub env: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

/// Executes the `translate` command.
///
/// # Errors
///
/// Returns an error if the baseline cannot be read or the compose file
/// cannot be translated.
pub fn execute(args: TranslateArgs) -> anyhow::Result<()> {
    let baseline = load_baseline(&args)?;
    let project_root = std::path::absolute(&args.project_root)
        .with_context(|| format!("invalid project root {}", args.project_root.display()))?;

    let translator = Translator::new(FileLoader::with_context(template_context(&args)));
    let resolved = translator.translate(&baseline, &project_root)?;
    tracing::info!(count = resolved.len(), "translation finished");

    let json = if args.pretty {
        serde_json::to_string_pretty(&resolved)?
    } else {
        serde_json::to_string(&resolved)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

fn load_baseline(args: &TranslateArgs) -> anyhow::Result<ImageConfiguration> {
    let mut baseline = match &args.config {
        Some(path) => ImageConfiguration::from_json_file(path)
            .with_context(|| format!("failed to load baseline {}", path.display()))?,
        None => ImageConfiguration::default(),
    };
    let external = baseline
        .external
        .get_or_insert_with(ComposeExternalConfig::default);
    if let Some(compose) = &args.compose {
        external.compose_file.clone_from(compose);
    }
    if let Some(basedir) = &args.basedir {
        external.basedir.clone_from(basedir);
    }
    baseline.validate()?;
    Ok(baseline)
}

fn template_context(args: &TranslateArgs) -> BTreeMap<String, String> {
    let mut context = BTreeMap::new();
    if args.env {
        context.extend(std::env::vars());
    }
    context.extend(args.variables.iter().cloned());
    context
}

fn parse_variable(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected NAME=VALUE, got \"{raw}\""))
}
