use annex9::{
    Annex9Error, FieldValue, Generator, GeneratorConfig, JsonDirSnapshotStore, OrderData,
    RenderJob, RenderMetadata, SnapshotId,
};
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const DATE_ARG_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Parser, Debug)]
#[command(version, about = "Fill Annex 9 order forms from JSON order data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Common {
    /// Directory holding `<version>.json` templates and their assets
    #[arg(long, default_value = "assets/templates")]
    template_dir: PathBuf,

    /// Fallback directory for fonts and background pages
    #[arg(long)]
    asset_dir: Option<PathBuf>,

    /// Generator settings (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of render snapshots
    #[arg(long)]
    snapshots: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one order
    Render {
        #[command(flatten)]
        common: Common,
        /// Template version, e.g. Annex9_v2009
        #[arg(long = "version", value_name = "VERSION")]
        template_version: String,
        /// Flat JSON object of field values
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        reference: String,
        /// Creation time written into the document, `YYYY-MM-DDTHH:MM:SS`; defaults to now
        #[arg(long)]
        date: Option<String>,
        /// Signature image for a field, as `key=path.png`; repeatable
        #[arg(long = "signature", value_name = "KEY=PNG")]
        signatures: Vec<String>,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Render a JSON array of `{reference, data, date?, signatures?}` orders
    Batch {
        #[command(flatten)]
        common: Common,
        #[arg(long = "version", value_name = "VERSION")]
        template_version: String,
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Regenerate a recorded render and verify its hash
    Reproduce {
        #[command(flatten)]
        common: Common,
        #[arg(long)]
        id: SnapshotId,
        /// Also write the regenerated document here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Load and validate template versions
    Check {
        #[command(flatten)]
        common: Common,
        #[arg(long = "version", value_name = "VERSION", required = true)]
        versions: Vec<String>,
    },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchOrder {
    reference: String,
    #[serde(default)]
    date: Option<String>,
    data: serde_json::Value,
    /// Field key to PNG path.
    #[serde(default)]
    signatures: std::collections::BTreeMap<String, PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run(Cli::parse().command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn generator(common: &Common) -> Result<Generator, Annex9Error> {
    let config = match &common.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };
    let mut builder = Generator::builder()
        .with_template_dir(&common.template_dir)
        .with_config(config);
    if let Some(dir) = &common.asset_dir {
        builder = builder.with_asset_dir(dir);
    }
    if let Some(dir) = &common.snapshots {
        builder = builder.with_snapshot_store(Arc::new(JsonDirSnapshotStore::open(dir)?));
    }
    builder.build()
}

/// Returns `Ok(false)` when some batch items failed.
fn run(command: Command) -> Result<bool, Annex9Error> {
    match command {
        Command::Render {
            common,
            template_version,
            data,
            reference,
            date,
            signatures,
            out,
        } => {
            let generator = generator(&common)?;
            let mut data = OrderData::from_json_str(&std::fs::read_to_string(data)?)?;
            for arg in &signatures {
                let (key, path) = arg.split_once('=').ok_or_else(|| {
                    Annex9Error::Config(format!("--signature expects KEY=PATH, got '{arg}'"))
                })?;
                data.insert(key, FieldValue::image(std::fs::read(path)?));
            }
            let created_at = created_at(date.as_deref())?;
            let job = RenderJob::new(
                template_version,
                data,
                RenderMetadata::new(reference, created_at),
            );
            let (doc, path) = generator.render_to_dir(&job, &out)?;
            println!("{}  {}", doc.hash, path.display());
            if let Some(id) = doc.snapshot_id {
                println!("snapshot {id}");
            }
            Ok(true)
        }
        Command::Batch {
            common,
            template_version,
            data,
            out,
        } => {
            let generator = generator(&common)?;
            let orders: Vec<BatchOrder> = serde_json::from_str(&std::fs::read_to_string(data)?)?;
            let jobs = orders
                .into_iter()
                .map(|order| {
                    let mut data = OrderData::from_json(&order.data)?;
                    for (key, path) in order.signatures {
                        data.insert(key, FieldValue::image(std::fs::read(path)?));
                    }
                    let metadata =
                        RenderMetadata::new(order.reference, created_at(order.date.as_deref())?);
                    Ok(RenderJob::new(template_version.as_str(), data, metadata))
                })
                .collect::<Result<Vec<_>, Annex9Error>>()?;

            let results = generator.render_batch_to_dir(jobs, &out);
            let mut all_ok = true;
            for item in &results {
                match &item.outcome {
                    Ok(done) => {
                        let path = done.path.clone().unwrap_or_else(|| done.file_name.clone().into());
                        println!("#{} {}  {}", item.index, done.hash, path.display());
                    }
                    Err(e) => {
                        all_ok = false;
                        println!("#{} {} FAILED: {}", item.index, item.reference, e);
                    }
                }
            }
            Ok(all_ok)
        }
        Command::Reproduce { common, id, out } => {
            let doc = generator(&common)?.reproduce(id)?;
            println!("{}  snapshot {} reproduced", doc.hash, id);
            if let Some(dir) = out {
                let path = dir.join(&doc.file_name);
                std::fs::write(&path, &doc.bytes)?;
                println!("wrote {}", path.display());
            }
            Ok(true)
        }
        Command::Check { common, versions } => {
            let generator = generator(&common)?;
            for version in &versions {
                let template = generator.template(version)?;
                println!(
                    "{}  {} fields, {} decorations, background: {}",
                    template.id,
                    template.fields.len(),
                    template.decorations.len(),
                    if template.background.is_some() { "yes" } else { "none" }
                );
            }
            Ok(true)
        }
    }
}

fn created_at(arg: Option<&str>) -> Result<NaiveDateTime, Annex9Error> {
    match arg {
        Some(s) => NaiveDateTime::parse_from_str(s, DATE_ARG_FORMAT)
            .map_err(|e| Annex9Error::Config(format!("invalid date '{s}': {e}"))),
        None => Ok(chrono::Local::now().naive_local()),
    }
}
