//! Regenerates `templates.json` and `templateFields.json` for a templates directory.
//!
//! ```text
//! template-indexer --dir ./templates
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use template_service::indexer;
use template_service::telemetry::{get_subscriber, init_subscriber};

#[derive(Parser, Debug)]
#[command(
    name = "template-indexer",
    version,
    about = "Index bundled templates by directory and sample-data fields"
)]
struct Args {
    /// Directory holding the template files; outputs are written into it
    #[arg(long, env = "TEMPLATES_DIR", default_value = "templates")]
    dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("template-indexer".into(), "info".into());
    init_subscriber(subscriber);

    let args = Args::parse();
    let index = indexer::generate(&args.dir)
        .with_context(|| format!("Failed to index templates in {}", args.dir.display()))?;

    println!(
        "Indexed {} template group(s), {} with fields",
        index.templates.len(),
        index.fields.len()
    );

    Ok(())
}
