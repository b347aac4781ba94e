//! Command line tool to score the prediction table

use anyhow::anyhow;
use cybercrime_classifier::{
    cli::{self, Overrides},
    datasets::Taxonomy,
    evaluation,
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: evaluate [OPTIONS]

Options:
  -h, --help           Print help
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
";

fn parse_args() -> anyhow::Result<Option<Option<String>>> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let data_dir = pargs.opt_value_from_str(["-d", "--data-dir"])?;

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        return Err(anyhow!("Unexpected arguments: {:?}", remaining));
    }

    Ok(Some(data_dir))
}

fn main() -> anyhow::Result<()> {
    let Some(data_dir) = parse_args()? else {
        print!("{}", HELP);

        return Ok(());
    };

    cli::init_logger();

    let config = Overrides {
        data_dir,
        ..Default::default()
    }
    .apply(cli::load_config(None)?);

    let evaluation = evaluation::evaluate(&config)?;

    println!("Confusion matrix for category:");
    for (index, label) in evaluation.confusion.labels().iter().enumerate() {
        println!("  {}: {}", index, label);
    }
    println!("{}", evaluation.confusion);

    for (taxonomy, name) in [
        (Taxonomy::Category, "Category"),
        (Taxonomy::SubCategory, "Sub-Category"),
    ] {
        println!("Classification Report for {}:", name);
        println!("{}", evaluation.report(taxonomy));
    }

    Ok(())
}
