//! Command line tool to predict the test file with the fine-tuned classifiers

use anyhow::anyhow;
use cybercrime_classifier::{
    cli::{self, Overrides},
    pipelines::text_classification,
    utils::backend::{self, Backend},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: infer [OPTIONS]

Options:
  -h, --help           Print help
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  -c, --config         A JSON experiment configuration to start from
";

#[derive(Debug)]
struct Args {
    data_dir: Option<String>,
    config: Option<String>,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
            config: pargs.opt_value_from_str(["-c", "--config"])?,
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(anyhow!("Unexpected arguments: {:?}", remaining));
        }

        Ok(Some(args))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    cli::init_logger();

    let config = Overrides {
        data_dir: args.data_dir,
        ..Default::default()
    }
    .apply(cli::load_config(args.config.as_deref())?);

    log::info!("Running inference using {}", backend::describe());

    let predictions = text_classification::infer::<Backend>(&backend::device(), &config).await?;

    println!(
        "Wrote {} predictions to {}",
        predictions.len(),
        config.predictions_file().display()
    );

    Ok(())
}
