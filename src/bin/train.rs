//! Command line tool to fine-tune the complaint classifiers

use anyhow::anyhow;
use burn::data::dataset::Dataset as _;
use cybercrime_classifier::{
    cli::{self, Model, Overrides},
    datasets::{complaints, Taxonomy},
    pipelines::text_classification,
    utils::backend::{self, TrainBackend},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: train [TAXONOMY] [OPTIONS]

Arguments:
  TAXONOMY             The taxonomy to train ('category' or 'sub-category', defaults to both)

Options:
  -h, --help           Print help
  -m, --model          The model to fine-tune (e.g., 'distilbert-base-uncased')
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  -n, --num-epochs     Number of epochs to train for
  -b, --batch-size     Batch size
  -c, --config         A JSON experiment configuration to start from
";

#[derive(Debug)]
struct Args {
    taxonomy: Option<String>,
    model: Option<String>,
    num_epochs: Option<usize>,
    batch_size: Option<usize>,
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
            model: pargs.opt_value_from_str(["-m", "--model"])?,
            num_epochs: pargs.opt_value_from_str(["-n", "--num-epochs"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
            config: pargs.opt_value_from_str(["-c", "--config"])?,
            taxonomy: pargs.opt_free_from_str()?,
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

    let taxonomies = match &args.taxonomy {
        Some(taxonomy) => vec![Taxonomy::try_from(taxonomy.as_str())?],
        None => Taxonomy::ALL.to_vec(),
    };

    let model = args
        .model
        .as_deref()
        .map(Model::try_from)
        .transpose()?;

    let config = Overrides {
        data_dir: args.data_dir,
        model,
        num_epochs: args.num_epochs,
        batch_size: args.batch_size,
    }
    .apply(cli::load_config(args.config.as_deref())?);

    let train_file = config.train_file();
    let dataset = complaints::Dataset::load(&train_file)
        .map_err(|e| anyhow!("Unable to read {}: {}", train_file.display(), e))?;

    log::info!(
        "Fine-tuning {} on {} complaints using {}",
        config.model,
        dataset.len(),
        backend::describe()
    );

    text_classification::train::<TrainBackend>(&backend::device(), &dataset, &taxonomies, &config)
        .await
}
