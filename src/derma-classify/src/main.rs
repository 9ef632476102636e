use std::path::PathBuf;

use anyhow::Context;
use log::info;
use structopt::StructOpt;

use derma_serve::record::PredictionRecord;
use derma_serve::ImageClassifier;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "derma-classify",
    about = "Classify a skin lesion image with a locally cached model"
)]
struct CmdArgs {
    /// Directory holding the downloaded SavedModel
    #[structopt(parse(from_os_str))]
    model_dir: PathBuf,

    /// Path or URL of the image to classify
    image: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = CmdArgs::from_args();

    let classifier = ImageClassifier::load(&args.model_dir).context("loading model")?;
    info!("model loaded from {}", args.model_dir.display());

    let label = if args.image.starts_with("http://") || args.image.starts_with("https://") {
        let client = reqwest::Client::new();
        classifier.classify_url(&client, &args.image).await?
    } else {
        let bytes = tokio::fs::read(&args.image)
            .await
            .with_context(|| format!("reading {}", args.image))?;
        classifier.classify(&bytes)?
    };

    let record = PredictionRecord::new(label);
    println!("{}", serde_json::to_string(&record)?);

    Ok(())
}
