use std::path::Path;

use image::imageops::FilterType;
use log::debug;
use tensorflow::{Graph, SavedModelBundle, Session, SessionOptions, SessionRunArgs, Tensor};

use crate::error::{Error, Result};
use crate::record::Label;
use crate::timing::Timer;

/// Input edge expected by the exported model.
const INPUT_OP: &str = "serving_default_input_1";
/// Output edge carrying the score tensor.
const OUTPUT_OP: &str = "StatefulPartitionedCall";

/// Spatial resolution the model was trained at.
pub const INPUT_SIZE: u32 = 224;

/// Number of values in one preprocessed input: 224 x 224 RGB.
pub const INPUT_LEN: usize = (INPUT_SIZE * INPUT_SIZE * 3) as usize;

/// The loaded inference graph. Read-only after construction and safe to
/// share across request tasks.
pub struct ImageClassifier {
    graph: Graph,
    session: Session,
}

impl ImageClassifier {
    /// Load the SavedModel from a local directory. The topology file
    /// transitively pulls in the weight shards next to it.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let t = Timer::start("loading model");
        let mut graph = Graph::new();
        let bundle =
            SavedModelBundle::load(&SessionOptions::new(), &["serve"], &mut graph, model_dir)?;
        t.stop();
        Ok(ImageClassifier {
            graph,
            session: bundle.session,
        })
    }

    /// Decode and resize uploaded bytes into the flat f32 input buffer:
    /// nearest-neighbor resample to 224x224, RGB, one value per channel.
    ///
    /// Decode failures are client errors; everything past decoding is
    /// infallible.
    pub fn preprocess(bytes: &[u8]) -> Result<Vec<f32>> {
        let t = Timer::start("preprocessing image");
        let decoded =
            image::load_from_memory(bytes).map_err(|err| Error::Decode(err.to_string()))?;
        let resized = decoded
            .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Nearest)
            .to_rgb8();
        let buffer = resized.into_raw().into_iter().map(f32::from).collect();
        t.stop();
        Ok(buffer)
    }

    /// Run a forward pass over one preprocessed buffer and return the first
    /// scalar output.
    pub fn score(&self, input: &[f32]) -> Result<f32> {
        let t = Timer::start("running session");
        let tensor = Tensor::new(&[1, u64::from(INPUT_SIZE), u64::from(INPUT_SIZE), 3])
            .with_values(input)?;

        let mut args = SessionRunArgs::new();
        args.add_feed(
            &self.graph.operation_by_name_required(INPUT_OP)?,
            0,
            &tensor,
        );
        let fetch = args.request_fetch(&self.graph.operation_by_name_required(OUTPUT_OP)?, 0);
        self.session.run(&mut args)?;
        let output: Tensor<f32> = args.fetch(fetch)?;
        t.stop();

        let score = output
            .first()
            .copied()
            .ok_or_else(|| Error::Upstream("model returned an empty output tensor".to_owned()))?;
        debug!("model score: {score}");
        Ok(score)
    }

    /// Classify raw uploaded bytes.
    pub fn classify(&self, bytes: &[u8]) -> Result<Label> {
        let input = Self::preprocess(bytes)?;
        let score = self.score(&input)?;
        Ok(Label::from_score(score))
    }

    /// Fetch an image over HTTP and classify it.
    pub async fn classify_url(&self, client: &reqwest::Client, url: &str) -> Result<Label> {
        let t = Timer::start("fetching image");
        let bytes = client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        t.stop();
        self.classify(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([120, 30, 200]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageOutputFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn preprocess_yields_one_batched_rgb_frame() {
        let buffer = ImageClassifier::preprocess(&png_bytes(8, 8)).unwrap();
        assert_eq!(buffer.len(), INPUT_LEN);
    }

    #[test]
    fn preprocess_is_shape_independent() {
        let wide = ImageClassifier::preprocess(&png_bytes(64, 3)).unwrap();
        let tall = ImageClassifier::preprocess(&png_bytes(3, 64)).unwrap();
        assert_eq!(wide.len(), INPUT_LEN);
        assert_eq!(tall.len(), INPUT_LEN);
    }

    #[test]
    fn preprocess_keeps_raw_channel_range() {
        let buffer = ImageClassifier::preprocess(&png_bytes(16, 16)).unwrap();
        assert!(buffer.iter().all(|v| (0.0..=255.0).contains(v)));
        // Nearest-neighbor resampling of a constant image stays constant.
        assert_eq!(buffer[0], 120.0);
        assert_eq!(buffer[1], 30.0);
        assert_eq!(buffer[2], 200.0);
    }

    #[test]
    fn undecodable_bytes_are_a_decode_error() {
        let result = ImageClassifier::preprocess(b"definitely not an image");
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
