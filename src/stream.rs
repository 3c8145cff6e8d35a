//! Streaming batch API: emit each image's result as soon as it is ready.
//!
//! Unlike [`crate::convert::convert_batch`], which returns after every image
//! has been attempted, [`convert_stream`] yields results through a `Stream`
//! in completion order. Sort by `index` if order matters.

use crate::config::{validate_language, ConversionConfig};
use crate::convert::process_image;
use crate::error::{Img2TexError, ImageError};
use crate::output::ImageResult;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-image results.
pub type ImageStream = Pin<Box<dyn Stream<Item = Result<ImageResult, ImageError>> + Send>>;

/// Convert several images, streaming results as they complete.
///
/// At most `config.concurrency` images are in flight. Failures arrive as
/// `Err(ImageError)` items; the stream itself only fails up front, for an
/// empty input list or an invalid language.
pub fn convert_stream<I, S>(inputs: I, config: &ConversionConfig) -> Result<ImageStream, Img2TexError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let inputs: Vec<String> = inputs.into_iter().map(Into::into).collect();
    if inputs.is_empty() {
        return Err(Img2TexError::InvalidConfig("No input images given".into()));
    }
    validate_language(&config.language)?;

    let total = inputs.len();
    info!("Starting streaming conversion of {} images", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let concurrency = config.concurrency;
    let config = config.clone();
    let s = stream::iter(inputs.into_iter().enumerate().map(move |(index, input)| {
        let cfg = config.clone();
        async move {
            let mut result = process_image(index, input, total, &cfg).await;
            match result.error.take() {
                None => Ok(result),
                Some(err) => Err(err),
            }
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ocr::PlaceholderEngine;
    use std::sync::Arc;

    #[tokio::test]
    async fn missing_files_stream_as_errors() {
        let config = ConversionConfig::builder()
            .engine(Arc::new(PlaceholderEngine))
            .build()
            .unwrap();
        let stream = convert_stream(["/nope/a.png", "/nope/b.png"], &config).unwrap();
        let mut items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        items.sort_by_key(|r| r.as_ref().map_or_else(|e| e.index, |ok| ok.index));
        for (i, item) in items.iter().enumerate() {
            let err = item.as_ref().unwrap_err();
            assert_eq!(err.index, i);
            assert!(err.detail.contains("not found"));
        }
    }

    #[test]
    fn empty_inputs_rejected() {
        let res = convert_stream(Vec::<String>::new(), &ConversionConfig::default());
        assert!(matches!(res, Err(Img2TexError::InvalidConfig(_))));
    }
}
