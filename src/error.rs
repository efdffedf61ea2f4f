/// Failures surfaced by report generation.
///
/// The per-image variants are recovered inside the card renderer (the image
/// degrades to an inline placeholder); anything that escapes
/// [`crate::generate_report`] is reported verbatim by the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("image fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("image fetch returned status {0}")]
    FetchStatus(u16),

    #[error("image decode failed: {0}")]
    ImageDecode(#[from] image::ImageError),
}
