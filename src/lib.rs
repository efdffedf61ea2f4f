mod error;
mod fetch;
mod fonts;
mod model;
mod pdf;
#[cfg(feature = "server")]
pub mod server;

pub use error::Error;
pub use fetch::{FetchedImage, HttpFetcher, ImageFetcher};
pub use model::{FileRef, IncidentRecord, ReportRequest};

use std::time::Instant;

/// Render a print-ready incident report for one event.
///
/// Cards are placed sequentially and atomically; each card's image fetches
/// complete before the next card begins. An individual image failure
/// degrades to an inline placeholder and never fails the report. The input
/// is expected pre-normalized by [`ReportRequest`]'s lenient deserialization,
/// so malformed shapes arrive here as empty defaults, not errors.
pub async fn generate_report<F: ImageFetcher>(
    request: &ReportRequest,
    fetcher: &F,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let bytes = pdf::render(request, fetcher).await?;

    log::info!(
        "Generated report for event '{}' in {:.1}ms ({} bytes)",
        request.event_id,
        t0.elapsed().as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(bytes)
}
