use std::future::Future;

use crate::error::Error;
use crate::model::{EmbeddedImage, ImageFormat};

/// Raw bytes of a fetched attachment plus the content type the server
/// declared for it.
pub struct FetchedImage {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

/// Network seam for attachment downloads. The card renderer treats every
/// fetch independently; one failing URL must not disturb its siblings, so
/// implementations report errors per call and keep no cross-call state.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedImage, Error>> + Send;
}

/// Production fetcher backed by a shared `reqwest` client (connection
/// pooling only; no caching, no retries).
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, Error> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::FetchStatus(response.status().as_u16()));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let data = response.bytes().await?.to_vec();
        Ok(FetchedImage { data, content_type })
    }
}

/// Classify and validate a download. PNG when the declared content type says
/// so, JPEG otherwise; reading the dimensions doubles as a header check, so
/// undecodable bytes fail here and become a placeholder upstream.
pub(crate) fn decode_image(fetched: &FetchedImage) -> Result<EmbeddedImage, Error> {
    let format = classify(fetched.content_type.as_deref());
    let reader_format = match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
    };
    let cursor = std::io::Cursor::new(fetched.data.as_slice());
    let reader = image::ImageReader::with_format(std::io::BufReader::new(cursor), reader_format);
    let (pixel_width, pixel_height) = reader.into_dimensions()?;
    Ok(EmbeddedImage {
        data: fetched.data.clone(),
        format,
        pixel_width,
        pixel_height,
    })
}

fn classify(content_type: Option<&str>) -> ImageFormat {
    match content_type {
        Some(ct) if ct.to_ascii_lowercase().contains("png") => ImageFormat::Png,
        _ => ImageFormat::Jpeg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_content_type() {
        assert_eq!(classify(Some("image/png")), ImageFormat::Png);
        assert_eq!(classify(Some("IMAGE/PNG; charset=binary")), ImageFormat::Png);
        assert_eq!(classify(Some("image/jpeg")), ImageFormat::Jpeg);
        assert_eq!(classify(Some("application/octet-stream")), ImageFormat::Jpeg);
        assert_eq!(classify(None), ImageFormat::Jpeg);
    }

    #[test]
    fn decode_reads_png_dimensions() {
        let png = {
            let img = image::RgbImage::from_pixel(6, 3, image::Rgb([10, 20, 30]));
            let mut out = std::io::Cursor::new(Vec::new());
            img.write_to(&mut out, image::ImageFormat::Png).unwrap();
            out.into_inner()
        };
        let fetched = FetchedImage {
            data: png,
            content_type: Some("image/png".into()),
        };
        let embedded = decode_image(&fetched).unwrap();
        assert_eq!(embedded.format, ImageFormat::Png);
        assert_eq!((embedded.pixel_width, embedded.pixel_height), (6, 3));
    }

    #[test]
    fn decode_rejects_garbage() {
        let fetched = FetchedImage {
            data: b"not an image at all".to_vec(),
            content_type: Some("image/jpeg".into()),
        };
        assert!(matches!(
            decode_image(&fetched),
            Err(Error::ImageDecode(_))
        ));
    }
}
