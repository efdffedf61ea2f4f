use std::collections::HashMap;

use incident_pdf::{
    Error, FetchedImage, FileRef, ImageFetcher, IncidentRecord, ReportRequest, generate_report,
};

/// Deterministic fetcher: responses keyed by URL, no network.
#[derive(Default)]
struct StubFetcher {
    responses: HashMap<String, StubResponse>,
}

enum StubResponse {
    Ok {
        data: Vec<u8>,
        content_type: &'static str,
    },
    Fail(u16),
}

impl StubFetcher {
    fn with(mut self, url: &str, response: StubResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }
}

impl ImageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, Error> {
        match self.responses.get(url) {
            Some(StubResponse::Ok { data, content_type }) => Ok(FetchedImage {
                data: data.clone(),
                content_type: Some((*content_type).to_string()),
            }),
            Some(StubResponse::Fail(status)) => Err(Error::FetchStatus(*status)),
            None => Err(Error::FetchStatus(404)),
        }
    }
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([64, 64, 64]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn jpeg_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([64, 64, 64]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

fn incident_with_files(urls: &[&str]) -> IncidentRecord {
    IncidentRecord {
        id: "inc-1".into(),
        time: "21:14".into(),
        category: "Medical".into(),
        source: "Radio".into(),
        logged_by: "Sam".into(),
        description: "Guest fainted near the main stage".into(),
        resolution: "Escorted to the medic tent".into(),
        ambulance_involved: true,
        files: urls
            .iter()
            .map(|url| FileRef {
                name: "photo.png".into(),
                download_url: (*url).to_string(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn request(incidents: Vec<IncidentRecord>) -> ReportRequest {
    ReportRequest {
        event_id: "EV-2026-081".into(),
        event_title: "Summer Festival".into(),
        incidents,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn count_bytes(haystack: &[u8], needle: &[u8]) -> usize {
    let mut count = 0;
    let mut pos = 0;
    while let Some(offset) = find(&haystack[pos..], needle) {
        count += 1;
        pos += offset + needle.len();
    }
    count
}

/// Inflate every Flate stream in the document and keep the ones carrying
/// text operators. Content streams are written in page order, so the result
/// maps 1:1 onto pages.
fn page_texts(pdf: &[u8]) -> Vec<String> {
    let mut texts = Vec::new();
    let mut pos = 0;
    while let Some(offset) = find(&pdf[pos..], b"stream\n") {
        let start = pos + offset + b"stream\n".len();
        let Some(len) = find(&pdf[start..], b"endstream") else {
            break;
        };
        let mut data = &pdf[start..start + len];
        if data.last() == Some(&b'\n') {
            data = &data[..data.len() - 1];
        }
        if let Ok(inflated) = miniz_oxide::inflate::decompress_to_vec_zlib(data) {
            let text = String::from_utf8_lossy(&inflated).into_owned();
            if text.contains("BT") {
                texts.push(text);
            }
        }
        pos = start + len + b"endstream".len();
    }
    texts
}

fn page_count(pdf: &[u8]) -> usize {
    count_bytes(pdf, b"/MediaBox")
}

#[tokio::test]
async fn empty_report_is_one_page_with_header_and_footer() {
    let bytes = generate_report(&request(Vec::new()), &StubFetcher::default())
        .await
        .unwrap();

    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(page_count(&bytes), 1);

    let pages = page_texts(&bytes);
    assert_eq!(pages.len(), 1);
    assert!(pages[0].contains("(Incident report)"));
    assert!(pages[0].contains("(No incidents were logged for this event.)"));
    assert!(pages[0].contains("(Page 1 / 1)"));
}

#[tokio::test]
async fn every_page_gets_exactly_one_footer_and_header_stays_on_page_one() {
    let incidents = (0..12).map(|_| incident_with_files(&[])).collect();
    let bytes = generate_report(&request(incidents), &StubFetcher::default())
        .await
        .unwrap();

    let pages = page_texts(&bytes);
    assert_eq!(pages.len(), page_count(&bytes));
    assert!(pages.len() > 1);

    let total = pages.len();
    for (i, page) in pages.iter().enumerate() {
        assert_eq!(page.matches("(Page ").count(), 1, "page {}", i + 1);
        assert!(page.contains(&format!("(Page {} / {total})", i + 1)));
        if i == 0 {
            assert!(page.contains("(Incident report)"));
        } else {
            assert!(!page.contains("(Incident report)"));
        }
    }
}

#[tokio::test]
async fn cards_are_never_split_across_pages() {
    let incidents = (0..12).map(|_| incident_with_files(&[])).collect();
    let bytes = generate_report(&request(incidents), &StubFetcher::default())
        .await
        .unwrap();

    let pages = page_texts(&bytes);
    for n in 1..=12 {
        let title = format!("(Incident {n})");
        let appearances: usize = pages.iter().map(|p| p.matches(&title).count()).sum();
        assert_eq!(appearances, 1, "{title}");
    }
    // Fixed-height cards: four per page at this geometry
    assert!(pages[0].contains("(Incident 4)"));
    assert!(pages[1].contains("(Incident 5)"));
}

#[tokio::test]
async fn failed_image_keeps_its_slot_and_spares_siblings() {
    let fetcher = StubFetcher::default()
        .with(
            "https://cdn.example/a.png",
            StubResponse::Ok {
                data: png_bytes(),
                content_type: "image/png",
            },
        )
        .with("https://cdn.example/b.png", StubResponse::Fail(500))
        .with(
            "https://cdn.example/c.png",
            StubResponse::Ok {
                data: png_bytes(),
                content_type: "image/png",
            },
        );
    let incidents = vec![incident_with_files(&[
        "https://cdn.example/a.png",
        "https://cdn.example/b.png",
        "https://cdn.example/c.png",
    ])];
    let bytes = generate_report(&request(incidents), &fetcher).await.unwrap();

    let pages = page_texts(&bytes);
    assert_eq!(pages.len(), 1);
    let page = &pages[0];

    assert!(page.contains("/Im1 Do"));
    assert!(page.contains("/Im2 Do"));
    assert!(!page.contains("/Im3"));
    assert!(page.contains("(could not fetch image 2)"));

    // Tiles sit at x = 50, 178, 306; the failing slot stays empty and the
    // third image lands at its original position
    assert!(page.contains("120 0 0 90 50 "));
    assert!(page.contains("120 0 0 90 306 "));
    assert!(!page.contains("120 0 0 90 178 "));
}

#[tokio::test]
async fn image_grid_wraps_after_four_tiles() {
    let urls: Vec<String> = (0..6)
        .map(|i| format!("https://cdn.example/img-{i}.png"))
        .collect();
    let mut fetcher = StubFetcher::default();
    for url in &urls {
        fetcher = fetcher.with(
            url,
            StubResponse::Ok {
                data: png_bytes(),
                content_type: "image/png",
            },
        );
    }
    let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let bytes = generate_report(&request(vec![incident_with_files(&url_refs)]), &fetcher)
        .await
        .unwrap();

    let pages = page_texts(&bytes);
    let page = &pages[0];
    for i in 1..=6 {
        assert!(page.contains(&format!("/Im{i} Do")));
    }
    // Slots 1 and 5 share the left edge on consecutive rows
    assert_eq!(page.matches("120 0 0 90 50 ").count(), 2);
}

#[tokio::test]
async fn ineligible_urls_are_not_attempted() {
    let fetcher = StubFetcher::default().with(
        "https://cdn.example/ok.png",
        StubResponse::Ok {
            data: png_bytes(),
            content_type: "image/png",
        },
    );
    let incidents = vec![incident_with_files(&[
        "gs://bucket/skip.png",
        "https://cdn.example/ok.png",
        "/relative/skip.png",
    ])];
    let bytes = generate_report(&request(incidents), &fetcher).await.unwrap();

    let pages = page_texts(&bytes);
    let page = &pages[0];
    assert!(page.contains("/Im1 Do"));
    assert!(!page.contains("/Im2"));
    // Excluded files never reach the fetcher, so no placeholder either
    assert!(!page.contains("(could not fetch"));
}

#[tokio::test]
async fn jpeg_images_embed_with_dct_filter() {
    let fetcher = StubFetcher::default().with(
        "https://cdn.example/photo.jpg",
        StubResponse::Ok {
            data: jpeg_bytes(),
            content_type: "image/jpeg",
        },
    );
    let incidents = vec![incident_with_files(&["https://cdn.example/photo.jpg"])];
    let bytes = generate_report(&request(incidents), &fetcher).await.unwrap();

    assert!(find(&bytes, b"/DCTDecode").is_some());
    assert!(page_texts(&bytes)[0].contains("/Im1 Do"));
}

#[tokio::test]
async fn identical_input_produces_identical_bytes() {
    let build = || async {
        let fetcher = StubFetcher::default()
            .with(
                "https://cdn.example/a.png",
                StubResponse::Ok {
                    data: png_bytes(),
                    content_type: "image/png",
                },
            )
            .with("https://cdn.example/b.png", StubResponse::Fail(503));
        let incidents = vec![
            incident_with_files(&["https://cdn.example/a.png", "https://cdn.example/b.png"]),
            incident_with_files(&[]),
        ];
        generate_report(&request(incidents), &fetcher).await.unwrap()
    };

    let first = build().await;
    let second = build().await;
    assert_eq!(first, second);
}
