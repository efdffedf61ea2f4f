mod card;
pub(crate) mod layout;

use std::time::Instant;

use crate::error::Error;
use crate::fetch::ImageFetcher;
use crate::model::ReportRequest;
use layout::{PageLayout, Palette, RenderState};

const HEADER_BAND_HEIGHT: f32 = 70.0;
const HEADER_GAP: f32 = 20.0;
const HEADER_TITLE_SIZE: f32 = 18.0;
const HEADER_META_SIZE: f32 = 9.5;
const FOOTER_SIZE: f32 = 8.5;

/// Build the complete report: header once, one atomic card per incident in
/// input order (each card's image fetches finish before the next card
/// starts), then the footer pass over the final page list.
pub(crate) async fn render<F: ImageFetcher>(
    request: &ReportRequest,
    fetcher: &F,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();
    let mut state = RenderState::new(PageLayout::a4(), Palette::default());

    draw_header(&mut state, &request.event_title, &request.event_id);

    if request.incidents.is_empty() {
        let margin = state.layout.margin;
        let y = state.cursor_y() - 14.0;
        state.draw_text(
            "No incidents were logged for this event.",
            margin,
            y,
            10.5,
            false,
            state.palette.muted,
        );
    } else {
        for (index, incident) in request.incidents.iter().enumerate() {
            card::render(&mut state, incident, index, fetcher).await;
        }
    }
    let t_content = t0.elapsed();

    stamp_footers(&mut state);

    let pages = state.page_count();
    let bytes = state.finish();
    log::info!(
        "Render: {} incidents, {} pages, {} bytes (content={:.1}ms, total={:.1}ms)",
        request.incidents.len(),
        pages,
        bytes.len(),
        t_content.as_secs_f64() * 1000.0,
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(bytes)
}

/// Banner on the first page only: colored band, title, and a metadata line
/// joined from the non-empty event parts. Pages created later by a forced
/// break start directly at the top margin.
fn draw_header(state: &mut RenderState, event_title: &str, event_id: &str) {
    let page_width = state.layout.page_width;
    let page_height = state.layout.page_height;
    let margin = state.layout.margin;

    state.draw_rect(
        0.0,
        page_height - HEADER_BAND_HEIGHT,
        page_width,
        HEADER_BAND_HEIGHT,
        state.palette.header_bg,
    );
    state.draw_text(
        "Incident report",
        margin,
        page_height - 42.0,
        HEADER_TITLE_SIZE,
        true,
        state.palette.header_text,
    );

    let mut parts: Vec<String> = Vec::new();
    if !event_title.is_empty() {
        parts.push(format!("Event: {event_title}"));
    }
    if !event_id.is_empty() {
        parts.push(format!("Event ID: {event_id}"));
    }
    if !parts.is_empty() {
        state.draw_text(
            &parts.join("  ·  "),
            margin,
            page_height - 58.0,
            HEADER_META_SIZE,
            false,
            state.palette.header_meta,
        );
    }

    state.set_cursor(page_height - HEADER_BAND_HEIGHT - HEADER_GAP);
}

/// Second pass: the total page count is only known once all content is
/// placed, so the ordinal stamps are drawn onto the finished page list.
fn stamp_footers(state: &mut RenderState) {
    let total = state.page_count();
    let page_width = state.layout.page_width;
    let margin = state.layout.margin;
    let y = margin - 18.0;
    for page in 0..total {
        let label = format!("Page {} / {}", page + 1, total);
        let x = page_width - margin - state.text_width(&label, FOOTER_SIZE, false);
        state.draw_text_on(page, &label, x, y, FOOTER_SIZE, false, state.palette.footer_text);
    }
}
