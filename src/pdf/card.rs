use super::layout::RenderState;
use crate::error::Error;
use crate::fetch::{ImageFetcher, decode_image};
use crate::model::IncidentRecord;

pub(crate) const TILE_WIDTH: f32 = 120.0;
pub(crate) const TILE_HEIGHT: f32 = 90.0;
pub(crate) const TILE_GAP: f32 = 8.0;

const CARD_PAD: f32 = 14.0;
const TITLE_GAP: f32 = 18.0;
const LINE_HEIGHT: f32 = 14.0;
const IMAGES_LABEL_HEIGHT: f32 = 14.0;
const IMAGES_TOP_GAP: f32 = 4.0;
const IMAGES_BOTTOM_GAP: f32 = 6.0;
const CARD_BOTTOM_PAD: f32 = 12.0;
pub(crate) const CARD_SPACING: f32 = 14.0;

const TEXT_INSET: f32 = 10.0;
const TITLE_SIZE: f32 = 12.0;
const META_SIZE: f32 = 9.5;
const PLACEHOLDER_SIZE: f32 = 8.5;

/// The fixed metadata lines of a card, in drawing order. Empty values render
/// as an em-dash placeholder at draw time; booleans render as "Ja"/"Nej".
pub(crate) fn meta_pairs(incident: &IncidentRecord) -> Vec<(&'static str, String)> {
    let yes_no = |flag: bool| if flag { "Ja" } else { "Nej" }.to_string();
    vec![
        ("Time", incident.time.clone()),
        ("Type", incident.category.clone()),
        ("Source", incident.source.clone()),
        ("Logged by", incident.logged_by.clone()),
        ("Description", incident.description.clone()),
        ("Resolution", incident.resolution.clone()),
        ("Police involved", yes_no(incident.police_involved)),
        ("Ambulance involved", yes_no(incident.ambulance_involved)),
    ]
}

pub(crate) fn images_per_row(content_width: f32) -> usize {
    let fit = ((content_width + TILE_GAP) / (TILE_WIDTH + TILE_GAP)).floor() as usize;
    fit.max(1)
}

/// Height of the image grid section, zero when there are no eligible images.
pub(crate) fn images_height(image_count: usize, content_width: f32) -> f32 {
    if image_count == 0 {
        return 0.0;
    }
    let rows = image_count.div_ceil(images_per_row(content_width)) as f32;
    IMAGES_LABEL_HEIGHT
        + IMAGES_TOP_GAP
        + rows * TILE_HEIGHT
        + (rows - 1.0) * TILE_GAP
        + IMAGES_BOTTOM_GAP
}

/// Full card height, computed before anything is drawn so the page-break
/// decision covers the whole block.
pub(crate) fn card_height(meta_count: usize, image_count: usize, content_width: f32) -> f32 {
    CARD_PAD
        + TITLE_GAP
        + meta_count as f32 * LINE_HEIGHT
        + images_height(image_count, content_width)
        + CARD_BOTTOM_PAD
}

/// Measure and draw one incident as an atomic block: background, title,
/// metadata lines, then the wrapped image grid. The only fallible step is
/// the per-image fetch, and that degrades to an inline placeholder without
/// shifting any sibling slot.
pub(crate) async fn render<F: ImageFetcher>(
    state: &mut RenderState,
    incident: &IncidentRecord,
    index: usize,
    fetcher: &F,
) {
    let pairs = meta_pairs(incident);
    let urls = incident.eligible_image_urls();
    let content_width = state.layout.content_width;
    let height = card_height(pairs.len(), urls.len(), content_width);

    state.ensure_space(height);

    let margin = state.layout.margin;
    let top = state.cursor_y();
    let right_edge = margin + content_width;
    let text_x = margin + TEXT_INSET;
    let text = state.palette.text;
    let muted = state.palette.muted;

    state.draw_rect(
        margin,
        top - height,
        content_width,
        height,
        state.palette.card_bg,
    );
    state.draw_rect_outline(
        margin,
        top - height,
        content_width,
        height,
        state.palette.line,
        0.75,
    );

    let mut y = top - CARD_PAD - TITLE_GAP;
    state.draw_text(
        &format!("Incident {}", index + 1),
        text_x,
        y + 4.0,
        TITLE_SIZE,
        true,
        text,
    );

    for (label, value) in &pairs {
        y -= LINE_HEIGHT;
        let label_text = format!("{label}: ");
        state.draw_text(&label_text, text_x, y + 3.0, META_SIZE, true, muted);
        let value_x = text_x + state.text_width(&label_text, META_SIZE, true);
        let shown = if value.is_empty() {
            "—".to_string()
        } else {
            state.truncate(value, META_SIZE, false, right_edge - TEXT_INSET - value_x)
        };
        state.draw_text(&shown, value_x, y + 3.0, META_SIZE, false, text);
    }

    if !urls.is_empty() {
        y -= IMAGES_LABEL_HEIGHT;
        state.draw_text("Images", text_x, y + 3.0, META_SIZE, true, muted);
        y -= IMAGES_TOP_GAP;

        let mut tile_x = text_x;
        let mut row_top = y;
        for (slot, url) in urls.iter().enumerate() {
            if slot > 0 && tile_x + TILE_WIDTH > right_edge {
                tile_x = text_x;
                row_top -= TILE_HEIGHT + TILE_GAP;
            }
            match embed(state, fetcher, url).await {
                Ok(name) => {
                    state.draw_image(&name, tile_x, row_top - TILE_HEIGHT, TILE_WIDTH, TILE_HEIGHT);
                }
                Err(err) => {
                    log::warn!("incident {}: image {} ({url}): {err}", index + 1, slot + 1);
                    state.draw_text(
                        &format!("could not fetch image {}", slot + 1),
                        tile_x + 6.0,
                        row_top - TILE_HEIGHT / 2.0,
                        PLACEHOLDER_SIZE,
                        false,
                        muted,
                    );
                }
            }
            tile_x += TILE_WIDTH + TILE_GAP;
        }
    }

    state.advance(height + CARD_SPACING);
}

async fn embed<F: ImageFetcher>(
    state: &mut RenderState,
    fetcher: &F,
    url: &str,
) -> Result<String, Error> {
    let fetched = fetcher.fetch(url).await?;
    let image = decode_image(&fetched)?;
    Ok(state.embed_image(&image))
}
