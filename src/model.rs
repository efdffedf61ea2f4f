use serde::{Deserialize, Deserializer};

/// Request body for one report build, as posted by the admin tool.
///
/// Every field is lenient: a missing or wrongly-typed value normalizes to its
/// default instead of failing the request. A non-array `incidents` is an
/// empty list, not an error.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub event_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub event_title: String,
    #[serde(deserialize_with = "lenient_incidents")]
    pub incidents: Vec<IncidentRecord>,
}

/// One logged incident. Supplied by the data store; never mutated here.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncidentRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub time: String,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(deserialize_with = "lenient_string")]
    pub logged_by: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub resolution: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub police_involved: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub ambulance_involved: bool,
    #[serde(deserialize_with = "lenient_files")]
    pub files: Vec<FileRef>,
}

/// An attachment uploaded with an incident. Only the download URL matters to
/// the renderer; the storage path belongs to the data store.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileRef {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub download_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub storage_path: String,
}

impl IncidentRecord {
    /// Download URLs that qualify for the image grid, in file order.
    /// Anything that is not an absolute http/https URL is silently dropped
    /// before any height computation sees it.
    pub fn eligible_image_urls(&self) -> Vec<&str> {
        self.files
            .iter()
            .map(|f| f.download_url.as_str())
            .filter(|url| is_absolute_http_url(url))
            .collect()
    }
}

/// Absolute `http://` / `https://` check with a case-insensitive scheme.
pub(crate) fn is_absolute_http_url(url: &str) -> bool {
    let has_prefix = |prefix: &str| {
        url.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    has_prefix("http://") || has_prefix("https://")
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum ImageFormat {
    Jpeg,
    Png,
}

/// A fetched image ready for XObject embedding.
#[derive(Clone)]
pub(crate) struct EmbeddedImage {
    pub(crate) data: Vec<u8>,
    pub(crate) format: ImageFormat,
    pub(crate) pixel_width: u32,
    pub(crate) pixel_height: u32,
}

fn lenient_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(de)? {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(match serde_json::Value::deserialize(de)? {
        serde_json::Value::Bool(b) => b,
        _ => false,
    })
}

fn lenient_incidents<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<IncidentRecord>, D::Error> {
    Ok(lenient_array(serde_json::Value::deserialize(de)?))
}

fn lenient_files<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<FileRef>, D::Error> {
    Ok(lenient_array(serde_json::Value::deserialize(de)?))
}

/// Non-array values become an empty list; a malformed element becomes a
/// default record rather than poisoning its siblings.
fn lenient_array<T: for<'a> Deserialize<'a> + Default>(value: serde_json::Value) -> Vec<T> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    }
}
