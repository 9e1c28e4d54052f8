use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use scraper::{Html, Selector};
use serde_json::Value;

use super::ScrapedVideo;

lazy_static! {
    static ref VIDEO_ID_REGEX: Regex = Regex::new(r"/video/(\d+)").unwrap();

    // "1.2M Likes, 500 Comments. TikTok video from User (@user): ..."
    static ref META_LIKES_REGEX: Regex = Regex::new(r"([\d.,]+[KMB]?) Likes").unwrap();
    static ref META_VIEWS_REGEX: Regex = Regex::new(r"([\d.,]+[KMB]?) Views").unwrap();
    static ref META_AUTHOR_REGEX: Regex = Regex::new(r"\(@([\w.]+)\)").unwrap();
}

const HYDRATION_SCRIPT_SELECTOR: &str = r#"script[id="__UNIVERSAL_DATA_FOR_REHYDRATION__"]"#;
const META_DESCRIPTION_SELECTOR: &str = r#"meta[name="description"]"#;

/// Normalize a video URL so the same video always maps to the same registry key.
///
/// Lower-cases scheme and host, drops query string and fragment and trailing slashes.
/// Returns None for anything that is not an absolute http(s) URL.
pub fn normalize_video_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let (scheme, rest) = trimmed.split_once("://")?;

    let scheme = scheme.to_lowercase();
    if scheme != "http" && scheme != "https" {
        return None;
    }

    let rest = rest.split(['?', '#']).next().unwrap_or("");
    let (host, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };

    if host.is_empty() || host.contains(char::is_whitespace) {
        return None;
    }

    Some(format!(
        "{}://{}{}",
        scheme,
        host.to_lowercase(),
        path.trim_end_matches('/')
    ))
}

/// Numeric video id from a `/video/<id>` path
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_REGEX
        .captures(url)
        .map(|cap| cap[1].to_string())
}

/// Parse display counts like "1.2M", "15K", "3,401"
pub fn parse_count_str(s: &str) -> Option<i64> {
    let cleaned = s.trim().to_uppercase().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }

    let (number, multiplier) = match cleaned.chars().last() {
        Some('K') => (&cleaned[..cleaned.len() - 1], 1_000i64),
        Some('M') => (&cleaned[..cleaned.len() - 1], 1_000_000),
        Some('B') => (&cleaned[..cleaned.len() - 1], 1_000_000_000),
        _ => (cleaned.as_str(), 1),
    };

    let value: Decimal = number.parse().ok()?;
    value.checked_mul(Decimal::from(multiplier))?.trunc().to_i64()
}

/// Pull video stats out of a fetched page.
///
/// Tries the hydration JSON first, then the description meta tag.
pub fn extract_video_data(html: &str) -> Option<ScrapedVideo> {
    let document = Html::parse_document(html);

    if let Some(video) = extract_from_hydration_script(&document) {
        tracing::debug!("Extracted video data from hydration script");
        return Some(video);
    }

    if let Some(video) = extract_from_meta_tags(&document) {
        tracing::debug!("Extracted video data from meta tags (imprecise)");
        return Some(video);
    }

    None
}

fn extract_from_hydration_script(document: &Html) -> Option<ScrapedVideo> {
    let selector = Selector::parse(HYDRATION_SCRIPT_SELECTOR).ok()?;
    let element = document.select(&selector).next()?;
    let content: String = element.text().collect();

    let json: Value = match serde_json::from_str(&content) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("Hydration script is not valid JSON: {}", e);
            return None;
        }
    };

    let video_detail = json.get("__DEFAULT_SCOPE__")?.get("webapp.video-detail")?;
    let item = video_detail
        .get("itemInfo")
        .and_then(|info| info.get("itemStruct"))
        .or_else(|| video_detail.get("itemStruct"))?;

    let stats = item.get("stats");
    let stats_v2 = item.get("statsV2");
    let stat = |key: &str| {
        stats
            .and_then(|s| s.get(key))
            .and_then(count_value)
            .or_else(|| stats_v2.and_then(|s| s.get(key)).and_then(count_value))
    };

    let author = item
        .get("author")
        .and_then(|a| a.get("uniqueId"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let video_id = item.get("id").and_then(|id| match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let canonical_url = match (&video_id, author.is_empty()) {
        (Some(id), false) => Some(format!("https://www.tiktok.com/@{}/video/{}", author, id)),
        _ => None,
    };

    Some(ScrapedVideo {
        video_id,
        author,
        views: stat("playCount"),
        likes: stat("diggCount"),
        canonical_url,
    })
}

fn extract_from_meta_tags(document: &Html) -> Option<ScrapedVideo> {
    let selector = Selector::parse(META_DESCRIPTION_SELECTOR).ok()?;
    let content = document
        .select(&selector)
        .next()?
        .value()
        .attr("content")?;

    let likes = META_LIKES_REGEX
        .captures(content)
        .and_then(|cap| parse_count_str(&cap[1]))?;

    // Views are rarely present in the description
    let views = META_VIEWS_REGEX
        .captures(content)
        .and_then(|cap| parse_count_str(&cap[1]))
        .unwrap_or(0);

    let author = META_AUTHOR_REGEX
        .captures(content)
        .map(|cap| cap[1].to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Some(ScrapedVideo {
        video_id: None,
        author,
        views: Some(views),
        likes: Some(likes),
        canonical_url: None,
    })
}

fn count_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => parse_count_str(s),
        _ => None,
    }
}
