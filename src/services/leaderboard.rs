//! Daily leaderboard scraper
//!
//! The page is fetched as HTML and scanned with a handful of regexes:
//!
//! - items: `<section data-test="post-item-N">` (fallback: sections whose class
//!   contains `group relative flex`)
//! - title + link: the `data-test="post-name-N"` anchor
//! - description: the anchor whose class contains `text-secondary`
//! - topics: anchors pointing at `/topics/`
//! - image: the first `<img>` (`src`, else the first `srcset` entry)
//!
//! Rank is the 1-based position among the items considered, so it follows
//! page order even when an item is later dropped for lacking a title.

use crate::constants::LEADERBOARD_BASE_URL;
use crate::error::Result;
use crate::models::{LeaderboardDate, Listing, PLACEHOLDER};
use crate::services::http::get_text;
use crate::services::sources::LeaderboardSource;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

pub struct LeaderboardClient {
    base_url: String,
    client: reqwest::Client,
}

impl LeaderboardClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            base_url: LEADERBOARD_BASE_URL.to_string(),
            client,
        }
    }

    /// `{base}/leaderboard/daily/{Y}/{M}/{D}?ref=header_nav`
    pub fn build_url(&self, date: LeaderboardDate) -> String {
        format!(
            "{}/leaderboard/daily/{}?ref=header_nav",
            self.base_url,
            date.path_segment()
        )
    }
}

#[async_trait]
impl LeaderboardSource for LeaderboardClient {
    async fn fetch_listings(&self, date: LeaderboardDate, limit: usize) -> Result<Vec<Listing>> {
        let url = self.build_url(date);
        info!(url = %url, "Fetching leaderboard page");

        let request = self
            .client
            .get(&url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5");

        let html = get_text(request, "leaderboard").await?;
        let listings = extract_listings(&html, date, limit, &self.base_url);

        info!(count = listings.len(), bytes = html.len(), "Extracted leaderboard listings");
        Ok(listings)
    }
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap_or_else(|e| panic!("invalid regex {}: {}", pattern, e)))
}

fn item_sections() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r#"(?s)<section\b[^>]*data-test="post-item-\d+"[^>]*>(.*?)</section>"#)
}

fn fallback_sections() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r#"(?s)<section\b[^>]*class="[^"]*group[^"]*relative[^"]*flex[^"]*"[^>]*>(.*?)</section>"#)
}

fn name_anchor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r#"(?s)<a\b([^>]*data-test="post-name-\d+"[^>]*)>(.*?)</a>"#)
}

fn description_anchor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r#"(?s)<a\b[^>]*class="[^"]*text-secondary[^"]*"[^>]*>(.*?)</a>"#)
}

fn topic_anchor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r#"(?s)<a\b[^>]*href="[^"]*/topics/[^"]*"[^>]*>(.*?)</a>"#)
}

fn image_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r#"(?s)<img\b([^>]*)>"#)
}

fn tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"<[^>]*>")
}

fn href_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r#"\bhref="([^"]*)""#)
}

fn src_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r#"\bsrc="([^"]*)""#)
}

fn srcset_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r#"\bsrcset="([^"]*)""#)
}

/// First capture of an attribute pattern, entity-decoded; empty values count as absent
fn attribute(attrs: &str, re: &Regex) -> Option<String> {
    re.captures(attrs)
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str()))
        .filter(|v| !v.is_empty())
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Strip markup, decode common entities and collapse whitespace
fn inner_text(html: &str) -> String {
    let stripped = tag().replace_all(html, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn absolute_link(href: &str, base_url: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", base_url, href)
    } else {
        href.to_string()
    }
}

/// Extract up to `limit` listings from a leaderboard page, dropping title-less items
pub fn extract_listings(html: &str, date: LeaderboardDate, limit: usize, base_url: &str) -> Vec<Listing> {
    let mut sections: Vec<&str> = item_sections()
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    if sections.is_empty() {
        warn!("No post-item sections found, trying fallback section pattern");
        sections = fallback_sections()
            .captures_iter(html)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
    }

    debug!(sections = sections.len(), "Found leaderboard sections");

    let mut listings = Vec::new();
    for (idx, section) in sections.iter().take(limit).enumerate() {
        let rank = (idx + 1) as u32;
        let listing = extract_listing(section, rank, date, base_url);
        if listing.has_title() {
            listings.push(listing);
        } else {
            warn!(rank, "Skipping leaderboard item without a title");
        }
    }

    listings
}

fn extract_listing(section: &str, rank: u32, date: LeaderboardDate, base_url: &str) -> Listing {
    let (title, link) = match name_anchor().captures(section) {
        Some(caps) => {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let text = caps.get(2).map_or(String::new(), |m| inner_text(m.as_str()));
            let link = attribute(attrs, href_attr()).map(|href| absolute_link(&href, base_url));
            (text, link)
        }
        None => (PLACEHOLDER.to_string(), None),
    };

    let description = description_anchor()
        .captures(section)
        .and_then(|c| c.get(1))
        .map(|m| inner_text(m.as_str()))
        .filter(|d| !d.is_empty());

    let topics = topic_anchor()
        .captures_iter(section)
        .filter_map(|c| c.get(1).map(|m| inner_text(m.as_str())))
        .filter(|t| !t.is_empty())
        .collect();

    let image = image_tag().captures(section).and_then(|c| {
        let attrs = c.get(1).map_or("", |m| m.as_str());
        attribute(attrs, src_attr()).or_else(|| {
            attribute(attrs, srcset_attr())
                .and_then(|set| set.split_whitespace().next().map(str::to_string))
        })
    });

    Listing {
        rank,
        title,
        description,
        link,
        image,
        topics,
        date: date.path_segment(),
    }
}
