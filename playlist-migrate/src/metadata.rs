//! Title, description and tags of a source video, read from its public watch page.

use crate::error::MetadataError;
use scraper::{Html, Selector};
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Anything that can describe a video given its watch URL.
pub trait MetadataSource {
    fn fetch(&self, video_url: &str) -> impl Future<Output = Result<VideoMetadata, MetadataError>>;
}

/// Reads the `<meta>` tags YouTube embeds in every watch page.
///
/// One unauthenticated GET per call. No retries and no caching.
#[derive(Debug, Clone, Default)]
pub struct PageScraper {
    client: reqwest::Client,
}

impl MetadataSource for PageScraper {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, video_url: &str) -> Result<VideoMetadata, MetadataError> {
        let response = self
            .client
            .get(video_url)
            .send()
            .await
            .map_err(|source| MetadataError::Request {
                url: video_url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status {
                url: video_url.to_string(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| MetadataError::Request {
                url: video_url.to_string(),
                source,
            })?;

        let metadata = parse_watch_page(video_url, &body)?;
        tracing::debug!(
            title = metadata.title,
            tags = metadata.tags.len(),
            "scraped video metadata"
        );
        Ok(metadata)
    }
}

/// Extracts [`VideoMetadata`] from watch page HTML.
///
/// `keywords` is a comma-separated list; each entry is trimmed and empty entries are dropped.
/// `url` is only used to label errors.
pub fn parse_watch_page(url: &str, html: &str) -> Result<VideoMetadata, MetadataError> {
    let document = Html::parse_document(html);
    let meta = |field: &'static str| {
        let selector = Selector::parse(&format!(r#"meta[name="{field}"]"#))
            .expect("meta selector is statically valid");
        document
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr("content"))
            .map(str::to_string)
            .ok_or_else(|| MetadataError::MissingField {
                url: url.to_string(),
                field,
            })
    };

    let title = meta("title")?;
    let description = meta("description")?;
    let tags = meta("keywords")?
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect();

    Ok(VideoMetadata {
        title,
        description,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const URL: &str = "https://www.youtube.com/watch?v=xyz";

    fn page(head: &str) -> String {
        format!(
            "<!DOCTYPE html><html><head>{head}</head>\
             <body><div id=\"player\"></div></body></html>"
        )
    }

    #[test]
    fn reads_title_description_and_tags() {
        let html = page(
            r#"<meta name="title" content="Rust in 100 seconds">
               <meta name="description" content="A quick tour &amp; more">
               <meta name="keywords" content="rust, programming,  systems ,">"#,
        );

        let metadata = parse_watch_page(URL, &html).unwrap();
        assert_eq!(
            metadata,
            VideoMetadata {
                title: "Rust in 100 seconds".into(),
                description: "A quick tour & more".into(),
                tags: vec!["rust".into(), "programming".into(), "systems".into()],
            }
        );
    }

    #[test]
    fn other_meta_tags_are_ignored() {
        let html = page(
            r#"<meta property="og:title" content="wrong">
               <meta name="title" content="right">
               <meta name="description" content="">
               <meta name="keywords" content="">"#,
        );

        let metadata = parse_watch_page(URL, &html).unwrap();
        assert_eq!(metadata.title, "right");
        assert_eq!(metadata.description, "");
        assert!(metadata.tags.is_empty());
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        let html = page(
            r#"<meta name="title" content="only a title">
               <meta name="description" content="and a description">"#,
        );

        let err = parse_watch_page(URL, &html).unwrap_err();
        match err {
            MetadataError::MissingField { field, url } => {
                assert_eq!(field, "keywords");
                assert_eq!(url, URL);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
