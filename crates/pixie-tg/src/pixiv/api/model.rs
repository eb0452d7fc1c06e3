//! Declarations of the pixiv JSON API types.
//!
//! Two API generations are in play. The ranking and search endpoints speak
//! the older public API dialect (entries nested under `response`, string
//! safety labels, multi-page data under `metadata.pages`). The detail
//! endpoint speaks the newer app API dialect (a flat `illust` object,
//! numeric sanity levels, multi-page data under `meta_pages`). All of them
//! funnel into [`RawIllust`], which tolerates both field layouts; lenient
//! defaults make a malformed payload decode as an empty one.

use crate::pixiv::model::{IllustId, SafetyRating};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub(crate) response: AuthPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthPayload {
    pub(crate) access_token: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RankingResponse {
    #[serde(default)]
    pub(crate) has_error: bool,

    #[serde(default)]
    pub(crate) response: Vec<RankingPage>,

    #[serde(default)]
    pub(crate) pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RankingPage {
    #[serde(default)]
    pub(crate) works: Vec<RankedWork>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RankedWork {
    pub(crate) work: RawIllust,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub(crate) has_error: bool,

    #[serde(default)]
    pub(crate) response: Vec<RawIllust>,

    #[serde(default)]
    pub(crate) pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Pagination {
    #[serde(default)]
    pub(crate) next: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailResponse {
    pub(crate) illust: RawIllust,
}

/// One illustration entry as any of the upstream endpoints shapes it.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawIllust {
    #[serde(default)]
    pub(crate) id: Option<IllustId>,

    #[serde(default)]
    pub(crate) title: String,

    #[serde(default)]
    pub(crate) image_urls: ImageUrls,

    #[serde(default)]
    pub(crate) user: Option<RawUser>,

    #[serde(default)]
    pub(crate) sanity_level: SafetyRating,

    /// App API multi-page layout
    #[serde(default)]
    pub(crate) meta_pages: Vec<MetaPage>,

    /// Public API multi-page layout
    #[serde(default)]
    pub(crate) metadata: Option<Metadata>,
}

impl RawIllust {
    /// Per-page image URL sets of a multi-page entry, in page order.
    /// Empty for single-page entries, whose URLs live at the top level.
    pub(crate) fn pages(&self) -> &[MetaPage] {
        if !self.meta_pages.is_empty() {
            return &self.meta_pages;
        }
        self.metadata
            .as_ref()
            .map(|metadata| metadata.pages.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Metadata {
    #[serde(default)]
    pub(crate) pages: Vec<MetaPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MetaPage {
    #[serde(default)]
    pub(crate) image_urls: ImageUrls,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ImageUrls {
    #[serde(default)]
    pub(crate) square_medium: Option<Url>,

    #[serde(default)]
    pub(crate) medium: Option<Url>,

    #[serde(default)]
    pub(crate) large: Option<Url>,

    #[serde(default)]
    pub(crate) original: Option<Url>,
}

impl ImageUrls {
    /// Best full-resolution representation for sending as the content.
    pub(crate) fn full(&self) -> Option<&Url> {
        self.large
            .as_ref()
            .or(self.original.as_ref())
            .or(self.medium.as_ref())
    }

    /// Best small representation for the results preview popup.
    pub(crate) fn thumb(&self) -> Option<&Url> {
        self.square_medium
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.large.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawUser {
    #[serde(default)]
    pub(crate) id: Option<u64>,

    #[serde(default)]
    pub(crate) name: String,
}

/// Tagged union over the upstream page payload shapes. The fetcher only
/// ever consumes it through [`RawPage::has_next_page`] and
/// [`RawPage::into_entries`], which is where the shape differences end.
#[derive(Debug)]
pub(crate) enum RawPage {
    Ranking(RankingResponse),
    Search(SearchResponse),
}

impl RawPage {
    pub(crate) fn has_next_page(&self) -> bool {
        let pagination = match self {
            Self::Ranking(res) => &res.pagination,
            Self::Search(res) => &res.pagination,
        };
        pagination
            .as_ref()
            .map_or(false, |pagination| pagination.next.is_some())
    }

    pub(crate) fn has_error(&self) -> bool {
        match self {
            Self::Ranking(res) => res.has_error,
            Self::Search(res) => res.has_error,
        }
    }

    pub(crate) fn into_entries(self) -> Vec<RawIllust> {
        match self {
            Self::Ranking(res) => res
                .response
                .into_iter()
                .flat_map(|page| page.works)
                .map(|ranked| ranked.work)
                .collect(),
            Self::Search(res) => res.response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_the_nested_ranking_shape() {
        let payload = serde_json::json!({
            "status": "success",
            "response": [{
                "content": "illust",
                "works": [{
                    "rank": 1,
                    "work": {
                        "id": 101,
                        "title": "morning",
                        "image_urls": {
                            "medium": "https://i.pximg.net/img/101_medium.jpg",
                            "large": "https://i.pximg.net/img/101_large.jpg"
                        },
                        "user": { "id": 7, "name": "aki" },
                        "sanity_level": "white"
                    }
                }]
            }],
            "pagination": { "next": 2, "current": 1 }
        });

        let res: RankingResponse = serde_json::from_value(payload).unwrap();
        let page = RawPage::Ranking(res);

        assert!(page.has_next_page());
        assert!(!page.has_error());

        let entries = page.into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, Some(IllustId(101)));
        assert_eq!(entries[0].sanity_level, SafetyRating::Safe);
        assert_eq!(entries[0].user.as_ref().unwrap().name, "aki");
    }

    #[test]
    fn decodes_the_flat_search_shape() {
        let payload = serde_json::json!({
            "response": [{
                "id": 202,
                "title": "cat",
                "image_urls": {
                    "medium": "https://i.pximg.net/img/202_medium.jpg",
                    "large": "https://i.pximg.net/img/202_large.jpg"
                },
                "user": { "id": 9, "name": "umi" },
                "sanity_level": "semi_black"
            }],
            "pagination": { "next": null }
        });

        let res: SearchResponse = serde_json::from_value(payload).unwrap();
        let page = RawPage::Search(res);

        assert!(!page.has_next_page());
        assert_eq!(page.into_entries()[0].sanity_level, SafetyRating::Questionable);
    }

    #[test]
    fn decodes_the_app_api_detail_shape() {
        let payload = serde_json::json!({
            "illust": {
                "id": 303,
                "title": "album",
                "image_urls": { "square_medium": "https://i.pximg.net/img/303_sq.jpg" },
                "user": { "id": 11, "name": "rin", "account": "rin_px" },
                "sanity_level": 6,
                "meta_pages": [
                    { "image_urls": { "large": "https://i.pximg.net/img/303_p0.jpg" } },
                    { "image_urls": { "large": "https://i.pximg.net/img/303_p1.jpg" } }
                ]
            }
        });

        let res: DetailResponse = serde_json::from_value(payload).unwrap();

        assert_eq!(res.illust.sanity_level, SafetyRating::Restricted);
        assert_eq!(res.illust.pages().len(), 2);
        assert!(res.illust.pages()[0]
            .image_urls
            .full()
            .unwrap()
            .as_str()
            .ends_with("303_p0.jpg"));
    }

    #[test]
    fn malformed_payloads_decode_as_empty() {
        let res: SearchResponse = serde_json::from_str(r#"{"status": "what"}"#).unwrap();
        let page = RawPage::Search(res);

        assert!(!page.has_next_page());
        assert!(page.into_entries().is_empty());
    }
}
