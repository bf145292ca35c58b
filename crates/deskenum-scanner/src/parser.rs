//! Wire shapes of the service desk and help center APIs, and their
//! conversion into records.

use crate::error::{Result, ScanError};
use crate::record::Record;
use crate::task::SearchPage;
use serde::{Deserialize, Serialize};

/// Avatar path the platform serves for accounts without a picture.
pub const DEFAULT_AVATAR: &str = "/default-avatar.png";

/// Response of the service desk listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDeskList {
    #[serde(default)]
    pub values: Vec<ServiceDesk>,
}

/// A service desk (customer portal project).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDesk {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub project_key: Option<String>,
}

impl ServiceDesk {
    /// A desk known only by id, as when a single desk is targeted.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// `Name (KEY) [ID: n]`, dropping whichever of name and key is unknown.
    #[must_use]
    pub fn label(&self) -> String {
        match (&self.project_name, &self.project_key) {
            (Some(name), Some(key)) if !name.is_empty() => {
                format!("{name} ({key}) [ID: {}]", self.id)
            }
            (Some(name), None) if !name.is_empty() => format!("{name} [ID: {}]", self.id),
            (_, Some(key)) if !key.is_empty() => format!("({key}) [ID: {}]", self.id),
            _ => format!("[ID: {}]", self.id),
        }
    }
}

/// A portal user returned by the user search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub account_id: String,
    pub email_address: String,
    pub display_name: String,
    pub avatar: String,
}

impl User {
    /// Avatar URL, or `None` for the platform's placeholder image.
    #[must_use]
    pub fn custom_avatar(&self) -> Option<&str> {
        if self.avatar.is_empty() || self.avatar.contains(DEFAULT_AVATAR) {
            None
        } else {
            Some(&self.avatar)
        }
    }
}

impl Record for User {
    fn key(&self) -> &str {
        &self.account_id
    }
}

/// Decode a user search body into a page.
///
/// The user search reports no total; entries without an account id are
/// dropped since they cannot be deduplicated.
pub fn parse_users(body: &[u8]) -> Result<SearchPage<User>> {
    let users: Vec<User> = serde_json::from_slice(body)
        .map_err(|e| ScanError::Client(deskenum_client::ClientError::Decode(e.to_string())))?;

    Ok(SearchPage::uncounted(
        users
            .into_iter()
            .filter(|user| !user.account_id.is_empty())
            .collect(),
    ))
}

/// Response of the tenant info lookup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantInfo {
    #[serde(default)]
    pub cloud_id: Option<String>,
}

/// Variables sent with the persisted article-search query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSearchVariables<'a> {
    pub cloud_id: &'a str,
    pub query_term: &'a str,
    pub portal_ids: Vec<String>,
    pub category_ids: Vec<String>,
    pub limit: usize,
    pub highlight: bool,
    pub is_source_system_enabled: bool,
}

/// Envelope of the persisted article-search request.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleSearchRequest<'a> {
    pub variables: ArticleSearchVariables<'a>,
}

impl<'a> ArticleSearchRequest<'a> {
    #[must_use]
    pub fn new(cloud_id: &'a str, query_term: &'a str, limit: usize) -> Self {
        Self {
            variables: ArticleSearchVariables {
                cloud_id,
                query_term,
                portal_ids: Vec::new(),
                category_ids: Vec::new(),
                limit,
                highlight: false,
                is_source_system_enabled: true,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArticleSearchResponse {
    #[serde(default)]
    data: Option<ArticleSearchData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct ArticleSearchData {
    #[serde(rename = "helpObjectStore_searchArticles")]
    search_articles: Option<ArticleResults>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleResults {
    #[serde(default)]
    results: Vec<ArticleHit>,
    #[serde(default)]
    total_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleHit {
    ari: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    display_link: String,
    #[serde(default)]
    metadata: ArticleMetadata,
    #[serde(default)]
    source_system: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ArticleMetadata {
    is_external: bool,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

/// A help center document exposed through the portal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub ari: String,
    pub title: String,
    pub display_link: String,
    pub full_url: String,
    pub source_system: String,
    pub is_external: bool,
}

impl Record for Document {
    fn key(&self) -> &str {
        &self.ari
    }
}

/// Decode an article-search body into a page of documents.
///
/// A non-empty `errors` array fails the search even if data is present.
pub fn parse_documents(body: &[u8], base_url: &str) -> Result<SearchPage<Document>> {
    let response: ArticleSearchResponse = serde_json::from_slice(body)
        .map_err(|e| ScanError::Client(deskenum_client::ClientError::Decode(e.to_string())))?;

    if !response.errors.is_empty() {
        return Err(ScanError::Application(
            response.errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    let results = response
        .data
        .and_then(|data| data.search_articles)
        .ok_or_else(|| {
            ScanError::Client(deskenum_client::ClientError::Decode(
                "response has no article search results".to_string(),
            ))
        })?;

    let documents = results
        .results
        .into_iter()
        .map(|hit| Document {
            full_url: format!("{base_url}{}", hit.display_link),
            ari: hit.ari,
            title: hit.title,
            display_link: hit.display_link,
            source_system: hit.source_system,
            is_external: hit.metadata.is_external,
        })
        .collect();

    Ok(SearchPage::counted(documents, results.total_count))
}
