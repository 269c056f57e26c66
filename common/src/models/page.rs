//! Narrative page models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Summary entry for the page listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageSummary {
    /// Page identifier used in the URL.
    pub id: String,
    /// Page title.
    pub title: String,
}

/// Full content of a narrative page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageContent {
    /// Page identifier.
    pub id: String,
    /// Page title.
    pub title: String,
    /// Page body, as markdown.
    pub body: String,
    /// Embedded document (the Dataset page's E/R diagram), if available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<EmbeddedDocument>,
    /// Non-fatal warnings to surface inline (e.g. a missing embed file).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

/// A document embedded into a page as base64 content.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmbeddedDocument {
    /// File name the content was read from.
    pub file_name: String,
    /// Media type (e.g. "application/pdf").
    pub media_type: String,
    /// Base64-encoded file content.
    pub content_base64: String,
}
