//! Resources, resource templates, and subscription types.

use serde::{Deserialize, Serialize};

use super::core::Cursor;
use super::{Notification, Request};
use crate::methods;

/// A resource the server offers for reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Resource URI.
    pub uri: String,
    /// Resource name.
    pub name: String,
    /// Human-readable display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// What the resource contains.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type, when known.
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A parameterized resource template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTemplate {
    /// RFC 6570 URI template.
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    /// Template name.
    pub name: String,
    /// Human-readable display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// What the template expands to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of expanded resources, when uniform.
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Contents of a read resource: text or binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceContents {
    /// Textual contents.
    Text {
        /// URI of this resource.
        uri: String,
        /// MIME type, when known.
        #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        /// The text.
        text: String,
    },
    /// Binary contents.
    Blob {
        /// URI of this resource.
        uri: String,
        /// MIME type, when known.
        #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        /// Base64-encoded bytes.
        blob: String,
    },
}

/// `resources/list` request params.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResourcesRequest {
    /// Pagination cursor from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
}

/// `resources/list` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResourcesResult {
    /// The resources on this page.
    pub resources: Vec<Resource>,
    /// Cursor for the next page, if any.
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,
}

impl Request for ListResourcesRequest {
    const METHOD: &'static str = methods::LIST_RESOURCES;
    type Result = ListResourcesResult;
}

/// `resources/templates/list` request params.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResourceTemplatesRequest {
    /// Pagination cursor from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
}

/// `resources/templates/list` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResourceTemplatesResult {
    /// The templates on this page.
    #[serde(rename = "resourceTemplates")]
    pub resource_templates: Vec<ResourceTemplate>,
    /// Cursor for the next page, if any.
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,
}

impl Request for ListResourceTemplatesRequest {
    const METHOD: &'static str = methods::LIST_RESOURCE_TEMPLATES;
    type Result = ListResourceTemplatesResult;
}

/// `resources/read` request params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResourceRequest {
    /// URI of the resource to read.
    pub uri: String,
}

/// `resources/read` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResourceResult {
    /// One or more content entries for the URI.
    pub contents: Vec<ResourceContents>,
}

impl Request for ReadResourceRequest {
    const METHOD: &'static str = methods::READ_RESOURCE;
    type Result = ReadResourceResult;
}

/// `resources/subscribe` request params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeResourceRequest {
    /// URI to watch for updates.
    pub uri: String,
}

impl Request for SubscribeResourceRequest {
    const METHOD: &'static str = methods::SUBSCRIBE_RESOURCE;
    type Result = super::core::EmptyResult;
}

/// `resources/unsubscribe` request params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeResourceRequest {
    /// URI to stop watching.
    pub uri: String,
}

impl Request for UnsubscribeResourceRequest {
    const METHOD: &'static str = methods::UNSUBSCRIBE_RESOURCE;
    type Result = super::core::EmptyResult;
}

/// `notifications/resources/updated` params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUpdatedNotification {
    /// URI of the resource that changed.
    pub uri: String,
}

impl Notification for ResourceUpdatedNotification {
    const METHOD: &'static str = methods::RESOURCE_UPDATED;
}

/// `notifications/resources/list_changed` params (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceListChangedNotification {}

impl Notification for ResourceListChangedNotification {
    const METHOD: &'static str = methods::RESOURCE_LIST_CHANGED;
}
