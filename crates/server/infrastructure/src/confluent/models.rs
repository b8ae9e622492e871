//! Request and response bodies of the Confluent Cloud REST APIs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct CreateServiceAccountRequest<'a> {
    pub display_name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ServiceAccountResponse {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub next: Option<String>,
}

/// Paged IAM v2 listing.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub metadata: PageMetadata,
}

#[derive(Debug, Serialize)]
pub struct CreateAclRequest<'a> {
    pub resource_type: &'a str,
    pub resource_name: &'a str,
    pub pattern_type: &'a str,
    pub principal: &'a str,
    pub host: &'a str,
    pub operation: &'a str,
    pub permission: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ObjectReference<'a> {
    pub id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ApiKeySpec<'a> {
    pub display_name: &'a str,
    pub description: &'a str,
    pub owner: ObjectReference<'a>,
    pub resource: ObjectReference<'a>,
}

#[derive(Debug, Serialize)]
pub struct CreateApiKeyRequest<'a> {
    pub spec: ApiKeySpec<'a>,
}

#[derive(Debug, Deserialize)]
pub struct ApiKeySecret {
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiKeyResponse {
    pub id: String,
    pub spec: ApiKeySecret,
}

/// Listed key; the secret is only returned on creation.
#[derive(Debug, Deserialize)]
pub struct ApiKeySummary {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRoleBindingRequest<'a> {
    pub principal: &'a str,
    pub role_name: &'a str,
    pub crn_pattern: &'a str,
}

#[derive(Debug, Serialize)]
pub struct TopicConfig<'a> {
    pub name: &'a str,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTopicRequest<'a> {
    pub topic_name: &'a str,
    pub partitions_count: i32,
    pub configs: Vec<TopicConfig<'a>>,
}

#[derive(Debug, Serialize)]
pub struct RegisterSchemaRequest<'a> {
    #[serde(rename = "schemaType")]
    pub schema_type: &'a str,
    pub schema: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct InternalUserResponse {
    pub id: i64,
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub deactivated: bool,
}

#[derive(Debug, Deserialize)]
pub struct InternalUsersResponse {
    #[serde(default)]
    pub users: Vec<InternalUserResponse>,
}
