use deskenum_client::encode_query;
use deskenum_core::DeskId;

pub const SERVICE_DESKS_PATH: &str = "/rest/servicedeskapi/servicedesk";

pub const TENANT_INFO_PATH: &str = "/_edge/tenant_info";

/// Persisted GraphQL query backing the help center article search.
pub const ARTICLE_SEARCH_QUERY_HASH: &str =
    "2b7701d308127724d13b7beb2b1c606c10713f908a96b13c96db5350d5ecc6ef";

pub fn user_search_path(desk: &DeskId, query: &str) -> String {
    let base = format!("/rest/servicedesk/1/customer/portal/{desk}/user-search/proforma");
    if query.is_empty() {
        base
    } else {
        format!("{base}?query={}", encode_query(query))
    }
}

pub fn article_search_path() -> String {
    format!("/gateway/api/graphql/pq/{ARTICLE_SEARCH_QUERY_HASH}")
}
