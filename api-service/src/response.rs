// ============================================================================
// Response Envelope
// ============================================================================
//
// Every successful response is wrapped in the same envelope:
// {"success": true, "data": ..., "meta"?: {...}}. The error half of
// the envelope lives in tally-error.
//
// ============================================================================

use serde::Serialize;

/// Pagination metadata for list endpoints
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub has_more: bool,
}

impl Meta {
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        let has_more = (page as u64).saturating_mul(page_size as u64) < total;
        Self {
            page,
            page_size,
            total,
            has_more,
        }
    }
}

/// Uniform success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }

    pub fn with_meta(data: T, meta: Meta) -> Self {
        Self {
            success: true,
            data,
            meta: Some(meta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::new(serde_json::json!({"id": 1}))).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 1);
        assert!(body.get("meta").is_none());
    }

    #[test]
    fn test_meta_has_more() {
        let meta = Meta::new(1, 20, 45);
        assert!(meta.has_more);
        let meta = Meta::new(3, 20, 45);
        assert!(!meta.has_more);

        let body = serde_json::to_value(ApiResponse::with_meta(Vec::<u8>::new(), meta)).unwrap();
        assert_eq!(body["meta"]["pageSize"], 20);
        assert_eq!(body["meta"]["hasMore"], false);
    }
}
