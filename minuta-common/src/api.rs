//! Shared API request/response types
//!
//! Envelope types used by every list endpoint plus simple status payloads.

use serde::{Deserialize, Serialize};

/// Pagination envelope returned by all list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// Page of records
    pub items: Vec<T>,
    /// Total matching records (before pagination)
    pub total: i64,
    /// 1-based page number
    pub page: i64,
    /// Page size requested
    pub size: i64,
    /// Total page count
    pub pages: i64,
}

impl<T> PaginatedResponse<T> {
    /// Build an envelope from a page of items and the skip/limit that produced it
    pub fn new(items: Vec<T>, total: i64, skip: i64, limit: i64) -> Self {
        let size = limit.max(1);
        Self {
            items,
            total,
            page: skip / size + 1,
            size,
            pages: (total + size - 1) / size,
        }
    }
}

/// Simple human-readable status message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
