use serde::{Deserialize, Serialize};
use validator::Validate;

pub fn default_page() -> i64 {
    1
}

pub fn default_page_size() -> i64 {
    10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Pagination {
    #[validate(range(min = 1, max = 1000000, message = "page must be between 1 and 1000000"))]
    pub page: i64,
    #[validate(range(min = 5, max = 15, message = "page_size must be between 5 and 15"))]
    pub page_size: i64,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.page_size)
    }
}

/// Query string carrying nothing but paging.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self {
            items,
            page: pagination.page,
            page_size: pagination.page_size,
            total: None,
        }
    }

    pub fn with_total(mut self, total: i64) -> Self {
        self.total = Some(total);
        self
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "old_password is required"))]
    pub old_password: String,
    #[validate(length(min = 6, message = "new_password must be at least 6 characters"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_are_enforced() {
        assert!(Pagination::new(1, 5).validate().is_ok());
        assert!(Pagination::new(3, 15).validate().is_ok());
        assert!(Pagination::new(0, 10).validate().is_err());
        assert!(Pagination::new(1, 4).validate().is_err());
        assert!(Pagination::new(1, 16).validate().is_err());
        assert!(Pagination::new(1_000_000, 15).validate().is_ok());
        assert!(Pagination::new(1_000_001, 15).validate().is_err());
        assert!(Pagination::new(i64::MAX, 15).validate().is_err());
    }

    #[test]
    fn offset_follows_page() {
        let p = Pagination::new(3, 10);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 20);
        assert_eq!(Pagination::new(i64::MAX, 15).offset(), i64::MAX);
    }

    #[test]
    fn total_is_omitted_unless_known() {
        let list = ListResponse::new(vec![1, 2], Pagination::new(1, 5));
        let json = serde_json::to_value(&list).unwrap();
        assert!(json.get("total").is_none());

        let json = serde_json::to_value(list.with_total(12)).unwrap();
        assert_eq!(json["total"], 12);
    }
}
