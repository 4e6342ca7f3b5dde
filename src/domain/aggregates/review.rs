//! Product reviews

use chrono::NaiveDate;

#[derive(Clone, Debug, PartialEq)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    /// Set once, when the review is posted.
    pub date: NaiveDate,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewReview {
    pub name: String,
    pub description: String,
}
