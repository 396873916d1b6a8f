//! This file defines the `Category` type and the types needed to create a category.
//! A category is a per-user label for grouping transactions, e.g. "Groceries" or "Salary".

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, database_id::CategoryId, user::UserID};

mod db;
mod endpoints;

pub use db::{
    create_category, create_category_table, delete_category, get_category, get_category_by_name,
    list_categories,
};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, list_categories_endpoint,
};

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// The maximum number of characters (grapheme clusters) in a category name.
    pub const MAX_LENGTH: usize = 100;

    /// Create a category name.
    ///
    /// Leading and trailing whitespace is removed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidCategoryName] if `name` is
    /// empty or longer than [CategoryName::MAX_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::InvalidCategoryName(
                "category name cannot be empty".to_owned(),
            ));
        }

        let length = name.graphemes(true).count();
        if length > Self::MAX_LENGTH {
            return Err(Error::InvalidCategoryName(format!(
                "category name must be at most {} characters, got {length}",
                Self::MAX_LENGTH
            )));
        }

        Ok(Self(name.to_owned()))
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category for grouping transactions, owned by a single user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The name of the category, unique per user.
    pub name: CategoryName,
    /// The user that owns the category.
    #[serde(skip_serializing)]
    pub user_id: UserID,
    /// When the category was created, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod category_name_tests {
    use crate::{Error, category::CategoryName};

    #[test]
    fn new_fails_on_empty_string() {
        let name = CategoryName::new("");

        assert!(matches!(name, Err(Error::InvalidCategoryName(_))));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        let name = CategoryName::new("\n\t \r");

        assert!(matches!(name, Err(Error::InvalidCategoryName(_))));
    }

    #[test]
    fn new_trims_whitespace() {
        let name = CategoryName::new("  Groceries ");

        assert_eq!(name, Ok(CategoryName::new_unchecked("Groceries")));
    }

    #[test]
    fn new_accepts_max_length() {
        let name = "🔥".repeat(CategoryName::MAX_LENGTH);

        assert!(CategoryName::new(&name).is_ok());
    }

    #[test]
    fn new_fails_when_too_long() {
        let name = "a".repeat(CategoryName::MAX_LENGTH + 1);

        assert!(matches!(
            CategoryName::new(&name),
            Err(Error::InvalidCategoryName(_))
        ));
    }
}
