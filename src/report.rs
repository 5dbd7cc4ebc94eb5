//! Per-category outcome collection.
//!
//! Runs an operation once per category and keeps each category's result
//! separately, so one missing or malformed category never stops the others.

use crate::error::{HealthError, Result};
use crate::models::Category;
use tracing::{debug, warn};

/// Result of running an operation for one category
#[derive(Debug)]
pub struct CategoryOutcome<T> {
    pub category: Category,
    pub result: Result<T>,
}

impl<T> CategoryOutcome<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of all categories, in the order they were run
#[derive(Debug)]
pub struct CollectionReport<T> {
    outcomes: Vec<CategoryOutcome<T>>,
}

impl<T> CollectionReport<T> {
    /// Run `op` for each category and record every result
    ///
    /// Fatal errors (missing or unreadable source) stop the collection and
    /// are returned directly; everything else is recorded per category.
    pub fn collect<F>(categories: &[Category], mut op: F) -> Result<Self>
    where
        F: FnMut(Category) -> Result<T>,
    {
        let mut outcomes = Vec::with_capacity(categories.len());

        for &category in categories {
            let result = match op(category) {
                Ok(value) => {
                    debug!("Completed {} data", category);
                    Ok(value)
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Missing {} data: {}", category, e);
                    Err(e)
                }
            };
            outcomes.push(CategoryOutcome { category, result });
        }

        Ok(Self { outcomes })
    }

    pub fn outcomes(&self) -> &[CategoryOutcome<T>] {
        &self.outcomes
    }

    /// Categories that succeeded with their values
    pub fn succeeded(&self) -> impl Iterator<Item = (Category, &T)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok().map(|value| (outcome.category, value)))
    }

    /// Categories that failed with their errors
    pub fn failed(&self) -> impl Iterator<Item = (Category, &HealthError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|error| (outcome.category, error)))
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(CategoryOutcome::is_success)
    }

    /// Result for one category, if it was run
    pub fn get(&self, category: Category) -> Option<&Result<T>> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.category == category)
            .map(|outcome| &outcome.result)
    }
}
