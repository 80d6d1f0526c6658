//! Listing filter backed by the entitlement checker.

use std::collections::HashMap;

use crate::domain::foundation::{CompanyId, Timestamp};
use crate::ports::EntitlementChecker;

/// Keep only the items whose company is visible at `now`.
///
/// Each distinct company is evaluated once. Evaluation errors hide the
/// company's items.
pub async fn retain_visible<T, F>(
    checker: &dyn EntitlementChecker,
    items: Vec<T>,
    company_of: F,
    now: Timestamp,
) -> Vec<T>
where
    F: Fn(&T) -> CompanyId,
{
    let mut decisions: HashMap<CompanyId, bool> = HashMap::new();
    for item in &items {
        let company_id = company_of(item);
        if !decisions.contains_key(&company_id) {
            let visible = checker.is_visible(&company_id, now).await;
            decisions.insert(company_id, visible);
        }
    }

    items
        .into_iter()
        .filter(|item| decisions.get(&company_of(item)).copied().unwrap_or(false))
        .collect()
}
