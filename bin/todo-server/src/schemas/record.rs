use serde::Deserialize;
use utoipa::IntoParams;

use crate::entities::Page;

/// Paging for the list route.
///
/// Kept as raw strings: absent, non-numeric and negative values all mean 0,
/// i.e. no skip and no limit.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Maximum number of records to return; 0 for all.
    pub limit: Option<String>,
    /// Number of records to skip.
    pub skip: Option<String>,
}

fn lenient_count(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

impl ListQuery {
    pub fn page(&self) -> Page {
        Page {
            skip: lenient_count(self.skip.as_deref()),
            limit: lenient_count(self.limit.as_deref()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn query(limit: Option<&str>, skip: Option<&str>) -> ListQuery {
        ListQuery {
            limit: limit.map(str::to_owned),
            skip: skip.map(str::to_owned),
        }
    }

    #[test]
    fn absent_values_mean_no_paging() {
        assert_eq!(ListQuery::default().page(), Page { skip: 0, limit: 0 });
    }

    #[test]
    fn numeric_values_are_used() {
        assert_eq!(query(Some("10"), Some("20")).page(), Page { skip: 20, limit: 10 });
    }

    #[test]
    fn junk_and_negative_values_fall_back_to_zero() {
        assert_eq!(query(Some("ten"), Some("-3")).page(), Page { skip: 0, limit: 0 });
    }
}
