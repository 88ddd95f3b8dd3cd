//! Shareable deep links that open the dashboard on one customer.

use reqwest::Url;

use crate::SyncError;

/// Query parameter carrying the selected customer.
pub const CUSTOMER_PARAM: &str = "customer";

/// Build a link to `base` that selects `customer`.
///
/// Other query parameters on `base` are kept; an existing customer
/// parameter is replaced.
pub fn share_link(base: &str, customer: &str) -> Result<Url, SyncError> {
    let mut url = Url::parse(base).map_err(|e| SyncError::InvalidUrl(format!("{base}: {e}")))?;
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != CUSTOMER_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(others)
        .append_pair(CUSTOMER_PARAM, customer);
    Ok(url)
}

/// Customer named by a deep link, if any. Blank values count as absent.
pub fn customer_from_link(link: &str) -> Result<Option<String>, SyncError> {
    let url = Url::parse(link).map_err(|e| SyncError::InvalidUrl(format!("{link}: {e}")))?;
    Ok(url
        .query_pairs()
        .find(|(k, _)| k == CUSTOMER_PARAM)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_encodes_customer() {
        let url = share_link("https://board.example.com/", "Acme & Sons").unwrap();
        assert_eq!(
            url.as_str(),
            "https://board.example.com/?customer=Acme+%26+Sons"
        );
        assert_eq!(
            customer_from_link(url.as_str()).unwrap().as_deref(),
            Some("Acme & Sons")
        );
    }

    #[test]
    fn link_replaces_existing_customer() {
        let url = share_link("https://board.example.com/?view=cards&customer=Old", "New").unwrap();
        assert_eq!(
            url.as_str(),
            "https://board.example.com/?view=cards&customer=New"
        );
    }

    #[test]
    fn link_without_customer() {
        assert_eq!(customer_from_link("https://board.example.com/").unwrap(), None);
        assert_eq!(
            customer_from_link("https://board.example.com/?customer=%20").unwrap(),
            None
        );
    }

    #[test]
    fn invalid_base() {
        assert!(matches!(
            share_link("not a url", "Acme"),
            Err(SyncError::InvalidUrl(_))
        ));
    }
}
