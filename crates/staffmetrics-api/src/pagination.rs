use staffmetrics_store::PageRequest;

use crate::error::ApiError;
use crate::settings::ApiSettings;

/// Resolve `page` / `page_size` query values against the configured
/// defaults. Zero is rejected; oversized pages are capped.
pub fn page_request(
    page: Option<u32>,
    page_size: Option<u32>,
    settings: &ApiSettings,
) -> Result<PageRequest, ApiError> {
    let page = page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::BadRequest("page must be at least 1".to_string()));
    }
    let page_size = page_size.unwrap_or(settings.page_size);
    if page_size == 0 {
        return Err(ApiError::BadRequest(
            "page_size must be at least 1".to_string(),
        ));
    }
    Ok(PageRequest::new(page, page_size.min(settings.max_page_size)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_cap() {
        let settings = ApiSettings::default();
        assert_eq!(
            page_request(None, None, &settings).expect("page"),
            PageRequest::new(1, 50)
        );
        assert_eq!(
            page_request(Some(3), Some(5_000), &settings).expect("page"),
            PageRequest::new(3, 1000)
        );
        assert!(page_request(Some(0), None, &settings).is_err());
        assert!(page_request(None, Some(0), &settings).is_err());
    }
}
