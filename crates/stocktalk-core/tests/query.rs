use stocktalk_core::error::HarvestError;
use stocktalk_core::query::build_search_spec;
use stocktalk_core::types::{HarvestRequest, SortMethod, TimeRange};

fn request(ticker: &str, limit: u32) -> HarvestRequest {
    HarvestRequest {
        ticker: Some(ticker.to_string()),
        limit: Some(limit),
        ..HarvestRequest::default()
    }
}

#[test]
fn spec_carries_self_post_qualifier_and_defaults() {
    let spec = build_search_spec(&request("GME", 25)).expect("build failed");

    assert_eq!(spec.ticker, "GME");
    assert_eq!(spec.query, "GME self:yes");
    assert_eq!(spec.sort_method, SortMethod::New);
    assert_eq!(spec.time_range, TimeRange::All);
    assert_eq!(spec.limit, 25);
}

#[test]
fn explicit_sort_and_time_range_override_defaults() {
    let mut req = request("TSLA", 10);
    req.sort_method = Some(SortMethod::Top);
    req.time_range = Some(TimeRange::Week);

    let spec = build_search_spec(&req).expect("build failed");

    assert_eq!(spec.sort_method, SortMethod::Top);
    assert_eq!(spec.time_range, TimeRange::Week);
}

#[test]
fn missing_ticker_is_a_configuration_error() {
    let req = HarvestRequest {
        limit: Some(10),
        ..HarvestRequest::default()
    };

    let err = build_search_spec(&req).unwrap_err();
    assert!(matches!(err, HarvestError::Configuration("ticker")));
}

#[test]
fn empty_ticker_is_a_configuration_error() {
    let req = HarvestRequest {
        ticker: Some(String::new()),
        limit: Some(10),
        ..HarvestRequest::default()
    };

    let err = build_search_spec(&req).unwrap_err();
    assert!(matches!(err, HarvestError::Configuration("ticker")));
}

#[test]
fn missing_limit_is_a_configuration_error() {
    let req = HarvestRequest {
        ticker: Some("GME".to_string()),
        ..HarvestRequest::default()
    };

    let err = build_search_spec(&req).unwrap_err();
    assert!(matches!(err, HarvestError::Configuration("limit")));
}

#[test]
fn zero_limit_is_accepted() {
    let spec = build_search_spec(&request("GME", 0)).expect("build failed");
    assert_eq!(spec.limit, 0);
}
