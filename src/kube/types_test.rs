use super::*;

#[test]
fn ordinal_reads_numeric_suffix() {
    assert_eq!(LocationId::from("kube1").ordinal(), Some(1));
    assert_eq!(LocationId::from("kube40").ordinal(), Some(40));
}

#[test]
fn ordinal_rejects_non_numeric_or_zero() {
    assert_eq!(LocationId::from("kubeA").ordinal(), None);
    assert_eq!(LocationId::from("kube").ordinal(), None);
    assert_eq!(LocationId::from("kube0").ordinal(), None);
    assert_eq!(LocationId::from("kube-3").ordinal(), None);
    assert_eq!(LocationId::from("Kube3").ordinal(), None);
}

#[test]
fn ids_sort_numerically_not_lexicographically() {
    let mut ids: Vec<LocationId> = ["kube10", "kube2", "kube1"].into_iter().map(LocationId::from).collect();
    ids.sort();
    assert_eq!(ids, vec![LocationId::from("kube1"), LocationId::from("kube2"), LocationId::from("kube10")]);
}

#[test]
fn non_numeric_ids_sort_last() {
    let mut ids: Vec<LocationId> = ["kubeZ", "kube3", "kubeA"].into_iter().map(LocationId::from).collect();
    ids.sort();
    assert_eq!(ids, vec![LocationId::from("kube3"), LocationId::from("kubeA"), LocationId::from("kubeZ")]);
}

#[test]
fn leading_zero_ids_stay_distinct() {
    let a = LocationId::from("kube01");
    let b = LocationId::from("kube1");
    assert_ne!(a, b);
    assert_ne!(a.cmp(&b), Ordering::Equal);
}

#[test]
fn location_id_serializes_as_plain_string() {
    let json = serde_json::to_string(&LocationId::from("kube7")).unwrap();
    assert_eq!(json, "\"kube7\"");
}

#[test]
fn cache_state_defaults_to_unknown() {
    assert_eq!(CacheState::default(), CacheState::Unknown);
    assert!(!CacheState::Unknown.is_resolved());
    assert!(CacheState::Valid.is_resolved());
    assert!(CacheState::InvalidEmpty.is_resolved());
    assert!(CacheState::InvalidNotFound.is_resolved());
}

#[test]
fn cache_state_tags_match_wire_names() {
    assert_eq!(CacheState::InvalidNotFound.to_string(), "invalidNotFound");
    assert_eq!(serde_json::to_string(&CacheState::InvalidEmpty).unwrap(), "\"invalidEmpty\"");
}

#[test]
fn fetch_error_codes_and_retry() {
    assert_eq!(FetchError::NotFound.error_code(), "E_NOT_FOUND");
    assert!(!FetchError::NotFound.retryable());
    assert!(FetchError::Transport("boom".into()).retryable());
}

#[test]
fn malformed_is_not_retryable() {
    let err = LocationError::Malformed("bad".into());
    assert_eq!(err.error_code(), "E_MALFORMED");
    assert!(!err.retryable());
    assert!(LocationError::Transport("x".into()).retryable());
}
