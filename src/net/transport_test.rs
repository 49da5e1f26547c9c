use super::*;

// =============================================================================
// resolve_url
// =============================================================================

#[test]
fn resolve_url_joins_absolute_path() {
    assert_eq!(resolve_url("http://h:8000", "/api/v1/auth/me"), "http://h:8000/api/v1/auth/me");
}

#[test]
fn resolve_url_inserts_missing_slash() {
    assert_eq!(resolve_url("http://h:8000", "api/posts"), "http://h:8000/api/posts");
}

#[test]
fn resolve_url_keeps_full_urls() {
    assert_eq!(resolve_url("http://h:8000", "https://cdn.example/x"), "https://cdn.example/x");
}

#[test]
fn transport_trims_trailing_slash() {
    let transport = ReqwestTransport::new("http://h:8000/", Timeouts::default()).unwrap();
    assert_eq!(transport.base_url(), "http://h:8000");
}

// =============================================================================
// RequestOptions
// =============================================================================

#[test]
fn get_is_default_method() {
    let opts = RequestOptions::get();
    assert_eq!(opts.method, Method::GET);
    assert!(opts.body.is_none());
    assert!(opts.headers.is_empty());
}

#[test]
fn post_form_keeps_pair_order() {
    let opts = RequestOptions::post_form([("username", "alice"), ("password", "pw")]);
    assert_eq!(opts.method, Method::POST);
    assert_eq!(
        opts.body,
        Some(RequestBody::Form(vec![
            ("username".into(), "alice".into()),
            ("password".into(), "pw".into()),
        ]))
    );
}

#[test]
fn header_appends() {
    let opts = RequestOptions::method(Method::DELETE)
        .header("X-Trace", "1")
        .header("Accept", "text/plain");
    assert_eq!(opts.method, Method::DELETE);
    assert_eq!(opts.headers.len(), 2);
}

// =============================================================================
// ApiResponse
// =============================================================================

#[test]
fn success_range_is_2xx() {
    assert!(ApiResponse::new(200, "").is_success());
    assert!(ApiResponse::new(204, "").is_success());
    assert!(!ApiResponse::new(199, "").is_success());
    assert!(!ApiResponse::new(302, "").is_success());
    assert!(!ApiResponse::new(404, "").is_success());
}

#[test]
fn error_for_status_carries_detail() {
    let err = ApiResponse::new(400, r#"{"detail":"bad credentials"}"#)
        .error_for_status()
        .unwrap_err();
    assert_eq!(err, ApiError::Http { status: 400, detail: Some("bad credentials".into()) });
}

#[test]
fn error_for_status_passes_success_through() {
    let resp = ApiResponse::new(201, "{}").error_for_status().unwrap();
    assert_eq!(resp.status(), 201);
}

#[test]
fn json_mismatch_is_malformed() {
    #[derive(serde::Deserialize)]
    struct Needs {
        #[allow(dead_code)]
        field: u32,
    }
    let err = ApiResponse::new(200, "not json").json::<Needs>().err().unwrap();
    assert!(matches!(err, ApiError::MalformedResponse(_)));
}
