use rootserve::http::headers::Headers;
use rootserve::http::request::{Method, Request, RequestBuilder, Version};

fn request_with_headers(headers: Headers) -> Request {
    Request {
        method: Method::GET,
        target: "/".to_string(),
        version: Version::HTTP_11,
        headers,
        body: None,
    }
}

#[test]
fn test_request_header_retrieval() {
    let headers: Headers = [("Host", "example.com"), ("Content-Type", "application/json")]
        .into_iter()
        .collect();
    let req = request_with_headers(headers);

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_duplicate_headers_first_wins() {
    let headers: Headers = [("Accept", "text/html"), ("Accept", "text/plain")]
        .into_iter()
        .collect();
    let req = request_with_headers(headers);

    assert_eq!(req.header("accept"), Some("text/html"));
    assert_eq!(req.headers.get_all("Accept").count(), 2);
}

#[test]
fn test_request_content_length_without_body() {
    let req = request_with_headers(Headers::new());
    assert_eq!(req.content_length(), 0);
    assert!(req.body.is_none());
}

#[test]
fn test_request_with_body() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .target("/api")
        .body(b"test body content".to_vec())
        .build()
        .unwrap();

    assert_eq!(req.body.as_deref(), Some(&b"test body content"[..]));
    assert_eq!(req.content_length(), 17);
}

#[test]
fn test_request_path_strips_query_and_fragment() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .target("/docs/a.html?lang=en#top")
        .build()
        .unwrap();

    assert_eq!(req.path(), "/docs/a.html");
    assert_eq!(req.target, "/docs/a.html?lang=en#top");
}

#[test]
fn test_request_builder_requires_method_and_target() {
    assert!(RequestBuilder::new().target("/").build().is_err());
    assert!(RequestBuilder::new().method(Method::GET).build().is_err());
}

#[test]
fn test_request_builder_defaults_to_http11() {
    let req = RequestBuilder::new()
        .method(Method::HEAD)
        .target("/")
        .build()
        .unwrap();

    assert_eq!(req.version, Version::HTTP_11);
}

#[test]
fn test_request_method_equality() {
    assert_eq!(Method::GET, Method::GET);
    assert_ne!(Method::GET, Method::POST);
}

#[test]
fn test_request_method_from_string() {
    assert_eq!(Method::parse("GET"), Some(Method::GET));
    assert_eq!(Method::parse("HEAD"), Some(Method::HEAD));
    assert_eq!(Method::parse("POST"), Some(Method::POST));
    // Case-sensitive: lowercase is a different, unknown method
    assert_eq!(Method::parse("get"), Some(Method::Other("get".to_string())));
    assert_eq!(Method::parse(""), None);
    assert_eq!(Method::parse("GET /"), None);
}

#[test]
fn test_method_display_round_trips_token() {
    assert_eq!(Method::DELETE.to_string(), "DELETE");
    assert_eq!(Method::Other("BREW".into()).to_string(), "BREW");
}

#[test]
fn test_version_parsing() {
    assert_eq!(Version::parse("HTTP/1.1"), Some(Version::HTTP_11));
    assert_eq!(Version::parse("HTTP/1.0"), Some(Version::HTTP_10));
    assert_eq!(Version::parse("HTTP/2.0"), Some(Version { major: 2, minor: 0 }));
    assert_eq!(Version::parse("HTTP/1"), None);
    assert_eq!(Version::parse("http/1.1"), None);
    assert_eq!(Version::parse("HTTP/1.10"), None);
    assert_eq!(Version::HTTP_11.to_string(), "HTTP/1.1");
}
