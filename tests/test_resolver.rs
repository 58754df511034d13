//! Path resolution against a real directory tree.

use std::path::PathBuf;

use rootserve::files::resolver::{normalize_target, resolve, ResolveError};
use rootserve::files::root::DocumentRoot;
use rootserve::fs::{FileKind, TokioFs};
use tempfile::TempDir;

fn site() -> (TempDir, DocumentRoot) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), b"<p>hello</p>").unwrap();
    std::fs::create_dir_all(dir.path().join("docs/guide")).unwrap();
    std::fs::write(dir.path().join("docs/guide/intro.txt"), b"intro").unwrap();
    std::fs::write(dir.path().join("with space.txt"), b"spaced").unwrap();
    let root = DocumentRoot::new(dir.path()).unwrap();
    (dir, root)
}

#[tokio::test]
async fn test_resolve_existing_file() {
    let (_dir, root) = site();

    let resolved = resolve("/index.html", &root, &TokioFs).await.unwrap();

    assert_eq!(resolved.path, root.path().join("index.html"));
    assert_eq!(resolved.kind(), Some(FileKind::File));
    assert_eq!(resolved.stat.unwrap().size, 12);
}

#[tokio::test]
async fn test_resolve_matches_root_join_normalized() {
    let (_dir, root) = site();

    for target in [
        "/docs/guide/intro.txt",
        "/docs/./guide/intro.txt",
        "/docs/x/../guide/intro.txt",
        "//docs//guide/intro.txt",
        "/docs/guide/intro.txt?v=2",
        "/%64ocs/guide/intro.txt",
    ] {
        let resolved = resolve(target, &root, &TokioFs).await.unwrap();
        let expected = root.path().join(normalize_target(target).unwrap());
        assert_eq!(resolved.path, expected, "{target}");
        assert_eq!(resolved.path, root.path().join("docs/guide/intro.txt"));
    }
}

#[tokio::test]
async fn test_resolve_percent_encoded_space() {
    let (_dir, root) = site();

    let resolved = resolve("/with%20space.txt", &root, &TokioFs).await.unwrap();
    assert_eq!(resolved.kind(), Some(FileKind::File));
}

#[tokio::test]
async fn test_resolve_root_and_directories() {
    let (_dir, root) = site();

    let resolved = resolve("/", &root, &TokioFs).await.unwrap();
    assert_eq!(resolved.path, root.path());
    assert_eq!(resolved.kind(), Some(FileKind::Directory));

    let resolved = resolve("/docs/", &root, &TokioFs).await.unwrap();
    assert_eq!(resolved.kind(), Some(FileKind::Directory));
}

#[tokio::test]
async fn test_resolve_missing_file() {
    let (_dir, root) = site();

    let resolved = resolve("/missing.txt", &root, &TokioFs).await.unwrap();
    assert_eq!(resolved.path, root.path().join("missing.txt"));
    assert_eq!(resolved.kind(), None);

    // A file used as a directory is also just missing
    let resolved = resolve("/index.html/extra", &root, &TokioFs).await.unwrap();
    assert_eq!(resolved.kind(), None);
}

#[tokio::test]
async fn test_resolve_traversal_variants() {
    let (_dir, root) = site();

    let attacks = [
        "/../etc/passwd",
        "/..",
        "/docs/../../etc/passwd",
        "/%2e%2e/%2e%2e/secret",
        "/%2E%2E%2Fetc%2Fpasswd",
        "/docs/..%2f..%2fetc/passwd",
        "/..\\..\\etc\\passwd",
        "/docs\\..\\..\\secret",
        "/a/b/c/../../../../../../../../../../etc/passwd",
        "/./../etc",
    ];

    for target in attacks {
        let result = resolve(target, &root, &TokioFs).await;
        assert!(
            matches!(result, Err(ResolveError::Traversal)),
            "{target} resolved to {result:?}"
        );
    }
}

#[tokio::test]
async fn test_resolve_double_encoding_is_decoded_once() {
    let (_dir, root) = site();

    // %252e decodes to the literal "%2e", an ordinary (missing) name
    let resolved = resolve("/%252e%252e/secret", &root, &TokioFs).await.unwrap();
    assert_eq!(resolved.kind(), None);
    assert!(root.contains(&resolved.path));
}

#[tokio::test]
async fn test_resolve_rejects_bad_encoding() {
    let (_dir, root) = site();

    assert!(matches!(
        resolve("/bad%zzescape", &root, &TokioFs).await,
        Err(ResolveError::InvalidEncoding)
    ));
    assert!(matches!(
        resolve("/index.html%00.txt", &root, &TokioFs).await,
        Err(ResolveError::NulByte)
    ));
    assert!(matches!(
        resolve("/%c0%ae%c0%ae/secret", &root, &TokioFs).await,
        Err(ResolveError::InvalidUtf8)
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn test_resolve_symlink_escape_is_traversal() {
    let (dir, root) = site();
    let outside = tempfile::tempdir().unwrap();
    std::fs::write(outside.path().join("secret.txt"), b"top secret").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("leak")).unwrap();

    let result = resolve("/leak/secret.txt", &root, &TokioFs).await;
    assert!(matches!(result, Err(ResolveError::Traversal)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_resolve_symlink_inside_root_is_followed() {
    let (dir, root) = site();
    std::os::unix::fs::symlink(dir.path().join("docs"), dir.path().join("alias")).unwrap();

    let resolved = resolve("/alias/guide/intro.txt", &root, &TokioFs).await.unwrap();
    assert_eq!(resolved.path, root.path().join("docs/guide/intro.txt"));
}

#[test]
fn test_normalize_is_lexical() {
    assert_eq!(
        normalize_target("/a/b/../c/./d").unwrap(),
        PathBuf::from("a/c/d")
    );
    assert_eq!(normalize_target("/a/b/..").unwrap(), PathBuf::from("a"));
}
