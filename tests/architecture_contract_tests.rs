//! Architecture contract tests.

mod support;

use support::architecture::{find_lines_containing, path_exists, scan_source};

#[test]
fn domain_has_no_framework_or_outer_layer_imports() {
    let hits = find_lines_containing(
        "src/domain",
        &[
            "crate::adapter",
            "crate::infrastructure",
            "crate::application",
            "crate::port",
            "tokio::",
            "reqwest::",
            "tokio_tungstenite::",
        ],
    );

    assert!(
        hits.is_empty(),
        "found forbidden imports in domain layer: {hits:#?}"
    );
}

#[test]
fn ports_depend_only_on_domain() {
    let hits = find_lines_containing(
        "src/port",
        &["crate::adapter", "crate::infrastructure", "crate::application"],
    );

    assert!(hits.is_empty(), "found outer-layer imports in ports: {hits:#?}");
}

#[test]
fn application_has_no_adapter_or_infrastructure_imports() {
    let hits = find_lines_containing(
        "src/application",
        &[
            "crate::adapter",
            "crate::infrastructure",
            "reqwest::",
            "tokio_tungstenite::",
        ],
    );

    assert!(
        hits.is_empty(),
        "found adapter or infrastructure imports in application layer: {hits:#?}"
    );
}

#[test]
fn wire_formats_stay_in_adapters() {
    let hits = find_lines_containing("src/infrastructure/feed", &["flate2", "serde_json::from"]);
    assert!(hits.is_empty(), "feed infrastructure parses wire data: {hits:#?}");
}

#[test]
fn layer_roots_exist() {
    for path in [
        "src/domain/mod.rs",
        "src/port/mod.rs",
        "src/application/mod.rs",
        "src/adapter/mod.rs",
        "src/infrastructure/mod.rs",
    ] {
        assert!(path_exists(path), "missing layer root {path}");
    }
}

#[test]
fn scanner_skips_comments_and_test_modules() {
    let source = "\
//! Behavior lives in [`crate::application`].
/// See crate::infrastructure for wiring.
use crate::application::spread;
    // crate::application in an inline comment
#[cfg(test)]
mod tests {
    use crate::application::store;
}
";
    let hits = scan_source(source, &["crate::application", "crate::infrastructure"]);
    assert_eq!(hits, vec![(3, "use crate::application::spread;".to_string())]);
}
