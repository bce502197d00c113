//! Normalizer for Mustang's XML validation report.
//!
//! The report root (`<validation filename=… datetime=…>`) carries the
//! source metadata; a `<summary status=…>` element carries the verdict and
//! a `<messages>` element carries the findings. Depending on the tool
//! version and the input kind, `summary` and `messages` appear either
//! directly under the root or nested one level under an intermediate
//! wrapper (`<xml>`, `<pdf>`). Both locations are searched; the nested one
//! wins when both exist. That precedence is a policy choice, not a
//! documented Mustang invariant — it has held for every report revision
//! observed so far.

use crate::error::GatewayError;
use crate::report::{Finding, NormalizedReport};
use roxmltree::{Document, Node};

/// Closing tag of the report root, used by the extractor to find the end
/// of the payload inside noisy stdout.
pub const VALIDATION_CLOSING_TAG: &str = "</validation>";

/// Parse a Mustang validation report into the normalized shape.
///
/// Fails with [`GatewayError::ReportMalformed`] when `xml` is not
/// well-formed. An absent or unrecognised `status` does not fail — the tool
/// spoke, it just did not say "valid" — so the report comes back with
/// `status: "unknown"` and `valid: false`.
pub fn parse_validation_report(xml: &str) -> Result<NormalizedReport, GatewayError> {
    let doc = Document::parse(xml).map_err(|e| GatewayError::ReportMalformed {
        tool: "mustang".into(),
        detail: e.to_string(),
    })?;
    let root = doc.root_element();

    let source_filename = root.attribute("filename").map(str::to_string);
    let produced_at = root.attribute("datetime").map(str::to_string);

    let status = find_section(root, "summary")
        .and_then(|s| s.attribute("status"))
        .unwrap_or("unknown")
        .to_string();

    let findings = find_section(root, "messages")
        .map(|messages| {
            messages
                .children()
                .filter(Node::is_element)
                .map(|entry| Finding {
                    kind: entry.tag_name().name().to_string(),
                    attributes: entry
                        .attributes()
                        .map(|a| (a.name().to_string(), a.value().to_string()))
                        .collect(),
                    message: entry.text().unwrap_or("").trim().to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    // Only the literal "valid" (any case) counts; everything else,
    // including absence, is non-valid.
    let valid = status.eq_ignore_ascii_case("valid");

    Ok(NormalizedReport {
        valid,
        source_filename,
        produced_at,
        status,
        findings,
    })
}

/// Find `tag` nested one level under an intermediate wrapper element, then
/// fall back to a direct child of `root`. Nested wins when both exist.
fn find_section<'a>(root: Node<'a, 'a>, tag: &str) -> Option<Node<'a, 'a>> {
    root.children()
        .filter(Node::is_element)
        .flat_map(|wrapper| wrapper.children())
        .filter(Node::is_element)
        .find(|n| n.has_tag_name(tag))
        .or_else(|| {
            root.children()
                .filter(Node::is_element)
                .find(|n| n.has_tag_name(tag))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_report_with_no_findings() {
        let xml = r#"<?xml version="1.0"?>
            <validation filename="invoice.xml" datetime="2024-01-15T10:00:00">
              <summary status="valid"/>
            </validation>"#;
        let report = parse_validation_report(xml).unwrap();
        assert!(report.valid);
        assert_eq!(report.status, "valid");
        assert_eq!(report.source_filename.as_deref(), Some("invoice.xml"));
        assert_eq!(report.produced_at.as_deref(), Some("2024-01-15T10:00:00"));
        assert!(report.findings.is_empty());
    }

    #[test]
    fn invalid_report_collects_findings() {
        let xml = r#"<?xml version="1.0"?>
            <validation filename="f" datetime="d">
              <messages>
                <error type="18" location="/invoice">XML schema mismatch</error>
                <warning type="4">deprecated element</warning>
              </messages>
              <summary status="invalid"/>
            </validation>"#;
        let report = parse_validation_report(xml).unwrap();
        assert!(!report.valid);
        assert_eq!(report.status, "invalid");
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.findings[0].kind, "error");
        assert_eq!(report.findings[0].attributes["type"], "18");
        assert_eq!(report.findings[0].message, "XML schema mismatch");
        assert_eq!(report.findings[1].kind, "warning");
    }

    #[test]
    fn nested_summary_wins_over_top_level() {
        let xml = r#"<?xml version="1.0"?>
            <validation>
              <summary status="invalid"/>
              <xml>
                <summary status="valid"/>
              </xml>
            </validation>"#;
        let report = parse_validation_report(xml).unwrap();
        assert!(report.valid, "nested summary must take precedence");
    }

    #[test]
    fn top_level_summary_is_the_fallback() {
        let xml = r#"<?xml version="1.0"?>
            <validation>
              <summary status="valid"/>
            </validation>"#;
        assert!(parse_validation_report(xml).unwrap().valid);
    }

    #[test]
    fn status_comparison_is_case_insensitive() {
        let xml = r#"<?xml version="1.0"?><validation><summary status="VALID"/></validation>"#;
        let report = parse_validation_report(xml).unwrap();
        assert!(report.valid);
        assert_eq!(report.status, "VALID");
    }

    #[test]
    fn absent_summary_means_unknown_and_invalid() {
        let xml = r#"<?xml version="1.0"?><validation filename="f"/>"#;
        let report = parse_validation_report(xml).unwrap();
        assert!(!report.valid);
        assert_eq!(report.status, "unknown");
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = parse_validation_report("<validation><summary").unwrap_err();
        assert_eq!(err.tag(), "report_malformed");
        assert_eq!(err.http_status(), 500);
    }
}
