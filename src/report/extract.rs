//! Payload extraction from noisy tool output.
//!
//! Tool stdout is genuinely unstructured: log4j lines, progress chatter and
//! the report payload share one stream. Extraction is deliberately a
//! two-pointer scan returning an `Option`, not a parser — the surrounding
//! text is outside this system's control and absence of a payload is a
//! normal, testable outcome, never an error.
//!
//! The XML and JSON paths are intentionally asymmetric. XML scans for a
//! declaration/closing-tag pair because Mustang interleaves log lines with
//! the report; JSON must parse as the *entire* trimmed text because that is
//! how veraPDF emits it. Unifying the two would encode assumptions about
//! tool output we cannot verify across tool versions.

/// Marker that starts every payload we extract.
const XML_DECLARATION: &str = "<?xml";

/// Extract the XML report embedded in `text`.
///
/// Finds the first XML declaration and the **last** occurrence of
/// `closing_tag` (the known closing tag of the report root, e.g.
/// `"</validation>"`). The closing tag must start strictly after the
/// declaration; otherwise there is no coherent payload and `None` is
/// returned. The result spans declaration start through closing-tag end,
/// inclusive.
pub fn extract_xml_payload<'a>(text: &'a str, closing_tag: &str) -> Option<&'a str> {
    let decl_start = text.find(XML_DECLARATION)?;
    let close_start = text.rfind(closing_tag)?;
    if close_start <= decl_start {
        return None;
    }
    Some(&text[decl_start..close_start + closing_tag.len()])
}

/// Parse the entire trimmed `text` as JSON.
///
/// No substring scanning: a stray log line anywhere in the stream makes
/// this fail (see module docs for the asymmetry with XML).
pub fn extract_json_payload(text: &str) -> Option<serde_json::Value> {
    serde_json::from_str(text.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOSE: &str = "</validation>";

    #[test]
    fn xml_payload_between_log_lines() {
        let text = "INFO starting up\n<?xml version=\"1.0\"?><validation><summary status=\"valid\"/></validation>\nINFO done";
        let payload = extract_xml_payload(text, CLOSE).unwrap();
        assert!(payload.starts_with("<?xml"));
        assert!(payload.ends_with(CLOSE));
        assert!(!payload.contains("INFO"));
    }

    #[test]
    fn xml_uses_last_closing_tag() {
        // Nested or repeated structures: the outermost close wins.
        let text = "<?xml?><validation>a</validation>garbage</validation>";
        let payload = extract_xml_payload(text, CLOSE).unwrap();
        assert!(payload.ends_with("garbage</validation>"));
    }

    #[test]
    fn xml_missing_declaration_is_none() {
        assert!(extract_xml_payload("<validation></validation>", CLOSE).is_none());
    }

    #[test]
    fn xml_missing_closing_tag_is_none() {
        assert!(extract_xml_payload("<?xml?><validation>", CLOSE).is_none());
    }

    #[test]
    fn xml_closing_tag_before_declaration_is_none() {
        let text = "</validation> some noise <?xml version=\"1.0\"?>";
        assert!(extract_xml_payload(text, CLOSE).is_none());
    }

    #[test]
    fn xml_empty_text_is_none() {
        assert!(extract_xml_payload("", CLOSE).is_none());
    }

    #[test]
    fn json_whole_text_parses() {
        let v = extract_json_payload("  {\"report\": {\"jobs\": []}}\n").unwrap();
        assert!(v.get("report").is_some());
    }

    #[test]
    fn json_with_leading_log_line_is_none() {
        // Strictness is the contract: no scan-for-substring fallback.
        assert!(extract_json_payload("INFO started\n{\"a\": 1}").is_none());
    }

    #[test]
    fn json_garbage_is_none() {
        assert!(extract_json_payload("not json at all").is_none());
        assert!(extract_json_payload("").is_none());
    }
}
