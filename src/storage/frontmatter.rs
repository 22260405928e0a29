//! YAML front matter reading and rewriting
//!
//! Front matter is a YAML mapping between `---` lines at the very start of
//! a markdown file. Rewriting re-serializes the mapping: key order is kept,
//! YAML comments inside the block are not.

use serde_yaml::{Mapping, Value};

/// A document split into its front matter and body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Split<'a> {
    pub yaml: Option<&'a str>,
    pub body: &'a str,
}

/// Separate front matter from the body
pub(crate) fn split(content: &str) -> Split<'_> {
    let text = content.strip_prefix('\u{feff}').unwrap_or(content);
    let no_front_matter = Split {
        yaml: None,
        body: content,
    };

    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return no_front_matter;
    };

    // An immediately closed block has no yaml lines at all.
    if let Some(body) = closing_line(rest) {
        return Split {
            yaml: Some(""),
            body,
        };
    }

    let mut offset = 0;
    while let Some(newline) = rest[offset..].find('\n') {
        let line_start = offset + newline + 1;
        if let Some(body) = closing_line(&rest[line_start..]) {
            return Split {
                yaml: Some(&rest[..line_start]),
                body,
            };
        }
        offset = line_start;
    }

    no_front_matter
}

/// If `text` starts with a `---` closing line, the text after it
fn closing_line(text: &str) -> Option<&str> {
    let after = text.strip_prefix("---")?;
    let after = after.trim_start_matches([' ', '\t']);
    if after.is_empty() {
        return Some(after);
    }
    after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
}

/// Parse front matter into a mapping
///
/// Empty, null and non-mapping front matter all read as an empty mapping.
pub(crate) fn parse(yaml: &str) -> Result<Mapping, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(map) => Ok(map),
        _ => Ok(Mapping::new()),
    }
}

/// Front matter mapping of a whole document
pub(crate) fn read(content: &str) -> Result<Mapping, serde_yaml::Error> {
    match split(content).yaml {
        Some(yaml) => parse(yaml),
        None => Ok(Mapping::new()),
    }
}

/// Set (`Some`) or remove (`None`) one front matter key
///
/// Creates a front matter block when needed and drops it when the last key
/// is removed. Returns the content unchanged when removing an absent key.
pub(crate) fn set_field(
    content: &str,
    key: &str,
    value: Option<Value>,
) -> Result<String, serde_yaml::Error> {
    let parts = split(content);
    let mut map = match parts.yaml {
        Some(yaml) => parse(yaml)?,
        None => Mapping::new(),
    };

    let key = Value::String(key.to_string());
    match value {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            if !map.contains_key(&key) {
                return Ok(content.to_string());
            }
            // Rebuild rather than remove in place so the other keys keep their order.
            map = map.into_iter().filter(|(k, _)| *k != key).collect();
        }
    }

    if map.is_empty() {
        return Ok(parts.body.to_string());
    }

    let yaml = serde_yaml::to_string(&map)?;
    Ok(format!("---\n{}---\n{}", yaml, parts.body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_finds_front_matter_and_body() {
        let content = "---\nprev: \"[[a]]\"\n---\n# Title\nbody\n";
        let parts = split(content);
        assert_eq!(parts.yaml, Some("prev: \"[[a]]\"\n"));
        assert_eq!(parts.body, "# Title\nbody\n");
    }

    #[test]
    fn split_without_front_matter() {
        let content = "# Title\n---\nnot front matter\n";
        assert_eq!(split(content).yaml, None);
        assert_eq!(split(content).body, content);
    }

    #[test]
    fn split_requires_closing_line() {
        let content = "---\nprev: a\nno closing\n";
        assert_eq!(split(content).yaml, None);
    }

    #[test]
    fn split_handles_empty_block_and_crlf() {
        let parts = split("---\n---\nbody");
        assert_eq!(parts.yaml, Some(""));
        assert_eq!(parts.body, "body");

        let parts = split("---\r\nprev: a\r\n---\r\nbody");
        assert_eq!(parts.yaml, Some("prev: a\r\n"));
        assert_eq!(parts.body, "body");
    }

    #[test]
    fn dashes_inside_values_do_not_close() {
        let parts = split("---\ntitle: ---x\n---\nbody");
        assert_eq!(parts.yaml, Some("title: ---x\n"));
        assert_eq!(parts.body, "body");
    }

    #[test]
    fn non_mapping_front_matter_reads_empty() {
        assert!(read("---\n- a\n- b\n---\n").unwrap().is_empty());
        assert!(read("no front matter").unwrap().is_empty());
    }

    #[test]
    fn set_field_replaces_value_and_keeps_other_keys() {
        let content = "---\ntitle: Day two\nprev: \"[[b]]\"\n---\nHello\n";
        let updated = set_field(content, "prev", Some(Value::String("[[a]]".into()))).unwrap();

        let map = read(&updated).unwrap();
        assert_eq!(map.get("title").and_then(Value::as_str), Some("Day two"));
        assert_eq!(map.get("prev").and_then(Value::as_str), Some("[[a]]"));
        assert_eq!(split(&updated).body, "Hello\n");
        assert!(updated.find("title").unwrap() < updated.find("prev").unwrap());
    }

    #[test]
    fn set_field_creates_block() {
        let updated = set_field("Hello\n", "prev", Some(Value::String("[[a]]".into()))).unwrap();
        assert!(updated.starts_with("---\n"));
        assert_eq!(split(&updated).body, "Hello\n");
    }

    #[test]
    fn removing_last_key_drops_block() {
        let updated = set_field("---\nprev: \"[[b]]\"\n---\nHello\n", "prev", None).unwrap();
        assert_eq!(updated, "Hello\n");
    }

    #[test]
    fn removing_absent_key_leaves_content_untouched() {
        let content = "---\ntitle:   spaced\n---\nHello\n";
        assert_eq!(set_field(content, "prev", None).unwrap(), content);
    }
}
