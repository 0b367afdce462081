/// A `{{name}}` occurrence. `start`/`end` are byte offsets into the scanned
/// string and include the delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub start: usize,
    pub end: usize,
    pub name: &'a str,
}

/// The placeholder opening exactly at byte `at`, if any. The name runs to the
/// first `}}` and is taken literally (no trimming).
pub fn placeholder_at(input: &str, at: usize) -> Option<Placeholder<'_>> {
    let rest = input.get(at..)?;
    if !rest.starts_with("{{") {
        return None;
    }
    let close = rest[2..].find("}}")?;
    Some(Placeholder {
        start: at,
        end: at + 2 + close + 2,
        name: &rest[2..2 + close],
    })
}

/// Every non-empty `{{name}}` span, leftmost first, non-overlapping.
pub fn parse_placeholders(input: &str) -> Vec<Placeholder<'_>> {
    let mut result = Vec::new();
    let mut i = 0;
    while i < input.len() {
        match placeholder_at(input, i) {
            Some(found) if !found.name.is_empty() && !found.name.contains("{{") => {
                i = found.end;
                result.push(found);
            }
            _ => {
                i += input[i..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_placeholders_basic() {
        let spans = parse_placeholders("{{host}}/api");
        assert_eq!(spans.len(), 1);
        let p = spans[0];
        assert_eq!((p.start, p.end, p.name), (0, 8, "host"));
        assert_eq!(&"{{host}}/api"[p.start..p.end], "{{host}}");
    }

    #[test]
    fn test_parse_placeholders_missing_close() {
        assert!(parse_placeholders("{{host").is_empty());
    }

    #[test]
    fn test_parse_placeholders_empty_name() {
        assert!(parse_placeholders("{{}}rest").is_empty());
    }

    #[test]
    fn test_parse_placeholders_multiple() {
        let names: Vec<&str> = parse_placeholders("{{scheme}}://{{host}}/path")
            .iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["scheme", "host"]);
    }

    #[test]
    fn test_parse_placeholders_restarts_inside_stray_braces() {
        let names: Vec<&str> = parse_placeholders("{{ {{host}}").iter().map(|p| p.name).collect();
        assert_eq!(names, ["host"]);
    }

    #[test]
    fn test_names_are_literal() {
        let spans = parse_placeholders("{{ host }}");
        assert_eq!(spans[0].name, " host ");
    }
}
