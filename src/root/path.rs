use crate::error::{DotkvError, DotkvResult};

/// A normalized attribute path.
///
/// Accepts dotted and bracketed navigation (`my.list`, `items[3].name`,
/// `users["anna"].age`) and canonicalizes to plain dotted segments, so
/// `items[3]` and `items.3` address the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotPath {
    segments: Vec<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum State {
    /// At the start or right after a dot: a named segment must follow.
    ExpectName,
    /// Inside a named segment.
    InName,
    /// Right after a closing bracket: only `.`, `[` or the end may follow.
    AfterGroup,
}

impl DotPath {
    pub fn parse(raw: &str) -> DotkvResult<Self> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = raw.chars();
        let mut state = State::ExpectName;

        while let Some(c) = chars.next() {
            match c {
                '.' => match state {
                    State::InName => {
                        segments.push(std::mem::take(&mut current));
                        state = State::ExpectName;
                    }
                    State::AfterGroup => state = State::ExpectName,
                    State::ExpectName => {
                        return Err(DotkvError::Path(format!("empty segment in {raw:?}")))
                    }
                },
                '[' => match state {
                    State::InName => {
                        segments.push(std::mem::take(&mut current));
                        segments.push(parse_bracket(&mut chars, raw)?);
                        state = State::AfterGroup;
                    }
                    State::AfterGroup => {
                        segments.push(parse_bracket(&mut chars, raw)?);
                    }
                    State::ExpectName => {
                        return Err(DotkvError::Path(format!(
                            "bracket without a preceding segment in {raw:?}"
                        )))
                    }
                },
                ']' => return Err(DotkvError::Path(format!("unmatched ']' in {raw:?}"))),
                _ => match state {
                    State::AfterGroup => {
                        return Err(DotkvError::Path(format!(
                            "unexpected {c:?} after ']' in {raw:?}"
                        )))
                    }
                    _ => {
                        current.push(c);
                        state = State::InName;
                    }
                },
            }
        }

        match state {
            State::InName => segments.push(current),
            State::AfterGroup => {}
            State::ExpectName => {
                return Err(DotkvError::Path(format!("incomplete path {raw:?}")))
            }
        }
        Ok(DotPath { segments })
    }

    /// The canonical dotted rendering used to build store keys.
    pub fn canonical(&self) -> String {
        self.segments.join(".")
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

fn parse_bracket(
    chars: &mut std::str::Chars<'_>,
    raw: &str,
) -> DotkvResult<String> {
    let mut inner = String::new();
    for c in chars.by_ref() {
        if c == ']' {
            let trimmed = inner
                .strip_prefix(['"', '\''])
                .and_then(|s| s.strip_suffix(['"', '\'']))
                .unwrap_or(&inner);
            if trimmed.is_empty() {
                return Err(DotkvError::Path(format!("empty brackets in {raw:?}")));
            }
            return Ok(trimmed.to_owned());
        }
        inner.push(c);
    }
    Err(DotkvError::Path(format!("unterminated '[' in {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plain dotted paths pass through.
    #[test]
    fn test_dotted_path() {
        let path = DotPath::parse("haha.wahaha").unwrap();
        assert_eq!(path.canonical(), "haha.wahaha");
    }

    /// Bracket indices normalize to dotted segments.
    #[test]
    fn test_bracket_index() {
        let path = DotPath::parse("items[3].name").unwrap();
        assert_eq!(path.canonical(), "items.3.name");
    }

    /// Quoted bracket keys drop their quotes.
    #[test]
    fn test_quoted_bracket_key() {
        let path = DotPath::parse(r#"users["anna"].age"#).unwrap();
        assert_eq!(path.canonical(), "users.anna.age");
    }

    /// Consecutive bracket groups work without dots between them.
    #[test]
    fn test_chained_brackets() {
        let path = DotPath::parse("grid[1][2]").unwrap();
        assert_eq!(path.canonical(), "grid.1.2");
    }

    /// A bracket group may end the path or be followed by a dot.
    #[test]
    fn test_bracket_then_dot() {
        let path = DotPath::parse("a[1].b").unwrap();
        assert_eq!(path.canonical(), "a.1.b");
    }

    /// Malformed paths are rejected.
    #[test]
    fn test_invalid_paths() {
        for raw in [
            "", ".", ".a", "a.", "a..b", "a[", "a[]", "a]b", "[3]", "a.[1]", "a[1]b",
        ] {
            assert!(DotPath::parse(raw).is_err(), "accepted {raw:?}");
        }
    }

    /// A single segment is a valid path.
    #[test]
    fn test_single_segment() {
        assert_eq!(DotPath::parse("time").unwrap().canonical(), "time");
    }
}
