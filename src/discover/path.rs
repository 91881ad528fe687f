use crate::model::{PathSegment, SegmentKind};

/// Parse an endpoint path into segments.
///
/// Segments are `/`-separated. `:name` and `{name}` are parameters, `*name` a wildcard and
/// `!name` a fallback; anything else is a literal. Problems are returned alongside the
/// segments that did parse, so a slightly malformed path still yields usable metadata.
pub fn parse_path(path: &str) -> (Vec<PathSegment>, Vec<String>) {
    let mut segments: Vec<PathSegment> = Vec::new();
    let mut problems = Vec::new();

    let rest = match path.strip_prefix('/') {
        Some(rest) => rest,
        None => {
            problems.push(format!("path `{}` must begin with '/'", path));
            path
        }
    };
    if rest.is_empty() {
        return (segments, problems);
    }

    let raw_segments: Vec<&str> = rest.split('/').collect();
    for (i, raw) in raw_segments.iter().enumerate() {
        if raw.is_empty() {
            // A single trailing slash is allowed, as in `/users/`.
            if i + 1 != raw_segments.len() {
                problems.push(format!("path `{}` contains an empty segment", path));
            }
            continue;
        }

        let (kind, name) = if let Some(name) = raw.strip_prefix(':') {
            (SegmentKind::Param, name)
        } else if let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            // `{name:regex}` constrains the parameter; only the name matters here.
            let name = inner.split(':').next().unwrap_or(inner);
            (SegmentKind::Param, name)
        } else if let Some(name) = raw.strip_prefix('*') {
            (SegmentKind::Wildcard, name)
        } else if let Some(name) = raw.strip_prefix('!') {
            (SegmentKind::Fallback, name)
        } else {
            segments.push(PathSegment::literal(*raw));
            continue;
        };

        if name.is_empty() {
            problems.push(format!("path `{}` has an unnamed parameter", path));
            continue;
        }
        if segments
            .iter()
            .any(|s| s.kind != SegmentKind::Literal && s.value == name)
        {
            problems.push(format!("path `{}` repeats parameter `{}`", path, name));
            continue;
        }
        if matches!(kind, SegmentKind::Wildcard | SegmentKind::Fallback)
            && i + 1 != raw_segments.len()
        {
            problems.push(format!(
                "path `{}`: `{}` must be the last segment",
                path, raw
            ));
        }
        segments.push(PathSegment::new(kind, name));
    }

    (segments, problems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(segments: &[PathSegment]) -> Vec<(SegmentKind, &str)> {
        segments.iter().map(|s| (s.kind, s.value.as_str())).collect()
    }

    #[test]
    fn test_parse_mixed_path() {
        let (segments, problems) = parse_path("/users/:id/posts/{post_id}/*rest");
        assert!(problems.is_empty());
        assert_eq!(
            kinds(&segments),
            vec![
                (SegmentKind::Literal, "users"),
                (SegmentKind::Param, "id"),
                (SegmentKind::Literal, "posts"),
                (SegmentKind::Param, "post_id"),
                (SegmentKind::Wildcard, "rest"),
            ]
        );
    }

    #[test]
    fn test_root_and_trailing_slash() {
        let (segments, problems) = parse_path("/");
        assert!(segments.is_empty());
        assert!(problems.is_empty());

        let (segments, problems) = parse_path("/users/");
        assert_eq!(kinds(&segments), vec![(SegmentKind::Literal, "users")]);
        assert!(problems.is_empty());
    }

    #[test]
    fn test_regex_constrained_param() {
        let (segments, _) = parse_path("/files/{name:.*}");
        assert_eq!(kinds(&segments)[1], (SegmentKind::Param, "name"));
    }

    #[test]
    fn test_fallback() {
        let (segments, problems) = parse_path("/!fallback");
        assert!(problems.is_empty());
        assert_eq!(kinds(&segments), vec![(SegmentKind::Fallback, "fallback")]);
    }

    #[test]
    fn test_problems_keep_partial_segments() {
        let (segments, problems) = parse_path("users//:id/:/:id/*rest/tail");

        assert_eq!(
            kinds(&segments),
            vec![
                (SegmentKind::Literal, "users"),
                (SegmentKind::Param, "id"),
                (SegmentKind::Wildcard, "rest"),
                (SegmentKind::Literal, "tail"),
            ]
        );
        assert_eq!(problems.len(), 5);
        assert!(problems[0].contains("must begin with '/'"));
        assert!(problems[1].contains("empty segment"));
        assert!(problems[2].contains("unnamed parameter"));
        assert!(problems[3].contains("repeats parameter `id`"));
        assert!(problems[4].contains("must be the last segment"));
    }
}
