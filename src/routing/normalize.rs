//! Path normalization for mistyped or mangled URLs.
//!
//! # Rules (applied in order)
//! - Drop percent-escapes (`%XX`)
//! - Drop characters outside `[-./A-Za-z0-9]`
//! - Collapse each run of `-`/`.`: all dashes → `-`, anything else → `.`
//! - Lowercase
//! - Trim `-` and `.` from each segment, drop empty segments
//!
//! # Design Decisions
//! - Single pass per rule, no regex
//! - The result always starts with `/`

/// Returns the normalized form of `path` if it differs from `path`.
pub fn normalize(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }

    let filtered: String = strip_escapes(path)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '/'))
        .collect();

    let collapsed = collapse_separators(&filtered).to_ascii_lowercase();

    let segments: Vec<&str> = collapsed
        .split('/')
        .map(|segment| segment.trim_matches(|c| c == '-' || c == '.'))
        .filter(|segment| !segment.is_empty())
        .collect();
    let normalized = format!("/{}", segments.join("/"));

    (normalized != path).then_some(normalized)
}

fn strip_escapes(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut run = String::new();

    for c in path.chars() {
        if c == '-' || c == '.' {
            run.push(c);
            continue;
        }
        flush_run(&mut out, &mut run);
        out.push(c);
    }
    flush_run(&mut out, &mut run);
    out
}

fn flush_run(out: &mut String, run: &mut String) {
    match run.len() {
        0 => {}
        1 => out.push_str(run),
        _ if run.chars().all(|c| c == '-') => out.push('-'),
        _ => out.push('.'),
    }
    run.clear();
}
