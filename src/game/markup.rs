//! Inline `<object>` / `<item>` markers embedded in story text.

pub const OBJECT_TAG: &str = "object";
pub const ITEM_TAG: &str = "item";

/// Names wrapped in `<tag>NAME</tag>`, in order of appearance.
///
/// Markers do not nest and do not span lines; a marker whose name is blank
/// or contains `<` is skipped.
pub fn extract_tagged<'a>(text: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut names = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(&open) {
        let after_open = &rest[start + open.len()..];
        let Some(end) = after_open.find(&close) else {
            break;
        };
        let name = &after_open[..end];
        if !name.contains('\n') && !name.contains('<') {
            let name = name.trim();
            if !name.is_empty() {
                names.push(name);
            }
            rest = &after_open[end + close.len()..];
        } else {
            rest = after_open;
        }
    }

    names
}

pub fn objects(text: &str) -> Vec<&str> {
    extract_tagged(text, OBJECT_TAG)
}

/// Replace every `<tag>NAME</tag>` with `render(tag, NAME)`.
pub fn render_markers(text: &str, render: impl Fn(&str, &str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    'outer: while let Some(lt) = rest.find('<') {
        for tag in [OBJECT_TAG, ITEM_TAG] {
            let open = format!("<{tag}>");
            let close = format!("</{tag}>");
            if let Some(after_open) = rest[lt..].strip_prefix(open.as_str())
                && let Some(end) = after_open.find(&close)
            {
                out.push_str(&rest[..lt]);
                out.push_str(&render(tag, &after_open[..end]));
                rest = &after_open[end + close.len()..];
                continue 'outer;
            }
        }
        out.push_str(&rest[..=lt]);
        rest = &rest[lt + 1..];
    }

    out.push_str(rest);
    out
}
