const MARKER: &str = "%%";

fn is_marker(line: &str) -> bool {
    line.trim_end_matches(['\r', '\n']) == MARKER
}

pub fn has_marker(template: &str) -> bool {
    template.split_inclusive('\n').any(is_marker)
}

/// Replaces the first `%%` line of `template` with `generated`.
///
/// Without a marker the generated code follows the whole template.
pub fn splice_template(template: &str, generated: &str) -> String {
    let mut out = String::with_capacity(template.len() + generated.len());
    let mut lines = template.split_inclusive('\n');

    let mut spliced = false;
    for line in lines.by_ref() {
        if is_marker(line) {
            spliced = true;
            break;
        }
        out.push_str(line);
    }

    if !spliced && !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(generated);

    for line in lines {
        out.push_str(line);
    }
    out
}
