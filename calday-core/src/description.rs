//! Description cleanup for meeting invitations.

/// Shortest run of underscores treated as a boilerplate separator.
const SEPARATOR_MIN_LEN: usize = 10;

/// Remove the meeting-invite block from a description.
///
/// Invitations from Teams (and similar tools) append a join-link block
/// framed by lines of underscores. Everything from the first separator to
/// the last one is dropped; with a single separator, everything after it.
pub fn trim_boilerplate(description: &str) -> String {
    let lines: Vec<&str> = description.lines().collect();
    let separators: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_separator(line))
        .map(|(i, _)| i)
        .collect();

    let (Some(&first), Some(&last)) = (separators.first(), separators.last()) else {
        return description.trim().to_string();
    };

    let mut kept = lines[..first].to_vec();
    if last > first {
        kept.extend_from_slice(&lines[last + 1..]);
    }

    kept.join("\n").trim().to_string()
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.len() >= SEPARATOR_MIN_LEN && line.chars().all(|c| c == '_')
}
