//! Tag ordering comparator (spec §4.2).
//!
//! Mixes numeric version segments with a lexicographic stream-name segment so
//! that tags like `1.2.A.3`, `1.10.A.1`, `2.0` sort the way a human expects,
//! while letting a designated "last tag" be pinned to the maximum.

use std::cmp::Ordering;

/// Parse the leading `version ("." version)*` run of `tag`, packing segments
/// little-endian as `sum(100^k * d_k)`, i.e. each `.` multiplies the
/// accumulated value by 100 and adds the next decimal group. Returns the
/// parsed value and the remaining, unconsumed slice of `tag`.
fn parse_version(tag: &str) -> (u64, &str) {
    let mut version: u64 = 0;
    let mut value: u64 = 0;
    let mut has_value = false;

    for (index, c) in tag.char_indices() {
        if c.is_ascii_digit() {
            value = value * 10 + u64::from(c as u8 - b'0');
            has_value = true;
            continue;
        }
        if c == '.' {
            version = version * 100 + value;
            value = 0;
            has_value = false;
            continue;
        }
        if has_value {
            version = version * 100 + value;
        }
        return (version, &tag[index..]);
    }

    if has_value {
        version = version * 100 + value;
    }
    (version, "")
}

/// Split `tag` into `(prefix, stream, suffix)` per spec §4.2's grammar:
/// `version ("." version)? name ("." version)?`.
fn split_tag(tag: &str) -> (u64, &str, u64) {
    let (prefix, rest) = parse_version(tag);

    let stream_len = rest
        .char_indices()
        .find(|&(_, c)| c == '.')
        .map(|(index, _)| index)
        .unwrap_or(rest.len());
    let (stream, rest) = rest.split_at(stream_len);
    let rest = rest.strip_prefix('.').unwrap_or(rest);

    let (suffix, _) = parse_version(rest);

    (prefix, stream, suffix)
}

/// Compare two tags for sorting, per spec §4.2. `last_tag`, when present, is
/// forced to be the maximum — this lets a stream's current tag always land
/// last in a catalog's source-tag list. The ordering is a strict weak order;
/// a stable sort preserves the relative order of tags that compare equal.
pub fn compare(a: &str, b: &str, last_tag: Option<&str>) -> Ordering {
    if let Some(last_tag) = last_tag {
        if a == last_tag && b == last_tag {
            return Ordering::Equal;
        }
        if a == last_tag {
            return Ordering::Greater;
        }
        if b == last_tag {
            return Ordering::Less;
        }
    }

    let (a_prefix, a_stream, a_suffix) = split_tag(a);
    let (b_prefix, b_stream, b_suffix) = split_tag(b);

    a_prefix
        .cmp(&b_prefix)
        .then_with(|| a_stream.cmp(b_stream))
        .then_with(|| a_suffix.cmp(&b_suffix))
}

/// Sort `tags` in place using [`compare`]. Stable, so an already-sorted list
/// is a no-op (spec §8, invariant 6).
pub fn sort_tags(tags: &mut [String], last_tag: Option<&str>) {
    tags.sort_by(|a, b| compare(a, b, last_tag));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_version_then_stream_then_suffix() {
        let mut tags: Vec<String> = ["1.2.A.3", "1.2.B.1", "1.10.A.1", "2.0"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sort_tags(&mut tags, None);
        assert_eq!(tags, ["1.2.A.3", "1.2.B.1", "1.10.A.1", "2.0"]);
    }

    #[test]
    fn last_tag_sorts_to_the_end() {
        let mut tags: Vec<String> = ["1.2.A.3", "1.2.B.1", "1.10.A.1", "2.0"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sort_tags(&mut tags, Some("1.2.A.3"));
        assert_eq!(tags.last().map(String::as_str), Some("1.2.A.3"));
    }

    #[test]
    fn already_sorted_list_is_a_no_op() {
        let mut tags: Vec<String> = ["1.2.A.3", "1.2.B.1", "1.10.A.1", "2.0"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let before = tags.clone();
        sort_tags(&mut tags, None);
        assert_eq!(tags, before);
    }

    #[test]
    fn totality_is_stable_for_equal_keys() {
        let mut tags: Vec<String> = ["1.0.A", "1.0.A"].iter().map(|s| s.to_string()).collect();
        sort_tags(&mut tags, None);
        assert_eq!(tags, ["1.0.A", "1.0.A"]);
    }
}
