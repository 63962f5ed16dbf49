//! `Accept` header negotiation.

use std::cmp::Ordering;

struct MediaRange<'a> {
    kind: &'a str,
    subtype: &'a str,
    q: f32,
}

fn parse_accept(accept: &str) -> Vec<MediaRange<'_>> {
    let mut ranges: Vec<MediaRange<'_>> = accept
        .split(',')
        .filter_map(|item| {
            let mut params = item.split(';');
            let (kind, subtype) = params.next()?.trim().split_once('/')?;
            let q = params
                .filter_map(|p| p.split_once('='))
                .filter(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
                .find_map(|(_, v)| v.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (q > 0.0).then_some(MediaRange {
                kind: kind.trim(),
                subtype: subtype.trim(),
                q,
            })
        })
        .collect();
    // stable: equal weights keep header order
    ranges.sort_by(|a, b| b.q.partial_cmp(&a.q).unwrap_or(Ordering::Equal));
    ranges
}

fn range_matches(range: &MediaRange<'_>, media_type: &str) -> bool {
    let Some((kind, subtype)) = media_type.split_once('/') else {
        return false;
    };
    if range.kind == "*" {
        return true;
    }
    if !range.kind.eq_ignore_ascii_case(kind) {
        return false;
    }
    if range.subtype == "*" || range.subtype.eq_ignore_ascii_case(subtype) {
        return true;
    }
    // structured syntax suffix: application/json accepts application/problem+json
    subtype
        .rsplit_once('+')
        .is_some_and(|(_, suffix)| range.subtype.eq_ignore_ascii_case(suffix))
}

/// Pick the media type to write from `available` (in preference order).
///
/// The highest-weighted `Accept` range that matches an available type wins.
/// Without an `Accept` header, or when nothing matches, the first available
/// type is used.
#[must_use]
pub fn select_media_type<'a>(accept: Option<&str>, available: &[&'a str]) -> Option<&'a str> {
    let first = available.first().copied();
    let Some(accept) = accept else {
        return first;
    };
    parse_accept(accept)
        .iter()
        .find_map(|range| available.iter().copied().find(|t| range_matches(range, t)))
        .or(first)
}
