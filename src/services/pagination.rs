//! Compact page navigation: a fixed-size window of page numbers around the
//! current page, with the first and last pages and ellipses outside it.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "snake_case")]
pub enum PageToken {
    Page(u32),
    Ellipsis,
}

/// Computes the navigation tokens for `current` of `total` pages
///
/// When `total > max_window` exactly `max_window` consecutive pages are shown;
/// near the edges the window shifts instead of shrinking. An out of range
/// `current` is clamped and a zero window is treated as one page.
pub fn pagination_window(current: u32, total: u32, max_window: u32) -> Vec<PageToken> {
    let window = max_window.max(1);

    if total <= window {
        return (1..=total).map(PageToken::Page).collect();
    }

    let current = current.clamp(1, total);
    let half = window / 2;

    let end = current
        .saturating_sub(half)
        .max(1)
        .saturating_add(window - 1)
        .min(total);
    // end >= window here since total > window
    let start = end - (window - 1);

    let mut tokens = Vec::with_capacity(window as usize + 4);

    if start > 1 {
        tokens.push(PageToken::Page(1));
        if start > 2 {
            tokens.push(PageToken::Ellipsis);
        }
    }

    tokens.extend((start..=end).map(PageToken::Page));

    if end < total {
        if end < total - 1 {
            tokens.push(PageToken::Ellipsis);
        }
        tokens.push(PageToken::Page(total));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageToken::{Ellipsis, Page};

    fn pages(range: std::ops::RangeInclusive<u32>) -> Vec<PageToken> {
        range.map(Page).collect()
    }

    #[test]
    fn test_middle_of_large_range() {
        let mut expected = vec![Page(1), Ellipsis];
        expected.extend(pages(47..=53));
        expected.extend([Ellipsis, Page(100)]);

        assert_eq!(pagination_window(50, 100, 7), expected);
    }

    #[test]
    fn test_small_total_shows_everything() {
        assert_eq!(pagination_window(1, 5, 7), pages(1..=5));
        assert_eq!(pagination_window(7, 7, 7), pages(1..=7));
    }

    #[test]
    fn test_zero_pages() {
        assert!(pagination_window(1, 0, 7).is_empty());
        assert!(pagination_window(0, 0, 0).is_empty());
    }

    #[test]
    fn test_window_shifts_at_start() {
        let mut expected = pages(1..=7);
        expected.extend([Ellipsis, Page(20)]);
        assert_eq!(pagination_window(1, 20, 7), expected);
        assert_eq!(pagination_window(3, 20, 7), expected);
    }

    #[test]
    fn test_window_shifts_at_end() {
        let mut expected = vec![Page(1), Ellipsis];
        expected.extend(pages(14..=20));
        assert_eq!(pagination_window(20, 20, 7), expected);
        assert_eq!(pagination_window(18, 20, 7), expected);
    }

    #[test]
    fn test_no_ellipsis_when_adjacent() {
        // window 2..=8 touches page 1, 9 touches the last page
        let mut expected = vec![Page(1)];
        expected.extend(pages(2..=8));
        expected.push(Page(9));
        assert_eq!(pagination_window(5, 9, 7), expected);
    }

    #[test]
    fn test_out_of_range_current_is_clamped() {
        assert_eq!(pagination_window(0, 20, 7), pagination_window(1, 20, 7));
        assert_eq!(pagination_window(999, 20, 7), pagination_window(20, 20, 7));
    }

    #[test]
    fn test_window_always_has_max_size_pages() {
        for total in 8..40 {
            for current in 0..=total + 2 {
                let tokens = pagination_window(current, total, 7);
                let numbers: Vec<u32> = tokens
                    .iter()
                    .filter_map(|t| match t {
                        Page(n) => Some(*n),
                        Ellipsis => None,
                    })
                    .collect();
                assert!(numbers.windows(2).all(|w| w[0] < w[1]));
                assert_eq!(numbers.first(), Some(&1));
                assert_eq!(numbers.last(), Some(&total));
                assert!(numbers.len() >= 7 && numbers.len() <= 9);
            }
        }
    }

    #[test]
    fn test_degenerate_window_sizes() {
        assert_eq!(
            pagination_window(5, 10, 1),
            vec![Page(1), Ellipsis, Page(5), Ellipsis, Page(10)]
        );
        assert_eq!(pagination_window(2, 3, 0), vec![Page(1), Page(2), Page(3)]);
    }

    #[test]
    fn test_pages_near_u32_max() {
        let mut expected = vec![Page(1), Ellipsis];
        expected.extend(pages(u32::MAX - 6..=u32::MAX));
        assert_eq!(pagination_window(u32::MAX, u32::MAX, 7), expected);
        assert_eq!(pagination_window(u32::MAX - 2, u32::MAX, 7), expected);

        let mut expected = vec![Page(1), Ellipsis];
        expected.extend(pages(u32::MAX - 5..=u32::MAX - 1));
        expected.push(Page(u32::MAX));
        assert_eq!(pagination_window(u32::MAX - 3, u32::MAX, 5), expected);
    }

    #[test]
    fn test_token_serialization() {
        let json = serde_json::to_value(pagination_window(2, 9, 3)).unwrap();
        assert_eq!(json[0], serde_json::json!({"kind": "page", "page": 1}));
        assert_eq!(json[3], serde_json::json!({"kind": "ellipsis"}));
    }
}
