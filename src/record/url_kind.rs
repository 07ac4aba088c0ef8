//! URL-kind classification — inspects the leading bytes of `location` in
//! priority order. Ported directly from the original date-delta and
//! prefix-match algorithm (see `libmsiecf_url_values.c`); every bounds check
//! and month-length table below mirrors it byte-for-byte.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum UrlKind {
    Cache,
    Cookie,
    History,
    HistoryDaily,
    HistoryWeekly,
    Download,
    DomStore,
    RssFeed,
    Compatibility,
    InPrivateFiltering,
    UserData,
    Tld,
    Unknown,
}

const PREFIXES: &[(&[u8], UrlKind)] = &[
    (b"iedownload:", UrlKind::Download),
    (b"DOMStore:", UrlKind::DomStore),
    (b"feedplat:", UrlKind::RssFeed),
    (b"iecompat:", UrlKind::Compatibility),
    (b"PrivacIE:", UrlKind::InPrivateFiltering),
    (b"userdata:", UrlKind::UserData),
    (b"Visited:", UrlKind::History),
    (b"Cookie:", UrlKind::Cookie),
    (b"ietld:", UrlKind::Tld),
];

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Parses the fixed 18-byte `:YYYYMMDDYYYYMMDD:` pattern at the start of
/// `location`, returning the day delta between the two embedded dates when
/// every character is an ASCII digit and the separators are colons.
fn history_date_delta(location: &[u8]) -> Option<u32> {
    if location.len() < 18 {
        return None;
    }
    if location[0] != b':' || location[17] != b':' {
        return None;
    }
    let digits = &location[1..17];
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let d = |i: usize| (digits[i] - b'0') as u32;

    let first_year = d(0) * 1000 + d(1) * 100 + d(2) * 10 + d(3);
    let first_month = d(4) * 10 + d(5);
    let first_day = d(6) * 10 + d(7);
    let second_year = d(8) * 1000 + d(9) * 100 + d(10) * 10 + d(11);
    let second_month = d(12) * 10 + d(13);
    let second_day = d(14) * 10 + d(15);

    if first_month == 0 || first_month > 12 || second_month == 0 || second_month > 12 {
        return None;
    }

    let number_of_days: i64 = if first_year == second_year && first_month == second_month {
        second_day as i64 - first_day as i64
    } else if first_year == second_year && first_month + 1 == second_month {
        days_in_month(first_year, first_month) as i64 - first_day as i64 + second_day as i64
    } else if first_year + 1 == second_year && first_month == 12 && second_month == 1 {
        31 - first_day as i64 + second_day as i64
    } else {
        return None;
    };

    if number_of_days < 0 {
        None
    } else {
        Some(number_of_days as u32)
    }
}

/// Classify a `location` byte string: history-date prefixes first, then
/// cookie/visited-link markers, falling back to a plain cached URL.
pub fn classify(location: &[u8]) -> UrlKind {
    if let Some(delta) = history_date_delta(location) {
        match delta {
            1 => return UrlKind::HistoryDaily,
            7 => return UrlKind::HistoryWeekly,
            _ => {}
        }
    }

    for (prefix, kind) in PREFIXES {
        if location.len() >= prefix.len() && &location[..prefix.len()] == *prefix {
            return *kind;
        }
    }

    UrlKind::Cache
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_history_daily() {
        assert_eq!(classify(b":20200101:20200102:"), UrlKind::HistoryDaily);
    }

    #[test]
    fn classifies_history_weekly() {
        assert_eq!(classify(b":20200101:20200108:"), UrlKind::HistoryWeekly);
    }

    #[test]
    fn three_day_delta_falls_through_to_cache() {
        assert_eq!(classify(b":20200101:20200103:"), UrlKind::Cache);
    }

    #[test]
    fn leap_year_month_rollover() {
        // Feb 29 2020 (leap) -> Mar 1 2020 is a 1-day delta.
        assert_eq!(classify(b":20200229:20200301:"), UrlKind::HistoryDaily);
    }

    #[test]
    fn december_to_january_rollover() {
        assert_eq!(classify(b":20201231:20210101:"), UrlKind::HistoryDaily);
    }

    #[test]
    fn prefix_priority_order() {
        assert_eq!(classify(b"Cookie:example.com/"), UrlKind::Cookie);
        assert_eq!(classify(b"Visited: http://example.com/"), UrlKind::History);
        assert_eq!(classify(b"ietld:example.com"), UrlKind::Tld);
        assert_eq!(classify(b"iedownload:foo"), UrlKind::Download);
    }

    #[test]
    fn unmatched_falls_back_to_cache() {
        assert_eq!(classify(b"http://example.com/image.png"), UrlKind::Cache);
    }
}
