use chrono::{DateTime, Local, TimeZone, Utc};
use marksync::models::Bookmark;
use marksync::validate::validate_url;
use owo_colors::OwoColorize;
use std::fmt::Display;

pub trait Colorize {
    fn to_colored(&self) -> String;
}

pub struct ColorizeBookmark<'a>(pub &'a Bookmark);

impl<'a> Colorize for ColorizeBookmark<'a> {
    fn to_colored(&self) -> String {
        let mut s = String::new();
        let id = short_id(&self.0.id);
        s.push_str(&format!("{}. {}\n", id.bright_blue(), self.0.title.bold().green()));
        let padding = id.len() + 3;
        // padding for alignment
        s.push_str(&format!("{:>padding$} {}\n", ">".red(), self.0.url.yellow()));
        s.push_str(&format!(
            "{:>padding$} {} {}\n",
            "@".red(),
            display_domain(&self.0.url).cyan(),
            relative_date(&self.0.created_at, &Local::now()).dimmed()
        ));
        s
    }
}

/// First eight characters of an id, enough to address it from the command line
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Host of `url` without a leading `www.`; the raw string when it doesn't parse
pub fn display_domain(url: &str) -> String {
    validate_url(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .host_str()
                .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
        })
        .unwrap_or_else(|| url.to_string())
}

/// "3:05 PM" for today, "Yesterday", else "Jan 5", all in `now`'s time zone
pub fn relative_date<Tz: TimeZone>(ts: &DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let local = ts.with_timezone(&now.timezone());
    let today = now.date_naive();
    let day = local.date_naive();

    if day == today {
        local.format("%-I:%M %p").to_string()
    } else if today.pred_opt() == Some(day) {
        "Yesterday".to_string()
    } else {
        local.format("%b %-d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[rstest]
    #[case("https://www.rust-lang.org/learn", "rust-lang.org")]
    #[case("https://go.dev", "go.dev")]
    #[case("http://docs.www.example.com", "docs.www.example.com")]
    #[case("not a url", "not a url")]
    fn test_display_domain(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(display_domain(url), expected);
    }

    #[rstest]
    #[case(at(2024, 3, 10, 9, 5), "9:05 AM")]
    #[case(at(2024, 3, 10, 14, 30), "2:30 PM")]
    #[case(at(2024, 3, 9, 23, 59), "Yesterday")]
    #[case(at(2024, 3, 8, 12, 0), "Mar 8")]
    #[case(at(2023, 1, 5, 12, 0), "Jan 5")]
    fn test_relative_date(#[case] ts: DateTime<Utc>, #[case] expected: &str) {
        let now = at(2024, 3, 10, 15, 0);
        assert_eq!(relative_date(&ts, &now), expected);
    }

    #[test]
    fn test_relative_date_uses_viewer_zone() {
        // 23:30 UTC on the 9th is already the 10th at UTC+2
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = at(2024, 3, 10, 12, 0).with_timezone(&plus_two);
        assert_eq!(relative_date(&at(2024, 3, 9, 23, 30), &now), "1:30 AM");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("b1"), "b1");
    }

    #[test]
    fn test_colorize_output_structure() {
        let bookmark = Bookmark::new(
            "4242aaaa-bbbb",
            "u1",
            "https://www.rust-lang.org",
            "Rust Programming Language",
            Utc::now(),
        );

        let colorized = ColorizeBookmark(&bookmark).to_colored();
        let lines: Vec<&str> = colorized.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("4242aaaa"));
        assert!(!lines[0].contains("bbbb"));
        assert!(lines[0].contains("Rust Programming Language"));
        assert!(lines[1].contains("https://www.rust-lang.org"));
        assert!(lines[2].contains("rust-lang.org"));
    }
}
