use std::collections::BTreeSet;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::party::{seats_from_signed, Party};
use crate::polls::Poll;

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h[1-4]\b[^>]*>(.*?)</h[1-4]\s*>").expect("valid heading regex"));
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</?(?:p|div|li|ul|ol|tr|td|table|section|article)\b[^>]*>")
        .expect("valid line break regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static PARTY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9\-]+):\s*(-?\d+)").expect("valid party line regex"));
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#(\d{1,7})|#[xX]([0-9a-fA-F]{1,6})|(amp|lt|gt|quot|apos));")
        .expect("valid entity regex")
});

fn clean_entities(text: &str) -> String {
    text.replace('\u{200b}', "")
        .replace("&#8203;", "")
        .replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let code = if let Some(decimal) = caps.get(1) {
                decimal.as_str().parse::<u32>().ok()
            } else if let Some(hex) = caps.get(2) {
                u32::from_str_radix(hex.as_str(), 16).ok()
            } else {
                None
            };
            match (code.and_then(char::from_u32), caps.get(3).map(|m| m.as_str())) {
                (Some(ch), _) => ch.to_string(),
                (None, Some("amp")) => "&".to_string(),
                (None, Some("lt")) => "<".to_string(),
                (None, Some("gt")) => ">".to_string(),
                (None, Some("quot")) => "\"".to_string(),
                (None, Some("apos")) => "'".to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn heading_text(inner: &str) -> Option<String> {
    let stripped = TAG.replace_all(inner, " ");
    let decoded = decode_entities(&stripped);
    let collapsed = SPACES.replace_all(decoded.trim(), " ").to_string();
    (!collapsed.is_empty()).then_some(collapsed)
}

/// `NAME: SEATS` lines of one region, seats descending, first mention wins.
pub fn parse_party_lines(region: &str) -> Vec<Party> {
    let mut seen = BTreeSet::new();
    let mut parties = Vec::new();
    for segment in LINE_BREAK.split(region) {
        let text = TAG.replace_all(segment, "");
        let Some(caps) = PARTY_LINE.captures(text.trim()) else {
            continue;
        };
        let seats = match caps[2].parse::<i64>().map(seats_from_signed) {
            Ok(Ok(seats)) => seats,
            _ => {
                debug!("skipping party line with invalid seats: {}", &caps[0]);
                continue;
            }
        };
        let Ok(party) = Party::new(&caps[1], seats) else {
            continue;
        };
        if !seen.insert(party.name.clone()) {
            debug!("ignoring repeated party line for {}", party.name);
            continue;
        }
        parties.push(party);
    }
    parties.sort_by(|a, b| b.seats.cmp(&a.seats));
    parties
}

pub fn parse_polls(html: &str) -> Result<Vec<Poll>> {
    let cleaned = clean_entities(html);
    let mut polls: Vec<Poll> = Vec::new();
    let mut cursor = 0;
    let mut label: Option<String> = None;

    for caps in HEADING.captures_iter(&cleaned) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_poll(&mut polls, label.take(), &cleaned[cursor..whole.start()]);
        label = heading_text(&caps[1]);
        cursor = whole.end();
    }
    push_poll(&mut polls, label, &cleaned[cursor..]);

    if polls.is_empty() {
        return Err(anyhow!("could not find party data in the page"));
    }
    Ok(polls)
}

fn push_poll(polls: &mut Vec<Poll>, label: Option<String>, region: &str) {
    let parties = parse_party_lines(region);
    if parties.is_empty() {
        return;
    }
    let base = label.unwrap_or_else(|| format!("Poll {}", polls.len() + 1));
    let mut unique = base.clone();
    let mut n = 2;
    while polls.iter().any(|p| p.label == unique) {
        unique = format!("{base} ({n})");
        n += 1;
    }
    debug!("parsed poll {unique} with {} parties", parties.len());
    polls.push(Poll {
        label: unique,
        parties,
    });
}

#[cfg(test)]
mod tests {
    use super::{decode_entities, parse_party_lines, parse_polls};
    use crate::polls::PollSet;

    const PAGE: &str = r#"
<html><body>
<h2 class="title"><strong>Peiling&nbsp;Maurice de Hond</strong></h2>
<div class="paragraph" style="text-align:left;"><span style="color:rgb(42, 42, 42)">
GL-PvdA: 25<br/>VVD: 30<br>PVV:&nbsp;35<br />&#8203;D66: 10<br>
Lijst Pim Fortuyn: 2<br>BBB: 5
</span></div>
<h3>Ipsos I&amp;O</h3>
<p>PVV: 31</p><p>VVD: 28</p><p>GL-PvdA: 27</p>
<h3>Archief</h3>
<p>Geen cijfers beschikbaar.</p>
</body></html>
"#;

    #[test]
    fn parses_polls_labelled_by_headings() {
        let polls = parse_polls(PAGE).expect("page has polls");
        assert_eq!(polls.len(), 2);
        assert_eq!(polls[0].label, "Peiling Maurice de Hond");
        assert_eq!(polls[1].label, "Ipsos I&O");

        let first = &polls[0].parties;
        let names = first.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["PVV", "VVD", "GL-PvdA", "D66", "BBB"]);
        assert_eq!(first[0].seats, 35);
    }

    #[test]
    fn decoded_heading_labels_resolve_by_name() {
        let polls = PollSet::new("memory", parse_polls(PAGE).expect("page has polls"));
        let ipsos = polls.select(Some("Ipsos I&O"), 150).expect("decoded label");
        assert_eq!(ipsos[0].seats, 31);
        assert!(polls.get("ipsos i&o").is_some());
    }

    #[test]
    fn entities_decode_in_a_single_pass() {
        assert_eq!(decode_entities("R&amp;D &#39;24 &#x27;25"), "R&D '24 '25");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_entities("&copy; &#xD800;"), "&copy; &#xD800;");
    }

    #[test]
    fn unlabelled_blocks_get_numbered_labels() {
        let polls = parse_polls("PVV: 30<br>VVD: 20").expect("page has polls");
        assert_eq!(polls[0].label, "Poll 1");
        assert_eq!(polls[0].parties.len(), 2);
    }

    #[test]
    fn repeated_headings_are_disambiguated() {
        let page = "<h2>Peiling</h2>PVV: 30<h2>Peiling</h2>VVD: 20";
        let polls = parse_polls(page).expect("page has polls");
        assert_eq!(polls[0].label, "Peiling");
        assert_eq!(polls[1].label, "Peiling (2)");
    }

    #[test]
    fn pages_without_party_lines_are_an_error() {
        assert!(parse_polls("<h2>Nothing</h2><p>here</p>").is_err());
    }

    #[test]
    fn repeated_party_lines_keep_the_first() {
        let parties = parse_party_lines("SP: 5<br>SP: 9<br>CU: 3");
        assert_eq!(parties.len(), 2);
        assert_eq!(parties[0].seats, 5);
    }

    #[test]
    fn negative_seat_counts_are_skipped() {
        let parties = parse_party_lines("SP: -5<br>CU: 3");
        assert_eq!(parties.len(), 1);
        assert_eq!(parties[0].name.as_str(), "CU");
    }
}
