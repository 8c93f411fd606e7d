use std::cmp::Ordering;

/// One run of a file name split on digit boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    /// Digit run with leading zeros removed, compared by value.
    Number(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Number(a), Segment::Number(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
            (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key where digit runs compare as integers and text compares
/// case-insensitively: `img2` < `img10`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<Segment>);

impl NaturalKey {
    pub fn new(name: &str) -> Self {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut digits = String::new();
        for c in name.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
            } else {
                if !digits.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text).to_lowercase()));
                    segments.push(number(std::mem::take(&mut digits)));
                }
                text.push(c);
            }
        }
        segments.push(Segment::Text(text.to_lowercase()));
        if !digits.is_empty() {
            segments.push(number(digits));
            segments.push(Segment::Text(String::new()));
        }
        Self(segments)
    }
}

fn number(digits: String) -> Segment {
    let trimmed = digits.trim_start_matches('0');
    Segment::Number(trimmed.to_string())
}

/// Natural order by name; names with equal keys (`img7`, `img007`) fall
/// back to plain string order so the result never depends on listing order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    NaturalKey::new(a)
        .cmp(&NaturalKey::new(b))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        v.sort_by(|a, b| natural_cmp(a, b));
        v
    }

    #[test]
    fn digit_runs_compare_numerically() {
        assert_eq!(
            sorted(&["img10.jpg", "img2.jpg", "img1.jpg"]),
            vec!["img1.jpg", "img2.jpg", "img10.jpg"]
        );
    }

    #[test]
    fn text_is_case_insensitive() {
        assert_eq!(
            sorted(&["b1.jpg", "A2.jpg", "a10.jpg"]),
            vec!["A2.jpg", "a10.jpg", "b1.jpg"]
        );
    }

    #[test]
    fn mixed_runs_interleave() {
        assert_eq!(
            sorted(&["site3_photo12.png", "site3_photo2.png", "site12_photo1.png"]),
            vec!["site3_photo2.png", "site3_photo12.png", "site12_photo1.png"]
        );
    }

    #[test]
    fn leading_digits_and_zero_padding() {
        assert_eq!(
            sorted(&["10.jpg", "9.jpg", "img007.jpg", "img7.jpg", "img08.jpg"]),
            vec!["9.jpg", "10.jpg", "img007.jpg", "img7.jpg", "img08.jpg"]
        );
    }

    #[test]
    fn huge_numbers_do_not_overflow() {
        assert_eq!(
            sorted(&["p99999999999999999999999.jpg", "p100000000000000000000000.jpg"]),
            vec!["p99999999999999999999999.jpg", "p100000000000000000000000.jpg"]
        );
    }
}
