//! Front-matter parsing

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer};

use crate::error::PostError;

/// Custom deserializer that handles both a single string and a list of strings.
///
/// A single string is split on commas, or on whitespace when it has none,
/// so `c++, serialization` and `docker clion` both become two entries.
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(split_list(value))
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                let item = item.trim();
                if !item.is_empty() {
                    vec.push(item.to_string());
                }
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec).map(dedup)
}

fn split_list(value: &str) -> Vec<String> {
    let parts: Vec<&str> = if value.contains(',') {
        value.split(',').collect()
    } else {
        value.split_whitespace().collect()
    };
    parts
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove repeated entries, keeping the first occurrence
fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Front-matter data from a post
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub updated: Option<String>,
    pub slug: Option<String>,
    #[serde(deserialize_with = "string_or_vec", default)]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "string_or_vec", default)]
    pub categories: Vec<String>,
    /// Posts are published unless they opt out
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            title: None,
            date: None,
            updated: None,
            slug: None,
            tags: Vec::new(),
            categories: Vec::new(),
            published: true,
        }
    }
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str), PostError> {
        let content = content.trim_start_matches('\u{feff}').trim_start();

        // Fenced YAML front-matter (---)
        if content.starts_with("---") {
            return Self::parse_fenced(content);
        }

        // JSON front-matter (;;; or {"key":)
        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        // Bare `key: value` lines ended by a blank line
        if content.lines().next().is_some_and(is_key_value_line) {
            return Self::parse_bare(content);
        }

        Err(PostError::MissingHeader)
    }

    fn parse_fenced(content: &str) -> Result<(Self, &str), PostError> {
        let mut lines = content.split_inclusive('\n');
        let first = lines.next().unwrap_or_default();
        if first.trim_end() != "---" {
            return Err(PostError::MalformedHeader(
                "opening `---` must be on its own line".to_string(),
            ));
        }

        let header_start = first.len();
        let mut offset = header_start;
        for line in lines {
            if matches!(line.trim_end(), "---" | "...") {
                let yaml_content = &content[header_start..offset];
                let remaining = content[offset + line.len()..].trim_start_matches(['\n', '\r']);
                return Ok((Self::from_yaml(yaml_content)?, remaining));
            }
            offset += line.len();
        }

        Err(PostError::MalformedHeader("unterminated `---` block".to_string()))
    }

    fn parse_bare(content: &str) -> Result<(Self, &str), PostError> {
        let mut offset = 0;
        for line in content.split_inclusive('\n') {
            if line.trim().is_empty() {
                let remaining = content[offset..].trim_start_matches(['\n', '\r']);
                return Ok((Self::from_yaml(&content[..offset])?, remaining));
            }
            offset += line.len();
        }

        // Header with no body
        Ok((Self::from_yaml(content)?, ""))
    }

    fn from_yaml(yaml_content: &str) -> Result<Self, PostError> {
        if yaml_content.trim().is_empty() {
            return Ok(FrontMatter::default());
        }
        serde_yaml::from_str::<FrontMatter>(yaml_content)
            .map_err(|e| PostError::MalformedHeader(e.to_string()))
    }

    fn parse_json(content: &str) -> Result<(Self, &str), PostError> {
        // JSON front-matter ends with ;;;
        if let Some(rest) = content.strip_prefix(";;;") {
            let end_pos = rest.find(";;;").ok_or_else(|| {
                PostError::MalformedHeader("unterminated `;;;` block".to_string())
            })?;
            let json_content = &rest[..end_pos];
            let remaining = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);
            return Ok((Self::from_json(json_content)?, remaining));
        }

        // Find matching closing brace, ignoring braces in strings
        let mut depth = 0;
        let mut in_string = false;
        let mut escaped = false;
        for (i, c) in content.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let end_pos = i + 1;
                        let remaining = content[end_pos..].trim_start_matches(['\n', '\r']);
                        return Ok((Self::from_json(&content[..end_pos])?, remaining));
                    }
                }
                _ => {}
            }
        }

        Err(PostError::MalformedHeader("unbalanced JSON object".to_string()))
    }

    fn from_json(json_content: &str) -> Result<Self, PostError> {
        serde_json::from_str(json_content).map_err(|e| PostError::MalformedHeader(e.to_string()))
    }

    /// Parse the date field. `Ok(None)` when the field is absent.
    pub fn parse_date(
        &self,
        offset: FixedOffset,
    ) -> Result<Option<DateTime<FixedOffset>>, PostError> {
        parse_optional(self.date.as_deref(), offset)
    }

    /// Parse the updated field. `Ok(None)` when the field is absent.
    pub fn parse_updated(
        &self,
        offset: FixedOffset,
    ) -> Result<Option<DateTime<FixedOffset>>, PostError> {
        parse_optional(self.updated.as_deref(), offset)
    }
}

fn parse_optional(
    value: Option<&str>,
    offset: FixedOffset,
) -> Result<Option<DateTime<FixedOffset>>, PostError> {
    match value {
        None => Ok(None),
        Some(s) => parse_date_string(s, offset)
            .map(Some)
            .ok_or_else(|| PostError::InvalidDate(s.to_string())),
    }
}

/// A `key: value` (or `key:`) line, where key is a plain identifier.
/// URLs such as `https://...` do not count.
fn is_key_value_line(line: &str) -> bool {
    let trimmed = line.trim();
    let Some(colon_pos) = trimmed.find(':') else {
        return false;
    };
    let key = &trimmed[..colon_pos];
    let is_valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && key != "http"
        && key != "https"
        && key != "ftp";
    let after_colon = &trimmed[colon_pos + 1..];
    is_valid_key && (after_colon.is_empty() || after_colon.starts_with(' '))
}

/// Parse a date string in various formats.
/// Values without an explicit offset are read in `offset`.
pub fn parse_date_string(s: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    let with_offset = [
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M %z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ];
    for fmt in with_offset {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    let naive = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in naive {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return offset.from_local_datetime(&dt).single();
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            let dt = d.and_hms_opt(0, 0, 0)?;
            return offset.from_local_datetime(&dt).single();
        }
    }

    None
}
