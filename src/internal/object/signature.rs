//! Author and committer signatures.
//!
//! A signature line reads `author Jane Doe <jane@example.org> 1717171717 +0200`.
//! The timezone is kept as the original string so re-serialising a parsed
//! commit is byte-exact.

use std::fmt::Display;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Which header a signature belongs to inside a commit object.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureKind {
    Author,
    Committer,
}

impl SignatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureKind::Author => "author",
            SignatureKind::Committer => "committer",
        }
    }

    fn from_tag(tag: &str) -> Result<Self, StoreError> {
        match tag {
            "author" => Ok(SignatureKind::Author),
            "committer" => Ok(SignatureKind::Committer),
            _ => Err(StoreError::InvalidSignature(tag.to_string())),
        }
    }
}

/// Name, e-mail, Unix timestamp and timezone of an author or committer.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub kind: SignatureKind,
    pub name: String,
    pub email: String,
    pub timestamp: i64,
    /// Timezone as written, e.g. `+0200` or `-0530`.
    pub timezone: String,
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} {} <{}> {} {}",
            self.kind.as_str(),
            self.name,
            self.email,
            self.timestamp,
            self.timezone
        )
    }
}

impl Signature {
    pub fn new(kind: SignatureKind, name: &str, email: &str, timestamp: i64, timezone: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            email: email.to_string(),
            timestamp,
            timezone: timezone.to_string(),
        }
    }

    /// A signature stamped with the current time in UTC.
    pub fn now(kind: SignatureKind, name: &str, email: &str) -> Self {
        Self::new(kind, name, email, Utc::now().timestamp(), "+0000")
    }

    /// Parse one signature line, e.g.
    /// `author Jane Doe <jane@example.org> 1717171717 +0200`.
    pub fn from_data(data: &[u8]) -> Result<Self, StoreError> {
        let line = std::str::from_utf8(data)
            .map_err(|_| StoreError::InvalidSignature(String::from_utf8_lossy(data).to_string()))?;
        let invalid = || StoreError::InvalidSignature(line.to_string());

        let (tag, rest) = line.split_once(' ').ok_or_else(invalid)?;
        let kind = SignatureKind::from_tag(tag)?;

        let email_start = rest.find('<').ok_or_else(invalid)?;
        let email_end = rest.find('>').ok_or_else(invalid)?;
        if email_end < email_start {
            return Err(invalid());
        }
        let name = rest[..email_start].trim_end();
        let email = &rest[email_start + 1..email_end];

        let mut tail = rest[email_end + 1..].split_whitespace();
        let timestamp: i64 = tail
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(invalid)?;
        let timezone = tail.next().ok_or_else(invalid)?;

        Ok(Self::new(kind, name, email, timestamp, timezone))
    }

    pub fn to_data(&self) -> Result<Vec<u8>, StoreError> {
        Ok(self.to_string().into_bytes())
    }

    /// The signature instant with its original timezone applied.
    pub fn when(&self) -> Result<DateTime<FixedOffset>, StoreError> {
        let offset = parse_timezone(&self.timezone)
            .ok_or_else(|| StoreError::InvalidSignature(self.timezone.clone()))?;
        DateTime::from_timestamp(self.timestamp, 0)
            .map(|utc| utc.with_timezone(&offset))
            .ok_or_else(|| StoreError::InvalidSignature(self.timestamp.to_string()))
    }
}

fn parse_timezone(tz: &str) -> Option<FixedOffset> {
    let bytes = tz.as_bytes();
    if bytes.len() != 5 {
        return None;
    }
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours: i32 = tz[1..3].parse().ok()?;
    let minutes: i32 = tz[3..5].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
