use reqwest::StatusCode;
use std::collections::BTreeSet;

/// Decides which response status codes end the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Only `200 OK` is accepted, everything else is retried
    OkOnly,
    /// `200 OK` is accepted, `404 Not Found` stops immediately with
    /// [`FetchError::NotFound`][crate::FetchError::NotFound], everything else is retried
    Tolerant,
    /// Every code in the set is accepted and returned to the caller
    Explicit(BTreeSet<u16>),
    /// Every status is accepted, only transport failures are retried
    Any,
}

/// What the executor does with a received status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Hand the response to the caller
    Accept,
    /// Stop with [`FetchError::NotFound`][crate::FetchError::NotFound]
    NotFound,
    /// Count a failed attempt and try again if any are left
    Retry,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::OkOnly
    }
}

impl StatusPolicy {
    /// Accept exactly the given codes
    pub fn explicit<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = u16>,
    {
        Self::Explicit(codes.into_iter().collect())
    }

    /// Verdict for a response carrying `status`
    pub fn classify(&self, status: StatusCode) -> Verdict {
        match self {
            Self::OkOnly if status == StatusCode::OK => Verdict::Accept,
            Self::Tolerant if status == StatusCode::OK => Verdict::Accept,
            Self::Tolerant if status == StatusCode::NOT_FOUND => Verdict::NotFound,
            Self::Explicit(codes) if codes.contains(&status.as_u16()) => Verdict::Accept,
            Self::Any => Verdict::Accept,
            _ => Verdict::Retry,
        }
    }
}
