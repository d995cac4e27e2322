//! The `startIndex` and `count` query parameters.

use crate::error::{ScimError, ScimResult};

use serde::{Deserialize, Serialize};

/// What to do with a start index below 1 (or a negative count).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartIndexPolicy {
    /// Normalize to the nearest legal value.
    #[default]
    Clamp,
    /// Fail with [`ScimError::InvalidQueryParameter`].
    Reject,
}

/// Requested page: a 1-based start index and an optional maximum count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSpec {
    start_index: u64,
    count: Option<u64>,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            start_index: 1,
            count: None,
        }
    }
}

impl PageSpec {
    /// Page from signed values, applying `policy` to out-of-range input.
    pub fn new(start_index: i64, count: Option<i64>, policy: StartIndexPolicy) -> ScimResult<Self> {
        let start_index = match (u64::try_from(start_index), policy) {
            (Ok(index), _) if index >= 1 => index,
            (_, StartIndexPolicy::Clamp) => 1,
            (_, StartIndexPolicy::Reject) => {
                return Err(ScimError::invalid_parameter(
                    "startIndex",
                    format!("{} is not a positive index", start_index),
                ));
            }
        };
        let count = match count.map(u64::try_from) {
            None => None,
            Some(Ok(count)) => Some(count),
            Some(Err(_)) if policy == StartIndexPolicy::Clamp => Some(0),
            Some(Err(_)) => {
                return Err(ScimError::invalid_parameter("count", "count cannot be negative"));
            }
        };
        Ok(Self { start_index, count })
    }

    /// Build from raw parameter values. Returns `None` when neither is given.
    pub fn from_parameters(
        start_index: Option<&str>,
        count: Option<&str>,
        policy: StartIndexPolicy,
    ) -> ScimResult<Option<Self>> {
        if start_index.is_none() && count.is_none() {
            return Ok(None);
        }
        let parse = |name: &str, text: &str| {
            text.trim()
                .parse::<i64>()
                .map_err(|_| ScimError::invalid_parameter(name, format!("'{}' is not an integer", text)))
        };
        let start = start_index.map(|s| parse("startIndex", s)).transpose()?.unwrap_or(1);
        let count = count.map(|c| parse("count", c)).transpose()?;
        Self::new(start, count, policy).map(Some)
    }

    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    pub fn count(&self) -> Option<u64> {
        self.count
    }

    /// Same page with the count capped at `max`.
    pub fn capped(&self, max: u64) -> Self {
        Self {
            start_index: self.start_index,
            count: Some(self.count.map_or(max, |count| count.min(max))),
        }
    }

    /// Zero-based offset of the first item.
    pub fn offset(&self) -> usize {
        usize::try_from(self.start_index - 1).unwrap_or(usize::MAX)
    }

    /// Select this page from a full result list.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let take = self
            .count
            .map_or(usize::MAX, |count| usize::try_from(count).unwrap_or(usize::MAX));
        items.into_iter().skip(self.offset()).take(take).collect()
    }
}
