//! What a polling command is watching, and how a name becomes a stable id.

use tracing::debug;

use crate::error::{Result, WatchError};
use crate::provider::ItemDirectory;
use crate::types::{ItemSummary, ProbeStatus, StableId};

/// Most candidates listed in an ambiguity error.
pub const MAX_LISTED_CANDIDATES: usize = 5;

/// Target of a watch or follow command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelector {
    /// Every probe, optionally restricted to one status.
    All {
        /// Status filter.
        status: Option<ProbeStatus>,
    },
    /// One probe, already resolved.
    Item(StableId),
}

impl TargetSelector {
    /// The resolved probe, if this selector names one.
    #[must_use]
    pub const fn item(&self) -> Option<StableId> {
        match self {
            Self::All { .. } => None,
            Self::Item(id) => Some(*id),
        }
    }
}

/// Resolves an operator-supplied identifier to a stable id.
///
/// UUID-shaped identifiers are accepted as-is without a network call.
/// Anything else is treated as a probe name and looked up with a single
/// search; see [`pick_candidate`] for the matching rules.
///
/// Call this once before polling starts. Ambiguity is a configuration
/// error, retrying it can never succeed.
///
/// # Errors
///
/// Returns [`WatchError::Ambiguous`], [`WatchError::NotFound`], or
/// [`WatchError::Resolve`] when the search itself fails.
pub async fn resolve<D: ItemDirectory>(directory: &D, identifier: &str) -> Result<StableId> {
    let query = identifier.trim();
    if query.is_empty() {
        return Err(WatchError::Config("probe identifier must not be empty".into()));
    }

    if let Some(id) = StableId::parse(query) {
        debug!(%id, "using stable probe id");
        return Ok(id);
    }

    let candidates = directory
        .search_items(query)
        .await
        .map_err(|source| WatchError::Resolve {
            query: query.to_string(),
            source,
        })?;
    debug!(query, found = candidates.len(), "probe search finished");

    pick_candidate(query, &candidates)
}

/// Applies the name-matching rules to search results.
///
/// 1. A unique exact, case-insensitive name match wins.
/// 2. Several exact matches, or no exact match and several substring
///    matches, are ambiguous.
/// 3. Exactly one substring match is accepted.
/// 4. No match is "not found".
///
/// # Errors
///
/// Returns [`WatchError::Ambiguous`] or [`WatchError::NotFound`].
pub fn pick_candidate(query: &str, candidates: &[ItemSummary]) -> Result<StableId> {
    let needle = query.to_lowercase();

    let exact: Vec<&ItemSummary> = candidates
        .iter()
        .filter(|c| c.name.to_lowercase() == needle)
        .collect();
    let matches = if exact.is_empty() {
        candidates
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .collect()
    } else {
        exact
    };

    match matches.as_slice() {
        [] => Err(WatchError::NotFound(query.to_string())),
        [only] => Ok(only.id),
        many => Err(ambiguous(query, many)),
    }
}

fn ambiguous(query: &str, matches: &[&ItemSummary]) -> WatchError {
    let mut sorted = matches.to_vec();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    WatchError::Ambiguous {
        query: query.to_string(),
        candidates: sorted
            .iter()
            .take(MAX_LISTED_CANDIDATES)
            .map(|c| format!("{} ({})", c.name, c.id))
            .collect(),
        total: matches.len(),
    }
}
