//! Picking a repository out of a listing

use crate::error::SelectionError;
use crate::repositories::RepositorySummary;

/// Return the repository at `index`
pub fn select_repository(
    list: &[RepositorySummary],
    index: usize,
) -> Result<RepositorySummary, SelectionError> {
    if list.is_empty() {
        return Err(SelectionError::Empty);
    }
    list.get(index)
        .cloned()
        .ok_or(SelectionError::OutOfRange {
            index,
            len: list.len(),
        })
}

/// Parse a typed index and check it against a list of `len` entries
pub fn parse_selection(input: &str, len: usize) -> Result<usize, SelectionError> {
    if len == 0 {
        return Err(SelectionError::Empty);
    }
    let trimmed = input.trim();
    let index = trimmed
        .parse::<usize>()
        .map_err(|_| SelectionError::NotANumber(trimmed.to_string()))?;
    if index >= len {
        return Err(SelectionError::OutOfRange { index, len });
    }
    Ok(index)
}

fn qualified_name(repo: &RepositorySummary) -> Option<String> {
    repo.full_name()
        .map(str::to_string)
        .or_else(|| Some(format!("{}/{}", repo.owner_login()?, repo.name)))
}

/// Find a repository by exact `name` or `owner/name`
///
/// A bare name that several owners share is rejected instead of guessed.
pub fn find_repository<'a>(
    list: &'a [RepositorySummary],
    name: &str,
) -> Result<&'a RepositorySummary, SelectionError> {
    if name.contains('/') {
        return list
            .iter()
            .find(|repo| qualified_name(repo).as_deref() == Some(name))
            .ok_or_else(|| SelectionError::NotFound(name.to_string()));
    }

    let matches: Vec<&RepositorySummary> = list.iter().filter(|repo| repo.name == name).collect();
    match matches.as_slice() {
        [] => Err(SelectionError::NotFound(name.to_string())),
        [repo] => Ok(*repo),
        _ => Err(SelectionError::Ambiguous {
            name: name.to_string(),
            candidates: matches
                .iter()
                .map(|repo| qualified_name(repo).unwrap_or_else(|| repo.name.clone()))
                .collect(),
        }),
    }
}
