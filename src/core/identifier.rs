use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::IdentifierKind;
use crate::utils::validation::{
    isbn10_check_digit, isbn13_check_digit, is_doi_shaped, is_isbn_shaped,
};

/// Prefixes a DOI is sometimes written with in reading lists
const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

/// Bookland prefix that ISBN-10 numbers are embedded under
const ISBN13_PREFIX: &str = "978";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Invalid identifier: '{0}' is neither a DOI nor an ISBN")]
    InvalidIdentifier(String),
}

/// A canonical identifier plus the alternate spellings registries index it under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedIdentifier {
    pub kind: IdentifierKind,

    /// Canonical form (trimmed DOI, or cleaned ISBN digits)
    pub canonical: String,

    /// All lookup forms, canonical first, without duplicates
    pub variants: Vec<String>,
}

impl NormalizedIdentifier {
    /// Keys to query registries with.
    ///
    /// DOIs collapse to the single canonical form; ISBNs use every variant.
    pub fn lookup_keys(&self) -> &[String] {
        match self.kind {
            IdentifierKind::Doi => std::slice::from_ref(&self.canonical),
            IdentifierKind::Isbn => &self.variants,
        }
    }
}

/// Classify a raw identifier by its shape.
///
/// # Errors
///
/// Returns `IdentifierError::InvalidIdentifier` if the value looks like neither a
/// DOI (`10.` prefix) nor an ISBN (digit/hyphen run).
pub fn detect_kind(raw: &str) -> Result<IdentifierKind, IdentifierError> {
    let stripped = strip_doi_prefix(raw.trim());
    if is_doi_shaped(stripped) {
        Ok(IdentifierKind::Doi)
    } else if is_isbn_shaped(raw) {
        Ok(IdentifierKind::Isbn)
    } else {
        Err(IdentifierError::InvalidIdentifier(raw.to_string()))
    }
}

/// Canonicalize a raw identifier into its comparable variants.
///
/// Normalizing the canonical member of the result again reproduces it.
///
/// # Errors
///
/// Returns `IdentifierError::InvalidIdentifier` if `raw` does not have the shape
/// of `kind`. A value with the right character class but the wrong length is
/// not an error: it is returned unchanged as the only variant.
pub fn normalize(raw: &str, kind: IdentifierKind) -> Result<NormalizedIdentifier, IdentifierError> {
    match kind {
        IdentifierKind::Doi => normalize_doi(raw),
        IdentifierKind::Isbn => normalize_isbn(raw),
    }
}

fn normalize_doi(raw: &str) -> Result<NormalizedIdentifier, IdentifierError> {
    let doi = strip_doi_prefix(raw.trim());
    if !is_doi_shaped(doi) {
        return Err(IdentifierError::InvalidIdentifier(raw.to_string()));
    }

    Ok(NormalizedIdentifier {
        kind: IdentifierKind::Doi,
        canonical: doi.to_string(),
        variants: vec![doi.to_string()],
    })
}

fn normalize_isbn(raw: &str) -> Result<NormalizedIdentifier, IdentifierError> {
    if !is_isbn_shaped(raw) {
        return Err(IdentifierError::InvalidIdentifier(raw.to_string()));
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let mut variants = vec![cleaned.clone()];

    let isbn13 = match cleaned.len() {
        10 => isbn10_to_isbn13(&cleaned),
        13 if cleaned.bytes().all(|b| b.is_ascii_digit()) => Some(cleaned.clone()),
        _ => None,
    };

    if let Some(isbn13) = isbn13 {
        if isbn13.starts_with(ISBN13_PREFIX) {
            // Body without prefix and check digit, e.g. 978[379651914]7
            let core = isbn13[3..12].to_string();
            let isbn10 = isbn10_check_digit(&core).map(|check| format!("{core}{check}"));

            push_unique(&mut variants, isbn13);
            if let Some(isbn10) = isbn10 {
                push_unique(&mut variants, isbn10);
            }
            push_unique(&mut variants, core);
        } else {
            push_unique(&mut variants, isbn13);
        }
    }

    Ok(NormalizedIdentifier {
        kind: IdentifierKind::Isbn,
        canonical: cleaned,
        variants,
    })
}

/// Convert an ISBN-10 to its ISBN-13 form under the `978` prefix.
///
/// Returns `None` if the first nine characters are not all digits.
pub fn isbn10_to_isbn13(isbn10: &str) -> Option<String> {
    let body_digits = isbn10.get(..9)?;
    if !body_digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let body = format!("{ISBN13_PREFIX}{body_digits}");
    let check = isbn13_check_digit(&body)?;
    Some(format!("{body}{check}"))
}

fn strip_doi_prefix(value: &str) -> &str {
    for prefix in DOI_PREFIXES {
        let matches = value
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            return value[prefix.len()..].trim_start();
        }
    }
    value
}

fn push_unique(variants: &mut Vec<String>, value: String) {
    if !variants.contains(&value) {
        variants.push(value);
    }
}
