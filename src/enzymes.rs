use crate::{
    error::CloningError,
    restriction_enzyme::{RestrictionEnzyme, RestrictionEnzymeEntry},
};
use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path};

const BUILTIN_ENZYMES_JSON: &str = include_str!("../assets/enzymes.json");

/// Read-only lookup table of restriction enzymes, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct EnzymeCatalog {
    restriction_enzymes: BTreeMap<String, RestrictionEnzyme>,
    max_re_length: usize,
    has_nonpalindromic_restriction_enzymes: bool,
}

impl EnzymeCatalog {
    pub fn new(enzymes: Vec<RestrictionEnzyme>) -> Result<Self, CloningError> {
        let mut ret = Self::default();
        for re in enzymes {
            if ret.restriction_enzymes.contains_key(&re.name) {
                return Err(CloningError::malformed(&re.name, "duplicate catalog entry"));
            }
            ret.restriction_enzymes.insert(re.name.to_owned(), re);
        }
        ret.recompute_derived_fields();
        Ok(ret)
    }

    /// Parses a JSON array of enzyme entries. An entry whose `type` is not
    /// `restriction` fails the whole catalog, as does a single malformed entry.
    pub fn from_json_text(json_text: &str) -> Result<Self> {
        let res: serde_json::Value =
            serde_json::from_str(json_text).context("Enzyme catalog is not valid JSON")?;
        let arr = res
            .as_array()
            .ok_or(anyhow!("Enzyme catalog is not a JSON array"))?;
        let mut enzymes = Vec::with_capacity(arr.len());
        for (idx, row) in arr.iter().enumerate() {
            match row.get("type").map(|t| t.as_str()) {
                None | Some(Some("restriction")) => {}
                Some(Some(other)) => bail!("Unknown enzyme type '{other}' in entry {idx}"),
                Some(None) => bail!("Enzyme type of entry {idx} is not a string"),
            }
            let entry = RestrictionEnzymeEntry::deserialize(row)
                .with_context(|| format!("Bad restriction enzyme entry {idx}: {row}"))?;
            let re = RestrictionEnzyme::try_from(entry)
                .with_context(|| format!("Bad restriction enzyme entry {idx}"))?;
            enzymes.push(re);
        }
        Ok(Self::new(enzymes)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read enzyme catalog '{}'", path.display()))?;
        Self::from_json_text(&text)
            .with_context(|| format!("Could not load enzyme catalog '{}'", path.display()))
    }

    /// The catalog bundled with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json_text(BUILTIN_ENZYMES_JSON).context("Bundled enzyme catalog")
    }

    pub fn get(&self, name: &str) -> Option<&RestrictionEnzyme> {
        self.restriction_enzymes.get(name)
    }

    pub fn get_required(&self, name: &str) -> Result<&RestrictionEnzyme, CloningError> {
        self.get(name)
            .ok_or_else(|| CloningError::EnzymeNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.restriction_enzymes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.restriction_enzymes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restriction_enzymes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.restriction_enzymes.keys().map(|k| k.as_str())
    }

    pub fn restriction_enzymes(&self) -> impl Iterator<Item = &RestrictionEnzyme> {
        self.restriction_enzymes.values()
    }

    pub fn max_recognition_len(&self) -> usize {
        self.max_re_length
    }

    pub fn has_nonpalindromic_restriction_enzymes(&self) -> bool {
        self.has_nonpalindromic_restriction_enzymes
    }

    /// Resolves `names` against the catalog, exact match first, then ignoring
    /// case. Unknown names are logged and left out; duplicates are collapsed.
    pub fn select(&self, names: &[&str]) -> Vec<&RestrictionEnzyme> {
        let mut ret: Vec<&RestrictionEnzyme> = Vec::with_capacity(names.len());
        for name in names {
            let found = self.get(name).or_else(|| {
                self.restriction_enzymes
                    .values()
                    .find(|re| re.name.eq_ignore_ascii_case(name))
            });
            match found {
                Some(re) if !ret.iter().any(|r| r.name == re.name) => ret.push(re),
                Some(_) => {}
                None => log::warn!("Enzyme '{name}' is not in the catalog, ignored"),
            }
        }
        ret
    }

    fn recompute_derived_fields(&mut self) {
        self.max_re_length = self
            .restriction_enzymes
            .values()
            .map(|re| re.recognition_len())
            .max()
            .unwrap_or(0);
        self.has_nonpalindromic_restriction_enzymes = self
            .restriction_enzymes
            .values()
            .any(|re| !re.is_palindromic());
    }
}
