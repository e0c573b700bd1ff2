use crate::{
    digest::{self, DigestFragment, DigestReport},
    dna_sequence::{SequenceRecord, Topology},
    enzymes::EnzymeCatalog,
    error::CloningError,
    ids::{IdGenerator, UuidIds},
    ligation::{self, LigationProduct},
    ligation_protocol::{LigationParams, LigationProtocol},
    pairing::{self, EnzymePair},
    restriction_enzyme::{RestrictionEnzyme, RestrictionSite},
    site_finder::{self, SiteMap},
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParameters {
    /// Spread site search over the rayon pool.
    pub parallel_site_search: bool,
    /// Smallest enzyme set worth searching in parallel.
    pub parallel_min_enzymes: usize,
    /// Insert:vector ratio for `ligate` and for generated ligation params.
    pub default_molar_ratio: f64,
}

impl Default for EngineParameters {
    fn default() -> Self {
        Self {
            parallel_site_search: false,
            parallel_min_enzymes: 64,
            default_molar_ratio: 3.0,
        }
    }
}

impl EngineParameters {
    pub fn from_json(text: &str) -> Result<Self, CloningError> {
        let ret: Self = serde_json::from_str(text)?;
        ret.validate()?;
        Ok(ret)
    }

    pub fn load_from_path(path: &str) -> Result<Self, CloningError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Sets one parameter by name from a JSON value.
    pub fn set(&mut self, name: &str, value: &serde_json::Value) -> Result<(), CloningError> {
        let invalid = |expected: &str| {
            CloningError::InvalidParameter(format!("{name} requires {expected}, got {value}"))
        };
        match name {
            "parallel_site_search" => {
                self.parallel_site_search = value.as_bool().ok_or_else(|| invalid("a boolean"))?;
            }
            "parallel_min_enzymes" => {
                let raw = value
                    .as_u64()
                    .filter(|v| *v > 0)
                    .ok_or_else(|| invalid("a positive integer"))?;
                self.parallel_min_enzymes = raw as usize;
            }
            "default_molar_ratio" => {
                self.default_molar_ratio = value
                    .as_f64()
                    .filter(|v| v.is_finite() && *v > 0.0)
                    .ok_or_else(|| invalid("a positive number"))?;
            }
            _ => {
                return Err(CloningError::InvalidParameter(format!(
                    "unknown parameter '{name}'"
                )));
            }
        }
        log::debug!("Set parameter '{name}' to {value}");
        Ok(())
    }

    fn validate(&self) -> Result<(), CloningError> {
        if self.parallel_min_enzymes == 0 {
            return Err(CloningError::InvalidParameter(
                "parallel_min_enzymes must be >= 1".to_string(),
            ));
        }
        if !self.default_molar_ratio.is_finite() || self.default_molar_ratio <= 0.0 {
            return Err(CloningError::InvalidParameter(format!(
                "default_molar_ratio must be positive, got {}",
                self.default_molar_ratio
            )));
        }
        Ok(())
    }
}

/// Entry point bundling a catalog, an ID source and parameters. All calls take
/// `&self`; share it across threads behind an `Arc`.
#[derive(Clone)]
pub struct CloningEngine {
    catalog: Arc<EnzymeCatalog>,
    ids: Arc<dyn IdGenerator>,
    parameters: EngineParameters,
}

impl fmt::Debug for CloningEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloningEngine")
            .field("enzymes", &self.catalog.len())
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl CloningEngine {
    pub fn new(catalog: EnzymeCatalog) -> Self {
        Self::from_shared(Arc::new(catalog))
    }

    pub fn from_shared(catalog: Arc<EnzymeCatalog>) -> Self {
        Self {
            catalog,
            ids: Arc::new(UuidIds),
            parameters: EngineParameters::default(),
        }
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_parameters(mut self, parameters: EngineParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn catalog(&self) -> &EnzymeCatalog {
        &self.catalog
    }

    pub fn parameters(&self) -> &EngineParameters {
        &self.parameters
    }

    pub fn find_sites(
        &self,
        sequence: &str,
        enzymes: &[&RestrictionEnzyme],
        topology: Topology,
    ) -> SiteMap {
        if self.parameters.parallel_site_search
            && enzymes.len() >= self.parameters.parallel_min_enzymes
        {
            site_finder::find_sites_parallel(sequence, enzymes, topology)
        } else {
            site_finder::find_sites(sequence, enzymes, topology)
        }
    }

    /// Sites in `record` for catalog enzymes picked by name; an empty name
    /// list searches the whole catalog.
    pub fn find_sites_by_name(&self, record: &SequenceRecord, names: &[&str]) -> SiteMap {
        let enzymes: Vec<&RestrictionEnzyme> = match names {
            [] => self.catalog.restriction_enzymes().collect(),
            names => self.catalog.select(names),
        };
        self.find_sites(record.sequence(), &enzymes, record.topology())
    }

    pub fn digest(
        &self,
        record: &SequenceRecord,
        sites: &[RestrictionSite],
    ) -> Vec<DigestFragment> {
        self.digest_with_report(record, sites).fragments
    }

    pub fn digest_with_report(
        &self,
        record: &SequenceRecord,
        sites: &[RestrictionSite],
    ) -> DigestReport {
        digest::digest_with_report(record, sites, &self.catalog, self.ids.as_ref())
    }

    pub fn predict_products(
        &self,
        vector: &DigestFragment,
        insert: &DigestFragment,
    ) -> Vec<LigationProduct> {
        ligation::predict_products_with_ids(vector, insert, None, self.ids.as_ref())
    }

    /// Like [`ligation::ligate`], at the configured molar ratio.
    pub fn ligate(
        &self,
        fragments: &[DigestFragment],
    ) -> Result<Vec<LigationProduct>, CloningError> {
        ligation::ligate(
            fragments,
            Some(self.parameters.default_molar_ratio),
            self.ids.as_ref(),
        )
    }

    pub fn ligation_protocol(
        &self,
        params: &LigationParams,
    ) -> Result<LigationProtocol, CloningError> {
        LigationProtocol::compute(params)
    }

    /// Protocol inputs for joining two fragments, with the configured molar
    /// ratio and the remaining fields at their defaults.
    pub fn ligation_params_for(
        &self,
        vector: &DigestFragment,
        insert: &DigestFragment,
    ) -> LigationParams {
        LigationParams {
            vector_length_bp: vector.length as f64,
            insert_length_bp: insert.length as f64,
            molar_ratio: self.parameters.default_molar_ratio,
            ..Default::default()
        }
    }

    pub fn suggest_pairs(&self, vector_sites: &SiteMap, insert_sites: &SiteMap) -> Vec<EnzymePair> {
        pairing::suggest_pairs(vector_sites, insert_sites, &self.catalog)
    }
}
