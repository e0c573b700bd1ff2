//! Restriction site search, digest simulation, ligation prediction and enzyme
//! pair ranking over DNA sequences.
//!
//! Everything runs against an explicit [`EnzymeCatalog`]; there is no global
//! state. [`CloningEngine`] bundles the catalog with an ID source and
//! parameters.

pub mod digest;
pub mod dna_sequence;
pub mod engine;
pub mod enzymes;
pub mod error;
pub mod gc_contents;
pub mod ids;
pub mod iupac_code;
pub mod ligation;
pub mod ligation_protocol;
pub mod pairing;
pub mod restriction_enzyme;
pub mod site_finder;

pub use digest::{DigestFragment, DigestReport, DigestStats, EndType, FragmentEnd, digest};
pub use dna_sequence::{Feature, FeatureType, SequenceRecord, Strand, Topology};
pub use engine::{CloningEngine, EngineParameters};
pub use enzymes::EnzymeCatalog;
pub use error::{CloningError, ErrorCode};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use ligation::{LigationProduct, ProductType, compatible, predict_products};
pub use ligation_protocol::{LigationParams, LigationProtocol};
pub use pairing::{EnzymePair, suggest_pairs};
pub use restriction_enzyme::{OverhangType, RestrictionEnzyme, RestrictionSite};
pub use site_finder::{SiteMap, find_sites, merge_sites};
