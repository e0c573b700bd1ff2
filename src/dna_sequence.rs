use crate::{error::CloningError, gc_contents::gc_percent, iupac_code::IupacCode};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, ops::Range};

const WATER_MASS: f64 = 18.0153;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    #[default]
    Linear,
    Circular,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn flipped(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }
}

impl From<Strand> for i8 {
    fn from(strand: Strand) -> Self {
        match strand {
            Strand::Forward => 1,
            Strand::Reverse => -1,
        }
    }
}

impl TryFrom<i8> for Strand {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Strand::Forward),
            -1 => Ok(Strand::Reverse),
            other => Err(format!("strand must be 1 or -1, not {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Gene,
    Cds,
    Promoter,
    Terminator,
    RepOrigin,
    PrimerBind,
    ProteinBind,
    Rbs,
    #[serde(other)]
    MiscFeature,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FeatureData")]
pub struct Feature {
    start: usize,
    end: usize,
    strand: Strand,
    #[serde(rename = "type")]
    feature_type: FeatureType,
    qualifiers: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct FeatureData {
    start: usize,
    end: usize,
    strand: Strand,
    #[serde(rename = "type")]
    feature_type: FeatureType,
    #[serde(default)]
    qualifiers: BTreeMap<String, String>,
}

impl TryFrom<FeatureData> for Feature {
    type Error = CloningError;

    fn try_from(data: FeatureData) -> Result<Self, Self::Error> {
        Feature::new(data.start, data.end, data.strand, data.feature_type)
            .map(|f| f.with_qualifiers(data.qualifiers))
    }
}

impl Feature {
    pub fn new(
        start: usize,
        end: usize,
        strand: Strand,
        feature_type: FeatureType,
    ) -> Result<Self, CloningError> {
        if start >= end {
            return Err(CloningError::InvalidFeature(format!(
                "start {start} must be before end {end}"
            )));
        }
        Ok(Self {
            start,
            end,
            strand,
            feature_type,
            qualifiers: BTreeMap::new(),
        })
    }

    pub fn with_qualifiers(mut self, qualifiers: BTreeMap<String, String>) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    pub fn with_qualifier(mut self, key: &str, value: &str) -> Self {
        self.qualifiers.insert(key.to_string(), value.to_string());
        self
    }

    #[inline(always)]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline(always)]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn feature_type(&self) -> FeatureType {
        self.feature_type
    }

    pub fn qualifiers(&self) -> &BTreeMap<String, String> {
        &self.qualifiers
    }

    pub fn label(&self) -> Option<&str> {
        self.qualifiers.get("label").map(|s| s.as_str())
    }

    /// Same feature moved to `start`; the length is unchanged.
    pub(crate) fn moved_to(&self, start: usize) -> Self {
        Self {
            start,
            end: start + self.len(),
            ..self.clone()
        }
    }

    /// Mirrors the feature onto the reverse complement of a region of
    /// `region_len` bases.
    pub(crate) fn mirrored(&self, region_len: usize) -> Self {
        Self {
            start: region_len - self.end,
            end: region_len - self.start,
            strand: self.strand.flipped(),
            ..self.clone()
        }
    }
}

/// A validated DNA sequence with its annotations. Built once, then read-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SequenceRecordData")]
pub struct SequenceRecord {
    name: Option<String>,
    description: Option<String>,
    sequence: String,
    length: usize,
    topology: Topology,
    features: Vec<Feature>,
    gc_content: f64,
    molecular_weight: f64,
}

#[derive(Deserialize)]
struct SequenceRecordData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    sequence: String,
    #[serde(default)]
    topology: Topology,
    #[serde(default)]
    features: Vec<Feature>,
}

impl TryFrom<SequenceRecordData> for SequenceRecord {
    type Error = CloningError;

    fn try_from(data: SequenceRecordData) -> Result<Self, Self::Error> {
        let mut ret = SequenceRecord::new(&data.sequence, data.topology, data.features)?;
        ret.name = data.name;
        ret.description = data.description;
        Ok(ret)
    }
}

impl SequenceRecord {
    pub fn new(
        sequence: &str,
        topology: Topology,
        features: Vec<Feature>,
    ) -> Result<Self, CloningError> {
        let sequence = Self::validate_dna_sequence(sequence.as_bytes())?;
        let length = sequence.len();
        if let Some(bad) = features.iter().find(|f| f.end > length) {
            return Err(CloningError::InvalidFeature(format!(
                "feature {}..{} extends past sequence end {length}",
                bad.start, bad.end
            )));
        }
        let gc_content = gc_percent(sequence.as_bytes());
        let molecular_weight = molecular_weight(sequence.as_bytes(), topology);
        Ok(Self {
            name: None,
            description: None,
            sequence,
            length,
            topology,
            features,
            gc_content,
            molecular_weight,
        })
    }

    pub fn from_sequence(sequence: &str) -> Result<Self, CloningError> {
        Self::new(sequence, Topology::Linear, vec![])
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Strips whitespace and uppercases. Fails on the first letter that is not
    /// an IUPAC nucleotide code.
    pub fn validate_dna_sequence(v: &[u8]) -> Result<String, CloningError> {
        let mut ret = String::with_capacity(v.len());
        for (pos, c) in v.iter().filter(|c| !c.is_ascii_whitespace()).enumerate() {
            if !IupacCode::is_valid_letter(*c) {
                return Err(CloningError::InvalidSequence(format!(
                    "invalid nucleotide '{}' at position {pos}",
                    c.escape_ascii()
                )));
            }
            ret.push(c.to_ascii_uppercase() as char);
        }
        Ok(ret)
    }

    #[inline(always)]
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    #[inline(always)]
    pub fn forward(&self) -> &[u8] {
        self.sequence.as_bytes()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn is_circular(&self) -> bool {
        self.topology == Topology::Circular
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn gc_content(&self) -> f64 {
        self.gc_content
    }

    pub fn molecular_weight(&self) -> f64 {
        self.molecular_weight
    }

    /// Bases in `range`. On circular sequences a range with `end <= start`
    /// runs over the origin; linear sequences return `None` for it.
    pub fn get_range_safe(&self, range: Range<usize>) -> Option<String> {
        let Range { start, end } = range;
        let len = self.len();
        if start > len || end > len {
            return None;
        }
        if start < end {
            return Some(self.sequence[start..end].to_string());
        }
        if !self.is_circular() {
            return None;
        }
        let mut ret = String::with_capacity(len - start + end);
        ret.push_str(&self.sequence[start..]);
        ret.push_str(&self.sequence[..end]);
        Some(ret)
    }
}

impl fmt::Display for SequenceRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.sequence)
    }
}

#[inline(always)]
fn nucleotide_weight(letter: u8) -> f64 {
    let bases = IupacCode::from_letter(letter).to_vec();
    if bases.is_empty() {
        return 0.0;
    }
    let total: f64 = bases
        .iter()
        .map(|b| match b {
            b'A' => 331.2218,
            b'C' => 307.1971,
            b'G' => 347.2212,
            _ => 322.2085,
        })
        .sum();
    total / bases.len() as f64
}

fn strand_weight(sequence: impl Iterator<Item = u8>, topology: Topology) -> f64 {
    let mut n = 0usize;
    let mut weight = 0.0;
    for letter in sequence {
        weight += nucleotide_weight(letter);
        n += 1;
    }
    if n == 0 {
        return 0.0;
    }
    weight -= (n - 1) as f64 * WATER_MASS;
    if topology == Topology::Circular {
        weight -= WATER_MASS;
    }
    weight
}

/// Double-stranded molecular weight in Daltons.
pub fn molecular_weight(sequence: &[u8], topology: Topology) -> f64 {
    let forward = strand_weight(sequence.iter().copied(), topology);
    let reverse = strand_weight(
        sequence.iter().map(|c| IupacCode::letter_complement(*c)),
        topology,
    );
    forward + reverse
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(start: usize, end: usize) -> Feature {
        Feature::new(start, end, Strand::Forward, FeatureType::Gene).unwrap()
    }

    #[test]
    fn test_from_sequence_normalizes() {
        let seq = SequenceRecord::from_sequence("atg cga\nattc").unwrap();
        assert_eq!(seq.sequence(), "ATGCGAATTC");
        assert_eq!(seq.len(), 10);
        assert!(!seq.is_circular());
    }

    #[test]
    fn test_invalid_letter_is_rejected_with_reason() {
        let err = SequenceRecord::from_sequence("ATGXC").unwrap_err();
        assert!(err.to_string().contains("'X' at position 3"));
        assert!(SequenceRecord::from_sequence("AUG").is_err());
    }

    #[test]
    fn test_ambiguity_codes_accepted() {
        let seq = SequenceRecord::from_sequence("ACGTNRYKMSWBDHV").unwrap();
        assert_eq!(seq.len(), 15);
    }

    #[test]
    fn test_feature_bounds() {
        assert!(Feature::new(5, 5, Strand::Forward, FeatureType::Cds).is_err());
        assert!(Feature::new(6, 5, Strand::Forward, FeatureType::Cds).is_err());
        assert!(SequenceRecord::new("ACGT", Topology::Linear, vec![feature(0, 4)]).is_ok());
        let err = SequenceRecord::new("ACGT", Topology::Linear, vec![feature(1, 5)]).unwrap_err();
        assert!(matches!(err, CloningError::InvalidFeature(_)));
    }

    #[test]
    fn test_gc_content() {
        let seq = SequenceRecord::from_sequence("GGCCAATT").unwrap();
        assert_eq!(seq.gc_content(), 50.0);
    }

    #[test]
    fn test_molecular_weight() {
        assert_eq!(molecular_weight(b"", Topology::Linear), 0.0);
        // A/T pair: 331.2218 + 322.2085
        let at = molecular_weight(b"A", Topology::Linear);
        assert!((at - 653.4303).abs() < 1e-9);
        let linear = molecular_weight(b"ACGT", Topology::Linear);
        let circular = molecular_weight(b"ACGT", Topology::Circular);
        assert!((linear - circular - 2.0 * WATER_MASS).abs() < 1e-9);
        // N is the mean of the four bases on both strands.
        let n = molecular_weight(b"N", Topology::Linear);
        let mean = (331.2218 + 307.1971 + 347.2212 + 322.2085) / 4.0;
        assert!((n - 2.0 * mean).abs() < 1e-9);
    }

    #[test]
    fn test_get_range_safe() {
        let linear = SequenceRecord::from_sequence("AACCGGTT").unwrap();
        assert_eq!(linear.get_range_safe(2..4), Some("CC".to_string()));
        assert_eq!(linear.get_range_safe(6..2), None);
        assert_eq!(linear.get_range_safe(2..9), None);
        let circular = SequenceRecord::new("AACCGGTT", Topology::Circular, vec![]).unwrap();
        assert_eq!(circular.get_range_safe(6..2), Some("TTAA".to_string()));
        assert_eq!(circular.get_range_safe(3..3), Some("CGGTTAAC".to_string()));
    }

    #[test]
    fn test_serde_round_trip_recomputes_derived_fields() {
        let json = r#"{
            "name": "pTiny",
            "sequence": "acgtacgt",
            "topology": "circular",
            "gc_content": 99.0,
            "features": [
                {"start": 0, "end": 4, "strand": -1, "type": "promoter", "qualifiers": {"label": "P1"}},
                {"start": 4, "end": 8, "strand": 1, "type": "enhancer"}
            ]
        }"#;
        let seq: SequenceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(seq.name(), Some("pTiny"));
        assert_eq!(seq.sequence(), "ACGTACGT");
        assert!(seq.is_circular());
        assert_eq!(seq.gc_content(), 50.0);
        assert_eq!(seq.features()[0].strand(), Strand::Reverse);
        assert_eq!(seq.features()[0].label(), Some("P1"));
        assert_eq!(seq.features()[1].feature_type(), FeatureType::MiscFeature);

        let value = serde_json::to_value(&seq).unwrap();
        assert_eq!(value["length"], 8);
        assert_eq!(value["features"][0]["strand"], -1);
        let again: SequenceRecord = serde_json::from_value(value).unwrap();
        assert_eq!(again, seq);
    }

    #[test]
    fn test_serde_rejects_bad_feature() {
        let json = r#"{"sequence": "ACGT", "features": [{"start": 2, "end": 9, "strand": 1, "type": "gene"}]}"#;
        assert!(serde_json::from_str::<SequenceRecord>(json).is_err());
        let json = r#"{"sequence": "ACGT", "features": [{"start": 0, "end": 2, "strand": 0, "type": "gene"}]}"#;
        assert!(serde_json::from_str::<SequenceRecord>(json).is_err());
    }

    #[test]
    fn test_feature_mirrored() {
        let f = feature(1, 3).mirrored(10);
        assert_eq!((f.start(), f.end()), (7, 9));
        assert_eq!(f.strand(), Strand::Reverse);
        let g = feature(1, 3).moved_to(5);
        assert_eq!((g.start(), g.end()), (5, 7));
    }
}
