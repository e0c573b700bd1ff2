use crate::{
    dna_sequence::{Strand, Topology},
    error::CloningError,
    iupac_code::reverse_complement,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverhangType {
    #[serde(rename = "blunt")]
    Blunt,
    #[serde(rename = "5'")]
    FivePrime,
    #[serde(rename = "3'")]
    ThreePrime,
}

/// One catalog entry. Construct through [`RestrictionEnzyme::new`] or by
/// deserializing, both of which validate the entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RestrictionEnzymeEntry")]
pub struct RestrictionEnzyme {
    pub name: String,
    pub recognition_seq: String,
    /// Top-strand cut for a forward match, relative to the recognition start.
    pub cut_pos5: isize,
    /// Top-strand cut for a reverse-strand match, relative to the start of the
    /// matched reverse complement. Equal to `cut_pos5` for palindromic sites;
    /// for BsaI (GGTCTC N1/N5) it is -5.
    pub cut_pos3: isize,
    pub overhang_type: OverhangType,
    pub overhang_seq: String,
    pub buffers: BTreeSet<String>,
    pub star_activity: bool,
    pub methylation_sensitive: bool,
    pub heat_inactivation: Option<u16>,
    #[serde(skip_serializing)]
    is_palindromic: bool,
}

/// Catalog JSON as written by hand; every numeric or overhang field may be
/// missing, and a missing one is reported by name.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RestrictionEnzymeEntry {
    name: String,
    recognition_seq: Option<String>,
    cut_pos5: Option<isize>,
    cut_pos3: Option<isize>,
    overhang_type: Option<OverhangType>,
    overhang_seq: Option<String>,
    #[serde(default)]
    buffers: BTreeSet<String>,
    #[serde(default)]
    star_activity: bool,
    #[serde(default)]
    methylation_sensitive: bool,
    #[serde(default)]
    heat_inactivation: Option<u16>,
}

impl TryFrom<RestrictionEnzymeEntry> for RestrictionEnzyme {
    type Error = CloningError;

    fn try_from(entry: RestrictionEnzymeEntry) -> Result<Self, Self::Error> {
        let name = entry.name;
        let missing = |field: &str| CloningError::malformed(&name, format!("missing {field}"));
        let sequence = entry.recognition_seq.ok_or_else(|| missing("recognition_seq"))?;
        let cut_pos5 = entry.cut_pos5.ok_or_else(|| missing("cut_pos5"))?;
        let cut_pos3 = entry.cut_pos3.ok_or_else(|| missing("cut_pos3"))?;
        let overhang_type = entry.overhang_type.ok_or_else(|| missing("overhang_type"))?;
        let overhang_seq = entry.overhang_seq.unwrap_or_default();
        let mut ret = RestrictionEnzyme::new(
            &name,
            &sequence,
            cut_pos5,
            cut_pos3,
            overhang_type,
            &overhang_seq,
        )?;
        ret.buffers = entry.buffers;
        ret.star_activity = entry.star_activity;
        ret.methylation_sensitive = entry.methylation_sensitive;
        ret.heat_inactivation = entry.heat_inactivation;
        Ok(ret)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionSite {
    pub enzyme: String,
    pub strand: Strand,
    pub recognition_start: usize,
    /// Exclusive, and not reduced modulo the length: on a circular sequence a
    /// site running over the origin ends past `length`.
    pub recognition_end: usize,
    /// Cut coordinate in `[0, length)`.
    pub position: usize,
    /// Top-strand bases between the two strand cuts, read from the sequence.
    /// `None` for blunt cutters, and on linear sequences when the overhang
    /// would run off an end.
    #[serde(default)]
    pub overhang_seq: Option<String>,
}

impl RestrictionEnzyme {
    pub fn new(
        name: &str,
        sequence: &str,
        cut_pos5: isize,
        cut_pos3: isize,
        overhang_type: OverhangType,
        overhang_seq: &str,
    ) -> Result<Self, CloningError> {
        if name.trim().is_empty() {
            return Err(CloningError::malformed(name, "empty name"));
        }
        let sequence = sequence.trim().to_ascii_uppercase();
        if sequence.is_empty() {
            return Err(CloningError::malformed(name, "empty recognition sequence"));
        }
        if let Some(c) = sequence.bytes().find(|c| !matches!(c, b'A' | b'C' | b'G' | b'T')) {
            return Err(CloningError::malformed(
                name,
                format!("recognition sequence contains '{}'", c as char),
            ));
        }
        let overhang_seq = overhang_seq.trim().to_ascii_uppercase();
        match overhang_type {
            OverhangType::Blunt if !overhang_seq.is_empty() => {
                return Err(CloningError::malformed(
                    name,
                    "blunt cutter with an overhang sequence",
                ));
            }
            OverhangType::FivePrime | OverhangType::ThreePrime if overhang_seq.is_empty() => {
                return Err(CloningError::malformed(
                    name,
                    "sticky cutter without an overhang sequence",
                ));
            }
            _ => {}
        }
        let mut ret = Self {
            name: name.to_string(),
            recognition_seq: sequence,
            cut_pos5,
            cut_pos3,
            overhang_type,
            overhang_seq,
            buffers: BTreeSet::new(),
            star_activity: false,
            methylation_sensitive: false,
            heat_inactivation: None,
            is_palindromic: false,
        };
        ret.check_palindromic();
        Ok(ret)
    }

    pub fn with_buffers(mut self, buffers: &[&str]) -> Self {
        self.buffers = buffers.iter().map(|b| b.to_string()).collect();
        self
    }

    pub fn with_star_activity(mut self, star_activity: bool) -> Self {
        self.star_activity = star_activity;
        self
    }

    pub fn with_methylation_sensitivity(mut self, sensitive: bool) -> Self {
        self.methylation_sensitive = sensitive;
        self
    }

    pub fn with_heat_inactivation(mut self, celsius: Option<u16>) -> Self {
        self.heat_inactivation = celsius;
        self
    }

    fn check_palindromic(&mut self) {
        self.is_palindromic = self.recognition_seq == self.get_sequence_rc();
    }

    pub fn is_palindromic(&self) -> bool {
        self.is_palindromic
    }

    pub fn get_sequence_rc(&self) -> String {
        reverse_complement(&self.recognition_seq)
    }

    pub fn recognition_len(&self) -> usize {
        self.recognition_seq.len()
    }

    /// Cut coordinate for a match starting at `recognition_start`, before any
    /// wrapping or bounds check.
    fn raw_cut(&self, recognition_start: usize, strand: Strand) -> isize {
        let offset = match strand {
            Strand::Forward => self.cut_pos5,
            Strand::Reverse => self.cut_pos3,
        };
        recognition_start as isize + offset
    }

    /// The bases between the top-strand cut at `raw_cut` and the bottom-strand
    /// cut. A 5' overhang lies right of the top-strand cut and a 3' overhang
    /// left of it, whichever strand the recognition site is on.
    fn overhang_at(&self, sequence: &[u8], raw_cut: isize, topology: Topology) -> Option<String> {
        let len = self.overhang_seq.len() as isize;
        let from = match self.overhang_type {
            OverhangType::Blunt => return None,
            OverhangType::FivePrime => raw_cut,
            OverhangType::ThreePrime => raw_cut - len,
        };
        let seq_len = sequence.len() as isize;
        let bases: Option<Vec<u8>> = (from..from + len)
            .map(|i| match topology {
                Topology::Circular if seq_len > 0 => Some(sequence[i.rem_euclid(seq_len) as usize]),
                Topology::Circular => None,
                Topology::Linear if i >= 0 && i < seq_len => Some(sequence[i as usize]),
                Topology::Linear => None,
            })
            .collect();
        bases.map(|b| String::from_utf8_lossy(&b).into_owned())
    }

    /// Sites of this enzyme in `haystack`, a search buffer whose first
    /// `seq_len` bytes are the sequence itself. For circular sequences the
    /// buffer carries a copy of the sequence head so that sites spanning the
    /// origin are seen once.
    pub fn get_sites(
        &self,
        haystack: &[u8],
        seq_len: usize,
        topology: Topology,
    ) -> Vec<RestrictionSite> {
        let forward = self.recognition_seq.as_bytes();
        let mut ret = self.scan(haystack, seq_len, topology, forward, Strand::Forward);
        if !self.is_palindromic {
            let rc = self.get_sequence_rc();
            ret.extend(self.scan(haystack, seq_len, topology, rc.as_bytes(), Strand::Reverse));
            ret.sort_by_key(|site| (site.recognition_start, site.strand == Strand::Reverse));
        }
        ret
    }

    fn scan(
        &self,
        haystack: &[u8],
        seq_len: usize,
        topology: Topology,
        pattern: &[u8],
        strand: Strand,
    ) -> Vec<RestrictionSite> {
        if pattern.is_empty() || haystack.len() < pattern.len() || seq_len == 0 {
            return vec![];
        }
        haystack
            .windows(pattern.len())
            .enumerate()
            .take_while(|(start, _)| *start < seq_len)
            .filter(|(_, window)| *window == pattern)
            .filter_map(|(start, _)| {
                let raw = self.raw_cut(start, strand);
                let position = match topology {
                    Topology::Circular => raw.rem_euclid(seq_len as isize) as usize,
                    Topology::Linear if raw > 0 && raw < seq_len as isize => raw as usize,
                    Topology::Linear => {
                        log::debug!(
                            "{}: cut at {raw} outside linear {seq_len} bp sequence, ignored",
                            self.name
                        );
                        return None;
                    }
                };
                let sequence = &haystack[..seq_len.min(haystack.len())];
                Some(RestrictionSite {
                    enzyme: self.name.to_owned(),
                    strand,
                    recognition_start: start,
                    recognition_end: start + pattern.len(),
                    position,
                    overhang_seq: self.overhang_at(sequence, raw, topology),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ecori() -> RestrictionEnzyme {
        RestrictionEnzyme::new("EcoRI", "GAATTC", 1, 1, OverhangType::FivePrime, "AATT").unwrap()
    }

    fn bsai() -> RestrictionEnzyme {
        RestrictionEnzyme::new("BsaI", "GGTCTC", 7, -5, OverhangType::FivePrime, "NNNN").unwrap()
    }

    #[test]
    fn test_restriction_enzyme() {
        let re = ecori();
        assert!(re.is_palindromic());
        let sites = re.get_sites(b"GAATTC", 6, Topology::Linear);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].recognition_start, 0);
        assert_eq!(sites[0].position, 1);
        assert_eq!(sites[0].strand, Strand::Forward);
    }

    #[test]
    fn test_restriction_enzyme_sites() {
        let re = ecori();
        let sites = re.get_sites(b"GAATTCGAATTC", 12, Topology::Linear);
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].recognition_start, 0);
        assert_eq!(sites[1].recognition_start, 6);
        assert_eq!(sites[1].recognition_end, 12);
        assert_eq!(sites[1].position, 7);
    }

    #[test]
    fn test_non_palindromic_reverse_strand() {
        let re = bsai();
        assert!(!re.is_palindromic());
        assert_eq!(re.get_sequence_rc(), "GAGACC");
        let seq = b"AAAAAAAGGTCTCAAAAAAAAAGAGACCAAAAAAA";
        let sites = re.get_sites(seq, seq.len(), Topology::Linear);
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].strand, Strand::Forward);
        assert_eq!(sites[0].recognition_start, 7);
        assert_eq!(sites[0].position, 14);
        assert_eq!(sites[1].strand, Strand::Reverse);
        assert_eq!(sites[1].recognition_start, 22);
        assert_eq!(sites[1].position, 17);
    }

    #[test]
    fn test_site_overhang_read_from_sequence() {
        let sites = ecori().get_sites(b"CCGAATTCCC", 10, Topology::Linear);
        assert_eq!(sites[0].overhang_seq.as_deref(), Some("AATT"));

        let seq = b"TTGGTCTCAAAAAGGGGGGGGCCCCAGAGACCTT";
        let sites = bsai().get_sites(seq, seq.len(), Topology::Linear);
        assert_eq!(sites.len(), 2);
        assert_eq!((sites[0].position, sites[0].overhang_seq.as_deref()), (9, Some("AAAA")));
        assert_eq!((sites[1].position, sites[1].overhang_seq.as_deref()), (21, Some("CCCC")));

        let pst =
            RestrictionEnzyme::new("PstI", "CTGCAG", 5, 5, OverhangType::ThreePrime, "TGCA").unwrap();
        let sites = pst.get_sites(b"AACTGCAGAA", 10, Topology::Linear);
        assert_eq!((sites[0].position, sites[0].overhang_seq.as_deref()), (7, Some("TGCA")));

        let smai = RestrictionEnzyme::new("SmaI", "CCCGGG", 3, 3, OverhangType::Blunt, "").unwrap();
        assert_eq!(smai.get_sites(b"ACCCGGGA", 8, Topology::Linear)[0].overhang_seq, None);
    }

    #[test]
    fn test_linear_cut_outside_sequence_dropped() {
        // BsaI forward site at the very end cuts 7 bases past its start.
        let seq = b"AAGGTCTC";
        assert!(bsai().get_sites(seq, seq.len(), Topology::Linear).is_empty());
        // On a ring the same cut wraps round.
        let sites = bsai().get_sites(seq, seq.len(), Topology::Circular);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].position, 1);
        assert_eq!(sites[0].overhang_seq.as_deref(), Some("AGGT"));
    }

    #[test]
    fn test_malformed_entries() {
        assert!(matches!(
            RestrictionEnzyme::new("X", "", 1, 1, OverhangType::Blunt, ""),
            Err(CloningError::MalformedEnzyme { .. })
        ));
        assert!(RestrictionEnzyme::new("X", "GANTC", 1, 1, OverhangType::Blunt, "").is_err());
        assert!(RestrictionEnzyme::new("X", "GATC", 2, 2, OverhangType::Blunt, "AT").is_err());
        assert!(RestrictionEnzyme::new("X", "GATC", 0, 4, OverhangType::FivePrime, "").is_err());
        assert!(RestrictionEnzyme::new("", "GATC", 0, 4, OverhangType::FivePrime, "GATC").is_err());
    }

    #[test]
    fn test_entry_missing_offsets() {
        let json = r#"{"name": "BrokenI", "recognition_seq": "GATC", "cut_pos3": 4, "overhang_type": "5'", "overhang_seq": "GATC"}"#;
        let err = serde_json::from_str::<RestrictionEnzyme>(json).unwrap_err();
        assert!(err.to_string().contains("missing cut_pos5"));
    }

    #[test]
    fn test_entry_serde() {
        let json = r#"{
            "name": "HindIII", "recognition_seq": "aagctt", "cut_pos5": 1, "cut_pos3": 1,
            "overhang_type": "5'", "overhang_seq": "AGCT",
            "buffers": ["NEBuffer 2.1"], "heat_inactivation": 80
        }"#;
        let re: RestrictionEnzyme = serde_json::from_str(json).unwrap();
        assert_eq!(re.recognition_seq, "AAGCTT");
        assert!(re.is_palindromic());
        assert_eq!(re.heat_inactivation, Some(80));
        assert!(!re.star_activity);
        let value = serde_json::to_value(&re).unwrap();
        assert_eq!(value["overhang_type"], "5'");
        assert!(value.get("is_palindromic").is_none());
    }
}
