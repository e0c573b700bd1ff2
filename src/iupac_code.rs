const DNA_BITMASK_A: u8 = 1;
const DNA_BITMASK_C: u8 = 2;
const DNA_BITMASK_G: u8 = 4;
const DNA_BITMASK_T: u8 = 8;
const DNA_BITMASK_N: u8 = DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T;

/// Letters indexed by bitmask; index 0 is not a base.
const LETTERS_BY_MASK: [u8; 16] = [
    b' ', b'A', b'C', b'M', b'G', b'R', b'S', b'V', b'T', b'W', b'Y', b'H', b'K', b'D', b'B', b'N',
];

/// One IUPAC nucleotide code as a set of bases, one bit per base.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct IupacCode(u8);

impl IupacCode {
    pub fn new(bitmask: u8) -> Self {
        Self(bitmask & DNA_BITMASK_N)
    }

    #[inline(always)]
    pub fn from_letter(letter: u8) -> Self {
        match letter.to_ascii_uppercase() {
            b'A' => Self(DNA_BITMASK_A),
            b'C' => Self(DNA_BITMASK_C),
            b'G' => Self(DNA_BITMASK_G),
            b'T' => Self(DNA_BITMASK_T),
            b'W' => Self(DNA_BITMASK_A | DNA_BITMASK_T),
            b'S' => Self(DNA_BITMASK_C | DNA_BITMASK_G),
            b'M' => Self(DNA_BITMASK_A | DNA_BITMASK_C),
            b'K' => Self(DNA_BITMASK_G | DNA_BITMASK_T),
            b'R' => Self(DNA_BITMASK_A | DNA_BITMASK_G),
            b'Y' => Self(DNA_BITMASK_C | DNA_BITMASK_T),
            b'B' => Self(DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T),
            b'D' => Self(DNA_BITMASK_A | DNA_BITMASK_G | DNA_BITMASK_T),
            b'H' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_T),
            b'V' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G),
            b'N' => Self(DNA_BITMASK_N),
            _ => Self(0),
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub fn letter(&self) -> u8 {
        LETTERS_BY_MASK[self.0 as usize]
    }

    /// Swaps A with T and C with G, so ambiguity codes map onto their partners
    /// (R <-> Y, K <-> M, B <-> V, D <-> H; S, W and N are their own complement).
    #[inline(always)]
    pub fn complement(self) -> Self {
        let a = (self.0 & DNA_BITMASK_A) << 3;
        let t = (self.0 & DNA_BITMASK_T) >> 3;
        let c = (self.0 & DNA_BITMASK_C) << 1;
        let g = (self.0 & DNA_BITMASK_G) >> 1;
        Self(a | t | c | g)
    }

    #[inline(always)]
    pub fn is_valid_letter(letter: u8) -> bool {
        !Self::from_letter(letter).is_empty()
    }

    /// The plain bases this code stands for, in ACGT order.
    pub fn to_vec(&self) -> Vec<u8> {
        [
            (DNA_BITMASK_A, b'A'),
            (DNA_BITMASK_C, b'C'),
            (DNA_BITMASK_G, b'G'),
            (DNA_BITMASK_T, b'T'),
        ]
        .into_iter()
        .filter(|(mask, _)| self.0 & mask != 0)
        .map(|(_, base)| base)
        .collect()
    }

    /// Complement of a single letter, uppercased. Anything that is not an IUPAC
    /// code comes back unchanged.
    #[inline(always)]
    pub fn letter_complement(letter: u8) -> u8 {
        let code = Self::from_letter(letter);
        if code.is_empty() {
            letter
        } else {
            code.complement().letter()
        }
    }
}

pub fn reverse_complement_bytes(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|c| IupacCode::letter_complement(*c))
        .collect()
}

pub fn reverse_complement(seq: &str) -> String {
    String::from_utf8_lossy(&reverse_complement_bytes(seq.as_bytes())).into_owned()
}
