use std::fmt;
use std::ops::Index;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Base {
    A, // Adenine (purine)
    C, // Cytosine (pyrimidine)
    G, // Guanine (purine)
    U, // Uracil (pyrimidine)
}

impl Base {
    pub fn to_char(self) -> char {
        match self {
            Base::A => 'A',
            Base::C => 'C',
            Base::G => 'G',
            Base::U => 'U',
        }
    }

    pub fn is_purine(self) -> bool {
        matches!(self, Base::A | Base::G)
    }

    pub fn is_pyrimidine(self) -> bool {
        !self.is_purine()
    }
}

impl TryFrom<char> for Base {
    type Error = char;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'A' => Ok(Base::A),
            'C' => Ok(Base::C),
            'G' => Ok(Base::G),
            'U' => Ok(Base::U),
            other => Err(other),
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Sequence is empty")]
    Empty,
    #[error("Invalid symbol '{symbol}' at position {position}: expected one of A, C, G, U")]
    InvalidBase { position: usize, symbol: char },
}

/// An immutable RNA sequence.
///
/// Construction validates every symbol; there is no lossy coercion of
/// lowercase letters, `T`, or IUPAC ambiguity codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    bases: Vec<Base>,
}

impl Sequence {
    pub fn new(bases: Vec<Base>) -> Result<Self, SequenceError> {
        if bases.is_empty() {
            return Err(SequenceError::Empty);
        }
        Ok(Self { bases })
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn bases(&self) -> &[Base] {
        &self.bases
    }

    pub fn get(&self, index: usize) -> Option<Base> {
        self.bases.get(index).copied()
    }
}

impl FromStr for Sequence {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bases = s
            .chars()
            .enumerate()
            .map(|(position, c)| {
                Base::try_from(c).map_err(|symbol| SequenceError::InvalidBase { position, symbol })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(bases)
    }
}

impl Index<usize> for Sequence {
    type Output = Base;

    fn index(&self, index: usize) -> &Self::Output {
        &self.bases[index]
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for base in &self.bases {
            write!(f, "{}", base.to_char())?;
        }
        Ok(())
    }
}
