use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Per-motif decomposition of a structure's energy, in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyTerm {
    pub stack: f64,
    pub hairpin: f64,
    pub internal: f64,
    pub multibranch: f64,
    pub coaxial: f64,
    pub unpaired: f64,
}

impl EnergyTerm {
    #[inline]
    pub fn loops(&self) -> f64 {
        self.hairpin + self.internal + self.multibranch
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.stack + self.loops() + self.coaxial + self.unpaired
    }
}

impl Add for EnergyTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            stack: self.stack + rhs.stack,
            hairpin: self.hairpin + rhs.hairpin,
            internal: self.internal + rhs.internal,
            multibranch: self.multibranch + rhs.multibranch,
            coaxial: self.coaxial + rhs.coaxial,
            unpaired: self.unpaired + rhs.unpaired,
        }
    }
}

impl AddAssign for EnergyTerm {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for EnergyTerm {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, term| acc + term)
    }
}
