//! Satisfying assignments.

use crate::literal::{LBool, Var};

/// A tri-valued assignment indexed by variable.
///
/// Values known to the solver are preserved exactly; variables the search
/// never had to assign are reported as [`LBool::Undef`].
#[derive(Debug, Clone, Default)]
pub struct Model {
    values: Vec<LBool>,
}

impl Model {
    pub(crate) fn from_values(values: Vec<LBool>) -> Self {
        Self { values }
    }

    /// Value of a variable.
    #[must_use]
    pub fn value(&self, v: Var) -> LBool {
        self.values.get(v as usize).copied().unwrap_or(LBool::Undef)
    }

    /// Number of variables covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the model is empty (no search has produced one).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the values in variable order.
    pub fn iter(&self) -> std::slice::Iter<'_, LBool> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_is_undef() {
        let m = Model::from_values(vec![LBool::True, LBool::False]);
        assert_eq!(m.value(0), LBool::True);
        assert_eq!(m.value(1), LBool::False);
        assert_eq!(m.value(2), LBool::Undef);
    }
}
