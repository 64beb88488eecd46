//! Random variables of a factor graph and the domains they range over.
//!
//! A variable is either boolean (`{0, 1}`) or multinomial. Multinomial
//! domains are *dense* (`0..cardinality`, where the value is its own index)
//! or *sparse* (an explicit, ordered value → index map for variables whose
//! active values are not a contiguous prefix of the naturals).

use crate::error::CoreError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Index of a variable in the graph's variable array.
pub type VariableId = usize;

/// A value taken by a variable.
pub type VariableValue = usize;

/// Kind of domain a variable ranges over.
///
/// Marked `#[non_exhaustive]`: samplers living outside this crate must treat
/// kinds they do not know as an unsupported configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DomainType {
    /// Binary variable with values {0, 1}
    Boolean,
    /// Categorical variable with a finite set of values
    Multinomial,
}

/// The set of values a variable may take, with a compact index for each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    /// Values `0..cardinality`; index == value.
    Dense { cardinality: usize },
    /// Explicit value → index map, iterated in index order.
    Sparse(IndexMap<VariableValue, usize>),
}

impl Domain {
    pub fn boolean() -> Self {
        Domain::Dense { cardinality: 2 }
    }

    pub fn dense(cardinality: usize) -> Result<Self, CoreError> {
        if cardinality == 0 {
            return Err(CoreError::EmptyDomain);
        }
        Ok(Domain::Dense { cardinality })
    }

    /// Build a sparse domain. Values are sorted ascending before indices are
    /// assigned, so the same value set always yields the same indexing.
    pub fn sparse<I>(values: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = VariableValue>,
    {
        let mut values: Vec<VariableValue> = values.into_iter().collect();
        if values.is_empty() {
            return Err(CoreError::EmptyDomain);
        }
        values.sort_unstable();

        let mut map = IndexMap::with_capacity(values.len());
        for value in values {
            let index = map.len();
            if map.insert(value, index).is_some() {
                return Err(CoreError::DuplicateDomainValue { value });
            }
        }
        Ok(Domain::Sparse(map))
    }

    pub fn cardinality(&self) -> usize {
        match self {
            Domain::Dense { cardinality } => *cardinality,
            Domain::Sparse(map) => map.len(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, Domain::Sparse(_))
    }

    /// Iterate `(value, index)` pairs in index order.
    ///
    /// Both sampling passes over a multinomial domain rely on this order
    /// being stable between calls.
    pub fn iter(&self) -> DomainIter<'_> {
        match self {
            Domain::Dense { cardinality } => DomainIter::Dense(0..*cardinality),
            Domain::Sparse(map) => DomainIter::Sparse(map.iter()),
        }
    }

    pub fn index_of(&self, value: VariableValue) -> Option<usize> {
        match self {
            Domain::Dense { cardinality } => (value < *cardinality).then_some(value),
            Domain::Sparse(map) => map.get(&value).copied(),
        }
    }

    pub fn value_at(&self, index: usize) -> Option<VariableValue> {
        match self {
            Domain::Dense { cardinality } => (index < *cardinality).then_some(index),
            Domain::Sparse(map) => map.get_index(index).map(|(value, _)| *value),
        }
    }

    pub fn contains(&self, value: VariableValue) -> bool {
        self.index_of(value).is_some()
    }

    /// Smallest-index value; every domain has one.
    pub fn first_value(&self) -> VariableValue {
        self.value_at(0).unwrap_or_default()
    }
}

/// Iterator over `(value, index)` pairs of a [`Domain`].
#[derive(Debug, Clone)]
pub enum DomainIter<'a> {
    Dense(std::ops::Range<usize>),
    Sparse(indexmap::map::Iter<'a, VariableValue, usize>),
}

impl Iterator for DomainIter<'_> {
    type Item = (VariableValue, usize);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            DomainIter::Dense(range) => range.next().map(|i| (i, i)),
            DomainIter::Sparse(iter) => iter.next().map(|(value, index)| (*value, *index)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            DomainIter::Dense(range) => range.size_hint(),
            DomainIter::Sparse(iter) => iter.size_hint(),
        }
    }
}

impl ExactSizeIterator for DomainIter<'_> {}

/// A random variable as seen by the sampler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: VariableId,
    pub domain_type: DomainType,
    pub domain: Domain,
    /// Fixed forever; never resampled by any sweep.
    pub is_observation: bool,
    /// Currently treated as evidence; resampled only when the run allows it.
    pub is_evid: bool,
    /// Value used in evidence mode (the observed value for evidence).
    pub assignment_evid: VariableValue,
    /// First slot of this variable's multinomial tallies.
    pub tally_offset: usize,
}

impl Variable {
    pub fn boolean(id: VariableId) -> Self {
        Variable {
            id,
            domain_type: DomainType::Boolean,
            domain: Domain::boolean(),
            is_observation: false,
            is_evid: false,
            assignment_evid: 0,
            tally_offset: 0,
        }
    }

    pub fn multinomial(id: VariableId, cardinality: usize) -> Result<Self, CoreError> {
        Ok(Self::with_domain(id, Domain::dense(cardinality)?))
    }

    pub fn sparse_multinomial<I>(id: VariableId, values: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = VariableValue>,
    {
        Ok(Self::with_domain(id, Domain::sparse(values)?))
    }

    fn with_domain(id: VariableId, domain: Domain) -> Self {
        let assignment_evid = domain.first_value();
        Variable {
            id,
            domain_type: DomainType::Multinomial,
            domain,
            is_observation: false,
            is_evid: false,
            assignment_evid,
            tally_offset: 0,
        }
    }

    /// Mark as evidence pinned at `value`.
    pub fn with_evidence(mut self, value: VariableValue) -> Result<Self, CoreError> {
        self.check_value(value)?;
        self.is_evid = true;
        self.assignment_evid = value;
        Ok(self)
    }

    /// Mark as a fixed observation at `value`. Observations are evidence too.
    pub fn as_observation(self, value: VariableValue) -> Result<Self, CoreError> {
        let mut variable = self.with_evidence(value)?;
        variable.is_observation = true;
        Ok(variable)
    }

    /// Set the starting value without marking the variable as evidence.
    pub fn with_initial_value(mut self, value: VariableValue) -> Result<Self, CoreError> {
        self.check_value(value)?;
        self.assignment_evid = value;
        Ok(self)
    }

    pub fn with_tally_offset(mut self, offset: usize) -> Self {
        self.tally_offset = offset;
        self
    }

    pub fn cardinality(&self) -> usize {
        self.domain.cardinality()
    }

    pub fn is_boolean(&self) -> bool {
        self.domain_type == DomainType::Boolean
    }

    pub fn has_sparse_domain(&self) -> bool {
        self.domain.is_sparse()
    }

    pub fn domain_index(&self, value: VariableValue) -> Option<usize> {
        self.domain.index_of(value)
    }

    fn check_value(&self, value: VariableValue) -> Result<(), CoreError> {
        if self.domain.contains(value) {
            Ok(())
        } else {
            Err(CoreError::ValueOutOfDomain {
                variable: self.id,
                value,
            })
        }
    }
}
