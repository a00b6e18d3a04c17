use rayon::prelude::*;

/// The records one worker owns. Workers never see each other's partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<T> {
    records: Vec<T>,
}

impl<T> Partition<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.records.iter_mut()
    }

    /// Visits every record in order.
    pub fn for_each<F: FnMut(&T)>(&self, f: F) {
        self.records.iter().for_each(f);
    }

    /// Visits every record in order, stopping at the first error.
    pub fn try_for_each<E, F>(&self, f: F) -> Result<(), E>
    where
        F: FnMut(&T) -> Result<(), E>,
    {
        self.records.iter().try_for_each(f)
    }
}

impl<T: Sync> Partition<T> {
    pub fn par_iter(&self) -> rayon::slice::Iter<'_, T> {
        self.records.par_iter()
    }
}

impl<T: Send> Partition<T> {
    pub fn par_iter_mut(&mut self) -> rayon::slice::IterMut<'_, T> {
        self.records.par_iter_mut()
    }
}

impl<T> Default for Partition<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> From<Vec<T>> for Partition<T> {
    fn from(records: Vec<T>) -> Self {
        Self::new(records)
    }
}

impl<T> FromIterator<T> for Partition<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a Partition<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
