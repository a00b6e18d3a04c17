/// A sparse gradient: the `(parameter index, value)` pairs that contribute to an update.
///
/// Zero contributions are never stored, so an empty gradient means no update at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gradient {
    entries: Vec<(usize, f32)>,
}

impl Gradient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Adds a contribution, skipping it if it's zero.
    pub fn push(&mut self, index: usize, value: f32) {
        if value != 0. {
            self.entries.push((index, value));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.entries.iter().copied()
    }
}

impl FromIterator<(usize, f32)> for Gradient {
    fn from_iter<I: IntoIterator<Item = (usize, f32)>>(iter: I) -> Self {
        let mut grad = Gradient::new();
        iter.into_iter().for_each(|(i, v)| grad.push(i, v));
        grad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_are_skipped() {
        let grad: Gradient = [(0, 1.), (1, 0.), (2, -3.)].into_iter().collect();

        assert_eq!(grad.len(), 2);
        assert_eq!(grad.iter().collect::<Vec<_>>(), vec![(0, 1.), (2, -3.)]);
        assert!(Gradient::new().is_empty());
    }
}
