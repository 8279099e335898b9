use crate::location::Coordinate;

use im::HashSet;
use lazy_static::lazy_static;

lazy_static! {
    static ref EMPTY: CoordinateSet = CoordinateSet {
        set: HashSet::new(),
    };
}

/// An immutable set of [`Coordinate`]s.
///
/// Every mutator returns a new set and leaves the receiver untouched.
/// Backed by a persistent hash set, so "copying" an instance is an O(1)
/// handle clone and updated instances share structure with their
/// originals. Iteration order is unspecified but stable for a given
/// instance.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CoordinateSet {
    set: HashSet<Coordinate>,
}

impl Default for CoordinateSet {
    fn default() -> Self {
        CoordinateSet::new()
    }
}

impl CoordinateSet {
    /// The canonical empty set. Cheap to hand out: clones of the
    /// singleton share its (empty) structure.
    pub fn new() -> CoordinateSet {
        EMPTY.clone()
    }

    pub fn from(coords: impl IntoIterator<Item = Coordinate>) -> CoordinateSet {
        let set: HashSet<Coordinate> = coords.into_iter().collect();

        if set.is_empty() {
            CoordinateSet::new()
        } else {
            CoordinateSet { set }
        }
    }

    pub fn has(&self, coord: &Coordinate) -> bool {
        self.set.contains(coord)
    }

    pub fn size(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Returns a set containing `coord`. Adding an already-present
    /// coordinate returns the receiver unchanged.
    pub fn add(&self, coord: Coordinate) -> CoordinateSet {
        if self.set.contains(&coord) {
            return self.clone();
        }

        CoordinateSet {
            set: self.set.update(coord),
        }
    }

    /// Returns a set without `coord`. Deleting an absent coordinate
    /// returns the receiver unchanged.
    pub fn delete(&self, coord: &Coordinate) -> CoordinateSet {
        if !self.set.contains(coord) {
            return self.clone();
        }

        CoordinateSet {
            set: self.set.without(coord),
        }
    }

    /// All coordinates in either set. Short-circuits on an empty
    /// operand instead of rebuilding.
    pub fn union(&self, other: &CoordinateSet) -> CoordinateSet {
        if other.is_empty() {
            return self.clone();
        }

        if self.is_empty() {
            return other.clone();
        }

        CoordinateSet {
            set: self.set.clone().union(other.set.clone()),
        }
    }

    /// Coordinates in `self` but not in `other`. An empty `other`
    /// returns the receiver unchanged.
    pub fn difference(&self, other: &CoordinateSet) -> CoordinateSet {
        if other.is_empty() || self.is_empty() {
            return self.clone();
        }

        let set: HashSet<Coordinate> = self
            .set
            .iter()
            .filter(|&coord| !other.set.contains(coord))
            .cloned()
            .collect();

        if set.is_empty() {
            CoordinateSet::new()
        } else {
            CoordinateSet { set }
        }
    }

    pub fn iter(&self) -> im::hashset::Iter<'_, Coordinate> {
        self.set.iter()
    }
}

impl FromIterator<Coordinate> for CoordinateSet {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        CoordinateSet::from(iter)
    }
}

impl<'a> IntoIterator for &'a CoordinateSet {
    type Item = &'a Coordinate;
    type IntoIter = im::hashset::Iter<'a, Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.set.iter()
    }
}
