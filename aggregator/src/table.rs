use ahash::AHashMap;

use crate::value::Tenths;

/// Expected number of distinct stations, used to presize the table.
pub const NUM_STATIONS: usize = 413;

/// Running summary of every value observed for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregate {
    count: u64,
    sum: i64,
    min: Tenths,
    max: Tenths,
}

impl Aggregate {
    pub fn new(value: Tenths) -> Self {
        Self {
            count: 1,
            sum: value.into(),
            min: value,
            max: value,
        }
    }

    #[inline]
    pub fn observe(&mut self, value: Tenths) {
        self.count += 1;
        self.sum += i64::from(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn merge(&mut self, other: &Aggregate) {
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of all observed values, in tenths.
    pub fn sum(&self) -> i64 {
        self.sum
    }

    pub fn min(&self) -> Tenths {
        self.min
    }

    pub fn max(&self) -> Tenths {
        self.max
    }

    /// `sum / count` rounded half away from zero, in tenths.
    ///
    /// Integer only: the truncated quotient is bumped one unit away from zero
    /// when the next decimal digit of the division is 5 or more. The direction
    /// comes from the sign of the sum, so `-0.05` rounds to `-0.1`; taking it
    /// from the truncated quotient (which is 0 there) would give `0.1`.
    pub fn mean(&self) -> Tenths {
        let count = self.count as i64;
        let mut q = self.sum / count;
        let next_digit = (self.sum * 10 / count % 10).abs();
        if next_digit >= 5 {
            if self.sum < 0 {
                q -= 1;
            } else {
                q += 1;
            }
        }
        Tenths::saturating(q)
    }
}

/// Key bytes to running aggregate. Keys are compared byte for byte.
#[derive(Debug, Clone, Default)]
pub struct StationTable {
    map: AHashMap<Box<[u8]>, Aggregate>,
}

impl StationTable {
    pub fn new() -> Self {
        Self::with_capacity(NUM_STATIONS)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            map: AHashMap::with_capacity(capacity),
        }
    }

    /// Creates the aggregate on first sight of `key`, otherwise folds `value`
    /// into it. The key is only copied on insertion.
    #[inline]
    pub fn update(&mut self, key: &[u8], value: Tenths) {
        if let Some(agg) = self.map.get_mut(key) {
            agg.observe(value);
        } else {
            self.map.insert(key.into(), Aggregate::new(value));
        }
    }

    /// Folds a partial table into this one.
    pub fn merge(&mut self, other: StationTable) {
        for (key, agg) in other.map {
            match self.map.get_mut(&key) {
                Some(existing) => existing.merge(&agg),
                None => {
                    self.map.insert(key, agg);
                }
            }
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&Aggregate> {
        self.map.get(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Aggregate)> {
        self.map.iter().map(|(k, v)| (&**k, v))
    }
}

impl PartialEq for StationTable {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for StationTable {}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(v: i16) -> Tenths {
        Tenths::new(v).unwrap()
    }

    fn agg(count: u64, sum: i64, min: i16, max: i16) -> Aggregate {
        Aggregate {
            count,
            sum,
            min: t(min),
            max: t(max),
        }
    }

    #[test]
    fn first_observation_creates_entry() {
        let mut table = StationTable::new();
        table.update(b"Beijing", t(100));
        assert_eq!(table.get(b"Beijing"), Some(&agg(1, 100, 100, 100)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn observe_updates_sum_min_max() {
        let cases = [
            ("sum", agg(2, 100, 0, 100), 10, agg(3, 110, 0, 100)),
            ("min", agg(2, 100, 0, 100), -100, agg(3, 0, -100, 100)),
            ("max", agg(2, 100, 0, 100), 200, agg(3, 300, 0, 200)),
        ];
        for (name, mut start, value, want) in cases {
            start.observe(t(value));
            assert_eq!(start, want, "updating the {name}");
        }
    }

    #[test]
    fn keys_are_exact_bytes() {
        let mut table = StationTable::new();
        table.update(b"Paris", t(1));
        table.update(b"paris", t(2));
        table.update(b"Paris ", t(3));
        table.update(b"Par\0is", t(4));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn mean_rounds_half_away_from_zero() {
        let cases = [
            (107, 7, 15),
            (-107, 7, -15),
            (102, 7, 15),
            (-102, 7, -15),
            (101, 7, 14),
            (15, 10, 2),
            (-15, 10, -2),
            (14, 10, 1),
            (-14, 10, -1),
            (25, 10, 3),
            (-25, 10, -3),
            (603, 2, 302),
            (0, 3, 0),
            (-4, 10, 0),
            (-5, 10, -1),
            (5, 10, 1),
            (-6, 10, -1),
        ];
        for (sum, count, want) in cases {
            let a = agg(count, sum, -999, 999);
            assert_eq!(a.mean(), t(want), "sum={sum} count={count}");
        }
    }

    #[test]
    fn update_is_order_independent() {
        let obs: Vec<(&str, i16)> = vec![
            ("a", 12),
            ("b", -999),
            ("a", -3),
            ("c", 999),
            ("b", 0),
            ("a", 77),
            ("c", 5),
        ];

        let mut forward = StationTable::new();
        obs.iter().for_each(|(k, v)| forward.update(k.as_bytes(), t(*v)));

        let mut backward = StationTable::new();
        obs.iter().rev().for_each(|(k, v)| backward.update(k.as_bytes(), t(*v)));

        // every rotation of the sequence lands on the same table
        for shift in 0..obs.len() {
            let mut rotated = StationTable::new();
            let mut seq = obs.clone();
            seq.rotate_left(shift);
            seq.iter().for_each(|(k, v)| rotated.update(k.as_bytes(), t(*v)));
            assert_eq!(rotated, forward, "rotation {shift}");
        }
        assert_eq!(forward, backward);
        assert_eq!(forward.get(b"a"), Some(&agg(3, 86, -3, 77)));
    }

    #[test]
    fn merge_matches_sequential() {
        let obs: [(&str, i16); 6] = [
            ("x", 10),
            ("y", 20),
            ("x", -30),
            ("z", 1),
            ("y", 25),
            ("x", 40),
        ];
        let mut whole = StationTable::new();
        obs.iter().for_each(|(k, v)| whole.update(k.as_bytes(), t(*v)));

        for split in 0..=obs.len() {
            let (left, right) = obs.split_at(split);
            let mut a = StationTable::new();
            let mut b = StationTable::new();
            left.iter().for_each(|(k, v)| a.update(k.as_bytes(), t(*v)));
            right.iter().for_each(|(k, v)| b.update(k.as_bytes(), t(*v)));

            let mut ab = a.clone();
            ab.merge(b.clone());
            let mut ba = b;
            ba.merge(a);
            assert_eq!(ab, whole, "split at {split}");
            assert_eq!(ba, whole, "split at {split}");
        }
    }
}
