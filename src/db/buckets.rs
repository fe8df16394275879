//! Capacity-bounded, append-only chunks ("buckets") of a session's records.
//!
//! A session owns an ordered run of buckets addressed by `index`. Only the last
//! bucket may still have room; once full it is never rewritten. Appending fills
//! that bucket first and then opens `index + 1`, `index + 2`, ... as needed.
//!
//! Each bucket keeps the capacity it was opened with. Changing the configured
//! capacity only affects buckets opened afterwards.

/// One chunk of records together with its position in the session's run.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<T> {
    pub index: u32,
    pub capacity: usize,
    pub items: Vec<T>,
}

impl<T> Bucket<T> {
    pub fn new(index: u32, capacity: usize) -> Self {
        Self {
            index,
            capacity: capacity.max(1),
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }
}

/// Distributes `items` over the open tail bucket and freshly numbered ones.
///
/// Returns only the buckets that were written to, in index order. The tail is
/// judged against its own recorded capacity, so a full tail is left untouched
/// even when `capacity` has grown since it was opened. New buckets get
/// `capacity`; a capacity of zero is treated as one.
pub fn fill_buckets<T>(tail: Option<Bucket<T>>, items: Vec<T>, capacity: usize) -> Vec<Bucket<T>> {
    if items.is_empty() {
        return Vec::new();
    }

    let mut touched = Vec::new();
    let mut current = match tail {
        Some(bucket) if !bucket.is_full() => bucket,
        Some(bucket) => Bucket::new(bucket.index + 1, capacity),
        None => Bucket::new(0, capacity),
    };

    for item in items {
        if current.is_full() {
            let next_index = current.index + 1;
            touched.push(std::mem::replace(&mut current, Bucket::new(next_index, capacity)));
        }
        current.items.push(item);
    }
    touched.push(current);

    touched
}

/// Concatenates buckets into one stream ordered by bucket index.
pub fn concat_buckets<T>(mut buckets: Vec<Bucket<T>>) -> Vec<T> {
    buckets.sort_by_key(|bucket| bucket.index);
    buckets.into_iter().flat_map(|bucket| bucket.items).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_append_touches_nothing() {
        let touched = fill_buckets::<u32>(Some(Bucket::new(3, 10)), Vec::new(), 10);
        assert!(touched.is_empty());
    }

    #[test]
    fn test_first_append_starts_at_zero() {
        let touched = fill_buckets(None, vec![1, 2, 3], 10);
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].index, 0);
        assert_eq!(touched[0].items, vec![1, 2, 3]);
    }

    #[test]
    fn test_tail_is_filled_before_rollover() {
        let tail = Bucket {
            index: 4,
            capacity: 3,
            items: vec![1, 2],
        };
        let touched = fill_buckets(Some(tail), vec![3, 4, 5], 3);
        assert_eq!(touched.len(), 2);
        assert_eq!(touched[0].index, 4);
        assert_eq!(touched[0].items, vec![1, 2, 3]);
        assert_eq!(touched[1].index, 5);
        assert_eq!(touched[1].items, vec![4, 5]);
    }

    #[test]
    fn test_full_tail_is_not_rewritten() {
        let tail = Bucket {
            index: 0,
            capacity: 2,
            items: vec![1, 2],
        };
        let touched = fill_buckets(Some(tail), vec![3], 2);
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].index, 1);
        assert_eq!(touched[0].items, vec![3]);
    }

    #[test]
    fn test_grown_capacity_does_not_reopen_full_tail() {
        let tail = Bucket {
            index: 0,
            capacity: 2,
            items: vec![1, 2],
        };
        let touched = fill_buckets(Some(tail), vec![3, 4, 5], 5);
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].index, 1);
        assert_eq!(touched[0].capacity, 5);
        assert_eq!(touched[0].items, vec![3, 4, 5]);
    }

    #[test]
    fn test_open_tail_keeps_its_own_capacity() {
        let tail = Bucket {
            index: 2,
            capacity: 4,
            items: vec![1],
        };
        let touched = fill_buckets(Some(tail), vec![2, 3, 4, 5], 2);
        assert_eq!(touched.len(), 2);
        assert_eq!((touched[0].capacity, touched[0].items.clone()), (4, vec![1, 2, 3, 4]));
        assert_eq!((touched[1].index, touched[1].capacity), (3, 2));
        assert_eq!(touched[1].items, vec![5]);
    }

    #[test]
    fn test_zero_capacity_behaves_as_one() {
        let touched = fill_buckets(None, vec![1, 2], 0);
        assert_eq!(touched.len(), 2);
    }

    #[test]
    fn test_concat_orders_by_index() {
        let buckets = vec![
            Bucket {
                index: 1,
                capacity: 2,
                items: vec![3],
            },
            Bucket {
                index: 0,
                capacity: 2,
                items: vec![1, 2],
            },
        ];
        assert_eq!(concat_buckets(buckets), vec![1, 2, 3]);
    }

    proptest! {
        #[test]
        fn prop_chunk_count_is_ceiling(n in 1usize..400, capacity in 1usize..50) {
            let items: Vec<usize> = (0..n).collect();
            let touched = fill_buckets(None, items.clone(), capacity);

            prop_assert_eq!(touched.len(), (n + capacity - 1) / capacity);
            for (position, bucket) in touched.iter().enumerate() {
                prop_assert!(bucket.len() <= capacity);
                prop_assert_eq!(bucket.index as usize, position);
            }
            prop_assert_eq!(concat_buckets(touched), items);
        }

        #[test]
        fn prop_repeated_appends_preserve_order(
            batches in proptest::collection::vec(1usize..30, 1..10),
            capacity in 1usize..20,
        ) {
            let mut stored: Vec<Bucket<usize>> = Vec::new();
            let mut expected = Vec::new();
            let mut next = 0usize;

            for size in batches {
                let batch: Vec<usize> = (next..next + size).collect();
                next += size;
                expected.extend(batch.iter().copied());

                let tail = stored.last().cloned();
                for bucket in fill_buckets(tail, batch, capacity) {
                    stored.retain(|existing| existing.index != bucket.index);
                    stored.push(bucket);
                }
            }

            for bucket in &stored {
                prop_assert!(bucket.len() <= capacity);
            }
            prop_assert_eq!(concat_buckets(stored), expected);
        }
    }
}
