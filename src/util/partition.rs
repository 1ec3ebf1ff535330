use crate::models::Record;

/// A contiguous slice of the query dataset.
#[derive(Debug, Clone, Copy)]
pub struct QueryBatch<'a> {
    pub index: usize,
    /// Offset of the first record in the query dataset.
    pub start: usize,
    pub records: &'a [Record],
}

impl QueryBatch<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Batch `i` holds records `[i * batch_size, min((i + 1) * batch_size, n))`.
/// A zero batch size is treated as one.
pub fn partition(records: &[Record], batch_size: usize) -> Vec<QueryBatch<'_>> {
    let size = batch_size.max(1);
    records
        .chunks(size)
        .enumerate()
        .map(|(index, records)| QueryBatch {
            index,
            start: index * size,
            records,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    fn rows(n: usize) -> Vec<Record> {
        (0..n).map(|i| Record::new(vec![Value::from_field(&i.to_string())])).collect()
    }

    #[test]
    fn partitions_cover_input_in_order() {
        let data = rows(250);
        let parts = partition(&data, 100);
        let lens: Vec<usize> = parts.iter().map(QueryBatch::len).collect();
        let starts: Vec<usize> = parts.iter().map(|b| b.start).collect();
        assert_eq!(lens, vec![100, 100, 50]);
        assert_eq!(starts, vec![0, 100, 200]);
        let flat: Vec<&Record> = parts.iter().flat_map(|b| b.records.iter()).collect();
        assert!(flat.iter().zip(&data).all(|(a, b)| *a == b));
    }

    #[test]
    fn exact_multiple_and_empty_input() {
        assert_eq!(partition(&rows(200), 100).len(), 2);
        assert!(partition(&rows(0), 100).is_empty());
        assert_eq!(partition(&rows(3), 0).len(), 3);
    }
}
