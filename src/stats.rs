use rayon::slice::ParallelSliceMut;

/// One reported statistic of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    Percentile { target: f64, value: f64 },
    Mean(f64),
    Max(f64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub count: usize,
    pub fields: Vec<Field>,
}

/// Which optional fields a snapshot carries besides the percentiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtraFields {
    pub mean: bool,
    pub max: bool,
}

/// Nearest-rank-below index `floor(n * p / 100)`, or `None` when it falls
/// outside `0..n`.
pub fn percentile_index(n: usize, p: f64) -> Option<usize> {
    let idx = (n as f64 * p / 100.0).floor();
    if idx >= 0.0 && idx < n as f64 {
        Some(idx as usize)
    } else {
        None
    }
}

pub fn snapshot_from_sorted(data: &[f64], targets: &[f64], extra: ExtraFields) -> Snapshot {
    let cnt = data.len();
    let mut fields = Vec::with_capacity(targets.len() + 2);

    for &p in targets {
        if let Some(idx) = percentile_index(cnt, p) {
            fields.push(Field::Percentile {
                target: p,
                value: data[idx],
            });
        }
    }

    if let Some(&last) = data.last() {
        if extra.mean {
            let sum: f64 = data.iter().sum();
            fields.push(Field::Mean(sum / cnt as f64));
        }
        if extra.max {
            fields.push(Field::Max(last));
        }
    }

    Snapshot { count: cnt, fields }
}

/// Cumulative working set of every value received so far.
#[derive(Debug, Default)]
pub struct Aggregator {
    values: Vec<f64>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intake(&mut self, x: f64) {
        self.values.push(x);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Sorts a copy of the working set and computes the snapshot over it.
    pub fn snapshot(&self, targets: &[f64], extra: ExtraFields) -> Snapshot {
        let mut sorted = self.values.clone();
        sorted.par_sort_unstable_by(f64::total_cmp);
        snapshot_from_sorted(&sorted, targets, extra)
    }
}
