/// A single measurement row: one core measured against one NUMA node.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub mnode: String,
    pub pyscpu: String,
    /// Repeated trials, in header order.
    pub measurements: Vec<f64>,
    /// 1-based line in the source file.
    pub line: u64,
}

impl RawSample {
    /// Arithmetic mean over all trials of this row.
    pub fn mean(&self) -> Option<f64> {
        if self.measurements.is_empty() {
            return None;
        }
        let sum: f64 = self.measurements.iter().sum();
        Some(sum / self.measurements.len() as f64)
    }
}

/// All rows of one input file, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    pub path: String,
    pub measurement_columns: Vec<String>,
    pub samples: Vec<RawSample>,
}

impl SampleSet {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
