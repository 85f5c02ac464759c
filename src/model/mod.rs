//! Aggregation model: mean latency per (NUMA node, core).

use crate::Result;
use crate::sample::SampleSet;
use anyhow::bail;
use std::collections::BTreeMap;
use std::fmt;

/// One NUMA node's column: mean latency keyed by `pyscpu`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeColumn {
    pub name: String,
    pub values: BTreeMap<String, f64>,
}

/// Rows indexed by `pyscpu`, one column per NUMA node.
///
/// Columns keep the order in which nodes first appear in the input; the row
/// index is the union of all cores in first-seen order. Cells a node never
/// measured are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedTable {
    index: Vec<String>,
    columns: Vec<NodeColumn>,
}

impl AggregatedTable {
    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn columns(&self) -> &[NodeColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn get(&self, cpu: &str, node: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|c| c.name == node)
            .and_then(|c| c.values.get(cpu).copied())
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// (min, max) over all present cells, None when there are none.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.columns
            .iter()
            .flat_map(|c| c.values.values().copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Add a node column, extending the row index with unseen cores (outer join).
    fn insert_column(&mut self, name: String, series: Vec<(String, f64)>) {
        let mut values = BTreeMap::new();
        for (cpu, mean) in series {
            if !self.index.contains(&cpu) {
                self.index.push(cpu.clone());
            }
            values.insert(cpu, mean);
        }
        self.columns.push(NodeColumn { name, values });
    }
}

/// Build the aggregated table. Performs:
/// - group rows by `mnode` (first-seen order)
/// - row-wise mean over all measurement columns
/// - reject a core listed twice under the same node
pub fn aggregate(set: &SampleSet) -> Result<AggregatedTable> {
    // 1) Group by node, keeping first-seen order.
    let mut order: Vec<&str> = Vec::new();
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, sample) in set.samples.iter().enumerate() {
        let rows = groups.entry(sample.mnode.as_str()).or_insert_with(|| {
            order.push(sample.mnode.as_str());
            Vec::new()
        });
        rows.push(i);
    }

    // 2) Per node: mean per row, keyed by core.
    let mut table = AggregatedTable::default();
    for node in order {
        let rows = &groups[node];
        let mut seen: BTreeMap<&str, u64> = BTreeMap::new();
        let mut series = Vec::with_capacity(rows.len());

        for &i in rows {
            let sample = &set.samples[i];
            if let Some(prev) = seen.insert(sample.pyscpu.as_str(), sample.line) {
                bail!(
                    "duplicate entry for mnode {} pyscpu {} in {} (lines {} and {})",
                    node,
                    sample.pyscpu,
                    set.path,
                    prev,
                    sample.line
                );
            }
            let Some(mean) = sample.mean() else {
                bail!("{}:{}: row has no measurements", set.path, sample.line);
            };
            series.push((sample.pyscpu.clone(), mean));
        }

        log::debug!("mnode {}: {} cores", node, series.len());
        table.insert_column(node.to_string(), series);
    }

    // Gaps are kept as missing cells, never zero-filled.
    for cpu in &table.index {
        let missing: Vec<&str> = table
            .columns
            .iter()
            .filter(|c| !c.values.contains_key(cpu))
            .map(|c| c.name.as_str())
            .collect();
        if !missing.is_empty() {
            log::warn!(
                "pyscpu {} has no samples for mnode {}",
                cpu,
                missing.join(", ")
            );
        }
    }

    log::info!(
        "aggregated {} cores x {} numa nodes",
        table.index.len(),
        table.columns.len()
    );

    Ok(table)
}

impl fmt::Display for AggregatedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const HEADER: &str = "pyscpu";

        let cells: Vec<Vec<String>> = self
            .index
            .iter()
            .map(|cpu| {
                self.columns
                    .iter()
                    .map(|c| match c.values.get(cpu) {
                        Some(v) => format!("{:.2}", v),
                        None => "NaN".to_string(),
                    })
                    .collect()
            })
            .collect();

        let index_width = self
            .index
            .iter()
            .map(|s| s.len())
            .chain(std::iter::once(HEADER.len()))
            .max()
            .unwrap_or(HEADER.len());
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(j, c)| {
                cells
                    .iter()
                    .map(|row| row[j].len())
                    .chain(std::iter::once(c.name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:<w$}", HEADER, w = index_width)?;
        for (c, w) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>w$}", c.name, w = *w)?;
        }
        writeln!(f)?;

        for (cpu, row) in self.index.iter().zip(&cells) {
            write!(f, "{:<w$}", cpu, w = index_width)?;
            for (cell, w) in row.iter().zip(&widths) {
                write!(f, "  {:>w$}", cell, w = *w)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::row::RawSample;
    use pretty_assertions::assert_eq;

    fn sample(mnode: &str, pyscpu: &str, measurements: &[f64], line: u64) -> RawSample {
        RawSample {
            mnode: mnode.into(),
            pyscpu: pyscpu.into(),
            measurements: measurements.to_vec(),
            line,
        }
    }

    fn set(samples: Vec<RawSample>) -> SampleSet {
        SampleSet {
            path: "latency.tsv".into(),
            measurement_columns: vec!["t1".into(), "t2".into()],
            samples,
        }
    }

    fn two_node_set() -> SampleSet {
        set(vec![
            sample("0", "1", &[10.0, 20.0], 2),
            sample("0", "2", &[30.0, 40.0], 3),
            sample("1", "1", &[100.0, 200.0], 4),
        ])
    }

    #[test]
    fn means_per_node_and_core_with_missing_cells() {
        let table = aggregate(&two_node_set()).unwrap();

        assert_eq!(table.column_names(), vec!["0", "1"]);
        assert_eq!(table.index(), &["1".to_string(), "2".to_string()]);
        assert_eq!(table.get("1", "0"), Some(15.0));
        assert_eq!(table.get("1", "1"), Some(150.0));
        assert_eq!(table.get("2", "0"), Some(35.0));
        assert_eq!(table.get("2", "1"), None);
    }

    #[test]
    fn columns_are_distinct_nodes_in_first_seen_order() {
        let table = aggregate(&set(vec![
            sample("3", "0", &[1.0, 1.0], 2),
            sample("1", "0", &[2.0, 2.0], 3),
            sample("3", "1", &[3.0, 3.0], 4),
            sample("2", "0", &[4.0, 4.0], 5),
        ]))
        .unwrap();
        assert_eq!(table.column_names(), vec!["3", "1", "2"]);
    }

    #[test]
    fn index_is_union_of_cores_across_nodes() {
        let table = aggregate(&set(vec![
            sample("0", "a", &[1.0, 1.0], 2),
            sample("0", "b", &[1.0, 1.0], 3),
            sample("1", "c", &[1.0, 1.0], 4),
            sample("1", "a", &[1.0, 1.0], 5),
        ]))
        .unwrap();

        assert_eq!(
            table.index(),
            &["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert_eq!(table.get("c", "0"), None);
        assert_eq!(table.get("b", "1"), None);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let input = two_node_set();
        assert_eq!(aggregate(&input).unwrap(), aggregate(&input).unwrap());
    }

    #[test]
    fn empty_set_gives_empty_table() {
        let table = aggregate(&set(vec![])).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
        assert_eq!(table.value_range(), None);
        assert_eq!(table.to_string(), "pyscpu\n");
    }

    #[test]
    fn duplicate_core_under_one_node_fails() {
        let err = aggregate(&set(vec![
            sample("0", "1", &[1.0, 2.0], 2),
            sample("0", "1", &[3.0, 4.0], 7),
        ]))
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("lines 2 and 7"), "{}", msg);
    }

    #[test]
    fn value_range_covers_present_cells() {
        let table = aggregate(&two_node_set()).unwrap();
        assert_eq!(table.value_range(), Some((15.0, 150.0)));
    }

    #[test]
    fn display_marks_missing_cells_as_nan() {
        let table = aggregate(&two_node_set()).unwrap();
        let expected = "\
pyscpu      0       1
1       15.00  150.00
2       35.00     NaN
";
        assert_eq!(table.to_string(), expected);
    }
}
