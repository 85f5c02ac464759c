use crate::sample::row::{RawSample, SampleSet};
use anyhow::{Context, anyhow, bail};
use serde::Deserialize;

const NODE_COLUMN: &str = "mnode";
const CPU_COLUMN: &str = "pyscpu";

/// Identifying columns of a row, looked up by header name.
#[derive(Debug, Deserialize)]
struct SampleKey {
    mnode: String,
    pyscpu: String,
}

/// Parse a latency sample table into a [`SampleSet`].
///
/// Expected layout (tab-separated, header required):
/// mnode  pyscpu  t1  t2 ...
///
/// Every column other than `mnode` and `pyscpu` is a measurement column and
/// must hold a finite number in every row.
///
/// Example:
/// 0   4   212.5   208.0   215.25
pub fn parse_sample_file(path: &str) -> anyhow::Result<SampleSet> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("read sample file {}", path))?;

    let headers = reader
        .headers()
        .with_context(|| format!("read header of {}", path))?
        .clone();

    for required in [NODE_COLUMN, CPU_COLUMN] {
        if !headers.iter().any(|h| h == required) {
            bail!("{}: header has no '{}' column", path, required);
        }
    }

    // Everything that is not an identifier is a repeated trial.
    let measurement_idx: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| *h != NODE_COLUMN && *h != CPU_COLUMN)
        .map(|(i, _)| i)
        .collect();
    if measurement_idx.is_empty() {
        bail!("{}: header has no measurement columns", path);
    }
    let measurement_columns: Vec<String> = measurement_idx
        .iter()
        .map(|&i| headers[i].to_string())
        .collect();

    let mut samples = Vec::new();
    for result in reader.records() {
        let record = result.with_context(|| format!("parse error in {}", path))?;
        let lno = record.position().map(|p| p.line()).unwrap_or(0);

        let key: SampleKey = record
            .deserialize(Some(&headers))
            .with_context(|| format!("bad identifiers at {}:{}", path, lno))?;
        if key.mnode.is_empty() || key.pyscpu.is_empty() {
            bail!("{}:{}: empty mnode or pyscpu", path, lno);
        }

        let mut measurements = Vec::with_capacity(measurement_idx.len());
        for (&idx, column) in measurement_idx.iter().zip(&measurement_columns) {
            let cell = record
                .get(idx)
                .ok_or_else(|| anyhow!("{}:{}: missing column '{}'", path, lno, column))?;
            measurements.push(parse_measurement(cell).with_context(|| {
                format!("{}:{}: bad value in column '{}'", path, lno, column)
            })?);
        }

        samples.push(RawSample {
            mnode: key.mnode,
            pyscpu: key.pyscpu,
            measurements,
            line: lno,
        });
    }

    log::info!(
        "loaded {} samples from {} ({} measurement columns: {})",
        samples.len(),
        path,
        measurement_columns.len(),
        measurement_columns.join(", ")
    );

    Ok(SampleSet {
        path: path.to_string(),
        measurement_columns,
        samples,
    })
}

/// Parse one latency cell. Empty and non-finite values are rejected.
fn parse_measurement(cell: &str) -> anyhow::Result<f64> {
    if cell.is_empty() {
        bail!("empty cell");
    }
    let v: f64 = cell
        .parse()
        .with_context(|| format!("not a number: {:?}", cell))?;
    if !v.is_finite() {
        bail!("not a finite number: {:?}", cell);
    }
    Ok(v)
}
