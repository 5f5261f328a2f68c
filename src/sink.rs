//! Append-only sample sink.
//!
//! One line per tick: `round(pc);rate to two decimals;setpoint`. The
//! setpoint is an integer (`AllParameters::set_points: Vec<u64>`), so it is
//! written bare, with no decimal point.

use std::path::Path;

use csv::WriterBuilder;

use crate::errors::SinkError;
use crate::sampler::Sample;

/// Single-writer, append-only sink. Uses the `csv` crate with a `;`
/// delimiter and no headers/quoting rather than hand-rolling line
/// formatting.
pub struct SampleSink {
    writer: csv::Writer<std::fs::File>,
}

impl SampleSink {
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let writer = WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_path(path)
            .map_err(|source| SinkError::Open {
                path: path.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, source),
            })?;
        Ok(SampleSink { writer })
    }

    pub fn write_sample(&mut self, sample: &Sample) -> Result<(), SinkError> {
        self.writer.write_record(&[
            format!("{:.0}", sample.pc),
            format!("{:.2}", sample.rate),
            sample.setpoint.to_string(),
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush().map_err(|source| SinkError::Open {
            path: "<sink>".to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::Sample;

    #[test]
    fn writes_semicolon_delimited_line() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("prefetch-ctl-sink-test-{}.csv", std::process::id()));
        {
            let mut sink = SampleSink::create(&path).unwrap();
            sink.write_sample(&Sample {
                pc: 20.0,
                rate: 12.345,
                setpoint: 100,
            })
            .unwrap();
            sink.flush().unwrap();
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "20;12.35;100\n");
        std::fs::remove_file(&path).unwrap();
    }
}
