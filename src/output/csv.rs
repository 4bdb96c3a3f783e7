use std::io::Write;

use anyhow::Result;

use crate::output::{TabularCell, TabularExport, TabularSink};

pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed flushing CSV output: {}", e.error()))
    }
}

impl<W: Write> TabularSink for CsvSink<W> {
    fn write_header(&mut self, header: &[String]) -> Result<()> {
        self.writer.write_record(header)?;
        Ok(())
    }

    fn write_row(&mut self, row: &[TabularCell]) -> Result<()> {
        self.writer
            .write_record(row.iter().map(|cell| cell.to_string()))?;
        Ok(())
    }
}

pub fn to_csv(table: &TabularExport) -> Result<String> {
    let mut sink = CsvSink::new(vec![]);
    sink.export(table)?;
    let data = sink.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_cells_with_commas() {
        let mut table = TabularExport::new(&["name", "score"]);
        table.push(vec!["Lovelace, Ada".into(), 4.5_f64.into()]);
        let out = to_csv(&table).unwrap();
        assert_eq!(out, "name,score\n\"Lovelace, Ada\",4.50\n");
    }
}
