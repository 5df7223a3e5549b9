// Primitives for reading CSV tally files.

use collation::VoteCount;
use log::{debug, info};
use snafu::prelude::*;

use crate::collate::{
    io_common::{ParsedTally, NUM_COLUMNS},
    *,
};

pub fn read_csv_tallies(path: &str) -> CollateResult<Vec<ParsedTally>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut res: Vec<ParsedTally> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_tallies: {:?} {:?}", lineno, line);
        if line.iter().all(|s| s.trim().is_empty()) {
            continue;
        }
        ensure!(line.len() >= NUM_COLUMNS, CsvLineTooShortSnafu { lineno });
        let cell = |i: usize| line.get(i).unwrap_or("").trim();

        let invalid_votes = if cell(4).is_empty() {
            VoteCount::EMPTY
        } else {
            read_count(cell(4), lineno)?
        };
        res.push(ParsedTally {
            lineno,
            station: read_id(cell(0), lineno)?,
            position: read_id(cell(1), lineno)?,
            candidate: read_id(cell(2), lineno)?,
            votes: read_count(cell(3), lineno)?,
            invalid_votes,
            scan: Some(cell(5).to_string()).filter(|s| !s.is_empty()),
            agent: read_id(cell(6), lineno)?,
        });
    }
    info!("read_csv_tallies: {}: {} lines", path, res.len());
    Ok(res)
}

fn read_id(s: &str, lineno: usize) -> CollateResult<u32> {
    s.parse::<u32>().ok().context(InvalidIdCellSnafu {
        lineno,
        content: s,
    })
}

fn read_count(s: &str, lineno: usize) -> CollateResult<VoteCount> {
    s.parse::<VoteCount>().context(InvalidCountSnafu {
        what: format!("line {}", lineno),
    })
}
