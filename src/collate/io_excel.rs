// Primitives for reading tally spreadsheets (.xlsx).

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use collation::VoteCount;
use log::{debug, info};
use snafu::prelude::*;

use crate::collate::{
    io_common::{ParsedTally, NUM_COLUMNS},
    *,
};

pub fn read_excel_tallies(
    path: &str,
    worksheet_name: Option<&str>,
) -> CollateResult<Vec<ParsedTally>> {
    let wrange = get_range(path, worksheet_name)?;

    let mut res: Vec<ParsedTally> = Vec::new();
    // The first row is the header.
    for (idx, row) in wrange.rows().enumerate().skip(1) {
        let lineno = idx + 1;
        debug!("read_excel_tallies: {:?} {:?}", lineno, row);
        if row.iter().all(|c| matches!(c, DataType::Empty)) {
            continue;
        }
        ensure!(row.len() >= NUM_COLUMNS, CsvLineTooShortSnafu { lineno });
        let invalid_votes = match &row[4] {
            DataType::Empty => VoteCount::EMPTY,
            c => read_count(c, lineno)?,
        };
        let scan = match &row[5] {
            DataType::Empty => None,
            DataType::String(s) if s.trim().is_empty() => None,
            DataType::String(s) => Some(s.trim().to_string()),
            c => {
                return ExcelWrongCellTypeSnafu {
                    lineno,
                    content: format!("{:?}", c),
                }
                .fail()
            }
        };
        res.push(ParsedTally {
            lineno,
            station: read_id(&row[0], lineno)?,
            position: read_id(&row[1], lineno)?,
            candidate: read_id(&row[2], lineno)?,
            votes: read_count(&row[3], lineno)?,
            invalid_votes,
            scan,
            agent: read_id(&row[6], lineno)?,
        });
    }
    info!("read_excel_tallies: {}: {} lines", path, res.len());
    Ok(res)
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> CollateResult<Range<DataType>> {
    debug!(
        "read_excel_tallies: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?,
    };
    wrange.context(OpeningExcelSnafu { path })
}

fn read_count(cell: &DataType, lineno: usize) -> CollateResult<VoteCount> {
    let what = format!("row {}", lineno);
    match cell {
        DataType::Int(i) => VoteCount::try_from(*i).context(InvalidCountSnafu { what }),
        DataType::Float(f) => VoteCount::try_from(*f).context(InvalidCountSnafu { what }),
        DataType::String(s) => s.parse::<VoteCount>().context(InvalidCountSnafu { what }),
        c => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", c),
        }
        .fail(),
    }
}

fn read_id(cell: &DataType, lineno: usize) -> CollateResult<u32> {
    let id = match cell {
        DataType::Int(i) => u32::try_from(*i).ok(),
        DataType::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64 => {
            Some(*f as u32)
        }
        DataType::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    id.context(InvalidIdCellSnafu {
        lineno,
        content: format!("{:?}", cell),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_to_counts() {
        assert_eq!(read_count(&DataType::Float(12.0), 2).unwrap(), VoteCount(12));
        assert_eq!(read_count(&DataType::Int(3), 2).unwrap(), VoteCount(3));
        assert_eq!(
            read_count(&DataType::String("8".to_string()), 2).unwrap(),
            VoteCount(8)
        );
        assert!(matches!(
            read_count(&DataType::Float(1.5), 2),
            Err(CollateError::InvalidCount { .. })
        ));
        assert!(matches!(
            read_count(&DataType::Bool(true), 4),
            Err(CollateError::ExcelWrongCellType { lineno: 4, .. })
        ));
        assert!(read_count(&DataType::Empty, 2).is_err());
    }

    #[test]
    fn cells_to_ids() {
        assert_eq!(read_id(&DataType::Float(7.0), 2).unwrap(), 7);
        assert_eq!(read_id(&DataType::String(" 9 ".to_string()), 2).unwrap(), 9);
        assert!(read_id(&DataType::Int(-1), 2).is_err());
        assert!(read_id(&DataType::Empty, 2).is_err());
    }

    #[test]
    fn missing_workbook() {
        let res = read_excel_tallies("/nonexistent/tallies.xlsx", None);
        assert!(matches!(res, Err(CollateError::OpeningExcel { .. })));
    }
}
