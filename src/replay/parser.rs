use super::ReplayError;
use std::io::Read;

pub(crate) struct ParsedTable {
    pub(crate) scorer_names: Vec<String>,
    pub(crate) rows: Vec<ParsedRow>,
}

pub(crate) struct ParsedRow {
    pub(crate) candidate: String,
    pub(crate) scores: Vec<Option<f64>>,
}

pub(crate) fn parse_table<R: Read>(reader: R) -> Result<ParsedTable, ReplayError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    match headers.get(0) {
        Some(first) if first.eq_ignore_ascii_case("candidate") => {}
        _ => return Err(ReplayError::MissingCandidateColumn),
    }
    let scorer_names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let line = index + 2;
        let candidate = record.get(0).unwrap_or_default().to_string();
        if candidate.is_empty() {
            return Err(ReplayError::MissingCandidate { line });
        }

        let mut scores = Vec::with_capacity(scorer_names.len());
        for (column, scorer) in scorer_names.iter().enumerate() {
            let cell = record.get(column + 1).unwrap_or_default();
            scores.push(parse_score(cell).map_err(|_| ReplayError::InvalidScore {
                line,
                scorer: scorer.clone(),
                value: cell.to_string(),
            })?);
        }

        rows.push(ParsedRow { candidate, scores });
    }

    Ok(ParsedTable { scorer_names, rows })
}

fn parse_score(cell: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>().map(Some)
}
