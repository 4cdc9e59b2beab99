//! Offline re-ranking of recorded scoring sessions.
//!
//! A score table is a CSV export with a `candidate` column followed by one column per
//! scorer, each cell holding the score that scorer produced for that candidate:
//!
//! ```text
//! candidate,proximity,gaze
//! lamp,0.6,0.5
//! door,0.0,0.9
//! ```
//!
//! Every column becomes a [`RecordedScorer`], so the session can be replayed through a
//! [`RankingEngine`](crate::ranking::RankingEngine) under another scorer order,
//! enable state or weight curve.

mod parser;

use crate::ranking::{Actor, Scorer, ScorerError};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum ReplayError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingCandidateColumn,
    MissingCandidate {
        line: usize,
    },
    InvalidScore {
        line: usize,
        scorer: String,
        value: String,
    },
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::Io(err) => write!(f, "failed to read score table: {}", err),
            ReplayError::Csv(err) => write!(f, "invalid score table CSV data: {}", err),
            ReplayError::MissingCandidateColumn => {
                write!(f, "score table must start with a 'candidate' column")
            }
            ReplayError::MissingCandidate { line } => {
                write!(f, "line {line} has no candidate name")
            }
            ReplayError::InvalidScore {
                line,
                scorer,
                value,
            } => write!(
                f,
                "line {line}: '{value}' is not a valid score for scorer {scorer}"
            ),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayError::Io(err) => Some(err),
            ReplayError::Csv(err) => Some(err),
            ReplayError::MissingCandidateColumn
            | ReplayError::MissingCandidate { .. }
            | ReplayError::InvalidScore { .. } => None,
        }
    }
}

impl From<std::io::Error> for ReplayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ReplayError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Recorded per-scorer scores of a set of candidates, in recording order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    scorer_names: Vec<String>,
    candidates: Vec<String>,
    scores: Vec<Vec<Option<f64>>>,
}

impl ScoreTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReplayError> {
        let parsed = parser::parse_table(reader)?;
        let mut candidates = Vec::with_capacity(parsed.rows.len());
        let mut scores = Vec::with_capacity(parsed.rows.len());
        for row in parsed.rows {
            candidates.push(row.candidate);
            scores.push(row.scores);
        }

        Ok(Self {
            scorer_names: parsed.scorer_names,
            candidates,
            scores,
        })
    }

    pub fn scorer_names(&self) -> &[String] {
        &self.scorer_names
    }

    /// Candidates in the order they were recorded.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn score(&self, scorer: &str, candidate: &str) -> Option<f64> {
        let column = self.scorer_names.iter().position(|name| name == scorer)?;
        let row = self
            .candidates
            .iter()
            .rposition(|recorded| recorded == candidate)?;
        self.scores[row][column]
    }

    /// One scorer per column, in column order.
    pub fn recorded_scorers(&self) -> Vec<RecordedScorer> {
        self.scorer_names
            .iter()
            .enumerate()
            .map(|(column, name)| {
                let scores = self
                    .candidates
                    .iter()
                    .zip(&self.scores)
                    .filter_map(|(candidate, row)| {
                        row[column].map(|score| (candidate.clone(), score))
                    })
                    .collect();
                RecordedScorer::new(name.clone(), scores)
            })
            .collect()
    }
}

/// Scorer replaying the scores recorded for named candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedScorer {
    name: String,
    scores: HashMap<String, f64>,
}

impl RecordedScorer {
    pub fn new(name: impl Into<String>, scores: HashMap<String, f64>) -> Self {
        Self {
            name: name.into(),
            scores,
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl<A: Actor> Scorer<A, String> for RecordedScorer {
    fn score(&self, _actor: &A, candidate: &String) -> Result<f64, ScorerError> {
        self.scores
            .get(candidate)
            .copied()
            .ok_or_else(|| ScorerError::MissingScore {
                candidate: candidate.clone(),
            })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = "candidate, proximity, gaze
lamp, 0.6, 0.5
door, 0.0,
vase, -0.2, 0.9
";

    #[test]
    fn loads_candidates_and_columns_in_order() {
        let table = ScoreTable::from_reader(SESSION.as_bytes()).expect("table loads");

        assert_eq!(table.scorer_names(), &["proximity", "gaze"]);
        assert_eq!(table.candidates(), &["lamp", "door", "vase"]);
        assert_eq!(table.score("gaze", "vase"), Some(0.9));
        assert_eq!(table.score("gaze", "door"), None);
        assert_eq!(table.score("missing", "lamp"), None);
    }

    #[test]
    fn recorded_scorers_skip_empty_cells() {
        let table = ScoreTable::from_reader(SESSION.as_bytes()).expect("table loads");
        let scorers = table.recorded_scorers();

        assert_eq!(scorers.len(), 2);
        assert_eq!(scorers[0].len(), 3);
        assert_eq!(scorers[1].len(), 2);

        let gaze = &scorers[1];
        assert_eq!(
            Scorer::<(), String>::score(gaze, &(), &"lamp".to_string()),
            Ok(0.5)
        );
        assert_eq!(
            Scorer::<(), String>::score(gaze, &(), &"door".to_string()),
            Err(ScorerError::MissingScore {
                candidate: "door".to_string()
            })
        );
    }

    #[test]
    fn rejects_tables_without_candidate_column() {
        let err = ScoreTable::from_reader("name,gaze\nlamp,1\n".as_bytes())
            .expect_err("candidate column required");
        assert!(matches!(err, ReplayError::MissingCandidateColumn));
    }

    #[test]
    fn reports_the_line_of_invalid_scores() {
        let err = ScoreTable::from_reader("candidate,gaze\nlamp,1\ndoor,far\n".as_bytes())
            .expect_err("invalid score");
        match err {
            ReplayError::InvalidScore {
                line,
                scorer,
                value,
            } => {
                assert_eq!(line, 3);
                assert_eq!(scorer, "gaze");
                assert_eq!(value, "far");
            }
            other => panic!("expected invalid score, got {other:?}"),
        }
    }
}
