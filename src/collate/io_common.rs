use std::collections::BTreeMap;
use std::path::Path;

use collation::*;
use log::debug;
use snafu::prelude::*;

use crate::collate::*;

/// One line of a tally file: the count of one candidate at one station.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedTally {
    pub lineno: usize,
    pub station: u32,
    pub position: u32,
    pub candidate: u32,
    pub votes: VoteCount,
    pub invalid_votes: VoteCount,
    pub scan: Option<String>,
    pub agent: u32,
}

pub const NUM_COLUMNS: usize = 7;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Groups the lines per (station, position) into one submission each.
///
/// The lines of a group must agree on the invalid votes, the scan and the agent.
pub fn group_tallies(path: &str, lines: Vec<ParsedTally>) -> CollateResult<Vec<TallySubmission>> {
    let mut groups: BTreeMap<(u32, u32), (ParsedTally, TallySubmission)> = BTreeMap::new();
    for line in lines {
        match groups.get_mut(&(line.station, line.position)) {
            Some((first, sub)) => {
                ensure!(
                    first.invalid_votes == line.invalid_votes
                        && first.scan == line.scan
                        && first.agent == line.agent,
                    InconsistentTallySnafu {
                        path: simplify_file_name(path),
                        lineno: line.lineno,
                        first_lineno: first.lineno,
                    }
                );
                sub.votes.push((CandidateId(line.candidate), line.votes));
            }
            None => {
                let sub = TallySubmission {
                    station: StationId(line.station),
                    position: PositionId(line.position),
                    votes: vec![(CandidateId(line.candidate), line.votes)],
                    total_invalid_votes: line.invalid_votes,
                    scan: line.scan.clone(),
                    agent: AgentId(line.agent),
                };
                groups.insert((line.station, line.position), (line, sub));
            }
        }
    }
    debug!("group_tallies: {}: {} tallies", path, groups.len());
    Ok(groups.into_values().map(|(_, sub)| sub).collect())
}
