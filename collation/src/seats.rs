// Parliamentary seats and zone winners.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use crate::config::*;
use crate::CollationEngine;

/// The entries sharing the highest count, when that count is above 0.
fn leaders<T: Ord + Copy>(tally: &BTreeMap<T, u64>) -> (BTreeSet<T>, u64) {
    let max = tally.values().copied().max().unwrap_or(0);
    if max == 0 {
        return (BTreeSet::new(), 0);
    }
    let tied = tally
        .iter()
        .filter(|(_, v)| **v == max)
        .map(|(k, _)| *k)
        .collect();
    (tied, max)
}

impl CollationEngine {
    /// Discards all the parliamentary summary sheets and computes them again
    /// from the raw results. Returns the number of sheets written.
    ///
    /// Constituencies without votes get no sheet. When several candidates
    /// share the highest count, the sheet records the tie.
    pub fn run_seat_determination(&mut self) -> Result<usize, CollationError> {
        let mut by_candidate: BTreeMap<CandidateId, u64> = BTreeMap::new();
        for r in self.store.results() {
            let c = self
                .registry
                .candidate(r.candidate)
                .ok_or(CollationError::UnknownCandidate(r.candidate))?;
            if self.registry.office_type(c.position)? == OfficeType::Parliamentary {
                *by_candidate.entry(c.id).or_insert(0) += r.votes.0;
            }
        }

        let mut sheets: Vec<ParliamentarySummarySheet> = Vec::new();
        for (constituency, position) in self.registry.parliamentary_seats() {
            let tally: BTreeMap<CandidateId, u64> = self
                .registry
                .candidates_for(position)
                .filter_map(|c| by_candidate.get(&c.id).map(|v| (c.id, *v)))
                .collect();
            let total_votes: u64 = tally.values().sum();
            let (winners, votes) = leaders(&tally);
            let outcome = match winners.len() {
                0 => {
                    debug!("run_seat_determination: no votes in {}", constituency);
                    continue;
                }
                1 => match winners.iter().next() {
                    Some(c) => SeatOutcome::Won(*c),
                    None => continue,
                },
                _ => SeatOutcome::Tied(winners),
            };
            debug!(
                "run_seat_determination: {}: {:?} with {} of {}",
                constituency, outcome, votes, total_votes
            );
            sheets.push(ParliamentarySummarySheet {
                position,
                constituency,
                outcome,
                votes,
                total_votes,
            });
        }

        let n = self.store.replace_summaries(sheets);
        let summary = self.seat_summary();
        info!(
            "run_seat_determination: {} seats declared, {} tied, {} outstanding",
            summary.declared, summary.tied, summary.outstanding
        );
        Ok(n)
    }

    pub fn summary_sheets(&self) -> impl Iterator<Item = &ParliamentarySummarySheet> {
        self.store.summaries()
    }

    /// Seats won per party, and how many seats are declared, tied or outstanding.
    pub fn seat_summary(&self) -> SeatSummary {
        let seats = self.registry.parliamentary_seats().count();
        let mut won: BTreeMap<PartyId, usize> = BTreeMap::new();
        let mut tied = 0;
        for s in self.store.summaries() {
            match &s.outcome {
                SeatOutcome::Won(cid) => {
                    if let Some(c) = self.registry.candidate(*cid) {
                        *won.entry(c.party).or_insert(0) += 1;
                    }
                }
                SeatOutcome::Tied(_) => tied += 1,
            }
        }
        let declared: usize = won.values().sum();
        SeatSummary {
            seats,
            declared,
            tied,
            outstanding: seats.saturating_sub(declared + tied),
            won_by_party: won.into_iter().collect(),
        }
    }

    /// The parties with the most votes in a zone.
    ///
    /// All the parties sharing the highest count are returned. The set is
    /// empty when no vote was counted in the zone.
    pub fn get_zone_winner(&self, office: OfficeType, zone: CollationZone) -> BTreeSet<PartyId> {
        let mut tally: BTreeMap<PartyId, u64> = BTreeMap::new();
        let records = self
            .store
            .collations()
            .table(zone.level())
            .iter()
            .filter(|(k, _)| k.office() == office && k.zone() == zone);
        for (k, t) in records {
            let party = match k.entity() {
                Entity::Party(p) => Some(p),
                Entity::Candidate(c) => self.registry.candidate(c).map(|c| c.party),
            };
            if let Some(p) = party {
                *tally.entry(p).or_insert(0) += t.total_votes;
            }
        }
        leaders(&tally).0
    }

    /// The winners of every zone of a level.
    pub fn zone_winners(&self, office: OfficeType, level: CollationLevel) -> LevelWinners {
        let winners = self
            .registry
            .zones_at(level)
            .into_iter()
            .map(|z| (z, self.get_zone_winner(office, z)))
            .collect();
        LevelWinners {
            office,
            level,
            winners,
        }
    }
}
