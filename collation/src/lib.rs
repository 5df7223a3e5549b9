//! Collation and approval of election results.
//!
//! Raw tallies are recorded per polling station, rolled up through the
//! constituency, region, nation and supernational levels, approved bottom-up
//! by the agents of each level, and finally used to declare parliamentary
//! seats and zone winners.
//!
//! See the [`quick_start`] and [`manual`] modules for a walkthrough.

mod aggregate;
mod approval;
pub mod builder;
mod config;
pub mod jobs;
pub mod manual;
pub mod quick_start;
mod registry;
mod seats;
mod store;
#[cfg(test)]
mod test_utils;

use std::collections::BTreeSet;

use log::{debug, info};

pub use crate::builder::RegistryBuilder;
pub use crate::config::*;
pub use crate::registry::Registry;
pub use crate::store::{CollationTable, CollationTables, TallyStore};

/// The state of one election: its reference data and everything recorded
/// or derived since.
#[derive(Debug, Clone)]
pub struct CollationEngine {
    pub(crate) registry: Registry,
    pub(crate) store: TallyStore,
}

impl CollationEngine {
    pub fn new(registry: Registry) -> CollationEngine {
        CollationEngine {
            registry,
            store: TallyStore::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &TallyStore {
        &self.store
    }

    pub fn result_sheet(&self, id: ResultSheetId) -> Option<&ResultSheet> {
        self.store.sheet(id)
    }

    pub fn result_sheet_for(&self, station: StationId, position: PositionId) -> Option<&ResultSheet> {
        self.store.sheet_for(station, position)
    }

    fn check_submission(&self, sub: &TallySubmission) -> Vec<String> {
        let mut errors: Vec<String> = Vec::new();
        let ancestry = self.registry.ancestry(sub.station).ok();
        if ancestry.is_none() {
            errors.push(format!("Station {} does not exist.", sub.station.0));
        }

        match (self.registry.position(sub.position), ancestry) {
            (None, _) => errors.push(format!("Position {} does not exist.", sub.position.0)),
            (Some(p), Some(a)) if !a.contains(p.zone) => errors.push(format!(
                "Position {} is not contested at station {}.",
                sub.position.0, sub.station.0
            )),
            _ => {}
        }

        match (self.registry.agent(sub.agent), ancestry) {
            (None, _) => errors.push(format!("Agent {} does not exist.", sub.agent.0)),
            (Some(ag), Some(a)) if !a.contains(ag.zone) => errors.push(format!(
                "Agent {} is not assigned to a zone containing station {}.",
                sub.agent.0, sub.station.0
            )),
            _ => {}
        }

        if sub.votes.is_empty() {
            errors.push("No candidate votes were submitted.".to_string());
        }
        let mut seen: BTreeSet<CandidateId> = BTreeSet::new();
        for (cid, votes) in sub.votes.iter() {
            if !seen.insert(*cid) {
                errors.push(format!("Candidate {} appears more than once.", cid.0));
                continue;
            }
            if !votes.is_valid() {
                errors.push(format!(
                    "Candidate {} has more than {} votes.",
                    cid.0,
                    VoteCount::MAX.0
                ));
            }
            match self.registry.candidate(*cid) {
                None => errors.push(format!("Candidate {} does not exist.", cid.0)),
                Some(c) if c.position != sub.position => errors.push(format!(
                    "Candidate {} does not contest position {}.",
                    cid.0, sub.position.0
                )),
                _ => {}
            }
        }

        if !sub.total_invalid_votes.is_valid() {
            errors.push(format!("More than {} invalid votes.", VoteCount::MAX.0));
        } else if errors.is_empty() && !self.fits_in_totals(sub) {
            errors.push(format!(
                "The votes recorded for the election would exceed {}.",
                VoteCount::MAX.0
            ));
        }

        if let Some(sheet) = self.store.sheet_for(sub.station, sub.position) {
            if !self.store.approvals_for(sheet.id).is_empty() {
                errors.push(format!(
                    "Result sheet {} is under approval and cannot be changed.",
                    sheet.id.0
                ));
            }
        }
        errors
    }

    // Every collation record sums a subset of the recorded counts, so bounding
    // the grand total bounds every record.
    fn fits_in_totals(&self, sub: &TallySubmission) -> bool {
        let replaced: BTreeSet<CandidateId> = sub.votes.iter().map(|(c, _)| *c).collect();
        let kept_votes: u128 = self
            .store
            .results()
            .filter(|r| !(r.station == sub.station && replaced.contains(&r.candidate)))
            .map(|r| r.votes.0 as u128)
            .sum();
        let kept_invalid: u128 = self
            .store
            .sheets()
            .filter(|s| !(s.station == sub.station && s.position == sub.position))
            .map(|s| s.total_invalid_votes as u128)
            .sum();
        let new_votes: u128 = sub.votes.iter().map(|(_, v)| v.0 as u128).sum();
        kept_votes + kept_invalid + new_votes + sub.total_invalid_votes.0 as u128
            <= VoteCount::MAX.0 as u128
    }

    /// Records the tally of a station for one position.
    ///
    /// Counts replace the counts previously recorded for the same candidates.
    /// The result sheet totals and the collation records above the station
    /// are updated before returning. Nothing is changed if the submission is
    /// refused.
    pub fn submit_tally(&mut self, sub: TallySubmission) -> Result<ResultSheet, ValidationErrors> {
        let errors = self.check_submission(&sub);
        if !errors.is_empty() {
            return Err(ValidationErrors { messages: errors });
        }
        let office = self
            .registry
            .office_type(sub.position)
            .map_err(|e| ValidationErrors::single(e.to_string()))?;

        let sheet_id = {
            let sheet =
                self.store
                    .sheet_mut_or_insert(sub.station, sub.position, office, sub.agent);
            sheet.total_invalid_votes = sub.total_invalid_votes.0;
            sheet.recorded_by = sub.agent;
            if sub.scan.is_some() {
                sheet.scan = sub.scan.clone();
            }
            sheet.id
        };
        for (cid, votes) in sub.votes.iter() {
            self.store
                .upsert_result(sub.station, *cid, *votes, sheet_id);
        }
        let valid: VoteCount = self
            .store
            .results_for_sheet(sheet_id)
            .map(|r| r.votes)
            .sum();
        let sheet = match self.store.sheet_mut(sheet_id) {
            Some(sheet) => {
                sheet.total_valid_votes = valid.0;
                sheet.total_votes = valid.0 + sheet.total_invalid_votes;
                sheet.clone()
            }
            None => {
                return Err(ValidationErrors::single(
                    CollationError::UnknownResultSheet(sheet_id).to_string(),
                ))
            }
        };
        debug!("submit_tally: {:?}", sheet);

        aggregate::collate_path(&self.registry, &mut self.store, sub.station, office)
            .map_err(|e| ValidationErrors::single(e.to_string()))?;
        info!(
            "submit_tally: {} {} recorded ({} valid, {} invalid)",
            sub.station, sub.position, sheet.total_valid_votes, sheet.total_invalid_votes
        );
        Ok(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn submission_builds_the_sheet() {
        init_logs();
        let mut e = engine();
        let sheet = e
            .submit_tally(submission(
                1,
                MP_C1,
                &[(MP1_A, 10), (MP1_B, 7), (MP1_C, 2)],
                4,
            ))
            .unwrap();
        assert_eq!(sheet.office, OfficeType::Parliamentary);
        assert_eq!(sheet.total_valid_votes, 19);
        assert_eq!(sheet.total_invalid_votes, 4);
        assert_eq!(sheet.total_votes, 23);
        assert_eq!(e.result_sheet_for(StationId(1), MP_C1), Some(&sheet));

        // A partial resubmission keeps the other candidates.
        let sheet = e
            .submit_tally(submission(1, MP_C1, &[(MP1_C, 5)], 4))
            .unwrap();
        assert_eq!(sheet.total_valid_votes, 22);
        assert_eq!(e.store().results().count(), 3);
    }

    #[test]
    fn end_to_end() {
        init_logs();
        let mut e = engine();
        let sheet = e
            .submit_tally(submission(
                1,
                MP_C1,
                &[(MP1_A, 10), (MP1_B, 7), (MP1_C, 2)],
                0,
            ))
            .unwrap();
        e.run_full_collation().unwrap();
        let votes = |entity, zone| {
            e.get_collation(OfficeType::Parliamentary, entity, zone)
                .map(|t| t.total_votes)
        };
        let s1 = CollationZone::Station(StationId(1));
        let c1 = CollationZone::Constituency(ConstituencyId(1));
        assert_eq!(votes(Entity::Candidate(MP1_A), s1), Some(10));
        assert_eq!(votes(Entity::Candidate(MP1_B), s1), Some(7));
        assert_eq!(votes(Entity::Candidate(MP1_C), s1), Some(2));
        assert_eq!(votes(Entity::Party(PARTY_A), c1), Some(10));
        assert_eq!(votes(Entity::Party(PARTY_B), c1), Some(7));
        assert_eq!(votes(Entity::Party(PARTY_C), c1), Some(2));
        assert_eq!(
            votes(Entity::Party(PARTY_A), CollationZone::Nation(NationId(1))),
            Some(10)
        );

        assert!(e
            .record_approval(sheet.id, station_agent(1), Some(VoteCount(19)))
            .is_ok());
        let refused = e.record_approval(sheet.id, REGION_AGENT_R1, None);
        assert_eq!(
            refused.map_err(|err| err.messages),
            Err(vec![
                "Result sheet 1 needs a constituency approval before a region approval."
                    .to_string()
            ])
        );
        assert!(e
            .record_approval(sheet.id, CONSTITUENCY_AGENT_C1, Some(VoteCount(19)))
            .is_ok());
        assert!(e.record_approval(sheet.id, REGION_AGENT_R1, None).is_ok());
        assert_eq!(e.approval_state(sheet.id), ApprovalState::RegionApproved);
    }

    #[test]
    fn all_submission_problems_are_reported() {
        let mut e = engine();
        let mut sub = submission(2, MP_C2, &[(MP1_A, 3), (CandidateId(99), 1)], 0);
        sub.agent = station_agent(3);
        let err = e.submit_tally(sub).unwrap_err();
        assert_eq!(
            err.messages,
            vec![
                "Position 3 is not contested at station 2.",
                "Agent 3 is not assigned to a zone containing station 2.",
                "Candidate 11 does not contest position 3.",
                "Candidate 99 does not exist.",
            ]
        );
        assert_eq!(e.store().results().count(), 0);
        assert!(e.store().collations().is_empty());
    }

    #[test]
    fn unknown_station_and_empty_votes() {
        let mut e = engine();
        let err = e
            .submit_tally(submission(42, PRESIDENT, &[], 0))
            .unwrap_err();
        assert_eq!(
            err.messages,
            vec![
                "Station 42 does not exist.",
                "Agent 42 does not exist.",
                "No candidate votes were submitted.",
            ]
        );
    }

    #[test]
    fn duplicate_candidate_is_refused() {
        let mut e = engine();
        let err = e
            .submit_tally(submission(1, PRESIDENT, &[(PRES_A, 1), (PRES_A, 2)], 0))
            .unwrap_err();
        assert_eq!(err.messages, vec!["Candidate 1 appears more than once."]);
    }

    #[test]
    fn counts_above_the_bound_are_refused() {
        let mut e = engine();
        let err = e
            .submit_tally(submission(1, PRESIDENT, &[(PRES_A, u64::MAX), (PRES_B, 1)], 0))
            .unwrap_err();
        assert_eq!(
            err.messages,
            vec!["Candidate 1 has more than 9223372036854775807 votes."]
        );
        let err = e
            .submit_tally(submission(1, PRESIDENT, &[(PRES_A, 1)], u64::MAX))
            .unwrap_err();
        assert_eq!(
            err.messages,
            vec!["More than 9223372036854775807 invalid votes."]
        );
        assert_eq!(e.store().results().count(), 0);
    }

    #[test]
    fn election_total_stays_within_the_bound() {
        let mut e = engine();
        let half = VoteCount::MAX.0 / 2;
        e.submit_tally(submission(1, PRESIDENT, &[(PRES_A, half)], 0))
            .unwrap();
        // Each count is valid on its own, the sum is not.
        let err = e
            .submit_tally(submission(2, PRESIDENT, &[(PRES_B, half), (PRES_C, 2)], 0))
            .unwrap_err();
        assert_eq!(
            err.messages,
            vec!["The votes recorded for the election would exceed 9223372036854775807."]
        );
        // Replacing a count only counts the new value.
        e.submit_tally(submission(1, PRESIDENT, &[(PRES_A, half + 1)], 0))
            .unwrap();
        let sheet = e
            .submit_tally(submission(2, PRESIDENT, &[(PRES_B, half)], 0))
            .unwrap();
        assert_eq!(sheet.total_votes, half);
        e.run_full_collation().unwrap();
        let nation = e
            .get_collation(
                OfficeType::Presidential,
                Entity::Party(PARTY_A),
                CollationZone::Supernational,
            )
            .unwrap();
        assert_eq!(nation.total_votes, half + 1);
        assert_eq!(nation.variance(), (half + 1) as i64);
    }
}
