// The approval chain of result sheets: station, then constituency, then
// region, then nation.

use chrono::Utc;
use log::{info, warn};

use crate::config::*;
use crate::CollationEngine;

impl CollationEngine {
    /// Records the approval of a result sheet by an agent.
    ///
    /// The agent fills the slot of its own zone level. All the preconditions
    /// are checked and every failed one is reported. On error, nothing is
    /// stored. A missing `ec_summary_total` counts as 0.
    pub fn record_approval(
        &mut self,
        sheet_id: ResultSheetId,
        agent_id: AgentId,
        ec_summary_total: Option<VoteCount>,
    ) -> Result<ResultSheetApproval, ValidationErrors> {
        let mut errors: Vec<String> = Vec::new();

        let sheet = self.store.sheet(sheet_id);
        match sheet {
            None => errors.push(format!("Result sheet {} does not exist.", sheet_id.0)),
            Some(s) => {
                if s.scan.is_none() {
                    errors.push(format!(
                        "Result sheet {} has no scanned sheet attached.",
                        sheet_id.0
                    ));
                }
                if self.store.results_for_sheet(sheet_id).next().is_none() {
                    errors.push(format!("Result sheet {} has no results.", sheet_id.0));
                }
            }
        }

        if let Some(ec) = ec_summary_total.filter(|v| !v.is_valid()) {
            errors.push(format!(
                "EC summary total {} is above {}.",
                ec.0,
                VoteCount::MAX.0
            ));
        }

        let agent = self.registry.agent(agent_id);
        if agent.is_none() {
            errors.push(format!("Agent {} does not exist.", agent_id.0));
        }

        let approved: Vec<ApprovalLevel> = self.get_approval_status(sheet_id);
        let mut level: Option<ApprovalLevel> = None;
        if let (Some(s), Some(a)) = (sheet, agent) {
            let covers = self
                .registry
                .zone_contains(a.zone, s.station)
                .unwrap_or(false);
            if !covers {
                errors.push(format!(
                    "Agent {} is not assigned to a zone containing station {}.",
                    agent_id.0, s.station.0
                ));
            }
            let l = ApprovalLevel::for_zone(a.zone);
            level = Some(l);
            if approved.contains(&l) {
                errors.push(format!(
                    "Result sheet {} already has a {} approval.",
                    sheet_id.0,
                    l.name()
                ));
            }
            for lower in l.below() {
                if !approved.contains(lower) {
                    errors.push(format!(
                        "Result sheet {} needs a {} approval before a {} approval.",
                        sheet_id.0,
                        lower.name(),
                        l.name()
                    ));
                }
            }
            if self
                .store
                .approvals_for(sheet_id)
                .iter()
                .any(|ap| ap.agent == agent_id)
            {
                errors.push(format!(
                    "Agent {} has already approved result sheet {}.",
                    agent_id.0, sheet_id.0
                ));
            }
        }

        let (sheet, level) = match (sheet, level) {
            (Some(s), Some(l)) if errors.is_empty() => (s, l),
            _ => {
                warn!(
                    "record_approval: {} by {} refused: {:?}",
                    sheet_id, agent_id, errors
                );
                return Err(ValidationErrors { messages: errors });
            }
        };

        let ec = ec_summary_total.unwrap_or_default().0;
        let approval = ResultSheetApproval {
            sheet: sheet_id,
            agent: agent_id,
            level,
            total_valid_votes: sheet.total_valid_votes,
            ec_summary_total: ec,
            variance: signed_difference(sheet.total_valid_votes, ec),
            approved_at: Utc::now(),
        };
        self.store
            .insert_approval(approval.clone())
            .map_err(|e| ValidationErrors::single(e.to_string()))?;
        if approval.variance != 0 {
            warn!(
                "record_approval: {} approved at {} level with a variance of {}",
                sheet_id,
                level.name(),
                approval.variance
            );
        } else {
            info!(
                "record_approval: {} approved at {} level by {}",
                sheet_id,
                level.name(),
                agent_id
            );
        }
        Ok(approval)
    }

    /// The levels at which the sheet is approved, lowest first.
    pub fn get_approval_status(&self, sheet: ResultSheetId) -> Vec<ApprovalLevel> {
        self.store
            .approvals_for(sheet)
            .iter()
            .map(|a| a.level)
            .collect()
    }

    pub fn approval_state(&self, sheet: ResultSheetId) -> ApprovalState {
        ApprovalState::from_highest(self.get_approval_status(sheet).last().copied())
    }

    pub fn is_fully_approved(&self, sheet: ResultSheetId) -> bool {
        self.approval_state(sheet) == ApprovalState::NationApproved
    }

    pub fn approvals(&self, sheet: ResultSheetId) -> Vec<&ResultSheetApproval> {
        self.store.approvals_for(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn with_sheet() -> (CollationEngine, ResultSheetId) {
        let mut e = engine();
        let sheet = e
            .submit_tally(submission(
                1,
                MP_C1,
                &[(MP1_A, 10), (MP1_B, 7), (MP1_C, 2)],
                0,
            ))
            .unwrap();
        (e, sheet.id)
    }

    fn agent_for(level: ApprovalLevel) -> AgentId {
        match level {
            ApprovalLevel::Station => station_agent(1),
            ApprovalLevel::Constituency => CONSTITUENCY_AGENT_C1,
            ApprovalLevel::Region => REGION_AGENT_R1,
            ApprovalLevel::Nation => NATION_AGENT,
        }
    }

    #[test]
    fn full_chain_in_order() {
        init_logs();
        let (mut e, sheet) = with_sheet();
        assert_eq!(e.approval_state(sheet), ApprovalState::NotApproved);
        for level in ApprovalLevel::ALL {
            let a = e
                .record_approval(sheet, agent_for(level), Some(VoteCount(19)))
                .unwrap();
            assert_eq!(a.level, level);
            assert_eq!(a.variance, 0);
        }
        assert_eq!(e.get_approval_status(sheet), ApprovalLevel::ALL.to_vec());
        assert!(e.is_fully_approved(sheet));
    }

    #[test]
    fn skipping_a_level_is_refused() {
        let (mut e, sheet) = with_sheet();
        let err = e
            .record_approval(sheet, CONSTITUENCY_AGENT_C1, None)
            .unwrap_err();
        assert_eq!(
            err.messages,
            vec!["Result sheet 1 needs a station approval before a constituency approval."]
        );
        assert!(e.get_approval_status(sheet).is_empty());
    }

    // Whatever the order of the attempts, the stored levels always form a prefix
    // of the chain.
    #[test]
    fn approvals_stay_monotonic_for_every_order() {
        let levels = ApprovalLevel::ALL;
        let mut orders: Vec<Vec<ApprovalLevel>> = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let idx = [a, b, c, d];
                        let mut sorted = idx;
                        sorted.sort();
                        if sorted == [0, 1, 2, 3] {
                            orders.push(idx.iter().map(|i| levels[*i]).collect());
                        }
                    }
                }
            }
        }
        assert_eq!(orders.len(), 24);
        for order in orders {
            let (mut e, sheet) = with_sheet();
            for level in order.iter() {
                let _ = e.record_approval(sheet, agent_for(*level), None);
                let status = e.get_approval_status(sheet);
                assert_eq!(status, levels[..status.len()].to_vec(), "{:?}", order);
            }
        }
    }

    #[test]
    fn variance_is_signed() {
        let (mut e, sheet) = with_sheet();
        let a = e
            .record_approval(sheet, station_agent(1), Some(VoteCount(25)))
            .unwrap();
        assert_eq!(a.total_valid_votes, 19);
        assert_eq!(a.variance, -6);
        let a = e
            .record_approval(sheet, CONSTITUENCY_AGENT_C1, Some(VoteCount(15)))
            .unwrap();
        assert_eq!(a.variance, 4);
        let a = e.record_approval(sheet, REGION_AGENT_R1, None).unwrap();
        assert_eq!(a.ec_summary_total, 0);
        assert_eq!(a.variance, 19);
    }

    #[test]
    fn variance_against_the_largest_ec_total() {
        let (mut e, sheet) = with_sheet();
        let err = e
            .record_approval(sheet, station_agent(1), Some(VoteCount(u64::MAX)))
            .unwrap_err();
        assert_eq!(
            err.messages,
            vec!["EC summary total 18446744073709551615 is above 9223372036854775807."]
        );
        assert!(e.approvals(sheet).is_empty());
        let a = e
            .record_approval(sheet, station_agent(1), Some(VoteCount::MAX))
            .unwrap();
        assert_eq!(a.variance, 19 - i64::MAX);
    }

    #[test]
    fn second_approval_at_same_level_is_refused() {
        let (mut e, sheet) = with_sheet();
        e.record_approval(sheet, station_agent(1), None).unwrap();
        let err = e
            .record_approval(sheet, station_agent(1), None)
            .unwrap_err();
        assert_eq!(
            err.messages,
            vec![
                "Result sheet 1 already has a station approval.",
                "Agent 1 has already approved result sheet 1.",
            ]
        );
        assert_eq!(e.approvals(sheet).len(), 1);
    }

    #[test]
    fn agent_outside_the_zone_is_refused() {
        let (mut e, sheet) = with_sheet();
        e.record_approval(sheet, station_agent(1), None).unwrap();
        let err = e
            .record_approval(sheet, CONSTITUENCY_AGENT_C2, None)
            .unwrap_err();
        assert_eq!(
            err.messages,
            vec!["Agent 11 is not assigned to a zone containing station 1."]
        );
        let err = e
            .record_approval(sheet, REGION_AGENT_R2, None)
            .unwrap_err();
        assert_eq!(err.messages.len(), 2);
    }

    #[test]
    fn missing_sheet_scan_and_agent() {
        let mut e = engine();
        let err = e
            .record_approval(ResultSheetId(5), AgentId(99), None)
            .unwrap_err();
        assert_eq!(
            err.messages,
            vec!["Result sheet 5 does not exist.", "Agent 99 does not exist."]
        );

        let mut sub = submission(2, PRESIDENT, &[(PRES_A, 3)], 0);
        sub.scan = None;
        let sheet = e.submit_tally(sub).unwrap().id;
        let err = e
            .record_approval(sheet, station_agent(2), None)
            .unwrap_err();
        assert_eq!(
            err.messages,
            vec!["Result sheet 1 has no scanned sheet attached."]
        );
    }

    #[test]
    fn approved_sheet_cannot_be_resubmitted() {
        let (mut e, sheet) = with_sheet();
        e.record_approval(sheet, station_agent(1), None).unwrap();
        let err = e
            .submit_tally(submission(1, MP_C1, &[(MP1_A, 11)], 0))
            .unwrap_err();
        assert_eq!(
            err.messages,
            vec!["Result sheet 1 is under approval and cannot be changed."]
        );
    }
}
