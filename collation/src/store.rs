// In-memory tables for the raw tallies and everything derived from them.

use std::collections::BTreeMap;

use log::debug;

use crate::config::*;

pub type CollationTable = BTreeMap<CollationKey, CollationTotals>;

/// One table of collation records per level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollationTables {
    station: CollationTable,
    constituency: CollationTable,
    region: CollationTable,
    nation: CollationTable,
    supernational: CollationTable,
}

impl CollationTables {
    pub fn table(&self, level: CollationLevel) -> &CollationTable {
        match level {
            CollationLevel::Station => &self.station,
            CollationLevel::Constituency => &self.constituency,
            CollationLevel::Region => &self.region,
            CollationLevel::Nation => &self.nation,
            CollationLevel::Supernational => &self.supernational,
        }
    }

    fn table_mut(&mut self, level: CollationLevel) -> &mut CollationTable {
        match level {
            CollationLevel::Station => &mut self.station,
            CollationLevel::Constituency => &mut self.constituency,
            CollationLevel::Region => &mut self.region,
            CollationLevel::Nation => &mut self.nation,
            CollationLevel::Supernational => &mut self.supernational,
        }
    }

    pub fn get(&self, key: &CollationKey) -> Option<&CollationTotals> {
        self.table(key.level()).get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &CollationKey) -> Option<&mut CollationTotals> {
        self.table_mut(key.level()).get_mut(key)
    }

    pub(crate) fn insert(&mut self, key: CollationKey, totals: CollationTotals) {
        self.table_mut(key.level()).insert(key, totals);
    }

    /// Replaces all the records of one office in one zone.
    pub(crate) fn replace_zone(
        &mut self,
        office: OfficeType,
        zone: CollationZone,
        records: CollationTable,
    ) {
        let table = self.table_mut(zone.level());
        table.retain(|k, _| !(k.office() == office && k.zone() == zone));
        debug!(
            "replace_zone: {} {}: {} records",
            office.name(),
            zone,
            records.len()
        );
        table.extend(records);
    }

    pub fn len(&self) -> usize {
        CollationLevel::ALL
            .iter()
            .map(|l| self.table(*l).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CollationKey, &CollationTotals)> {
        CollationLevel::ALL
            .iter()
            .flat_map(move |l| self.table(*l).iter())
    }
}

/// Storage for one election.
///
/// Uniqueness constraints are enforced here: one result per (station,
/// candidate), one sheet per (station, position), one approval per
/// (sheet, agent) and per (sheet, level).
#[derive(Debug, Clone, Default)]
pub struct TallyStore {
    results: BTreeMap<ResultId, StationResult>,
    result_index: BTreeMap<(StationId, CandidateId), ResultId>,
    sheets: BTreeMap<ResultSheetId, ResultSheet>,
    sheet_index: BTreeMap<(StationId, PositionId), ResultSheetId>,
    approvals: Vec<ResultSheetApproval>,
    collations: CollationTables,
    ec_totals: BTreeMap<CollationKey, u64>,
    summaries: BTreeMap<ConstituencyId, ParliamentarySummarySheet>,
    next_result: u32,
    next_sheet: u32,
}

impl TallyStore {
    pub fn new() -> TallyStore {
        TallyStore::default()
    }

    // ******** Raw tallies ********

    pub fn results(&self) -> impl Iterator<Item = &StationResult> {
        self.results.values()
    }

    pub fn results_for_sheet(&self, sheet: ResultSheetId) -> impl Iterator<Item = &StationResult> {
        self.results.values().filter(move |r| r.sheet == sheet)
    }

    pub fn sheet(&self, id: ResultSheetId) -> Option<&ResultSheet> {
        self.sheets.get(&id)
    }

    pub fn sheets(&self) -> impl Iterator<Item = &ResultSheet> {
        self.sheets.values()
    }

    pub fn sheet_for(&self, station: StationId, position: PositionId) -> Option<&ResultSheet> {
        self.sheet_index
            .get(&(station, position))
            .and_then(|id| self.sheets.get(id))
    }

    /// Returns the sheet of the station for this position, creating an empty one if needed.
    pub(crate) fn sheet_mut_or_insert(
        &mut self,
        station: StationId,
        position: PositionId,
        office: OfficeType,
        recorded_by: AgentId,
    ) -> &mut ResultSheet {
        let id = match self.sheet_index.get(&(station, position)) {
            Some(id) => *id,
            None => {
                self.next_sheet += 1;
                let id = ResultSheetId(self.next_sheet);
                self.sheet_index.insert((station, position), id);
                id
            }
        };
        self.sheets.entry(id).or_insert(ResultSheet {
            id,
            station,
            position,
            office,
            total_valid_votes: 0,
            total_invalid_votes: 0,
            total_votes: 0,
            scan: None,
            recorded_by,
        })
    }

    pub(crate) fn sheet_mut(&mut self, id: ResultSheetId) -> Option<&mut ResultSheet> {
        self.sheets.get_mut(&id)
    }

    /// Sets the count of a candidate at a station, replacing any previous count.
    pub(crate) fn upsert_result(
        &mut self,
        station: StationId,
        candidate: CandidateId,
        votes: VoteCount,
        sheet: ResultSheetId,
    ) -> ResultId {
        if let Some(id) = self.result_index.get(&(station, candidate)) {
            if let Some(r) = self.results.get_mut(id) {
                r.votes = votes;
                r.sheet = sheet;
                return *id;
            }
        }
        self.next_result += 1;
        let id = ResultId(self.next_result);
        self.result_index.insert((station, candidate), id);
        self.results.insert(
            id,
            StationResult {
                id,
                station,
                candidate,
                votes,
                sheet,
            },
        );
        id
    }

    // ******** Approvals ********

    /// Approvals of the sheet, lowest level first.
    pub fn approvals_for(&self, sheet: ResultSheetId) -> Vec<&ResultSheetApproval> {
        let mut res: Vec<&ResultSheetApproval> =
            self.approvals.iter().filter(|a| a.sheet == sheet).collect();
        res.sort_by_key(|a| a.level);
        res
    }

    pub fn approvals(&self) -> &[ResultSheetApproval] {
        &self.approvals
    }

    pub(crate) fn insert_approval(
        &mut self,
        approval: ResultSheetApproval,
    ) -> Result<(), CollationError> {
        for a in self.approvals.iter().filter(|a| a.sheet == approval.sheet) {
            if a.agent == approval.agent {
                return Err(CollationError::DuplicateApproval {
                    sheet: a.sheet,
                    agent: a.agent,
                });
            }
            if a.level == approval.level {
                return Err(CollationError::DuplicateApprovalLevel {
                    sheet: a.sheet,
                    level: a.level,
                });
            }
        }
        self.approvals.push(approval);
        Ok(())
    }

    // ******** Derived data ********

    pub fn collations(&self) -> &CollationTables {
        &self.collations
    }

    pub(crate) fn collations_mut(&mut self) -> &mut CollationTables {
        &mut self.collations
    }

    /// Swaps in a complete set of tables and returns the number of records.
    pub(crate) fn replace_collations(&mut self, tables: CollationTables) -> usize {
        self.collations = tables;
        self.collations.len()
    }

    pub fn ec_totals(&self) -> &BTreeMap<CollationKey, u64> {
        &self.ec_totals
    }

    pub(crate) fn set_ec_total(&mut self, key: CollationKey, total: u64) {
        self.ec_totals.insert(key, total);
    }

    pub fn summaries(&self) -> impl Iterator<Item = &ParliamentarySummarySheet> {
        self.summaries.values()
    }

    pub(crate) fn replace_summaries(&mut self, sheets: Vec<ParliamentarySummarySheet>) -> usize {
        self.summaries = sheets.into_iter().map(|s| (s.constituency, s)).collect();
        self.summaries.len()
    }

    /// Removes the collation records and the summary sheets, returns how many were removed.
    pub(crate) fn clear_derived(&mut self) -> usize {
        let n = self.collations.len() + self.summaries.len();
        self.collations = CollationTables::default();
        self.summaries.clear();
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn approval(sheet: u32, agent: u32, level: ApprovalLevel) -> ResultSheetApproval {
        ResultSheetApproval {
            sheet: ResultSheetId(sheet),
            agent: AgentId(agent),
            level,
            total_valid_votes: 0,
            ec_summary_total: 0,
            variance: 0,
            approved_at: Utc::now(),
        }
    }

    #[test]
    fn approvals_are_unique_per_agent_and_level() {
        let mut store = TallyStore::new();
        store
            .insert_approval(approval(1, 1, ApprovalLevel::Station))
            .unwrap();
        assert_eq!(
            store.insert_approval(approval(1, 1, ApprovalLevel::Constituency)),
            Err(CollationError::DuplicateApproval {
                sheet: ResultSheetId(1),
                agent: AgentId(1)
            })
        );
        assert_eq!(
            store.insert_approval(approval(1, 2, ApprovalLevel::Station)),
            Err(CollationError::DuplicateApprovalLevel {
                sheet: ResultSheetId(1),
                level: ApprovalLevel::Station
            })
        );
        // Another sheet is unaffected.
        assert!(store
            .insert_approval(approval(2, 1, ApprovalLevel::Station))
            .is_ok());
        assert_eq!(store.approvals().len(), 2);
    }

    #[test]
    fn upsert_replaces_count() {
        let mut store = TallyStore::new();
        let sheet = store
            .sheet_mut_or_insert(
                StationId(1),
                PositionId(1),
                OfficeType::Presidential,
                AgentId(1),
            )
            .id;
        let a = store.upsert_result(StationId(1), CandidateId(1), VoteCount(4), sheet);
        let b = store.upsert_result(StationId(1), CandidateId(1), VoteCount(9), sheet);
        assert_eq!(a, b);
        assert_eq!(store.results().count(), 1);
        assert_eq!(store.results_for_sheet(sheet).next().unwrap().votes, VoteCount(9));
    }

    #[test]
    fn replace_zone_drops_stale_records() {
        let mut tables = CollationTables::default();
        let zone = CollationZone::Region(RegionId(1));
        let k1 = CollationKey::new(OfficeType::Presidential, Entity::Party(PartyId(1)), zone)
            .unwrap();
        let k2 = CollationKey::new(OfficeType::Presidential, Entity::Party(PartyId(2)), zone)
            .unwrap();
        let other = CollationKey::new(OfficeType::Parliamentary, Entity::Party(PartyId(2)), zone)
            .unwrap();
        tables.insert(k1, CollationTotals::default());
        tables.insert(k2, CollationTotals::default());
        tables.insert(other, CollationTotals::default());
        let mut fresh = CollationTable::new();
        fresh.insert(
            k1,
            CollationTotals {
                total_votes: 5,
                ..Default::default()
            },
        );
        tables.replace_zone(OfficeType::Presidential, zone, fresh);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables.get(&k1).unwrap().total_votes, 5);
        assert!(tables.get(&k2).is_none());
        assert!(tables.get(&other).is_some());
    }
}
