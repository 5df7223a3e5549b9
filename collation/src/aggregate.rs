// Rolling raw results up the five collation levels.
//
// There is one way to compute a record: sum every row under its key. The
// batch run does it for all the keys at once, a tally submission does it for
// the zones above the station that changed.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use crate::config::*;
use crate::registry::Registry;
use crate::store::{CollationTable, CollationTables, TallyStore};
use crate::CollationEngine;

/// A raw result joined with its place in the hierarchy.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TallyRow {
    pub office: OfficeType,
    pub candidate: CandidateId,
    pub party: PartyId,
    pub ancestry: Ancestry,
    pub votes: VoteCount,
    pub sheet: ResultSheetId,
    pub sheet_invalid_votes: u64,
}

impl CollationKey {
    pub(crate) fn for_row(level: CollationLevel, row: &TallyRow) -> CollationKey {
        let entity = match level {
            CollationLevel::Station => Entity::Candidate(row.candidate),
            _ => Entity::Party(row.party),
        };
        CollationKey::new_unchecked(row.office, entity, row.ancestry.zone_at(level))
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    votes: VoteCount,
    invalid_votes: u64,
    sheets: BTreeSet<ResultSheetId>,
}

impl Accumulator {
    fn add(&mut self, row: &TallyRow) {
        self.votes += row.votes;
        // Invalid votes belong to the sheet, not to the candidate: count each sheet once.
        if self.sheets.insert(row.sheet) {
            self.invalid_votes += row.sheet_invalid_votes;
        }
    }

    fn finish(&self, key: &CollationKey, ec_totals: &BTreeMap<CollationKey, u64>) -> CollationTotals {
        CollationTotals {
            total_votes: self.votes.0,
            total_invalid_votes: self.invalid_votes,
            total_votes_ec: ec_totals.get(key).copied().unwrap_or(0),
        }
    }
}

pub(crate) fn tally_rows(
    registry: &Registry,
    store: &TallyStore,
) -> Result<Vec<TallyRow>, CollationError> {
    let mut rows: Vec<TallyRow> = Vec::new();
    for r in store.results() {
        let candidate = registry
            .candidate(r.candidate)
            .ok_or(CollationError::UnknownCandidate(r.candidate))?;
        let sheet = store
            .sheet(r.sheet)
            .ok_or(CollationError::UnknownResultSheet(r.sheet))?;
        rows.push(TallyRow {
            office: registry.office_type(candidate.position)?,
            candidate: candidate.id,
            party: candidate.party,
            ancestry: registry.ancestry(r.station)?,
            votes: r.votes,
            sheet: sheet.id,
            sheet_invalid_votes: sheet.total_invalid_votes,
        });
    }
    Ok(rows)
}

fn accumulate<'a>(
    rows: impl Iterator<Item = &'a TallyRow>,
    level: CollationLevel,
    ec_totals: &BTreeMap<CollationKey, u64>,
) -> CollationTable {
    let mut acc: BTreeMap<CollationKey, Accumulator> = BTreeMap::new();
    for row in rows {
        acc.entry(CollationKey::for_row(level, row))
            .or_default()
            .add(row);
    }
    acc.iter()
        .map(|(k, a)| (*k, a.finish(k, ec_totals)))
        .collect()
}

/// Computes every record of every level from scratch.
pub(crate) fn collate_all(
    registry: &Registry,
    store: &TallyStore,
) -> Result<CollationTables, CollationError> {
    let rows = tally_rows(registry, store)?;
    debug!("collate_all: {} rows", rows.len());
    let mut tables = CollationTables::default();
    for level in CollationLevel::ALL {
        for (k, t) in accumulate(rows.iter(), level, store.ec_totals()) {
            tables.insert(k, t);
        }
    }
    Ok(tables)
}

/// Recomputes the records of one office in every zone above the station.
pub(crate) fn collate_path(
    registry: &Registry,
    store: &mut TallyStore,
    station: StationId,
    office: OfficeType,
) -> Result<(), CollationError> {
    let ancestry = registry.ancestry(station)?;
    let rows: Vec<TallyRow> = tally_rows(registry, store)?
        .into_iter()
        .filter(|r| r.office == office)
        .collect();
    for level in CollationLevel::ALL {
        let zone = ancestry.zone_at(level);
        let records = accumulate(
            rows.iter().filter(|r| r.ancestry.zone_at(level) == zone),
            level,
            store.ec_totals(),
        );
        store
            .collations_mut()
            .replace_zone(office, zone, records);
    }
    Ok(())
}

impl CollationEngine {
    /// Rebuilds all the collation records from the raw results.
    ///
    /// The new tables are computed first and swapped in at the end: on error,
    /// the current records are left as they were. Returns the number of records.
    pub fn run_full_collation(&mut self) -> Result<usize, CollationError> {
        let tables = collate_all(&self.registry, &self.store)?;
        let n = self.store.replace_collations(tables);
        info!("run_full_collation: {} collation records", n);
        Ok(n)
    }

    /// The record of an entity in a zone, if any vote was recorded for it.
    pub fn get_collation(
        &self,
        office: OfficeType,
        entity: Entity,
        zone: CollationZone,
    ) -> Option<CollationTotals> {
        let key = CollationKey::new(office, entity, zone).ok()?;
        self.store.collations().get(&key).copied()
    }

    pub fn collation_records(&self, level: CollationLevel) -> &CollationTable {
        self.store.collations().table(level)
    }

    /// Records the externally reported total for a key.
    ///
    /// The figure is kept apart from the derived records, so it survives
    /// later rebuilds.
    pub fn record_ec_total(
        &mut self,
        office: OfficeType,
        entity: Entity,
        zone: CollationZone,
        total: VoteCount,
    ) -> Result<(), CollationError> {
        let key = CollationKey::new(office, entity, zone)?;
        if !total.is_valid() {
            return Err(CollationError::InvalidVoteCount(total.0.to_string()));
        }
        if let Some(z) = zone.zone() {
            if !self.registry.zone_exists(z) {
                return Err(CollationError::UnknownZone(z));
            }
        }
        match entity {
            Entity::Candidate(id) if self.registry.candidate(id).is_none() => {
                return Err(CollationError::UnknownCandidate(id))
            }
            Entity::Party(id) if self.registry.party(id).is_none() => {
                return Err(CollationError::UnknownParty(id))
            }
            _ => {}
        }
        debug!("record_ec_total: {} = {}", key.code(), total.0);
        self.store.set_ec_total(key, total.0);
        if let Some(t) = self.store.collations_mut().get_mut(&key) {
            t.total_votes_ec = total.0;
        }
        Ok(())
    }

    /// Deletes all derived records (collations and seat summaries). Returns how many were removed.
    pub fn clear_collations(&mut self) -> usize {
        let n = self.store.clear_derived();
        info!("clear_collations: {} records removed", n);
        n
    }
}
