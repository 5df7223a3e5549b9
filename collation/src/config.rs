use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::Display;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use chrono::{DateTime, Utc};

// ********* Identifiers ***********

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
        pub struct $name(pub u32);

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }
    };
}

id_type!(NationId, "nation");
id_type!(RegionId, "region");
id_type!(ConstituencyId, "constituency");
id_type!(
    /// A polling station, the leaf of the geographic tree.
    StationId,
    "station"
);
id_type!(PartyId, "party");
id_type!(CandidateId, "candidate");
id_type!(PositionId, "position");
id_type!(AgentId, "agent");
id_type!(ResultSheetId, "sheet");
id_type!(ResultId, "result");

// ********* Zones ***********

/// The four levels of the geographic tree.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum ZoneLevel {
    Station,
    Constituency,
    Region,
    Nation,
}

/// A node of the geographic tree.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Zone {
    Station(StationId),
    Constituency(ConstituencyId),
    Region(RegionId),
    Nation(NationId),
}

impl Zone {
    pub fn level(&self) -> ZoneLevel {
        match self {
            Zone::Station(_) => ZoneLevel::Station,
            Zone::Constituency(_) => ZoneLevel::Constituency,
            Zone::Region(_) => ZoneLevel::Region,
            Zone::Nation(_) => ZoneLevel::Nation,
        }
    }
}

impl Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::Station(id) => id.fmt(f),
            Zone::Constituency(id) => id.fmt(f),
            Zone::Region(id) => id.fmt(f),
            Zone::Nation(id) => id.fmt(f),
        }
    }
}

/// The five levels at which votes are rolled up, bottom first.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum CollationLevel {
    Station,
    Constituency,
    Region,
    Nation,
    Supernational,
}

impl CollationLevel {
    pub const ALL: [CollationLevel; 5] = [
        CollationLevel::Station,
        CollationLevel::Constituency,
        CollationLevel::Region,
        CollationLevel::Nation,
        CollationLevel::Supernational,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CollationLevel::Station => "station",
            CollationLevel::Constituency => "constituency",
            CollationLevel::Region => "region",
            CollationLevel::Nation => "nation",
            CollationLevel::Supernational => "supernational",
        }
    }
}

impl From<ZoneLevel> for CollationLevel {
    fn from(level: ZoneLevel) -> Self {
        match level {
            ZoneLevel::Station => CollationLevel::Station,
            ZoneLevel::Constituency => CollationLevel::Constituency,
            ZoneLevel::Region => CollationLevel::Region,
            ZoneLevel::Nation => CollationLevel::Nation,
        }
    }
}

/// The zone a collation record is attached to.
///
/// This is a geographic zone, or the single root above all the nations.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum CollationZone {
    Station(StationId),
    Constituency(ConstituencyId),
    Region(RegionId),
    Nation(NationId),
    Supernational,
}

impl CollationZone {
    pub fn level(&self) -> CollationLevel {
        match self {
            CollationZone::Station(_) => CollationLevel::Station,
            CollationZone::Constituency(_) => CollationLevel::Constituency,
            CollationZone::Region(_) => CollationLevel::Region,
            CollationZone::Nation(_) => CollationLevel::Nation,
            CollationZone::Supernational => CollationLevel::Supernational,
        }
    }

    /// The geographic zone, if this is not the supernational root.
    pub fn zone(&self) -> Option<Zone> {
        match *self {
            CollationZone::Station(id) => Some(Zone::Station(id)),
            CollationZone::Constituency(id) => Some(Zone::Constituency(id)),
            CollationZone::Region(id) => Some(Zone::Region(id)),
            CollationZone::Nation(id) => Some(Zone::Nation(id)),
            CollationZone::Supernational => None,
        }
    }
}

impl From<Zone> for CollationZone {
    fn from(zone: Zone) -> Self {
        match zone {
            Zone::Station(id) => CollationZone::Station(id),
            Zone::Constituency(id) => CollationZone::Constituency(id),
            Zone::Region(id) => CollationZone::Region(id),
            Zone::Nation(id) => CollationZone::Nation(id),
        }
    }
}

impl Display for CollationZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.zone() {
            Some(z) => z.fmt(f),
            None => write!(f, "supernational"),
        }
    }
}

/// The chain of zones above a station.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Ancestry {
    pub station: StationId,
    pub constituency: ConstituencyId,
    pub region: RegionId,
    pub nation: NationId,
}

impl Ancestry {
    /// True if the zone is the station itself or one of its ancestors.
    pub fn contains(&self, zone: Zone) -> bool {
        match zone {
            Zone::Station(id) => id == self.station,
            Zone::Constituency(id) => id == self.constituency,
            Zone::Region(id) => id == self.region,
            Zone::Nation(id) => id == self.nation,
        }
    }

    pub fn zone_at(&self, level: CollationLevel) -> CollationZone {
        match level {
            CollationLevel::Station => CollationZone::Station(self.station),
            CollationLevel::Constituency => CollationZone::Constituency(self.constituency),
            CollationLevel::Region => CollationZone::Region(self.region),
            CollationLevel::Nation => CollationZone::Nation(self.nation),
            CollationLevel::Supernational => CollationZone::Supernational,
        }
    }
}

// ********* Reference data ***********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Nation {
    pub id: NationId,
    pub title: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Region {
    pub id: RegionId,
    pub title: String,
    pub nation: NationId,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Constituency {
    pub id: ConstituencyId,
    pub title: String,
    pub region: RegionId,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Station {
    pub id: StationId,
    pub code: String,
    pub title: String,
    pub constituency: ConstituencyId,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Party {
    pub id: PartyId,
    pub code: String,
    pub title: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum OfficeType {
    Presidential,
    Parliamentary,
}

impl OfficeType {
    pub fn name(&self) -> &'static str {
        match self {
            OfficeType::Presidential => "presidential",
            OfficeType::Parliamentary => "parliamentary",
        }
    }
}

/// An office contested within a zone.
///
/// The office type follows from the anchor zone: a position anchored at a
/// nation is presidential, one anchored at a constituency is parliamentary.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Position {
    pub id: PositionId,
    pub title: String,
    pub zone: Zone,
}

impl Position {
    pub fn office_type(&self) -> Option<OfficeType> {
        match self.zone {
            Zone::Nation(_) => Some(OfficeType::Presidential),
            Zone::Constituency(_) => Some(OfficeType::Parliamentary),
            _ => None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub party: PartyId,
    pub position: PositionId,
}

/// A person assigned to a zone. Agents record tallies and approve result sheets.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub zone: Zone,
}

// ********* Votes ***********

/// A non-negative number of votes, at most `VoteCount::MAX`.
///
/// The bound keeps every sum and every signed difference of counts inside `i64`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Default)]
pub struct VoteCount(pub u64);

impl VoteCount {
    pub const EMPTY: VoteCount = VoteCount(0);
    pub const MAX: VoteCount = VoteCount(i64::MAX as u64);

    pub fn is_valid(&self) -> bool {
        *self <= VoteCount::MAX
    }

    /// The sum, or `None` if it would go above `VoteCount::MAX`.
    pub fn checked_add(self, rhs: VoteCount) -> Option<VoteCount> {
        self.0
            .checked_add(rhs.0)
            .map(VoteCount)
            .filter(|v| v.is_valid())
    }
}

// Saturating: callers bound the totals before adding.
impl Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(VoteCount::EMPTY, |a, b| a + b)
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        *self = *self + rhs;
    }
}

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self: VoteCount, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0.saturating_add(rhs.0))
    }
}

impl FromStr for VoteCount {
    type Err = CollationError;

    /// Reads a decimal count. Surrounding whitespace is ignored, anything else
    /// that is not an integer between 0 and `VoteCount::MAX` is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .map(VoteCount)
            .filter(|v| v.is_valid())
            .ok_or_else(|| CollationError::InvalidVoteCount(s.to_string()))
    }
}

impl TryFrom<u64> for VoteCount {
    type Error = CollationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Some(VoteCount(value))
            .filter(|v| v.is_valid())
            .ok_or_else(|| CollationError::InvalidVoteCount(value.to_string()))
    }
}

impl TryFrom<i64> for VoteCount {
    type Error = CollationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(VoteCount)
            .map_err(|_| CollationError::InvalidVoteCount(value.to_string()))
    }
}

impl TryFrom<f64> for VoteCount {
    type Error = CollationError;

    // Spreadsheets store integers as floats.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        // i64::MAX as f64 rounds up to 2^63, which is out of range.
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < i64::MAX as f64 {
            Ok(VoteCount(value as u64))
        } else {
            Err(CollationError::InvalidVoteCount(value.to_string()))
        }
    }
}

/// `a - b` as a signed number, clamped to the range of `i64`.
pub fn signed_difference(a: u64, b: u64) -> i64 {
    let d = a as i128 - b as i128;
    i64::try_from(d).unwrap_or(if d < 0 { i64::MIN } else { i64::MAX })
}

// ********* Raw tallies ***********

/// The vote count of one candidate at one station.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StationResult {
    pub id: ResultId,
    pub station: StationId,
    pub candidate: CandidateId,
    pub votes: VoteCount,
    pub sheet: ResultSheetId,
}

/// The physical tally record of one station for one position.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultSheet {
    pub id: ResultSheetId,
    pub station: StationId,
    pub position: PositionId,
    pub office: OfficeType,
    pub total_valid_votes: u64,
    pub total_invalid_votes: u64,
    pub total_votes: u64,
    /// Reference to the scanned image of the paper sheet.
    pub scan: Option<String>,
    pub recorded_by: AgentId,
}

/// Everything an agent reports for one station and one position.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallySubmission {
    pub station: StationId,
    pub position: PositionId,
    pub votes: Vec<(CandidateId, VoteCount)>,
    pub total_invalid_votes: VoteCount,
    pub scan: Option<String>,
    pub agent: AgentId,
}

// ********* Collation records ***********

/// Whose votes a collation record counts: a candidate at station level,
/// a party everywhere above.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Entity {
    Candidate(CandidateId),
    Party(PartyId),
}

impl Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Candidate(id) => id.fmt(f),
            Entity::Party(id) => id.fmt(f),
        }
    }
}

/// The identity of a collation record.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CollationKey {
    office: OfficeType,
    entity: Entity,
    zone: CollationZone,
}

impl CollationKey {
    pub fn new(
        office: OfficeType,
        entity: Entity,
        zone: CollationZone,
    ) -> Result<CollationKey, CollationError> {
        let level = zone.level();
        match (entity, level) {
            (Entity::Candidate(_), CollationLevel::Station) => {}
            (Entity::Party(_), l) if l != CollationLevel::Station => {}
            _ => return Err(CollationError::MismatchedEntity { level, entity }),
        }
        Ok(CollationKey {
            office,
            entity,
            zone,
        })
    }

    // Callers guarantee the entity matches the level.
    pub(crate) fn new_unchecked(
        office: OfficeType,
        entity: Entity,
        zone: CollationZone,
    ) -> CollationKey {
        CollationKey {
            office,
            entity,
            zone,
        }
    }

    pub fn office(&self) -> OfficeType {
        self.office
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn zone(&self) -> CollationZone {
        self.zone
    }

    pub fn level(&self) -> CollationLevel {
        self.zone.level()
    }

    /// The textual form of the key, for example `PARLIAMENTARY|PARTY-2|REGION-1`.
    pub fn code(&self) -> String {
        format!("{}|{}|{}", self.office.name(), self.entity, self.zone).to_uppercase()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct CollationTotals {
    pub total_votes: u64,
    pub total_invalid_votes: u64,
    /// The externally reported figure for the same key, 0 when none was reported.
    pub total_votes_ec: u64,
}

impl CollationTotals {
    pub fn variance(&self) -> i64 {
        signed_difference(self.total_votes, self.total_votes_ec)
    }
}

// ********* Approvals ***********

/// The four approval slots of a result sheet, in the order they must be filled.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum ApprovalLevel {
    Station,
    Constituency,
    Region,
    Nation,
}

impl ApprovalLevel {
    pub const ALL: [ApprovalLevel; 4] = [
        ApprovalLevel::Station,
        ApprovalLevel::Constituency,
        ApprovalLevel::Region,
        ApprovalLevel::Nation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ApprovalLevel::Station => "station",
            ApprovalLevel::Constituency => "constituency",
            ApprovalLevel::Region => "region",
            ApprovalLevel::Nation => "nation",
        }
    }

    /// The slot an agent assigned to the zone fills.
    pub fn for_zone(zone: Zone) -> ApprovalLevel {
        match zone.level() {
            ZoneLevel::Station => ApprovalLevel::Station,
            ZoneLevel::Constituency => ApprovalLevel::Constituency,
            ZoneLevel::Region => ApprovalLevel::Region,
            ZoneLevel::Nation => ApprovalLevel::Nation,
        }
    }

    pub fn below(&self) -> &'static [ApprovalLevel] {
        match self {
            ApprovalLevel::Station => &[],
            ApprovalLevel::Constituency => &[ApprovalLevel::Station],
            ApprovalLevel::Region => &[ApprovalLevel::Station, ApprovalLevel::Constituency],
            ApprovalLevel::Nation => &[
                ApprovalLevel::Station,
                ApprovalLevel::Constituency,
                ApprovalLevel::Region,
            ],
        }
    }
}

/// The approval state of a result sheet, derived from its approvals.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum ApprovalState {
    NotApproved,
    StationApproved,
    ConstituencyApproved,
    RegionApproved,
    NationApproved,
}

impl ApprovalState {
    pub fn from_highest(level: Option<ApprovalLevel>) -> ApprovalState {
        match level {
            None => ApprovalState::NotApproved,
            Some(ApprovalLevel::Station) => ApprovalState::StationApproved,
            Some(ApprovalLevel::Constituency) => ApprovalState::ConstituencyApproved,
            Some(ApprovalLevel::Region) => ApprovalState::RegionApproved,
            Some(ApprovalLevel::Nation) => ApprovalState::NationApproved,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultSheetApproval {
    pub sheet: ResultSheetId,
    pub agent: AgentId,
    pub level: ApprovalLevel,
    /// Snapshot of the sheet's valid votes at approval time.
    pub total_valid_votes: u64,
    pub ec_summary_total: u64,
    pub variance: i64,
    pub approved_at: DateTime<Utc>,
}

// ******** Seats and winners *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SeatOutcome {
    Won(CandidateId),
    /// Several candidates share the highest count. No winner is picked.
    Tied(BTreeSet<CandidateId>),
}

/// The outcome of the parliamentary race of one constituency.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParliamentarySummarySheet {
    pub position: PositionId,
    pub constituency: ConstituencyId,
    pub outcome: SeatOutcome,
    pub votes: u64,
    pub total_votes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SeatSummary {
    pub seats: usize,
    pub declared: usize,
    pub tied: usize,
    pub outstanding: usize,
    pub won_by_party: Vec<(PartyId, usize)>,
}

/// Winning parties for every zone of one level.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LevelWinners {
    pub office: OfficeType,
    pub level: CollationLevel,
    pub winners: Vec<(CollationZone, BTreeSet<PartyId>)>,
}

impl LevelWinners {
    /// The number of zones with at least one winner.
    pub fn declared(&self) -> usize {
        self.winners.iter().filter(|(_, w)| !w.is_empty()).count()
    }
}

// ********* Errors **********

/// Errors in the reference data or in a request to the engine.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CollationError {
    UnknownZone(Zone),
    UnknownParty(PartyId),
    UnknownCandidate(CandidateId),
    UnknownPosition(PositionId),
    UnknownAgent(AgentId),
    UnknownResultSheet(ResultSheetId),
    DuplicateId(String),
    InvalidReferenceData(Vec<String>),
    MismatchedEntity {
        level: CollationLevel,
        entity: Entity,
    },
    InvalidVoteCount(String),
    DuplicateApproval {
        sheet: ResultSheetId,
        agent: AgentId,
    },
    DuplicateApprovalLevel {
        sheet: ResultSheetId,
        level: ApprovalLevel,
    },
}

impl Error for CollationError {}

impl Display for CollationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollationError::UnknownZone(z) => write!(f, "unknown zone {}", z),
            CollationError::UnknownParty(id) => write!(f, "unknown party {}", id),
            CollationError::UnknownCandidate(id) => write!(f, "unknown candidate {}", id),
            CollationError::UnknownPosition(id) => write!(f, "unknown position {}", id),
            CollationError::UnknownAgent(id) => write!(f, "unknown agent {}", id),
            CollationError::UnknownResultSheet(id) => write!(f, "unknown result sheet {}", id),
            CollationError::DuplicateId(id) => write!(f, "duplicate identifier {}", id),
            CollationError::InvalidReferenceData(msgs) => {
                write!(f, "invalid reference data: {}", msgs.join("; "))
            }
            CollationError::MismatchedEntity { level, entity } => write!(
                f,
                "{} cannot be collated at {} level",
                entity,
                level.name()
            ),
            CollationError::InvalidVoteCount(s) => write!(f, "invalid vote count {:?}", s),
            CollationError::DuplicateApproval { sheet, agent } => {
                write!(f, "{} has already approved {}", agent, sheet)
            }
            CollationError::DuplicateApprovalLevel { sheet, level } => {
                write!(f, "{} already has a {} approval", sheet, level.name())
            }
        }
    }
}

/// The reasons a tally submission or an approval was refused.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ValidationErrors {
    pub messages: Vec<String>,
}

impl ValidationErrors {
    pub fn single(message: String) -> ValidationErrors {
        ValidationErrors {
            messages: vec![message],
        }
    }
}

impl Error for ValidationErrors {}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.messages.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_count_from_text() {
        assert_eq!("12".parse::<VoteCount>(), Ok(VoteCount(12)));
        assert_eq!(" 7 ".parse::<VoteCount>(), Ok(VoteCount(7)));
        assert!("abc".parse::<VoteCount>().is_err());
        assert!("-3".parse::<VoteCount>().is_err());
        assert!("4.5".parse::<VoteCount>().is_err());
        assert!("".parse::<VoteCount>().is_err());
        assert_eq!("9223372036854775807".parse::<VoteCount>(), Ok(VoteCount::MAX));
        assert!("9223372036854775808".parse::<VoteCount>().is_err());
        assert!("18446744073709551615".parse::<VoteCount>().is_err());
    }

    #[test]
    fn vote_count_from_numbers() {
        assert_eq!(VoteCount::try_from(3i64), Ok(VoteCount(3)));
        assert!(VoteCount::try_from(-1i64).is_err());
        assert_eq!(VoteCount::try_from(8.0f64), Ok(VoteCount(8)));
        assert!(VoteCount::try_from(8.5f64).is_err());
        assert!(VoteCount::try_from(f64::NAN).is_err());
        assert!(VoteCount::try_from(1e19f64).is_err());
        assert!(VoteCount::try_from(9.3e18f64).is_err());
        assert_eq!(VoteCount::try_from(i64::MAX), Ok(VoteCount::MAX));
        assert!(VoteCount::try_from(u64::MAX).is_err());
        assert_eq!(VoteCount::try_from(40u64), Ok(VoteCount(40)));
    }

    #[test]
    fn vote_count_arithmetic_does_not_overflow() {
        assert_eq!(VoteCount(2).checked_add(VoteCount(3)), Some(VoteCount(5)));
        assert_eq!(VoteCount::MAX.checked_add(VoteCount(1)), None);
        assert_eq!(VoteCount(u64::MAX).checked_add(VoteCount(1)), None);
        assert_eq!(VoteCount(u64::MAX) + VoteCount(1), VoteCount(u64::MAX));
        let total: VoteCount = [VoteCount(u64::MAX), VoteCount(u64::MAX)].into_iter().sum();
        assert_eq!(total, VoteCount(u64::MAX));
    }

    #[test]
    fn signed_difference_of_large_counts() {
        assert_eq!(signed_difference(5, 8), -3);
        assert_eq!(signed_difference(5, VoteCount::MAX.0), 5 - i64::MAX);
        assert_eq!(signed_difference(VoteCount::MAX.0, 0), i64::MAX);
        assert_eq!(signed_difference(0, u64::MAX), i64::MIN);
        assert_eq!(signed_difference(u64::MAX, 0), i64::MAX);
        let t = CollationTotals {
            total_votes: 5,
            total_invalid_votes: 0,
            total_votes_ec: u64::MAX,
        };
        assert!(t.variance() < 0);
    }

    #[test]
    fn key_checks_entity_against_level() {
        let station = CollationZone::Station(StationId(1));
        let region = CollationZone::Region(RegionId(1));
        let cand = Entity::Candidate(CandidateId(4));
        let party = Entity::Party(PartyId(2));
        assert!(CollationKey::new(OfficeType::Presidential, cand, station).is_ok());
        assert!(CollationKey::new(OfficeType::Presidential, party, station).is_err());
        assert!(CollationKey::new(OfficeType::Presidential, party, region).is_ok());
        assert!(CollationKey::new(OfficeType::Presidential, cand, region).is_err());
        assert!(CollationKey::new(
            OfficeType::Presidential,
            party,
            CollationZone::Supernational
        )
        .is_ok());
    }

    #[test]
    fn key_code() {
        let k = CollationKey::new(
            OfficeType::Parliamentary,
            Entity::Party(PartyId(2)),
            CollationZone::Region(RegionId(1)),
        )
        .unwrap();
        assert_eq!(k.code(), "PARLIAMENTARY|PARTY-2|REGION-1");
    }

    #[test]
    fn variance_can_be_negative() {
        let t = CollationTotals {
            total_votes: 90,
            total_invalid_votes: 0,
            total_votes_ec: 100,
        };
        assert_eq!(t.variance(), -10);
    }

    #[test]
    fn levels_below() {
        assert!(ApprovalLevel::Station.below().is_empty());
        assert_eq!(
            ApprovalLevel::Region.below(),
            &[ApprovalLevel::Station, ApprovalLevel::Constituency]
        );
    }
}
