use std::collections::BTreeMap;

use crate::config::*;

/// Validated reference data: the geographic tree, the offices, the parties
/// and candidates, and the agents.
///
/// Built with `builder::RegistryBuilder`. It does not change afterwards.
#[derive(Debug, Clone)]
pub struct Registry {
    pub(crate) nations: BTreeMap<NationId, Nation>,
    pub(crate) regions: BTreeMap<RegionId, Region>,
    pub(crate) constituencies: BTreeMap<ConstituencyId, Constituency>,
    pub(crate) stations: BTreeMap<StationId, Station>,
    pub(crate) parties: BTreeMap<PartyId, Party>,
    pub(crate) positions: BTreeMap<PositionId, Position>,
    pub(crate) candidates: BTreeMap<CandidateId, Candidate>,
    pub(crate) agents: BTreeMap<AgentId, Agent>,
    pub(crate) parliamentary_seats: BTreeMap<ConstituencyId, PositionId>,
}

impl Registry {
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    pub fn party(&self, id: PartyId) -> Option<&Party> {
        self.parties.get(&id)
    }

    pub fn position(&self, id: PositionId) -> Option<&Position> {
        self.positions.get(&id)
    }

    pub fn candidate(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.get(&id)
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn parties(&self) -> impl Iterator<Item = &Party> {
        self.parties.values()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn candidates_for(&self, position: PositionId) -> impl Iterator<Item = &Candidate> {
        self.candidates
            .values()
            .filter(move |c| c.position == position)
    }

    /// The parliamentary position of every constituency that has one.
    pub fn parliamentary_seats(&self) -> impl Iterator<Item = (ConstituencyId, PositionId)> + '_ {
        self.parliamentary_seats.iter().map(|(c, p)| (*c, *p))
    }

    pub fn zone_exists(&self, zone: Zone) -> bool {
        match zone {
            Zone::Station(id) => self.stations.contains_key(&id),
            Zone::Constituency(id) => self.constituencies.contains_key(&id),
            Zone::Region(id) => self.regions.contains_key(&id),
            Zone::Nation(id) => self.nations.contains_key(&id),
        }
    }

    pub fn ancestry(&self, station: StationId) -> Result<Ancestry, CollationError> {
        let missing = |z: Zone| CollationError::UnknownZone(z);
        let s = self
            .stations
            .get(&station)
            .ok_or_else(|| missing(Zone::Station(station)))?;
        let c = self
            .constituencies
            .get(&s.constituency)
            .ok_or_else(|| missing(Zone::Constituency(s.constituency)))?;
        let r = self
            .regions
            .get(&c.region)
            .ok_or_else(|| missing(Zone::Region(c.region)))?;
        Ok(Ancestry {
            station,
            constituency: c.id,
            region: r.id,
            nation: r.nation,
        })
    }

    /// True if the station lies inside the zone (or is the zone).
    pub fn zone_contains(&self, zone: Zone, station: StationId) -> Result<bool, CollationError> {
        Ok(self.ancestry(station)?.contains(zone))
    }

    pub fn office_type(&self, position: PositionId) -> Result<OfficeType, CollationError> {
        self.positions
            .get(&position)
            .and_then(|p| p.office_type())
            .ok_or(CollationError::UnknownPosition(position))
    }

    /// All the zones of one level, in identifier order.
    pub fn zones_at(&self, level: CollationLevel) -> Vec<CollationZone> {
        match level {
            CollationLevel::Station => self
                .stations
                .keys()
                .map(|id| CollationZone::Station(*id))
                .collect(),
            CollationLevel::Constituency => self
                .constituencies
                .keys()
                .map(|id| CollationZone::Constituency(*id))
                .collect(),
            CollationLevel::Region => self
                .regions
                .keys()
                .map(|id| CollationZone::Region(*id))
                .collect(),
            CollationLevel::Nation => self
                .nations
                .keys()
                .map(|id| CollationZone::Nation(*id))
                .collect(),
            CollationLevel::Supernational => vec![CollationZone::Supernational],
        }
    }
}
