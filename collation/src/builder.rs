use std::collections::{BTreeMap, BTreeSet};

pub use crate::config::*;
use crate::registry::Registry;

/// A builder for the reference data of an election.
///
/// Everything is checked when calling `build`: all the problems found are
/// reported together.
///
/// ```
/// use collation::builder::RegistryBuilder;
/// use collation::*;
///
/// let mut builder = RegistryBuilder::new();
/// builder.add_nation(Nation { id: NationId(1), title: "Ghana".to_string() })?;
/// builder.add_region(Region { id: RegionId(1), title: "Volta".to_string(), nation: NationId(1) })?;
/// builder.add_constituency(Constituency {
///     id: ConstituencyId(1),
///     title: "Ho Central".to_string(),
///     region: RegionId(1),
/// })?;
/// builder.add_station(Station {
///     id: StationId(1),
///     code: "V001".to_string(),
///     title: "Ho Market".to_string(),
///     constituency: ConstituencyId(1),
/// })?;
/// let registry = builder.build()?;
///
/// assert_eq!(registry.ancestry(StationId(1))?.nation, NationId(1));
/// # Ok::<(), CollationError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    pub(crate) _nations: BTreeMap<NationId, Nation>,
    pub(crate) _regions: BTreeMap<RegionId, Region>,
    pub(crate) _constituencies: BTreeMap<ConstituencyId, Constituency>,
    pub(crate) _stations: BTreeMap<StationId, Station>,
    pub(crate) _parties: BTreeMap<PartyId, Party>,
    pub(crate) _positions: BTreeMap<PositionId, Position>,
    pub(crate) _candidates: BTreeMap<CandidateId, Candidate>,
    pub(crate) _agents: BTreeMap<AgentId, Agent>,
}

fn insert_new<K: Ord + Copy + std::fmt::Display, V>(
    map: &mut BTreeMap<K, V>,
    id: K,
    value: V,
) -> Result<(), CollationError> {
    if map.contains_key(&id) {
        return Err(CollationError::DuplicateId(id.to_string()));
    }
    map.insert(id, value);
    Ok(())
}

impl RegistryBuilder {
    pub fn new() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn add_nation(&mut self, nation: Nation) -> Result<(), CollationError> {
        insert_new(&mut self._nations, nation.id, nation)
    }

    pub fn add_region(&mut self, region: Region) -> Result<(), CollationError> {
        insert_new(&mut self._regions, region.id, region)
    }

    pub fn add_constituency(&mut self, constituency: Constituency) -> Result<(), CollationError> {
        insert_new(&mut self._constituencies, constituency.id, constituency)
    }

    pub fn add_station(&mut self, station: Station) -> Result<(), CollationError> {
        insert_new(&mut self._stations, station.id, station)
    }

    pub fn add_party(&mut self, party: Party) -> Result<(), CollationError> {
        insert_new(&mut self._parties, party.id, party)
    }

    /// Adds an office. Only nation (presidential) and constituency
    /// (parliamentary) anchors are accepted by `build`.
    pub fn add_position(&mut self, position: Position) -> Result<(), CollationError> {
        insert_new(&mut self._positions, position.id, position)
    }

    pub fn add_candidate(&mut self, candidate: Candidate) -> Result<(), CollationError> {
        insert_new(&mut self._candidates, candidate.id, candidate)
    }

    pub fn add_agent(&mut self, agent: Agent) -> Result<(), CollationError> {
        insert_new(&mut self._agents, agent.id, agent)
    }

    fn zone_exists(&self, zone: Zone) -> bool {
        match zone {
            Zone::Station(id) => self._stations.contains_key(&id),
            Zone::Constituency(id) => self._constituencies.contains_key(&id),
            Zone::Region(id) => self._regions.contains_key(&id),
            Zone::Nation(id) => self._nations.contains_key(&id),
        }
    }

    /// Checks the references between all the records and returns the registry.
    pub fn build(&self) -> Result<Registry, CollationError> {
        let mut errors: Vec<String> = Vec::new();

        for r in self._regions.values() {
            if !self._nations.contains_key(&r.nation) {
                errors.push(format!("{} belongs to missing {}", r.id, r.nation));
            }
        }
        for c in self._constituencies.values() {
            if !self._regions.contains_key(&c.region) {
                errors.push(format!("{} belongs to missing {}", c.id, c.region));
            }
        }
        for s in self._stations.values() {
            if !self._constituencies.contains_key(&s.constituency) {
                errors.push(format!("{} belongs to missing {}", s.id, s.constituency));
            }
        }

        let mut parliamentary_seats: BTreeMap<ConstituencyId, PositionId> = BTreeMap::new();
        for p in self._positions.values() {
            if !self.zone_exists(p.zone) {
                errors.push(format!("{} is anchored at missing {}", p.id, p.zone));
            }
            match p.zone {
                Zone::Constituency(cid) => {
                    if let Some(other) = parliamentary_seats.insert(cid, p.id) {
                        errors.push(format!(
                            "{} has two parliamentary positions: {} and {}",
                            cid, other, p.id
                        ));
                    }
                }
                Zone::Nation(_) => {}
                z => {
                    errors.push(format!(
                        "{} is anchored at {}: positions must be anchored at a nation or a constituency",
                        p.id, z
                    ));
                }
            }
        }

        let mut names: BTreeSet<(PositionId, &str)> = BTreeSet::new();
        for c in self._candidates.values() {
            if !self._parties.contains_key(&c.party) {
                errors.push(format!("{} belongs to missing {}", c.id, c.party));
            }
            if !self._positions.contains_key(&c.position) {
                errors.push(format!("{} contests missing {}", c.id, c.position));
            }
            if !names.insert((c.position, c.name.as_str())) {
                errors.push(format!(
                    "{} contests {} under a name already taken: {}",
                    c.id, c.position, c.name
                ));
            }
        }

        for a in self._agents.values() {
            if !self.zone_exists(a.zone) {
                errors.push(format!("{} is assigned to missing {}", a.id, a.zone));
            }
        }

        if !errors.is_empty() {
            return Err(CollationError::InvalidReferenceData(errors));
        }

        Ok(Registry {
            nations: self._nations.clone(),
            regions: self._regions.clone(),
            constituencies: self._constituencies.clone(),
            stations: self._stations.clone(),
            parties: self._parties.clone(),
            positions: self._positions.clone(),
            candidates: self._candidates.clone(),
            agents: self._agents.clone(),
            parliamentary_seats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RegistryBuilder {
        let mut b = RegistryBuilder::new();
        b.add_nation(Nation {
            id: NationId(1),
            title: "N".to_string(),
        })
        .unwrap();
        b.add_region(Region {
            id: RegionId(1),
            title: "R".to_string(),
            nation: NationId(1),
        })
        .unwrap();
        b.add_constituency(Constituency {
            id: ConstituencyId(1),
            title: "C".to_string(),
            region: RegionId(1),
        })
        .unwrap();
        b
    }

    #[test]
    fn duplicate_ids_are_refused() {
        let mut b = base();
        let res = b.add_nation(Nation {
            id: NationId(1),
            title: "Again".to_string(),
        });
        assert_eq!(res, Err(CollationError::DuplicateId("nation-1".to_string())));
    }

    #[test]
    fn missing_parent_is_reported() {
        let mut b = base();
        b.add_station(Station {
            id: StationId(5),
            code: "X".to_string(),
            title: "X".to_string(),
            constituency: ConstituencyId(9),
        })
        .unwrap();
        match b.build() {
            Err(CollationError::InvalidReferenceData(msgs)) => {
                assert_eq!(msgs, vec!["station-5 belongs to missing constituency-9"]);
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn one_parliamentary_position_per_constituency() {
        let mut b = base();
        for id in [1, 2] {
            b.add_position(Position {
                id: PositionId(id),
                title: "MP".to_string(),
                zone: Zone::Constituency(ConstituencyId(1)),
            })
            .unwrap();
        }
        assert!(b.build().is_err());
    }

    #[test]
    fn positions_anchored_at_regions_are_refused() {
        let mut b = base();
        b.add_position(Position {
            id: PositionId(1),
            title: "Governor".to_string(),
            zone: Zone::Region(RegionId(1)),
        })
        .unwrap();
        assert!(b.build().is_err());
    }

    #[test]
    fn all_problems_are_reported_together() {
        let mut b = base();
        b.add_candidate(Candidate {
            id: CandidateId(1),
            name: "A".to_string(),
            party: PartyId(3),
            position: PositionId(4),
        })
        .unwrap();
        b.add_agent(Agent {
            id: AgentId(1),
            name: "Z".to_string(),
            zone: Zone::Station(StationId(8)),
        })
        .unwrap();
        match b.build() {
            Err(CollationError::InvalidReferenceData(msgs)) => assert_eq!(msgs.len(), 3),
            x => panic!("unexpected {:?}", x),
        }
    }
}
