// A small election shared by the unit tests.
//
// nation 1
// ├── region 1
// │   ├── constituency 1: stations 1, 2
// │   └── constituency 2: station 3
// └── region 2
//     └── constituency 3: station 4

use crate::builder::RegistryBuilder;
use crate::config::*;
use crate::registry::Registry;
use crate::CollationEngine;

pub const PRESIDENT: PositionId = PositionId(1);
pub const MP_C1: PositionId = PositionId(2);
pub const MP_C2: PositionId = PositionId(3);
pub const MP_C3: PositionId = PositionId(4);

pub const PARTY_A: PartyId = PartyId(1);
pub const PARTY_B: PartyId = PartyId(2);
pub const PARTY_C: PartyId = PartyId(3);

pub const PRES_A: CandidateId = CandidateId(1);
pub const PRES_B: CandidateId = CandidateId(2);
pub const PRES_C: CandidateId = CandidateId(3);
pub const MP1_A: CandidateId = CandidateId(11);
pub const MP1_B: CandidateId = CandidateId(12);
pub const MP1_C: CandidateId = CandidateId(13);
pub const MP2_A: CandidateId = CandidateId(21);
pub const MP2_B: CandidateId = CandidateId(22);
pub const MP3_A: CandidateId = CandidateId(31);
pub const MP3_B: CandidateId = CandidateId(32);

pub const CONSTITUENCY_AGENT_C1: AgentId = AgentId(10);
pub const CONSTITUENCY_AGENT_C2: AgentId = AgentId(11);
pub const REGION_AGENT_R1: AgentId = AgentId(20);
pub const REGION_AGENT_R2: AgentId = AgentId(21);
pub const NATION_AGENT: AgentId = AgentId(30);

/// The agent of a station has the same number as the station.
pub fn station_agent(station: u32) -> AgentId {
    AgentId(station)
}

pub fn registry() -> Registry {
    let mut b = RegistryBuilder::new();
    b.add_nation(Nation {
        id: NationId(1),
        title: "Nation".to_string(),
    })
    .unwrap();
    for r in [1, 2] {
        b.add_region(Region {
            id: RegionId(r),
            title: format!("Region {}", r),
            nation: NationId(1),
        })
        .unwrap();
    }
    for (c, r) in [(1, 1), (2, 1), (3, 2)] {
        b.add_constituency(Constituency {
            id: ConstituencyId(c),
            title: format!("Constituency {}", c),
            region: RegionId(r),
        })
        .unwrap();
    }
    for (s, c) in [(1, 1), (2, 1), (3, 2), (4, 3)] {
        b.add_station(Station {
            id: StationId(s),
            code: format!("S{:03}", s),
            title: format!("Station {}", s),
            constituency: ConstituencyId(c),
        })
        .unwrap();
        b.add_agent(Agent {
            id: station_agent(s),
            name: format!("Station agent {}", s),
            zone: Zone::Station(StationId(s)),
        })
        .unwrap();
    }
    for (id, code) in [(PARTY_A, "A"), (PARTY_B, "B"), (PARTY_C, "C")] {
        b.add_party(Party {
            id,
            code: code.to_string(),
            title: format!("Party {}", code),
        })
        .unwrap();
    }
    b.add_position(Position {
        id: PRESIDENT,
        title: "President".to_string(),
        zone: Zone::Nation(NationId(1)),
    })
    .unwrap();
    for (p, c) in [(MP_C1, 1), (MP_C2, 2), (MP_C3, 3)] {
        b.add_position(Position {
            id: p,
            title: format!("Member for constituency {}", c),
            zone: Zone::Constituency(ConstituencyId(c)),
        })
        .unwrap();
    }
    let candidates = [
        (PRES_A, PARTY_A, PRESIDENT),
        (PRES_B, PARTY_B, PRESIDENT),
        (PRES_C, PARTY_C, PRESIDENT),
        (MP1_A, PARTY_A, MP_C1),
        (MP1_B, PARTY_B, MP_C1),
        (MP1_C, PARTY_C, MP_C1),
        (MP2_A, PARTY_A, MP_C2),
        (MP2_B, PARTY_B, MP_C2),
        (MP3_A, PARTY_A, MP_C3),
        (MP3_B, PARTY_B, MP_C3),
    ];
    for (id, party, position) in candidates {
        b.add_candidate(Candidate {
            id,
            name: format!("Candidate {}", id.0),
            party,
            position,
        })
        .unwrap();
    }
    let supervisors = [
        (CONSTITUENCY_AGENT_C1, Zone::Constituency(ConstituencyId(1))),
        (CONSTITUENCY_AGENT_C2, Zone::Constituency(ConstituencyId(2))),
        (AgentId(12), Zone::Constituency(ConstituencyId(3))),
        (REGION_AGENT_R1, Zone::Region(RegionId(1))),
        (REGION_AGENT_R2, Zone::Region(RegionId(2))),
        (NATION_AGENT, Zone::Nation(NationId(1))),
    ];
    for (id, zone) in supervisors {
        b.add_agent(Agent {
            id,
            name: format!("Supervisor {}", id.0),
            zone,
        })
        .unwrap();
    }
    b.build().unwrap()
}

pub fn engine() -> CollationEngine {
    CollationEngine::new(registry())
}

/// A tally recorded by the station's own agent, with a scan attached.
pub fn submission(
    station: u32,
    position: PositionId,
    votes: &[(CandidateId, u64)],
    invalid: u64,
) -> TallySubmission {
    TallySubmission {
        station: StationId(station),
        position,
        votes: votes.iter().map(|(c, v)| (*c, VoteCount(*v))).collect(),
        total_invalid_votes: VoteCount(invalid),
        scan: Some(format!("scan-{}-{}.png", station, position.0)),
        agent: station_agent(station),
    }
}

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}
