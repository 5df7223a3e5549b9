/*!

# Quick start

This example follows one polling station from the first tally to the
declaration of its constituency seat.

The election has one nation, one region, one constituency and one station.
Three parties field a candidate each for the parliamentary seat of the
constituency. Every level has an agent.

```
use collation::*;

let mut b = RegistryBuilder::new();
b.add_nation(Nation { id: NationId(1), title: "Zed".to_string() })?;
b.add_region(Region { id: RegionId(1), title: "Yonder".to_string(), nation: NationId(1) })?;
b.add_constituency(Constituency {
    id: ConstituencyId(1),
    title: "Xavier North".to_string(),
    region: RegionId(1),
})?;
b.add_station(Station {
    id: StationId(1),
    code: "X001".to_string(),
    title: "Xavier North primary school".to_string(),
    constituency: ConstituencyId(1),
})?;
b.add_position(Position {
    id: PositionId(1),
    title: "Member for Xavier North".to_string(),
    zone: Zone::Constituency(ConstituencyId(1)),
})?;
for (i, code) in ["A", "B", "C"].iter().enumerate() {
    let id = i as u32 + 1;
    b.add_party(Party { id: PartyId(id), code: code.to_string(), title: format!("Party {}", code) })?;
    b.add_candidate(Candidate {
        id: CandidateId(id),
        name: format!("Candidate {}", code),
        party: PartyId(id),
        position: PositionId(1),
    })?;
}
let zones = [
    Zone::Station(StationId(1)),
    Zone::Constituency(ConstituencyId(1)),
    Zone::Region(RegionId(1)),
    Zone::Nation(NationId(1)),
];
for (i, zone) in zones.iter().enumerate() {
    b.add_agent(Agent { id: AgentId(i as u32 + 1), name: format!("Agent {}", i + 1), zone: *zone })?;
}
let mut engine = CollationEngine::new(b.build()?);

// The station agent sends the counts of the station, with the reference of
// the scanned paper sheet.
let sheet = engine.submit_tally(TallySubmission {
    station: StationId(1),
    position: PositionId(1),
    votes: vec![
        (CandidateId(1), VoteCount(10)),
        (CandidateId(2), VoteCount(7)),
        (CandidateId(3), VoteCount(2)),
    ],
    total_invalid_votes: VoteCount(1),
    scan: Some("x001-mp.png".to_string()),
    agent: AgentId(1),
})?;
assert_eq!(sheet.total_votes, 20);

engine.run_full_collation()?;
let at = |entity, zone| {
    engine
        .get_collation(OfficeType::Parliamentary, entity, zone)
        .map(|t| t.total_votes)
};
assert_eq!(at(Entity::Candidate(CandidateId(1)), CollationZone::Station(StationId(1))), Some(10));
assert_eq!(at(Entity::Party(PartyId(2)), CollationZone::Constituency(ConstituencyId(1))), Some(7));
assert_eq!(at(Entity::Party(PartyId(3)), CollationZone::Supernational), Some(2));

// Approvals go up one level at a time: the region agent cannot approve
// before the constituency agent.
engine.record_approval(sheet.id, AgentId(1), Some(VoteCount(19)))?;
engine.record_approval(sheet.id, AgentId(2), Some(VoteCount(19)))?;
assert_eq!(
    engine.get_approval_status(sheet.id),
    vec![ApprovalLevel::Station, ApprovalLevel::Constituency]
);

// Seat determination rebuilds the summary sheets.
engine.run_seat_determination()?;
let seat = engine.summary_sheets().next().map(|s| s.outcome.clone());
assert_eq!(seat, Some(SeatOutcome::Won(CandidateId(1))));
# Ok::<(), Box<dyn std::error::Error>>(())
```

A refused request reports every reason at once:

```
# use collation::*;
# let mut b = RegistryBuilder::new();
# b.add_nation(Nation { id: NationId(1), title: "Zed".to_string() })?;
# b.add_region(Region { id: RegionId(1), title: "Yonder".to_string(), nation: NationId(1) })?;
# b.add_agent(Agent { id: AgentId(3), name: "Region agent".to_string(), zone: Zone::Region(RegionId(1)) })?;
# let mut engine = CollationEngine::new(b.build()?);
let refused = engine.record_approval(ResultSheetId(1), AgentId(3), None);
assert_eq!(
    refused.map_err(|e| e.messages),
    Err(vec!["Result sheet 1 does not exist.".to_string()])
);
# Ok::<(), CollationError>(())
```

The `collate` program runs the same steps from an election file and
tally spreadsheets. See the [manual](../manual/index.html) for the formats.

*/
