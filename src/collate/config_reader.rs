use std::collections::BTreeMap;

use collation::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::collate::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "electionName")]
    pub election_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

/// A zone written as `{"level": "region", "id": 2}`.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigZone {
    pub level: String,
    pub id: u32,
}

impl ConfigZone {
    pub fn zone(&self) -> CollateResult<Zone> {
        read_zone(&self.level, self.id)
    }
}

fn read_zone(level: &str, id: u32) -> CollateResult<Zone> {
    match level {
        "station" => Ok(Zone::Station(StationId(id))),
        "constituency" => Ok(Zone::Constituency(ConstituencyId(id))),
        "region" => Ok(Zone::Region(RegionId(id))),
        "nation" => Ok(Zone::Nation(NationId(id))),
        x => UnknownLevelSnafu { level: x }.fail(),
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigNation {
    pub id: u32,
    pub title: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRegion {
    pub id: u32,
    pub title: String,
    pub nation: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigConstituency {
    pub id: u32,
    pub title: String,
    pub region: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigStation {
    pub id: u32,
    pub code: String,
    pub title: String,
    pub constituency: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigParty {
    pub id: u32,
    pub code: String,
    pub title: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigPosition {
    pub id: u32,
    pub title: String,
    pub zone: ConfigZone,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigCandidate {
    pub id: u32,
    pub name: String,
    pub party: u32,
    pub position: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigAgent {
    pub id: u32,
    pub name: String,
    pub zone: ConfigZone,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

/// A tally written directly in the election file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSubmission {
    pub station: u32,
    pub position: u32,
    /// Candidate identifier -> count.
    pub votes: BTreeMap<String, JSValue>,
    #[serde(rename = "invalidVotes")]
    pub invalid_votes: Option<JSValue>,
    pub scan: Option<String>,
    pub agent: u32,
}

impl ConfigSubmission {
    pub fn submission(&self) -> CollateResult<TallySubmission> {
        let what = format!("station {} position {}", self.station, self.position);
        let mut votes: Vec<(CandidateId, VoteCount)> = Vec::new();
        for (k, v) in self.votes.iter() {
            let cid = k
                .trim()
                .parse::<u32>()
                .ok()
                .context(InvalidCandidateKeySnafu { key: k.clone() })?;
            let count = read_js_votes(v).context(InvalidCountSnafu { what: what.clone() })?;
            votes.push((CandidateId(cid), count));
        }
        let invalid = match &self.invalid_votes {
            Some(x) => read_js_votes(x).context(InvalidCountSnafu { what })?,
            None => VoteCount::EMPTY,
        };
        Ok(TallySubmission {
            station: StationId(self.station),
            position: PositionId(self.position),
            votes,
            total_invalid_votes: invalid,
            scan: self.scan.clone().filter(|s| !s.is_empty()),
            agent: AgentId(self.agent),
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigApproval {
    pub station: u32,
    pub position: u32,
    pub agent: u32,
    #[serde(rename = "ecSummaryTotal")]
    pub ec_summary_total: Option<JSValue>,
}

impl ConfigApproval {
    /// The EC figure, if one was given. A null value counts as missing.
    pub fn ec_summary_total(&self) -> CollateResult<Option<VoteCount>> {
        match &self.ec_summary_total {
            None | Some(JSValue::Null) => Ok(None),
            Some(x) => read_js_votes(x).map(Some).context(InvalidCountSnafu {
                what: format!(
                    "approval of station {} position {} by agent {}",
                    self.station, self.position, self.agent
                ),
            }),
        }
    }
}

/// A total reported by the electoral commission for one collation record.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEcTotal {
    pub office: String,
    pub level: String,
    /// Not used at supernational level.
    pub zone: Option<u32>,
    pub party: Option<u32>,
    pub candidate: Option<u32>,
    pub total: JSValue,
}

impl ConfigEcTotal {
    pub fn office_type(&self) -> CollateResult<OfficeType> {
        read_office(&self.office)
    }

    pub fn collation_zone(&self) -> CollateResult<CollationZone> {
        match (self.level.as_str(), self.zone) {
            ("supernational", _) => Ok(CollationZone::Supernational),
            (level, Some(id)) => read_zone(level, id).map(CollationZone::from),
            (level, None) => MissingZoneSnafu { level }.fail(),
        }
    }

    pub fn entity(&self) -> CollateResult<Entity> {
        match (self.party, self.candidate) {
            (Some(p), None) => Ok(Entity::Party(PartyId(p))),
            (None, Some(c)) => Ok(Entity::Candidate(CandidateId(c))),
            _ => AmbiguousEntitySnafu {
                level: self.level.clone(),
            }
            .fail(),
        }
    }

    pub fn total(&self) -> CollateResult<VoteCount> {
        read_js_votes(&self.total).context(InvalidCountSnafu {
            what: format!("EC total at {} level", self.level),
        })
    }
}

pub fn read_office(office: &str) -> CollateResult<OfficeType> {
    match office {
        "presidential" => Ok(OfficeType::Presidential),
        "parliamentary" => Ok(OfficeType::Parliamentary),
        x => UnknownOfficeSnafu { office: x }.fail(),
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub nations: Vec<ConfigNation>,
    pub regions: Vec<ConfigRegion>,
    pub constituencies: Vec<ConfigConstituency>,
    pub stations: Vec<ConfigStation>,
    pub parties: Vec<ConfigParty>,
    pub positions: Vec<ConfigPosition>,
    pub candidates: Vec<ConfigCandidate>,
    pub agents: Vec<ConfigAgent>,
    #[serde(rename = "tallySources", default)]
    pub tally_sources: Vec<FileSource>,
    #[serde(default)]
    pub submissions: Vec<ConfigSubmission>,
    #[serde(default)]
    pub approvals: Vec<ConfigApproval>,
    #[serde(rename = "ecTotals", default)]
    pub ec_totals: Vec<ConfigEcTotal>,
}

impl ElectionConfig {
    pub fn registry(&self) -> CollateResult<Registry> {
        let mut b = RegistryBuilder::new();
        for n in self.nations.iter() {
            b.add_nation(Nation {
                id: NationId(n.id),
                title: n.title.clone(),
            })
            .context(RegistrySnafu {})?;
        }
        for r in self.regions.iter() {
            b.add_region(Region {
                id: RegionId(r.id),
                title: r.title.clone(),
                nation: NationId(r.nation),
            })
            .context(RegistrySnafu {})?;
        }
        for c in self.constituencies.iter() {
            b.add_constituency(Constituency {
                id: ConstituencyId(c.id),
                title: c.title.clone(),
                region: RegionId(c.region),
            })
            .context(RegistrySnafu {})?;
        }
        for s in self.stations.iter() {
            b.add_station(Station {
                id: StationId(s.id),
                code: s.code.clone(),
                title: s.title.clone(),
                constituency: ConstituencyId(s.constituency),
            })
            .context(RegistrySnafu {})?;
        }
        for p in self.parties.iter() {
            b.add_party(Party {
                id: PartyId(p.id),
                code: p.code.clone(),
                title: p.title.clone(),
            })
            .context(RegistrySnafu {})?;
        }
        for p in self.positions.iter() {
            b.add_position(Position {
                id: PositionId(p.id),
                title: p.title.clone(),
                zone: p.zone.zone()?,
            })
            .context(RegistrySnafu {})?;
        }
        for c in self.candidates.iter() {
            b.add_candidate(Candidate {
                id: CandidateId(c.id),
                name: c.name.clone(),
                party: PartyId(c.party),
                position: PositionId(c.position),
            })
            .context(RegistrySnafu {})?;
        }
        for a in self.agents.iter() {
            b.add_agent(Agent {
                id: AgentId(a.id),
                name: a.name.clone(),
                zone: a.zone.zone()?,
            })
            .context(RegistrySnafu {})?;
        }
        b.build().context(RegistrySnafu {})
    }
}

/// Reads a count written either as a JSON number or as a string.
pub fn read_js_votes(x: &JSValue) -> Result<VoteCount, CollationError> {
    match x {
        JSValue::Number(n) => {
            if let Some(u) = n.as_u64() {
                VoteCount::try_from(u)
            } else if let Some(i) = n.as_i64() {
                VoteCount::try_from(i)
            } else if let Some(f) = n.as_f64() {
                VoteCount::try_from(f)
            } else {
                Err(CollationError::InvalidVoteCount(n.to_string()))
            }
        }
        JSValue::String(s) => s.parse::<VoteCount>(),
        x => Err(CollationError::InvalidVoteCount(x.to_string())),
    }
}
