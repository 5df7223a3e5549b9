// Assembles the JSON summary of a run.

use collation::*;
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

/// A refused approval from the election file, with the reasons.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RejectedApproval {
    pub station: u32,
    pub position: u32,
    pub agent: u32,
    pub reasons: Vec<String>,
}

fn party_codes<'a>(registry: &Registry, parties: impl Iterator<Item = &'a PartyId>) -> Vec<String> {
    parties
        .map(|p| {
            registry
                .party(*p)
                .map(|x| x.code.clone())
                .unwrap_or_else(|| p.to_string())
        })
        .collect()
}

fn candidate_name(registry: &Registry, c: CandidateId) -> String {
    registry
        .candidate(c)
        .map(|x| x.name.clone())
        .unwrap_or_else(|| c.to_string())
}

// A share as a percentage with two decimals, rounded half up. Zero of zero is 0.00.
fn percent(part: usize, whole: usize) -> String {
    if whole == 0 {
        return "0.00".to_string();
    }
    let (part, whole) = (part as u128, whole as u128);
    let hundredths = (part * 20_000 + whole) / (2 * whole);
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

fn collations_to_json(engine: &CollationEngine) -> JSMap<String, JSValue> {
    let mut levels: JSMap<String, JSValue> = JSMap::new();
    for level in CollationLevel::ALL {
        let mut records: JSMap<String, JSValue> = JSMap::new();
        for (key, totals) in engine.collation_records(level) {
            records.insert(
                key.code(),
                json!({
                    "totalVotes": totals.total_votes,
                    "totalInvalidVotes": totals.total_invalid_votes,
                    "totalVotesEc": totals.total_votes_ec,
                    "variance": totals.variance(),
                }),
            );
        }
        levels.insert(level.name().to_string(), JSValue::Object(records));
    }
    levels
}

fn winners_to_json(engine: &CollationEngine) -> JSMap<String, JSValue> {
    let registry = engine.registry();
    let mut levels: JSMap<String, JSValue> = JSMap::new();
    for level in CollationLevel::ALL.iter().skip(1) {
        let lw = engine.zone_winners(OfficeType::Presidential, *level);
        let mut zones: JSMap<String, JSValue> = JSMap::new();
        for (zone, parties) in lw.winners.iter() {
            zones.insert(zone.to_string(), json!(party_codes(registry, parties.iter())));
        }
        levels.insert(
            level.name().to_string(),
            json!({
                "zones": zones,
                "declared": lw.declared(),
                "percentDeclared": percent(lw.declared(), lw.winners.len()),
            }),
        );
    }
    levels
}

fn seats_to_json(engine: &CollationEngine) -> JSValue {
    let registry = engine.registry();
    let mut sheets: Vec<JSValue> = Vec::new();
    for s in engine.summary_sheets() {
        let (outcome, candidates) = match &s.outcome {
            SeatOutcome::Won(c) => ("won", vec![candidate_name(registry, *c)]),
            SeatOutcome::Tied(cs) => (
                "tied",
                cs.iter().map(|c| candidate_name(registry, *c)).collect(),
            ),
        };
        sheets.push(json!({
            "constituency": s.constituency.to_string(),
            "position": s.position.to_string(),
            "outcome": outcome,
            "candidates": candidates,
            "votes": s.votes,
            "totalVotes": s.total_votes,
        }));
    }
    let summary = engine.seat_summary();
    let mut by_party: JSMap<String, JSValue> = JSMap::new();
    for (p, n) in summary.won_by_party.iter() {
        let code = party_codes(registry, [*p].iter()).concat();
        by_party.insert(
            code,
            json!({
                "seats": n,
                "percent": percent(*n, summary.seats),
            }),
        );
    }
    json!({
        "sheets": sheets,
        "seats": summary.seats,
        "declared": summary.declared,
        "tied": summary.tied,
        "outstanding": summary.outstanding,
        "wonByParty": by_party,
    })
}

fn sheets_to_json(engine: &CollationEngine) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for sheet in engine.store().sheets() {
        let approvals: Vec<JSValue> = engine
            .approvals(sheet.id)
            .iter()
            .map(|a| {
                json!({
                    "level": a.level.name(),
                    "agent": a.agent.to_string(),
                    "totalValidVotes": a.total_valid_votes,
                    "ecSummaryTotal": a.ec_summary_total,
                    "variance": a.variance,
                })
            })
            .collect();
        l.push(json!({
            "station": sheet.station.to_string(),
            "position": sheet.position.to_string(),
            "totalValidVotes": sheet.total_valid_votes,
            "totalInvalidVotes": sheet.total_invalid_votes,
            "totalVotes": sheet.total_votes,
            "fullyApproved": engine.is_fully_approved(sheet.id),
            "approvals": approvals,
        }));
    }
    l
}

pub fn build_summary_js(
    election_name: &str,
    engine: &CollationEngine,
    rejected: &[RejectedApproval],
) -> JSValue {
    let rejected_js: Vec<JSValue> = rejected
        .iter()
        .map(|r| {
            json!({
                "station": r.station,
                "position": r.position,
                "agent": r.agent,
                "reasons": r.reasons,
            })
        })
        .collect();
    json!({
        "election": election_name,
        "collations": collations_to_json(engine),
        "presidentialWinners": winners_to_json(engine),
        "parliamentarySeats": seats_to_json(engine),
        "resultSheets": sheets_to_json(engine),
        "rejectedApprovals": rejected_js,
    })
}

pub fn build_cleared_js(election_name: &str, cleared: usize) -> JSValue {
    json!({
        "election": election_name,
        "cleared": cleared,
    })
}
