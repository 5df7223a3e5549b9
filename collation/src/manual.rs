/*!

This is the long-form manual for `collation` and `collate`.

## Levels

Votes are rolled up in five levels: station, constituency, region, nation
and supernational. A station belongs to exactly one constituency, which
belongs to one region, which belongs to one nation. The supernational level
is a single record set above all the nations.

At station level, records count the votes of a candidate. At all the other
levels, records count the votes of a party.

| level         | entity    | zone                       |
|---------------|-----------|----------------------------|
| station       | candidate | the station                |
| constituency  | party     | the constituency           |
| region        | party     | the region                 |
| nation        | party     | the nation                 |
| supernational | party     | none (one record per party)|

Records are keyed by office type, entity and zone. Their code is the
uppercase triple, for example `PRESIDENTIAL|PARTY-3|REGION-2`.

## Offices

An office anchored at a nation is presidential. An office anchored at a
constituency is parliamentary, and each constituency has at most one.

## Approvals

Each result sheet is approved four times, in order: by an agent of its
station, then of its constituency, of its region and of its nation. An agent
may only approve sheets of stations inside its own zone. The approval
records the valid votes of the sheet, the figure reported by the electoral
commission and the difference between the two. A difference does not block
the approval.

Once a sheet has an approval, new tallies for the same station and position
are refused.

## Ties

Ties are never broken. A parliamentary seat with several candidates at the
highest count is reported as tied, with all of them. A zone winner query
returns every party at the highest count.

## Configuration

The `collate` program reads an election file in JSON format.

```json
{
  "outputSettings": { "electionName": "General election", "outputDirectory": "out" },
  "nations": [{ "id": 1, "title": "Zed" }],
  "regions": [{ "id": 1, "title": "Yonder", "nation": 1 }],
  "constituencies": [{ "id": 1, "title": "Xavier North", "region": 1 }],
  "stations": [{ "id": 1, "code": "X001", "title": "Primary school", "constituency": 1 }],
  "parties": [{ "id": 1, "code": "A", "title": "Party A" }],
  "positions": [{ "id": 1, "title": "President", "zone": { "level": "nation", "id": 1 } }],
  "candidates": [{ "id": 1, "name": "Candidate A", "party": 1, "position": 1 }],
  "agents": [{ "id": 1, "name": "Agent", "zone": { "level": "station", "id": 1 } }],
  "tallySources": [{ "provider": "csv", "filePath": "tallies.csv" }],
  "submissions": [],
  "approvals": [{ "station": 1, "position": 1, "agent": 1, "ecSummaryTotal": 19 }],
  "ecTotals": [{ "office": "presidential", "level": "region", "zone": 1, "party": 1, "total": 20 }]
}
```

Counts may be written as numbers or as strings. A count that is not a
non-negative integer stops the program.

`tallySources`, `submissions`, `approvals` and `ecTotals` are optional.
Tallies may be listed inline in `submissions`:

```json
{ "station": 1, "position": 1, "votes": { "1": 10, "2": "7" }, "invalidVotes": 1, "scan": "x001.png", "agent": 1 }
```

## Tally files

The following formats are supported:
* `csv` Comma Separated Values
* `xlsx` Excel spreadsheet (use `excelWorksheetName` to pick the sheet, the first one by default)

Both have one header row and the following columns, one row per candidate:

| station | position | candidate | votes | invalid_votes | scan       | agent |
|---------|----------|-----------|-------|---------------|------------|-------|
| 1       | 1        | 1         | 10    | 1             | x001.png   | 1     |
| 1       | 1        | 2         | 7     | 1             | x001.png   | 1     |

Rows of the same station and position form one tally. They must agree on the
invalid votes, the scan and the agent.

## Output

The summary is written in JSON format. It contains the records of every level,
the winners of every zone, the parliamentary seats, the approval status of
every result sheet and the approvals that were refused.

*/
