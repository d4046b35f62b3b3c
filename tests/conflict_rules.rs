mod common;

use anyhow::Result;
use common::*;
use traffic_validator::decode::{MapemDecoder, SignalGroupTable};
use traffic_validator::rules::cyclist_arrow::{
    opposing_left_turns, CONFLICT_FREE_LEFT_TURN, DIAGONAL_GREEN_ARROW, DIRECTIONAL_ARROWS,
};
use traffic_validator::rules::{Clause, ClauseOutcome, RuleEngine, RuleStatus, ValidationError, Verdict};
use traffic_validator::{
    Connection, ConnectionId, Direction, Intersection, Pipeline, SignalGroupId, SignalGroupType,
};

fn table_with_diagonal_arrow() -> SignalGroupTable {
    let mut table = SignalGroupTable::new();
    table.insert(SignalGroupId(1), "K1 West", SignalGroupType::FV);
    table.insert(SignalGroupId(2), "K2 Ost Links", SignalGroupType::DN);
    table.insert(SignalGroupId(3), "K3 Ost", SignalGroupType::FV);
    table.insert(SignalGroupId(4), "K4 Nord", SignalGroupType::FV);
    table.insert(SignalGroupId(5), "K5 Sued", SignalGroupType::FV);
    table
}

#[test]
fn test_diagonal_arrow_fails_both_clauses() -> Result<()> {
    let xml = opposing_left_turn(13).build();
    let run = Pipeline::default().run_with_table(xml.as_bytes(), Some(&table_with_diagonal_arrow()))?;

    assert_eq!(run.results.len(), 1);
    let result = run.result(ConnectionId(1)).unwrap();
    assert!(!result.valid);
    assert_eq!(result.verdict, Verdict::Invalid);
    assert_eq!(result.reasons.len(), 2);
    assert!(result.reasons[0].starts_with(CONFLICT_FREE_LEFT_TURN));
    assert!(result.reasons[0].contains("opposing approach E"));
    assert!(result.reasons[0].contains("K2 Ost Links (id 2)"));
    assert!(result.reasons[0].contains("controls connection 3"));
    assert!(result.reasons[1].starts_with(DIAGONAL_GREEN_ARROW));
    assert!(result.reasons[1].contains("DN signal group K2 Ost Links"));
    Ok(())
}

#[test]
fn test_diverging_left_turn_is_no_conflict() -> Result<()> {
    let xml = opposing_left_turn(12).build();
    let run = Pipeline::default().run_with_table(xml.as_bytes(), Some(&table_with_diagonal_arrow()))?;

    let result = run.result(ConnectionId(1)).unwrap();
    assert!(result.valid);
    assert_eq!(result.verdict, Verdict::Valid);
    assert!(result.reasons.is_empty());
    Ok(())
}

#[test]
fn test_plain_vehicle_group_on_left_turn_still_conflicts() -> Result<()> {
    // Without a table group 2 is typed FV, but it controls nothing except the left turn.
    let xml = opposing_left_turn(13).build();
    let run = Pipeline::default().run_with_table(xml.as_bytes(), None)?;

    let result = run.result(ConnectionId(1)).unwrap();
    assert!(!result.valid);
    assert_eq!(result.reasons.len(), 1);
    assert!(result.reasons[0].starts_with(CONFLICT_FREE_LEFT_TURN));
    assert!(result.reasons[0].contains("signal group SG2 (id 2)"));
    assert!(run.is_degraded());
    Ok(())
}

#[test]
fn test_lowest_conflicting_left_turn_is_reported() -> Result<()> {
    // Two protected left turns from the east converge with the right turn; connection 7 comes first
    // in the document.
    let xml = MapemBuilder::new()
        .lane(LaneXml::ingress(1, 1).stop_line(-150, 1000).connect(13, STRAIGHT, 4, 6))
        .lane(
            LaneXml::ingress(2, 2)
                .stop_line(1000, 150)
                .connect(13, LEFT, 7, 7)
                .connect(14, STRAIGHT, 3, 4),
        )
        .lane(LaneXml::ingress(5, 2).stop_line(1000, 250).connect(13, LEFT, 2, 3))
        .lane(LaneXml::ingress(3, 3).stop_line(150, -1000).connect(11, STRAIGHT, 5, 9))
        .lane(
            LaneXml::ingress(4, 4)
                .stop_line(-1000, -150)
                .connect(13, RIGHT, 1, 1)
                .connect(12, STRAIGHT, 1, 2),
        )
        .lane(LaneXml::egress(11, 1).node(150, 1000))
        .lane(LaneXml::egress(12, 2).node(1000, -150))
        .lane(LaneXml::egress(13, 3).node(-150, -1000))
        .lane(LaneXml::egress(14, 4).node(-1000, 150))
        .stream(1, 13, 4)
        .stream(2, 13, 6)
        .stream(2, 14, 3)
        .stream(5, 13, 2)
        .stream(3, 11, 5)
        .stream(4, 13, 1)
        .build();
    let mut table = table_with_diagonal_arrow();
    table.insert(SignalGroupId(6), "K6 Ost Links", SignalGroupType::DN);
    let run = Pipeline::default().run_with_table(xml.as_bytes(), Some(&table))?;

    let right_turn = run.intersection.connection(ConnectionId(1)).unwrap();
    let from_east: Vec<ConnectionId> = opposing_left_turns(&run.intersection, right_turn, Direction::W)
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(from_east, vec![ConnectionId(3), ConnectionId(7)]);

    let result = run.result(ConnectionId(1)).unwrap();
    assert_eq!(result.verdict, Verdict::Invalid);
    assert_eq!(result.reasons.len(), 2);
    assert!(result.reasons[0].starts_with(CONFLICT_FREE_LEFT_TURN));
    assert!(result.reasons[0].contains("K2 Ost Links (id 2)"));
    assert!(result.reasons[1].starts_with(DIAGONAL_GREEN_ARROW));
    for reason in &result.reasons {
        assert!(reason.contains("controls connection 3"), "{}", reason);
        assert!(!reason.contains("connection 7"), "{}", reason);
    }
    Ok(())
}

#[test]
fn test_shared_left_turn_group_is_no_conflict() -> Result<()> {
    // Left turn and straight from the east share one group, so the left turn is not protected.
    let xml = MapemBuilder::new()
        .lane(LaneXml::ingress(1, 1).stop_line(-150, 1000).connect(13, STRAIGHT, 4, 6))
        .lane(
            LaneXml::ingress(2, 2)
                .stop_line(1000, 150)
                .connect(13, LEFT, 2, 3)
                .connect(14, STRAIGHT, 2, 4),
        )
        .lane(LaneXml::ingress(3, 3).stop_line(150, -1000).connect(11, STRAIGHT, 5, 9))
        .lane(LaneXml::ingress(4, 4).stop_line(-1000, -150).connect(13, RIGHT, 1, 1))
        .lane(LaneXml::egress(11, 1).node(150, 1000))
        .lane(LaneXml::egress(13, 3).node(-150, -1000))
        .lane(LaneXml::egress(14, 4).node(-1000, 150))
        .stream(1, 13, 4)
        .stream(2, 13, 2)
        .stream(3, 11, 5)
        .stream(4, 13, 1)
        .build();
    let run = Pipeline::default().run_with_table(xml.as_bytes(), None)?;

    let result = run.result(ConnectionId(1)).unwrap();
    assert_eq!(result.verdict, Verdict::Valid);
    Ok(())
}

#[test]
fn test_audit_trail_order() -> Result<()> {
    let run = Pipeline::default().run(fixture_mapem().as_bytes(), Some(fixture_stg().as_bytes()))?;

    let ids: Vec<ConnectionId> = run.results.iter().map(|r| r.connection).collect();
    assert_eq!(ids, vec![ConnectionId(1), ConnectionId(6)]);
    for result in &run.results {
        assert_eq!(
            result.executed_rule_names(),
            vec![CONFLICT_FREE_LEFT_TURN, DIAGONAL_GREEN_ARROW, DIRECTIONAL_ARROWS]
        );
        let not_evaluable: Vec<&str> = result
            .rules_with_status(RuleStatus::NotEvaluable)
            .map(|r| r.rule.as_str())
            .collect();
        assert_eq!(not_evaluable, vec![DIRECTIONAL_ARROWS]);
    }

    let north = run.result(ConnectionId(6)).unwrap();
    assert_eq!(north.verdict, Verdict::Valid);
    assert_eq!(north.rules_with_status(RuleStatus::Passed).count(), 2);
    Ok(())
}

#[test]
fn test_unknown_direction_is_not_evaluable() -> Result<()> {
    // Skipping classification leaves every lane without a direction.
    let intersection = MapemDecoder::default().decode_str(&opposing_left_turn(13).build())?;
    let results = RuleEngine::default().validate(&intersection)?;

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(result.valid);
    assert!(!result.evaluable);
    assert_eq!(result.verdict, Verdict::NotEvaluable);
    assert_eq!(result.rules_with_status(RuleStatus::NotEvaluable).count(), 3);
    assert!(result.executed_rules[0]
        .note
        .as_deref()
        .unwrap()
        .contains("direction of lane 4 is unknown"));
    Ok(())
}

#[test]
fn test_opposing_left_turns_query() -> Result<()> {
    let run = Pipeline::default().run_with_table(opposing_left_turn(13).build().as_bytes(), None)?;
    let right_turn = run.intersection.connection(ConnectionId(1)).unwrap();

    let from_east: Vec<ConnectionId> = opposing_left_turns(&run.intersection, right_turn, Direction::W)
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(from_east, vec![ConnectionId(3)]);
    assert!(opposing_left_turns(&run.intersection, right_turn, Direction::N).is_empty());
    Ok(())
}

fn reject_everything(
    _intersection: &Intersection,
    right_turn: &Connection,
    direction: Direction,
) -> Result<ClauseOutcome, ValidationError> {
    Ok(ClauseOutcome::Fail(format!("{} from {} rejected", right_turn.id, direction)))
}

#[test]
fn test_custom_clause_list() -> Result<()> {
    let mut intersection = MapemDecoder::default().decode_str(&fixture_mapem())?;
    traffic_validator::geometry::GeometryClassifier::new().classify(&mut intersection)?;

    let engine = RuleEngine::new(vec![Clause {
        name: "reject",
        check: reject_everything,
    }]);
    assert_eq!(engine.clause_names(), vec!["reject"]);
    let results = engine.validate(&intersection)?;
    let reasons: Vec<&str> = results.iter().map(|r| r.reasons[0].as_str()).collect();
    assert_eq!(reasons, vec!["1 from W rejected", "6 from N rejected"]);
    Ok(())
}
