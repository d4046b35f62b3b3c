use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use traffic_validator::{
    decode::BitString, Connection, ConnectionId, Direction, Intersection, Lane, LaneId,
    ManeuverFlags, ManeuverType, ModelError,
};

#[test]
fn test_direction_group_laws() {
    for d in Direction::ALL {
        assert_eq!(d.opposite().opposite(), d);
        assert_eq!(d.right_of().right_of(), d.opposite());
        assert_eq!(d.right_of().right_of().right_of().right_of(), d);
        assert_eq!(d.left_of().right_of(), d);
        assert_eq!(d.right_of().left_of(), d);
        assert_ne!(d.opposite(), d);
        assert_ne!(d.right_of(), d);
    }
}

#[test]
fn test_bearing_sector_boundaries() {
    let cases = [
        (0.0, Direction::N),
        (22.4, Direction::N),
        (22.5, Direction::NE),
        (67.5, Direction::E),
        (112.5, Direction::SE),
        (157.5, Direction::S),
        (202.5, Direction::SW),
        (247.5, Direction::W),
        (292.5, Direction::NW),
        (337.4, Direction::NW),
        (337.5, Direction::N),
        (359.9, Direction::N),
        (-90.0, Direction::W),
        (450.0, Direction::E),
    ];
    for (bearing, expected) in cases {
        assert_eq!(Direction::from_bearing(bearing), expected, "bearing {}", bearing);
    }
}

#[test]
fn test_straight_bit_wins() {
    let mut rng = StdRng::seed_from_u64(37);
    for _ in 0..500 {
        let len = rng.gen_range(4..=12);
        let mut raw = String::from("1");
        for _ in 1..len {
            raw.push(if rng.gen_bool(0.5) { '1' } else { '0' });
        }
        let bits = BitString::parse(&raw).unwrap();
        assert_eq!(ManeuverFlags::from(bits).maneuver_type(), ManeuverType::Straight, "{}", raw);
    }
}

#[test]
fn test_maneuver_priority_after_straight() {
    let flags = ManeuverFlags::from(BitString::parse("0111").unwrap());
    assert_eq!(flags.maneuver_type(), ManeuverType::Left);
    let flags = ManeuverFlags::from(BitString::parse("0011").unwrap());
    assert_eq!(flags.maneuver_type(), ManeuverType::Right);
    let flags = ManeuverFlags::from(BitString::parse("0001").unwrap());
    assert_eq!(flags.maneuver_type(), ManeuverType::UTurn);
    assert_eq!(ManeuverType::UTurn.label(), "U-Turn");
}

fn right_turn_between_cyclist_lanes() -> Result<Intersection> {
    let mut intersection = Intersection::new(1, 1);
    let mut ingress = Lane::ingress(LaneId(1), 1);
    ingress.permissions.cyclist = true;
    let mut egress = Lane::egress(LaneId(2), 2);
    egress.permissions.cyclist = true;
    intersection.add_lane(ingress)?;
    intersection.add_lane(egress)?;
    intersection.add_connection(Connection::new(
        ConnectionId(1),
        LaneId(1),
        LaneId(2),
        ManeuverFlags::right(),
    ))?;
    Ok(intersection)
}

#[test]
fn test_cyclist_right_turn_follows_lane_permissions() -> Result<()> {
    for lane in [LaneId(1), LaneId(2)] {
        let mut intersection = right_turn_between_cyclist_lanes()?;
        let connection = intersection.connection(ConnectionId(1)).unwrap().clone();
        assert!(connection.is_cyclist_right_turn(&intersection));

        intersection.lane_mut(lane).unwrap().permissions.cyclist = false;
        assert!(!connection.is_cyclist_right_turn(&intersection));
        assert!(intersection.cyclist_right_turn_connections().is_empty());
    }
    Ok(())
}

#[test]
fn test_connection_registers_on_both_lanes() -> Result<()> {
    let intersection = right_turn_between_cyclist_lanes()?;
    assert_eq!(intersection.lane(LaneId(1)).unwrap().outgoing_connections(), &[ConnectionId(1)]);
    assert_eq!(intersection.lane(LaneId(2)).unwrap().incoming_connections(), &[ConnectionId(1)]);
    assert_eq!(
        intersection.find_connection(LaneId(1), LaneId(2)).map(|c| c.id),
        Some(ConnectionId(1))
    );
    Ok(())
}

#[test]
fn test_duplicate_and_dangling_connections_rejected() -> Result<()> {
    let mut intersection = right_turn_between_cyclist_lanes()?;
    let duplicate = Connection::new(ConnectionId(1), LaneId(1), LaneId(2), ManeuverFlags::straight());
    assert_eq!(
        intersection.add_connection(duplicate),
        Err(ModelError::DuplicateConnection(ConnectionId(1)))
    );
    let dangling = Connection::new(ConnectionId(2), LaneId(1), LaneId(99), ManeuverFlags::left());
    assert_eq!(
        intersection.add_connection(dangling),
        Err(ModelError::UnknownLane(LaneId(99)))
    );
    assert_eq!(intersection.connection_count(), 1);
    Ok(())
}
