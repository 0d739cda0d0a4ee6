/// E2E TESTS: Liveness & failsafe behavior
///
/// Key invariants:
/// 1. A unit whose channel goes silent stops its outputs and advertises again
/// 2. The coordinator forgets silent units and their pairings
/// 3. No control frame leaves the coordinator while the emergency stop is latched

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use minibot_client::{transport::UnitSocket, EmergencyStopEvent, SessionPhase, TimeoutEvent};
use minibot_server::{
    ControllerId, ControllerSample, Coordinator, CoordinatorConfig, CoordinatorError,
    DiscoverEvent, ErrorEvent, EvictEvent, ReassignEvent, UnpairEvent,
};
use minibot_shared::{
    constants::{COMMAND_PORT_BASE, DISCOVERY_PORT}, ButtonSet, ControlFrame, Frame, Instant, SessionMode,
    NEUTRAL_AXIS_BYTE,
};
use minibot_test::{
    coordinator_address, settle, test_coordinator, test_unit, unit_id, Clock, Destination, LocalNetwork, RecordingSink,
    SinkCall, TestUnit,
};

fn joined(network: &LocalNetwork, clock: &Clock) -> (Coordinator, TestUnit, RecordingSink) {
    let mut coordinator = test_coordinator(network, CoordinatorConfig::default());
    let (mut unit, sink) = test_unit(network, 7, "r1");
    unit.start(&clock.at(0)).unwrap();
    settle(&mut coordinator, &mut [&mut unit], &clock.at(0));
    assert_eq!(unit.session().phase(), SessionPhase::Assigned);
    (coordinator, unit, sink)
}

fn full_stick(at: Instant) -> HashMap<ControllerId, ControllerSample> {
    let mut controllers = HashMap::new();
    controllers.insert(
        ControllerId(1),
        ControllerSample::new([1.0; 4], ButtonSet::empty(), at),
    );
    controllers
}

fn control_frames(network: &LocalNetwork) -> Vec<ControlFrame> {
    network
        .take_sent_frames()
        .into_iter()
        .filter_map(|(_, _, frame)| match frame {
            Frame::Control(control) => Some(control),
            _ => None,
        })
        .collect()
}

#[test]
fn silent_channel_stops_outputs_and_readvertises() {
    let _ = env_logger::builder().is_test(true).try_init();
    let clock = Clock::new();
    let network = LocalNetwork::new();
    let (mut coordinator, mut unit, sink) = joined(&network, &clock);

    let operator = coordinator.operator();
    operator.pair(&unit_id("r1"), ControllerId(1)).unwrap();
    operator.set_mode(&unit_id("r1"), SessionMode::Teleop).unwrap();
    coordinator.dispatch(&mut full_stick(clock.at(100)), &clock.at(100));
    unit.update(&clock.at(100));
    assert!(matches!(sink.last(), Some(SinkCall::Apply(_))));

    // the coordinator goes away
    unit.update(&clock.at(5000));
    assert_eq!(unit.session().phase(), SessionPhase::Assigned);
    network.take_sent();

    let mut events = unit.update(&clock.at(5200));
    assert_eq!(events.read::<TimeoutEvent>().count(), 1);
    assert_eq!(sink.last(), Some(SinkCall::Stop));
    assert_eq!(unit.session().phase(), SessionPhase::Advertising);
    assert_eq!(unit.session().mode(), SessionMode::Standby);
    assert_eq!(unit.socket().local_port(), Some(DISCOVERY_PORT));

    // and it announces again right away
    let announced = network
        .take_sent_frames()
        .into_iter()
        .any(|(_, to, frame)| {
            to == Destination::Broadcast(DISCOVERY_PORT)
                && matches!(frame, Frame::Discover { .. })
        });
    assert!(announced);
}

#[test]
fn keepalive_holds_an_idle_unit() {
    let clock = Clock::new();
    let network = LocalNetwork::new();
    let (mut coordinator, mut unit, _sink) = joined(&network, &clock);
    let mut controllers: HashMap<ControllerId, ControllerSample> = HashMap::new();

    // unpaired & in standby for 30 seconds
    for step in 1..=300u32 {
        let now = clock.at(step * 100);
        coordinator.dispatch(&mut controllers, &now);
        unit.update(&now);
        coordinator.receive(&now);
    }

    assert_eq!(unit.session().phase(), SessionPhase::Assigned);
    let record = coordinator.operator().unit(&unit_id("r1")).unwrap();
    assert!(record.last_ack_at().is_some());
}

#[test]
fn silent_unit_is_evicted_with_its_pairing() {
    let _ = env_logger::builder().is_test(true).try_init();
    let clock = Clock::new();
    let network = LocalNetwork::new();
    let (mut coordinator, unit, _sink) = joined(&network, &clock);
    let operator = coordinator.operator();
    operator.pair(&unit_id("r1"), ControllerId(1)).unwrap();

    // powered off
    drop(unit);

    let mut events = coordinator.receive(&clock.at(9000));
    assert!(!events.has::<EvictEvent>());

    let mut events = coordinator.receive(&clock.at(12_000));
    let evicted: Vec<_> = events.read::<EvictEvent>().collect();
    assert_eq!(evicted, vec![(unit_id("r1"), Some(ControllerId(1)))]);
    assert!(operator.units().is_empty());
    assert_eq!(operator.paired_controller(&unit_id("r1")), None);
}

#[test]
fn vanished_controller_is_unpaired() {
    let clock = Clock::new();
    let network = LocalNetwork::new();
    let (mut coordinator, _unit, _sink) = joined(&network, &clock);
    let operator = coordinator.operator();
    operator.pair(&unit_id("r1"), ControllerId(1)).unwrap();
    operator.set_mode(&unit_id("r1"), SessionMode::Teleop).unwrap();

    let mut nobody: HashMap<ControllerId, ControllerSample> = HashMap::new();
    network.take_sent();
    let mut events = coordinator.dispatch(&mut nobody, &clock.at(100));

    let unpaired: Vec<_> = events.read::<UnpairEvent>().collect();
    assert_eq!(unpaired, vec![(unit_id("r1"), ControllerId(1))]);
    assert_eq!(operator.paired_controller(&unit_id("r1")), None);
    assert!(control_frames(&network).is_empty());
}

#[test]
fn stale_sample_is_sent_as_neutral() {
    let clock = Clock::new();
    let network = LocalNetwork::new();
    let (mut coordinator, _unit, _sink) = joined(&network, &clock);
    let operator = coordinator.operator();
    operator.pair(&unit_id("r1"), ControllerId(1)).unwrap();
    operator.set_mode(&unit_id("r1"), SessionMode::Teleop).unwrap();

    network.take_sent();
    coordinator.dispatch(&mut full_stick(clock.at(0)), &clock.at(1000));

    let frames = control_frames(&network);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].axes, [NEUTRAL_AXIS_BYTE; 4]);
}

#[test]
fn control_is_only_sent_to_teleop_units() {
    let clock = Clock::new();
    let network = LocalNetwork::new();
    let (mut coordinator, _unit, _sink) = joined(&network, &clock);
    let operator = coordinator.operator();
    operator.pair(&unit_id("r1"), ControllerId(1)).unwrap();

    network.take_sent();
    coordinator.dispatch(&mut full_stick(clock.at(100)), &clock.at(100));
    assert!(control_frames(&network).is_empty());

    operator.set_mode(&unit_id("r1"), SessionMode::Autonomous).unwrap();
    coordinator.dispatch(&mut full_stick(clock.at(200)), &clock.at(200));
    assert!(control_frames(&network).is_empty());

    operator.set_mode(&unit_id("r1"), SessionMode::Teleop).unwrap();
    coordinator.dispatch(&mut full_stick(clock.at(300)), &clock.at(300));
    assert_eq!(control_frames(&network).len(), 1);
}

#[test]
fn emergency_stop_halts_everything_until_released() {
    let _ = env_logger::builder().is_test(true).try_init();
    let clock = Clock::new();
    let network = LocalNetwork::new();
    let (mut coordinator, mut unit, sink) = joined(&network, &clock);
    let operator = coordinator.operator();
    operator.pair(&unit_id("r1"), ControllerId(1)).unwrap();
    operator.set_mode(&unit_id("r1"), SessionMode::Teleop).unwrap();
    coordinator.dispatch(&mut full_stick(clock.at(100)), &clock.at(100));
    unit.update(&clock.at(100));
    assert_eq!(sink.applied().len(), 1);

    network.take_sent();
    operator.emergency_stop(true);
    assert!(operator.emergency_stop_active());

    // observed address, channel, and a broadcast for advertising units
    let destinations: Vec<Destination> = network
        .take_sent_frames()
        .into_iter()
        .filter(|(_, _, frame)| *frame == Frame::EmergencyStop)
        .map(|(_, to, _)| to)
        .collect();
    assert_eq!(
        destinations,
        vec![
            Destination::Unicast(SocketAddr::new(LocalNetwork::host(7), DISCOVERY_PORT)),
            Destination::Unicast(SocketAddr::new(LocalNetwork::host(7), COMMAND_PORT_BASE)),
            Destination::Broadcast(DISCOVERY_PORT),
        ]
    );

    let mut events = unit.update(&clock.at(200));
    assert_eq!(events.read::<EmergencyStopEvent>().collect::<Vec<_>>(), vec![true]);
    assert_eq!(sink.last(), Some(SinkCall::Stop));

    coordinator.dispatch(&mut full_stick(clock.at(300)), &clock.at(300));
    assert!(control_frames(&network).is_empty());

    operator.emergency_stop(false);
    unit.update(&clock.at(400));
    assert!(!unit.session().emergency_stop_active());

    coordinator.dispatch(&mut full_stick(clock.at(500)), &clock.at(500));
    unit.update(&clock.at(500));
    assert_eq!(sink.applied().len(), 2);
}

#[test]
fn keepalive_repeats_latched_emergency_stop() {
    let clock = Clock::new();
    let network = LocalNetwork::new();
    let (mut coordinator, _unit, _sink) = joined(&network, &clock);
    let mut controllers: HashMap<ControllerId, ControllerSample> = HashMap::new();

    coordinator.operator().emergency_stop(true);
    // first tick always carries the keepalive
    network.take_sent();
    coordinator.dispatch(&mut controllers, &clock.at(100));

    let frames: Vec<Frame> = network
        .take_sent_frames()
        .into_iter()
        .map(|(_, _, frame)| frame)
        .collect();
    assert_eq!(
        frames,
        vec![
            Frame::Status {
                unit_id: unit_id("r1"),
                mode: SessionMode::Standby,
            },
            Frame::EmergencyStop,
        ]
    );
}

#[test]
fn shutdown_sends_emergency_stop() {
    let clock = Clock::new();
    let network = LocalNetwork::new();
    let (coordinator, mut unit, sink) = joined(&network, &clock);

    coordinator.shutdown();
    unit.update(&clock.at(100));
    assert!(unit.session().emergency_stop_active());
    assert_eq!(sink.last(), Some(SinkCall::Stop));
}

#[test]
fn reset_forgets_units_until_they_announce_again() {
    let clock = Clock::new();
    let network = LocalNetwork::new();
    let (coordinator, _unit, _sink) = joined(&network, &clock);
    let operator = coordinator.operator();
    operator.pair(&unit_id("r1"), ControllerId(1)).unwrap();

    assert_eq!(operator.reset_all(), 1);
    assert!(operator.units().is_empty());
    assert_eq!(operator.paired_controller(&unit_id("r1")), None);
}

#[test]
fn spawned_coordinator_assigns_and_drives() {
    let _ = env_logger::builder().is_test(true).try_init();
    let network = LocalNetwork::new();
    let coordinator = test_coordinator(&network, CoordinatorConfig::default());
    let controllers: Arc<Mutex<HashMap<ControllerId, ControllerSample>>> =
        Arc::new(Mutex::new(HashMap::new()));
    let handle = coordinator.spawn(controllers.clone()).unwrap();
    let (mut unit, sink) = test_unit(&network, 7, "r1");

    unit.start(&Instant::now()).unwrap();
    for _ in 0..200 {
        unit.update(&Instant::now());
        if unit.session().phase() == SessionPhase::Assigned {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(unit.session().assigned_channel(), Some(COMMAND_PORT_BASE));

    let operator = handle.operator();
    operator.pair(&unit_id("r1"), ControllerId(1)).unwrap();
    operator.set_mode(&unit_id("r1"), SessionMode::Teleop).unwrap();

    for _ in 0..200 {
        controllers.lock().unwrap().insert(
            ControllerId(1),
            ControllerSample::new([0.5; 4], ButtonSet::empty(), Instant::now()),
        );
        unit.update(&Instant::now());
        if !sink.applied().is_empty() {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(!sink.applied().is_empty());

    let mut events = handle.poll_events();
    assert!(events.has::<DiscoverEvent>());
    assert!(events.read::<ErrorEvent>().next().is_none());

    handle.shutdown();
    unit.update(&Instant::now());
    assert!(unit.session().emergency_stop_active());
}

#[test]
fn operator_send_failures_are_reported() {
    let _ = env_logger::builder().is_test(true).try_init();
    let clock = Clock::new();
    let network = LocalNetwork::new();
    let (mut coordinator, _unit, _sink) = joined(&network, &clock);
    let operator = coordinator.operator();
    let source_address = SocketAddr::new(LocalNetwork::host(7), DISCOVERY_PORT);
    let command_address = SocketAddr::new(LocalNetwork::host(7), COMMAND_PORT_BASE);

    network.fail_sends_from(coordinator_address(coordinator.config()));

    // the action succeeds; its lost frame shows up on the next receive
    operator.set_mode(&unit_id("r1"), SessionMode::Teleop).unwrap();
    let mut events = coordinator.receive(&clock.at(100));
    let errors: Vec<CoordinatorError> = events.read::<ErrorEvent>().collect();
    assert_eq!(
        errors,
        vec![CoordinatorError::SendFailed {
            frame: "STATUS",
            address: command_address,
        }]
    );

    operator.emergency_stop(true);
    let mut events = coordinator.receive(&clock.at(200));
    let errors: Vec<CoordinatorError> = events.read::<ErrorEvent>().collect();
    assert_eq!(
        errors,
        vec![
            CoordinatorError::SendFailed {
                frame: "ESTOP",
                address: source_address,
            },
            CoordinatorError::SendFailed {
                frame: "ESTOP",
                address: command_address,
            },
            CoordinatorError::BroadcastFailed {
                frame: "ESTOP",
                port: DISCOVERY_PORT,
            },
        ]
    );

    // reported once only
    let mut events = coordinator.receive(&clock.at(300));
    assert!(!events.has::<ErrorEvent>());

    network.restore_sends_from(&coordinator_address(coordinator.config()));
    operator.emergency_stop(false);
    let mut events = coordinator.receive(&clock.at(400));
    assert!(events.read::<ErrorEvent>().next().is_none());
}

#[test]
fn unpolled_events_stay_bounded() {
    let _ = env_logger::builder().is_test(true).try_init();
    let network = LocalNetwork::new();
    let config = CoordinatorConfig {
        max_pending_events: 16,
        ..CoordinatorConfig::default()
    };
    let address = coordinator_address(&config);
    let coordinator = test_coordinator(&network, config);
    let controllers: HashMap<ControllerId, ControllerSample> = HashMap::new();
    let handle = coordinator.spawn(Arc::new(Mutex::new(controllers))).unwrap();

    // every assignment reply fails, adding an error per announcement
    network.fail_sends_from(address);
    let discover = Frame::Discover {
        unit_id: unit_id("r1"),
        reported_address: "192.168.4.7".to_string(),
    }
    .encode();
    let source_address = SocketAddr::new(LocalNetwork::host(7), DISCOVERY_PORT);
    for _ in 0..200 {
        network.inject(source_address, Destination::Unicast(address), &discover);
    }

    for _ in 0..400 {
        if network.pending(&address) == 0 {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(network.pending(&address), 0);
    // let the last pass publish
    thread::sleep(Duration::from_millis(50));

    let mut events = handle.poll_events();
    assert_eq!(events.read::<DiscoverEvent>().count(), 1);
    assert_eq!(events.read::<ReassignEvent>().count(), 16);
    assert_eq!(events.read::<ErrorEvent>().count(), 16);

    network.restore_sends_from(&address);
    handle.shutdown();
}
