use bhumi_tracker::{
    Event, FLAG_IGNORE_FOR_BEHAVIOUR, Inbound, MeshToken, ProfileLocation, RankedAccessPolicy, RegisterTrackedDevice, Sighting,
    Status, TrackedDevices, TrackerConfig, TrackerError, gate,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type Tracker<const N: usize> = TrackedDevices<RankedAccessPolicy, Vec<Event>, N>;

fn new_tracker<const N: usize>() -> Tracker<N> {
    let config = TrackerConfig {
        ticks_per_minute: Some(1),
        ..Default::default()
    };
    TrackedDevices::new(&config, RankedAccessPolicy, Vec::new())
}

fn full(device_id: u16, token: [u8; 3], ttl_minutes: u16) -> RegisterTrackedDevice {
    RegisterTrackedDevice {
        device_id,
        access_level: 1,
        location_id: 3,
        profile_id: 7,
        rssi_offset: 0,
        flags: 0,
        device_token: token,
        ttl_minutes,
    }
}

fn ids<const N: usize>(tracker: &Tracker<N>) -> Vec<u16> {
    tracker.store().iter().map(|d| d.device_id()).collect()
}

#[test]
fn distinct_ids_fill_up_to_capacity() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..50 {
        let mut tracker = new_tracker::<8>();
        let mut seen = Vec::new();
        for _ in 0..rng.gen_range(1..=8) {
            let id: u16 = rng.gen_range(0..32);
            let token = [id as u8, 0xaa, 0x55];
            assert_eq!(tracker.register(&full(id, token, 10)), Ok(()));
            if !seen.contains(&id) {
                seen.push(id);
            }
            assert!(tracker.store().len() <= 8);
        }
        assert_eq!(tracker.store().len(), seen.len());
    }
}

#[test]
fn store_never_exceeds_capacity() {
    let mut tracker = new_tracker::<3>();
    for id in 0..20u16 {
        tracker.register(&full(id, [id as u8, 1, 1], id)).unwrap();
        assert!(tracker.store().len() <= 3);
    }
    assert_eq!(tracker.store().len(), 3);
}

#[test]
fn reregistering_own_token_never_conflicts() {
    let mut tracker = new_tracker::<4>();
    let packet = full(1, [9, 9, 9], 10);
    for _ in 0..3 {
        assert_eq!(tracker.register(&packet), Ok(()));
    }
    let mut changed = packet.clone();
    changed.location_id = 42;
    assert_eq!(tracker.update(&changed), Ok(()));
    assert_eq!(tracker.find(1).unwrap().location_id(), 42);
}

#[test]
fn foreign_token_conflicts_and_leaves_owner_untouched() {
    let mut tracker = new_tracker::<4>();
    tracker.register(&full(1, [1, 2, 3], 10)).unwrap();
    let before = *tracker.find(1).unwrap();
    tracker.sink_mut().clear();

    let mut intruder = full(2, [1, 2, 3], 99);
    intruder.location_id = 11;
    let err = tracker.register(&intruder).unwrap_err();
    assert_eq!(err, TrackerError::TokenConflict { owner: 1 });
    assert_eq!(err.status(), Status::AlreadyExists);

    assert_eq!(*tracker.find(1).unwrap(), before);
    assert!(!tracker.find(2).unwrap().has_token());
    assert!(tracker.sink().is_empty());
}

fn mesh_only(device_id: u16) -> bhumi_tracker::MeshRegister {
    bhumi_tracker::MeshRegister {
        device_id,
        location_id: 1,
        profile_id: 1,
        rssi_offset: 0,
        flags: 0,
        access_level: 1,
    }
}

#[test]
fn overflow_evicts_incomplete_entry() {
    let mut tracker = new_tracker::<2>();
    // known from the mesh, but its token never arrived
    tracker.on_mesh_register(&mesh_only(1));
    assert!(!tracker.find(1).unwrap().is_complete());

    tracker.register(&full(2, [2, 0, 0], 1)).unwrap();
    tracker.register(&full(3, [3, 0, 0], 50)).unwrap();

    assert!(tracker.find(1).is_none());
    assert_eq!(ids(&tracker), vec![3, 2]);
}

#[test]
fn overflow_evicts_first_incomplete_from_head() {
    let mut tracker = new_tracker::<3>();
    tracker.on_mesh_register(&mesh_only(1));
    tracker.on_mesh_register(&mesh_only(2));
    tracker.register(&full(3, [3, 0, 0], 0)).unwrap();

    // head to tail: 3 (complete), 2, 1
    tracker.register(&full(4, [4, 0, 0], 9)).unwrap();
    assert_eq!(ids(&tracker), vec![4, 3, 1]);
}

#[test]
fn overflow_with_all_complete_evicts_lowest_ttl_towards_tail() {
    let mut tracker = new_tracker::<3>();
    tracker.register(&full(1, [1, 0, 0], 4)).unwrap();
    tracker.register(&full(2, [2, 0, 0], 4)).unwrap();
    tracker.register(&full(3, [3, 0, 0], 9)).unwrap();

    // 1 and 2 tie on ttl 4; 1 is further towards the tail
    tracker.register(&full(4, [4, 0, 0], 9)).unwrap();
    assert_eq!(ids(&tracker), vec![4, 3, 2]);

    tracker.register(&full(5, [5, 0, 0], 9)).unwrap();
    assert_eq!(ids(&tracker), vec![5, 4, 3]);
}

#[test]
fn sighting_requires_every_condition() {
    let sighting = Sighting {
        device_token: [1, 2, 3],
        rssi: -50,
    };
    let expected = Event::ProfileLocation(ProfileLocation {
        profile_id: 7,
        location_id: 3,
        from_mesh: false,
    });

    // all conditions hold
    let mut tracker = new_tracker::<4>();
    tracker.register(&full(1, [1, 2, 3], 10)).unwrap();
    tracker.sink_mut().clear();
    tracker.on_sighting(&sighting);
    assert_eq!(tracker.sink().as_slice(), &[expected]);

    // ignored for behaviour
    let mut tracker = new_tracker::<4>();
    let mut ignored = full(1, [1, 2, 3], 10);
    ignored.flags = FLAG_IGNORE_FOR_BEHAVIOUR;
    tracker.register(&ignored).unwrap();
    tracker.sink_mut().clear();
    tracker.on_sighting(&sighting);
    assert!(tracker.sink().is_empty());

    // ttl ran out
    let mut tracker = new_tracker::<4>();
    tracker.register(&full(1, [1, 2, 3], 0)).unwrap();
    tracker.sink_mut().clear();
    tracker.on_sighting(&sighting);
    assert!(tracker.sink().is_empty());

    // incomplete: only token and ttl known, via the mesh
    let mut tracker = new_tracker::<4>();
    tracker.on_mesh_token(&MeshToken {
        device_id: 1,
        device_token: [1, 2, 3],
        ttl_minutes: 10,
    });
    tracker.on_sighting(&sighting);
    assert!(tracker.sink().is_empty());

    // unknown token
    let mut tracker = new_tracker::<4>();
    tracker.on_sighting(&sighting);
    assert!(tracker.sink().is_empty());
}

#[test]
fn ttl_counts_down_and_floors_at_zero() {
    let mut tracker = new_tracker::<4>();
    tracker.register(&full(1, [1, 0, 0], 5)).unwrap();
    tracker.on_mesh_register(&bhumi_tracker::MeshRegister {
        device_id: 2,
        location_id: 0,
        profile_id: 0,
        rssi_offset: 0,
        flags: 0,
        access_level: 0,
    });

    for expected in (0..5).rev() {
        assert!(tracker.on_tick());
        assert_eq!(tracker.find(1).unwrap().ttl_minutes(), expected);
    }
    assert!(tracker.on_tick());
    assert_eq!(tracker.find(1).unwrap().ttl_minutes(), 0);

    // entries without ttl are untouched and nothing gets removed
    assert_eq!(tracker.find(2).unwrap().ttl_minutes(), 0);
    assert_eq!(tracker.store().len(), 2);
}

#[test]
fn invalid_ttl_always_grants_access() {
    let mut tracker = new_tracker::<4>();
    let mut admin = full(1, [1, 0, 0], 1);
    admin.access_level = 0;
    tracker.register(&admin).unwrap();

    let device = *tracker.find(1).unwrap();
    assert!(!gate::has_access(&RankedAccessPolicy, &device, 2));

    tracker.on_tick();
    let device = *tracker.find(1).unwrap();
    for requested in [0u8, 1, 2, 100, 201, 254, 255, 17] {
        assert!(gate::has_access(&RankedAccessPolicy, &device, requested));
    }
}

#[test]
fn expired_token_still_blocks_other_devices() {
    let mut tracker = new_tracker::<4>();
    tracker.register(&full(1, [1, 2, 3], 1)).unwrap();
    tracker.on_tick();
    assert!(!tracker.find(1).unwrap().is_valid_ttl());

    assert_eq!(
        tracker.register(&full(2, [1, 2, 3], 10)),
        Err(TrackerError::TokenConflict { owner: 1 })
    );
}

#[test]
fn store_without_room_reports_no_space() {
    let mut tracker = new_tracker::<0>();

    let status = tracker.handle_event(&Inbound::Register(full(1, [1, 2, 3], 10)));
    assert_eq!(status, Some(Status::NoSpace));
    let status = tracker.handle_event(&Inbound::Update(full(1, [1, 2, 3], 10)));
    assert_eq!(status, Some(Status::NoSpace));

    // mesh input has no reply channel and is dropped without output
    tracker.on_mesh_token(&MeshToken {
        device_id: 1,
        device_token: [1, 2, 3],
        ttl_minutes: 10,
    });
    tracker.on_mesh_register(&mesh_only(1));
    assert!(tracker.store().is_empty());
    assert!(tracker.sink().is_empty());
}
