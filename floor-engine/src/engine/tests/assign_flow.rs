use super::*;
use crate::assignment::AssignmentError;
use shared::event::FloorEvent;
use shared::types::ReservationStatus;

fn pair_config() -> FloorConfig {
    // Two adjacent tables plus one far away
    FloorConfig::with_tables(vec![
        simple_table(1, 2, 0, 0),
        simple_table(2, 2, 0, 3),
        simple_table(3, 2, 8, 8),
    ])
}

#[test]
fn assignment_commits_to_store_and_index() {
    let (manager, reservations) = create_test_manager(pair_config());
    let tables = manager.assign_tables(draft("19:00", "21:00", 2), None).unwrap();
    assert_eq!(tables.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);

    let stored = reservations.get_all().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].tables[0].id, 1);

    // Visible mid-window, gone exactly at the end
    assert_eq!(manager.active_reservations(test_date(), at(20, 0)).len(), 1);
    assert!(manager.active_reservations(test_date(), at(21, 0)).is_empty());
}

#[test]
fn assignment_emits_reservation_then_cluster_events() {
    let (manager, _) = create_test_manager(pair_config());
    let mut rx = manager.subscribe();

    manager.assign_tables(draft("19:00", "21:00", 4), None).unwrap();

    assert_eq!(
        rx.try_recv().unwrap(),
        FloorEvent::ReservationsChanged {
            date: test_date(),
            category: ServiceCategory::Dinner,
        }
    );
    assert!(matches!(
        rx.try_recv().unwrap(),
        FloorEvent::ClustersUpdated { .. }
    ));
}

#[test]
fn unseatable_party_is_insufficient_tables() {
    // Two capacity-4 tables with a gap between them
    let config = FloorConfig::with_tables(vec![
        simple_table(1, 4, 0, 0),
        simple_table(2, 4, 8, 8),
    ]);
    let (manager, _) = create_test_manager(config);
    assert_eq!(
        manager.assign_tables(draft("19:00", "21:00", 10), None).unwrap_err(),
        AssignmentError::InsufficientTables
    );
}

#[test]
fn fully_booked_window_is_no_tables_left() {
    let (manager, _) = create_test_manager(pair_config());
    manager.assign_tables(draft("19:00", "21:00", 4), None).unwrap();
    manager.assign_tables(draft("19:00", "21:00", 2), None).unwrap();
    assert_eq!(
        manager.assign_tables(draft("20:00", "22:00", 2), None).unwrap_err(),
        AssignmentError::NoTablesLeft
    );
}

#[test]
fn committed_assignment_locks_tables_for_the_window() {
    let (manager, _) = create_test_manager(pair_config());
    manager.assign_tables(draft("19:00", "21:00", 2), None).unwrap();

    // Table 1 is held, 2 is the next candidate
    let tables = manager.assign_tables(draft("19:30", "21:30", 2), None).unwrap();
    assert_eq!(tables[0].id, 2);
}

#[test]
fn malformed_draft_times_are_rejected() {
    let (manager, reservations) = create_test_manager(pair_config());
    let err = manager.assign_tables(draft("7pm", "21:00", 2), None).unwrap_err();
    assert!(matches!(err, AssignmentError::Unknown(_)));
    assert!(reservations.get_all().unwrap().is_empty());
}

#[test]
fn deleting_frees_the_table_and_its_locks() {
    let (manager, reservations) = create_test_manager(pair_config());
    let d = draft("19:00", "21:00", 4);
    let id = d.id;
    manager.assign_tables(d, None).unwrap();
    // The adjacent pair is held, only the lone far table is free
    assert!(manager
        .assign_tables(draft("19:00", "21:00", 4), None)
        .is_err());

    manager
        .delete_reservation(id, test_date(), ServiceCategory::Dinner)
        .unwrap();
    assert!(reservations.get_all().unwrap().is_empty());
    assert!(manager.active_reservations(test_date(), at(20, 0)).is_empty());

    // Same window assigns cleanly again
    manager.assign_tables(draft("19:00", "21:00", 4), None).unwrap();
}

#[test]
fn preload_window_focuses_on_store_contents() {
    let (manager, _) = create_test_manager(pair_config());
    manager.assign_tables(draft("19:00", "21:00", 2), None).unwrap();

    // Wipe and refill the index from the store
    manager.preload_window(test_date()).unwrap();
    assert_eq!(manager.active_reservations(test_date(), at(20, 0)).len(), 1);

    // Refocusing 20 days out evicts the old day entirely
    manager
        .preload_window(test_date() + chrono::Duration::days(20))
        .unwrap();
    assert!(manager.active_reservations(test_date(), at(20, 0)).is_empty());
}

#[test]
fn no_show_frees_the_table_and_its_lock() {
    let (manager, _) = create_test_manager(pair_config());
    manager.assign_tables(draft("19:00", "21:00", 4), None).unwrap();
    manager.assign_tables(draft("19:00", "21:00", 2), None).unwrap();

    // Every table is taken while both bookings stand
    assert!(manager
        .assign_tables(draft("19:00", "21:00", 2), None)
        .is_err());

    // The four-top party never shows; it stays indexed but occupies
    // nothing, and its lock must go with the occupancy
    let mut no_show = manager
        .active_reservations(test_date(), at(20, 0))
        .into_iter()
        .find(|r| r.party_size == 4)
        .unwrap();
    no_show.status = ReservationStatus::NoShow;
    manager.apply_external_change(no_show.clone());
    assert_eq!(manager.active_reservations(test_date(), at(20, 0)).len(), 2);

    let tables = manager
        .assign_tables(draft("19:00", "21:00", 2), None)
        .unwrap();
    assert!(no_show.tables.iter().any(|t| t.id == tables[0].id));
}

#[test]
fn forcing_an_occupied_table_reports_insufficient() {
    let (manager, _) = create_test_manager(pair_config());
    manager.assign_tables(draft("19:00", "21:00", 2), None).unwrap();

    let err = manager
        .assign_tables(draft("19:30", "21:30", 2), Some(1))
        .unwrap_err();
    assert_eq!(err, AssignmentError::InsufficientTables);
}

#[test]
fn external_cancellation_evicts_the_reservation() {
    let (manager, _) = create_test_manager(pair_config());
    let d = draft("19:00", "21:00", 2);
    manager.assign_tables(d, None).unwrap();

    let mut changed = manager.active_reservations(test_date(), at(20, 0)).remove(0);
    changed.status = ReservationStatus::Canceled;
    manager.apply_external_change(changed);

    assert!(manager.active_reservations(test_date(), at(20, 0)).is_empty());
}

#[tokio::test]
async fn store_listener_feeds_external_changes() {
    let (manager, reservations) = create_test_manager(pair_config());
    let mut rx = manager.subscribe();
    let handle = manager.spawn_store_listener();

    let d = draft("19:00", "21:00", 2);
    let reservation = d.into_reservation(
        at(19, 0),
        at(21, 0),
        vec![simple_table(1, 2, 0, 0)],
        chrono::Utc::now(),
    );
    reservations.push_external(reservation);

    let event = rx.recv().await.unwrap();
    assert_eq!(
        event,
        FloorEvent::ReservationsChanged {
            date: test_date(),
            category: ServiceCategory::Dinner,
        }
    );
    assert_eq!(manager.active_reservations(test_date(), at(20, 0)).len(), 1);
    handle.abort();
}

#[test]
fn editing_a_reservation_reassigns_over_its_own_hold() {
    let (manager, reservations) = create_test_manager(pair_config());
    let first = draft("19:00", "21:00", 2);
    let mut edit = first.clone();
    manager.assign_tables(first, None).unwrap();

    // Same booking grows to four guests in the same window
    edit.party_size = 4;
    let tables = manager.assign_tables(edit, None).unwrap();
    let mut ids: Vec<i64> = tables.iter().map(|t| t.id).collect();
    ids.sort();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(reservations.get_all().unwrap().len(), 1);
}

#[test]
fn available_tables_flags_the_edited_reservations_tables() {
    let (manager, _) = create_test_manager(pair_config());
    let d = draft("19:00", "21:00", 2);
    let mut edit = d.clone();
    manager.assign_tables(d, None).unwrap();

    edit.party_size = 2;
    let available = manager.available_tables(&edit).unwrap();
    let t1 = available.iter().find(|a| a.table.id == 1).unwrap();
    assert!(t1.currently_assigned);
    assert!(!available.iter().find(|a| a.table.id == 2).unwrap().currently_assigned);
}
