use super::*;
use crate::layout::MoveOutcome;
use shared::event::FloorEvent;

fn config() -> FloorConfig {
    FloorConfig::with_tables(vec![
        simple_table(1, 2, 0, 0),
        simple_table(2, 2, 0, 3),
    ])
}

#[test]
fn rejected_move_changes_nothing_and_stays_silent() {
    let (manager, _) = create_test_manager(config());
    let mut rx = manager.subscribe();
    let grid_before = manager.tables();

    // Straight onto the other table's footprint
    let outcome = manager
        .move_table(test_date(), ServiceCategory::Dinner, 1, 0, 3)
        .unwrap();
    assert_eq!(outcome, MoveOutcome::Invalid);
    assert_eq!(manager.tables(), grid_before);
    assert!(rx.try_recv().is_err());
}

#[test]
fn committed_move_emits_layout_and_cluster_events() {
    let (manager, _) = create_test_manager(config());
    let mut rx = manager.subscribe();

    let outcome = manager
        .move_table(test_date(), ServiceCategory::Dinner, 1, 5, 5)
        .unwrap();
    assert_eq!(outcome, MoveOutcome::Moved);

    let key = format!("{}-dinner", test_date());
    assert_eq!(rx.try_recv().unwrap(), FloorEvent::LayoutChanged { key: key.clone() });
    assert_eq!(rx.try_recv().unwrap(), FloorEvent::ClustersUpdated { key });
}

#[test]
fn moving_a_table_away_dissolves_its_cluster() {
    let (manager, _) = create_test_manager(config());
    manager.assign_tables(draft("19:00", "21:00", 4), None).unwrap();
    assert_eq!(
        manager
            .clusters_for(test_date(), ServiceCategory::Dinner)
            .unwrap()
            .len(),
        1
    );

    manager
        .move_table(test_date(), ServiceCategory::Dinner, 1, 10, 10)
        .unwrap();
    assert!(manager
        .clusters_for(test_date(), ServiceCategory::Dinner)
        .unwrap()
        .is_empty());
}

#[test]
fn reset_restores_base_positions() {
    let (manager, _) = create_test_manager(config());
    manager
        .move_table(test_date(), ServiceCategory::Dinner, 1, 9, 9)
        .unwrap();
    manager
        .reset_layout(test_date(), ServiceCategory::Dinner)
        .unwrap();

    let t1 = manager.tables().into_iter().find(|t| t.id == 1).unwrap();
    assert_eq!((t1.row, t1.column), (0, 0));
}

#[test]
fn saved_layout_survives_reload_and_seeds_later_days() {
    let (manager, _) = create_test_manager(config());
    manager
        .move_table(test_date(), ServiceCategory::Dinner, 1, 5, 5)
        .unwrap();

    let later = test_date() + chrono::Duration::days(7);
    let tables = manager.load_layout(later, ServiceCategory::Dinner);
    let t1 = tables.iter().find(|t| t.id == 1).unwrap();
    assert_eq!((t1.row, t1.column), (5, 5));

    // The other category still serves the base arrangement
    let tables = manager.load_layout(later, ServiceCategory::Lunch);
    let t1 = tables.iter().find(|t| t.id == 1).unwrap();
    assert_eq!((t1.row, t1.column), (0, 0));
}
