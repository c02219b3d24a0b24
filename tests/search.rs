mod support;

use support::{task, PROJECT};
use taskdeck::config::SearchConfig;
use taskdeck::model::{StoredTask, Task};
use taskdeck::search::{search_tasks, SearchOptions};

fn stored(id: i64, task: Task) -> StoredTask {
    StoredTask::new(id, PROJECT, task)
}

#[test]
fn substring_match_scores_by_weight_and_length() {
    let tasks = vec![stored(1, task("Buy milk")), stored(2, task("Clean house"))];
    let results = search_tasks(&tasks, "milk", &SearchOptions::default());

    assert_eq!(results.len(), 1);
    assert!(results.contains(1));
    assert!(!results.contains(2));
    let score = results.score(1).expect("scored");
    assert!((score - 0.2824).abs() < 0.005, "score was {score}");
}

#[test]
fn exact_names_rank_before_partial_matches() {
    let tasks = vec![
        stored(1, task("Choir rehearsal notes")),
        stored(2, task("Choir rehearsal")),
    ];
    let results = search_tasks(&tasks, "choir rehearsal", &SearchOptions::default());

    let order: Vec<i64> = results.hits().iter().map(|hit| hit.id).collect();
    assert_eq!(order, vec![2, 1]);
}

#[test]
fn description_contributes_matches() {
    let mut rehearsal = task("Rehearsal");
    rehearsal.description = Some("bring sheet music".to_string());
    let tasks = vec![stored(1, rehearsal), stored(2, task("Clean house"))];
    let results = search_tasks(&tasks, "sheet music", &SearchOptions::default());

    assert!(results.contains(1));
    assert!(!results.contains(2));
}

#[test]
fn empty_query_returns_everything_unscored() {
    let tasks = vec![stored(1, task("Buy milk")), stored(2, task("Clean house"))];
    let results = search_tasks(&tasks, "", &SearchOptions::default());

    assert_eq!(results.len(), 2);
    assert!(results.hits().iter().all(|hit| hit.score.is_none()));
}

#[test]
fn threshold_comes_from_config() {
    let strict = SearchOptions::new(&SearchConfig {
        threshold: 0.0,
        ..SearchConfig::default()
    });
    let tasks = vec![stored(1, task("Newsletter"))];

    assert!(search_tasks(&tasks, "newsleter", &SearchOptions::default()).contains(1));
    assert!(search_tasks(&tasks, "newsleter", &strict).is_empty());
}
