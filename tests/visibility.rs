mod support;

use support::{list, parent, task, PROJECT};
use taskdeck::filter::{annotate, sort_tasks, SortBy, Visibility};
use taskdeck::graph::TaskGraph;
use taskdeck::model::{StoredList, StoredTask, Task};
use taskdeck::search::{search_tasks, SearchOptions, SearchResults};
use taskdeck::session::ViewToggles;

fn stored(id: i64, task: Task) -> StoredTask {
    StoredTask::new(id, PROJECT, task)
}

fn in_list(mut task: Task, list: i64) -> Task {
    task.list = Some(list);
    task
}

fn done(mut task: Task) -> Task {
    task.fullfilled = true;
    task
}

fn board() -> TaskGraph {
    TaskGraph::build(vec![
        stored(1, in_list(parent("Harvest festival", &[2]), 20)),
        stored(2, in_list(task("Child"), 20)),
        stored(3, done(task("Done in default"))),
        stored(4, done(in_list(task("Done in open list"), 20))),
        stored(5, in_list(parent("Unknown list", &[6]), 99)),
        stored(6, task("Grandchild")),
    ])
}

fn lists() -> Vec<StoredList> {
    vec![
        StoredList::new(10, PROJECT, list("Tasks", true, false, false)),
        StoredList::new(20, PROJECT, list("Open", false, true, true)),
    ]
}

fn everything(graph: &TaskGraph) -> SearchResults {
    search_tasks(graph.tasks(), "", &SearchOptions::default())
}

fn visible_ids(graph: &TaskGraph, lists: &[StoredList], toggles: &ViewToggles) -> Vec<i64> {
    let search = everything(graph);
    Visibility::new(graph, lists, toggles, &search)
        .visible_tasks()
        .iter()
        .map(|task| task.id)
        .collect()
}

#[test]
fn default_toggles_hide_sub_tasks() {
    let graph = board();
    let ids = visible_ids(&graph, &lists(), &ViewToggles::default());
    assert_eq!(ids, vec![1, 4, 5]);
}

#[test]
fn sub_tasks_need_list_and_toggle() {
    let graph = board();
    let toggles = ViewToggles {
        show_sub_tasks: true,
        ..ViewToggles::default()
    };
    let ids = visible_ids(&graph, &lists(), &toggles);
    // 6 falls back to the default list, which hides sub-tasks.
    assert_eq!(ids, vec![1, 2, 4, 5]);
}

#[test]
fn hiding_fullfilled_overrides_list_setting() {
    let graph = board();
    let toggles = ViewToggles {
        show_fullfilled: false,
        ..ViewToggles::default()
    };
    assert_eq!(visible_ids(&graph, &lists(), &toggles), vec![1, 5]);
}

#[test]
fn unknown_list_falls_back_to_default() {
    let graph = board();
    let lists = lists();
    let search = everything(&graph);
    let toggles = ViewToggles::default();
    let visibility = Visibility::new(&graph, &lists, &toggles, &search);

    assert_eq!(visibility.effective_list_id(graph.get(5).expect("task")), Some(10));
    let in_default: Vec<i64> = visibility.visible_in_list(10).iter().map(|task| task.id).collect();
    assert_eq!(in_default, vec![5]);
}

#[test]
fn missing_default_list_hides_completed_and_sub_tasks() {
    let graph = board();
    let only_open = vec![StoredList::new(20, PROJECT, list("Open", false, true, true))];
    let toggles = ViewToggles {
        show_sub_tasks: true,
        ..ViewToggles::default()
    };
    assert_eq!(visible_ids(&graph, &only_open, &toggles), vec![1, 2, 4, 5]);
}

#[test]
fn search_narrows_the_view() {
    let graph = board();
    let lists = lists();
    let search = search_tasks(graph.tasks(), "harvest", &SearchOptions::default());
    let toggles = ViewToggles::default();
    let visibility = Visibility::new(&graph, &lists, &toggles, &search);

    let ids: Vec<i64> = visibility.visible_tasks().iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn name_sort_orders_annotated_tasks() {
    let graph = board();
    let search = everything(&graph);
    let mut annotated = annotate(&graph, &search);
    sort_tasks(&mut annotated, SortBy::Name);

    let names: Vec<&str> = annotated.iter().map(|task| task.task.name.as_str()).collect();
    assert_eq!(names[0], "Child");
    assert_eq!(annotated.iter().find(|task| task.task.id == 2).and_then(|task| task.parent), Some(1));
}
