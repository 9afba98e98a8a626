use md_core::{Color, DesignElement, EditorConfig, ElementKind};
use md_editor::{EditorSession, History, InputEvent, Modifiers};
use pretty_assertions::assert_eq;

fn rect(x: f32) -> DesignElement {
    DesignElement::new(
        x,
        0.0,
        ElementKind::Rectangle {
            fill: Color::BLACK,
            stroke: None,
            stroke_width: 1.0,
        },
    )
    .with_size(10.0, 10.0)
}

/// Apply `n` alternating adds and moves.
fn mutate(session: &mut EditorSession, n: usize) {
    for i in 0..n {
        if i % 3 == 2 && !session.scene().is_empty() {
            let last = session.scene().len() - 1;
            let moved = session.scene().get(last).unwrap().translated(5.0, 5.0);
            assert!(session.update_element(last, moved));
        } else {
            session.add_element(rect(i as f32 * 15.0));
        }
    }
}

#[test]
fn undo_inverts_any_short_sequence() {
    for n in [1, 7, 23, 50] {
        let mut session = EditorSession::new(EditorConfig::default());
        session.add_element(rect(-100.0));
        let original = session.scene().clone();

        mutate(&mut session, n);
        for _ in 0..n {
            assert!(session.undo());
        }
        assert_eq!(session.scene(), &original, "after {n} mutations");
    }
}

#[test]
fn redo_replays_what_undo_took() {
    let mut session = EditorSession::new(EditorConfig::default());
    mutate(&mut session, 6);
    let latest = session.scene().clone();

    for _ in 0..4 {
        session.undo();
    }
    for _ in 0..4 {
        assert!(session.redo());
    }
    assert_eq!(session.scene(), &latest);
    assert!(!session.redo());
}

#[test]
fn new_mutation_discards_redo_branch() {
    let mut session = EditorSession::new(EditorConfig::default());
    mutate(&mut session, 4);
    session.undo();
    session.undo();
    assert!(session.history().can_redo());

    session.add_element(rect(999.0));
    assert!(!session.history().can_redo());
    assert!(!session.redo());
}

#[test]
fn depth_is_capped_at_fifty_steps() {
    let mut session = EditorSession::new(EditorConfig::default());
    mutate(&mut session, 60);

    let mut undone = 0;
    while session.undo() {
        undone += 1;
    }
    assert_eq!(undone, 50);
}

#[test]
fn keyboard_undo_and_redo() {
    let mut session = EditorSession::new(EditorConfig::default());
    session.add_element(rect(0.0));
    session.add_element(rect(20.0));

    assert!(session.handle(&InputEvent::key("z", Modifiers::CTRL)));
    assert_eq!(session.scene().len(), 1);
    let redo = Modifiers {
        ctrl: true,
        shift: true,
        ..Modifiers::NONE
    };
    assert!(session.handle(&InputEvent::key("Z", redo)));
    assert_eq!(session.scene().len(), 2);
    assert!(session.handle(&InputEvent::key("z", Modifiers::CTRL)));
    assert!(session.handle(&InputEvent::key("y", Modifiers::CTRL)));
    assert_eq!(session.scene().len(), 2);
}

#[test]
fn batch_restores_start_on_cancel() {
    let mut history: History<Vec<u32>> = History::new(10);
    let mut live = vec![1];
    history.save(&live);
    live.push(2);

    history.begin_batch(&live);
    live.push(3);
    live.push(4);
    assert_eq!(history.cancel_batch(), Some(vec![1, 2]));
    assert!(!history.is_batching());
    assert_eq!(history.undo(&vec![1, 2]), Some(vec![1]));
}
