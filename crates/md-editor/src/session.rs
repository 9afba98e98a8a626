//! The editing session: scene, history, selection and the active tool.
//!
//! Every committed mutation is preceded by a history snapshot and
//! followed by an [`EditorEvent::DesignChanged`] sent to each subscriber.
//! Pointer gestures (moving elements, drawing a shape) are batched into
//! a single undo step that is committed on pointer-up.

use crate::history::History;
use crate::input::{InputEvent, Modifiers};
use crate::selection::{Selection, SelectionGesture, SelectionMode};
use crate::shortcuts::{Focus, ShortcutAction, ShortcutContext, ShortcutMap};
use crate::tools::{self, ToolDefaults, ToolKind};
use md_core::{CanvasSettings, DesignDocument, DesignElement, EditorConfig, Point, Scene};
use md_render::hit_test;
use smallvec::SmallVec;
use tokio::sync::mpsc;

/// Notifications for the hosting application.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Snapshot of the scene after a committed mutation.
    DesignChanged(Scene),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    BringForward,
    SendBackward,
    BringToFront,
    SendToBack,
}

#[derive(Debug, Clone, Default)]
enum Interaction {
    #[default]
    Idle,
    /// Dragging the selected elements.
    Moving { last: Point },
    /// Growing a freshly placed element.
    Drawing { index: usize, origin: Point },
    Selecting(SelectionGesture),
}

pub struct EditorSession {
    scene: Scene,
    history: History<Scene>,
    selection: Selection,
    tool: ToolKind,
    defaults: ToolDefaults,
    config: EditorConfig,
    focus: Focus,
    interaction: Interaction,
    category: String,
    subscribers: Vec<mpsc::UnboundedSender<EditorEvent>>,
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_scene(Scene::default(), config)
    }

    pub fn with_scene(scene: Scene, config: EditorConfig) -> Self {
        Self {
            scene,
            history: History::new(config.history_depth),
            selection: Selection::new(),
            tool: ToolKind::Select,
            defaults: ToolDefaults::default(),
            config,
            focus: Focus::Canvas,
            interaction: Interaction::Idle,
            category: String::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn from_document(doc: DesignDocument, config: EditorConfig) -> Self {
        let mut session = Self::new(config);
        session.load_document(doc);
        session
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History<Scene> {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.cancel_interaction();
        self.tool = tool;
    }

    pub fn defaults(&self) -> &ToolDefaults {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut ToolDefaults {
        &mut self.defaults
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        if let Interaction::Selecting(_) = self.interaction {
            self.interaction = Interaction::Idle;
        }
        self.selection.set_mode(mode);
    }

    /// Region geometry while a selection drag is in progress.
    pub fn gesture(&self) -> Option<&SelectionGesture> {
        match &self.interaction {
            Interaction::Selecting(g) => Some(g),
            _ => None,
        }
    }

    /// Receive a [`EditorEvent`] for every committed change from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<EditorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self) {
        let event = EditorEvent::DesignChanged(self.scene.clone());
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // ─── Document contract ───────────────────────────────────────────────

    /// Replace the scene with `doc`. History restarts from here.
    pub fn load_document(&mut self, doc: DesignDocument) {
        self.category = doc.category.clone();
        self.scene = Scene::from_document(doc);
        self.history.clear();
        self.selection.clear();
        self.interaction = Interaction::Idle;
        log::debug!("loaded document with {} elements", self.scene.len());
    }

    pub fn document(&self) -> DesignDocument {
        self.scene.to_document(&self.category)
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Append `element` on top and select it. Returns its index.
    pub fn add_element(&mut self, element: DesignElement) -> usize {
        self.settle_interaction();
        self.history.save(&self.scene);
        let index = self.scene.add(element);
        self.selection.set_single(Some(index));
        self.notify();
        index
    }

    /// Place an image (dropped or picked by the host) with its top-left at
    /// `at`, snapped to the grid.
    pub fn insert_image(&mut self, src: impl Into<String>, at: Point) -> usize {
        let at = self.scene.snap(at.x, at.y);
        let element = tools::create_image(src, &self.config, at);
        self.add_element(element)
    }

    /// Inject a ready-made element from an external sticker picker.
    pub fn insert_sticker(&mut self, element: DesignElement) -> usize {
        log::debug!("inserting {} from picker", element.type_name());
        self.add_element(element)
    }

    pub fn update_element(&mut self, index: usize, element: DesignElement) -> bool {
        self.settle_interaction();
        if self.scene.get(index).is_none_or(|current| *current == element) {
            return false;
        }
        self.history.save(&self.scene);
        self.scene.update(index, element);
        self.notify();
        true
    }

    pub fn delete_element(&mut self, index: usize) -> bool {
        self.settle_interaction();
        if index >= self.scene.len() {
            return false;
        }
        self.history.save(&self.scene);
        self.scene.remove(index);
        self.selection.after_remove(index);
        self.notify();
        true
    }

    /// Delete every selected element as one undo step. Returns how many
    /// were removed.
    pub fn delete_selected(&mut self) -> usize {
        self.settle_interaction();
        let len = self.scene.len();
        let doomed: SmallVec<[usize; 8]> = self
            .selection
            .indices()
            .iter()
            .copied()
            .filter(|&i| i < len)
            .collect();
        if doomed.is_empty() {
            return 0;
        }
        self.history.save(&self.scene);
        // Indices are sorted; remove from the top so earlier ones stay valid.
        for &i in doomed.iter().rev() {
            self.scene.remove(i);
        }
        self.selection.clear();
        self.notify();
        doomed.len()
    }

    /// Copy every selected element, offset by the configured amount, and
    /// select the copies.
    pub fn duplicate_selected(&mut self) -> Vec<usize> {
        self.settle_interaction();
        let sources: SmallVec<[usize; 8]> = self
            .selection
            .indices()
            .iter()
            .copied()
            .filter(|&i| i < self.scene.len())
            .collect();
        if sources.is_empty() {
            return Vec::new();
        }
        self.history.save(&self.scene);
        let offset = self.config.duplicate_offset;
        let copies: Vec<usize> = sources
            .iter()
            .filter_map(|&i| self.scene.duplicate(i, offset))
            .collect();
        self.selection.set(copies.iter().copied());
        self.notify();
        copies
    }

    pub fn select_all(&mut self) {
        self.settle_interaction();
        self.selection.set(0..self.scene.len());
    }

    pub fn clear_selection(&mut self) {
        self.settle_interaction();
        self.selection.clear();
    }

    /// Move the primary selected element in the z-order.
    pub fn reorder(&mut self, op: ZOrder) -> Option<usize> {
        self.settle_interaction();
        let index = self.selection.selected_index()?;
        let before = self.scene.clone();
        let moved = match op {
            ZOrder::BringForward => self.scene.bring_forward(index),
            ZOrder::SendBackward => self.scene.send_backward(index),
            ZOrder::BringToFront => self.scene.bring_to_front(index),
            ZOrder::SendToBack => self.scene.send_to_back(index),
        }?;
        self.history.save(&before);
        self.selection.set_single(Some(moved));
        self.notify();
        Some(moved)
    }

    pub fn set_settings(&mut self, settings: CanvasSettings) -> bool {
        self.settle_interaction();
        if self.scene.settings == settings {
            return false;
        }
        self.history.save(&self.scene);
        self.scene.settings = settings;
        self.notify();
        true
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_interaction();
        match self.history.undo(&self.scene) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_interaction();
        match self.history.redo(&self.scene) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, scene: Scene) {
        self.scene = scene;
        // Indices from before the jump may name different elements now.
        self.selection.clear();
        self.notify();
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Handle one input event. Returns whether a redraw is needed.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => {
                self.pointer_down(Point::new(*x, *y), *modifiers)
            }
            InputEvent::PointerMove { x, y, modifiers } => {
                self.pointer_move(Point::new(*x, *y), *modifiers)
            }
            InputEvent::PointerUp { .. } => self.pointer_up(),
            InputEvent::Key { key, modifiers } => {
                match ShortcutMap::resolve(key, *modifiers, self.focus, ShortcutContext::Editor) {
                    Some(action) => self.apply_shortcut(action),
                    None => false,
                }
            }
        }
    }

    fn pointer_down(&mut self, at: Point, modifiers: Modifiers) -> bool {
        self.cancel_interaction();

        if self.tool != ToolKind::Select {
            let snapped = self.scene.snap(at.x, at.y);
            let Some(el) = tools::create_element(self.tool, &self.defaults, &self.config, snapped)
            else {
                return false;
            };
            self.history.begin_batch(&self.scene);
            let index = self.scene.add(el);
            self.selection.set_single(Some(index));
            self.interaction = Interaction::Drawing {
                index,
                origin: snapped,
            };
            return true;
        }

        if self.selection.mode() != SelectionMode::Single {
            self.interaction =
                Interaction::Selecting(SelectionGesture::begin(self.selection.mode(), at));
            return true;
        }

        match hit_test(&self.scene, at.x, at.y) {
            Some(index) => {
                if modifiers.shift {
                    self.selection.toggle(index);
                    // Toggled off: nothing under the pointer to drag.
                    if !self.selection.contains(index) {
                        return true;
                    }
                } else if !self.selection.contains(index) {
                    self.selection.set_single(Some(index));
                }
                self.history.begin_batch(&self.scene);
                self.interaction = Interaction::Moving { last: at };
                true
            }
            None => {
                let had = !self.selection.is_empty();
                self.selection.clear();
                had
            }
        }
    }

    fn pointer_move(&mut self, at: Point, modifiers: Modifiers) -> bool {
        match &mut self.interaction {
            Interaction::Idle => false,
            Interaction::Moving { last } => {
                let (mut dx, mut dy) = (at.x - last.x, at.y - last.y);
                *last = at;
                // Shift: constrain to the dominant axis.
                if modifiers.shift {
                    if dx.abs() > dy.abs() {
                        dy = 0.0;
                    } else {
                        dx = 0.0;
                    }
                }
                for &i in self.selection.indices() {
                    if let Some(el) = self.scene.get_mut(i) {
                        el.translate(dx, dy);
                    }
                }
                true
            }
            Interaction::Drawing { index, origin } => {
                let current = self.scene.snap(at.x, at.y);
                if let Some(el) = self.scene.get_mut(*index) {
                    tools::extend_element(el, *origin, current);
                }
                true
            }
            Interaction::Selecting(gesture) => {
                gesture.update(at);
                true
            }
        }
    }

    fn pointer_up(&mut self) -> bool {
        match std::mem::take(&mut self.interaction) {
            Interaction::Idle => false,
            Interaction::Moving { .. } => {
                self.commit_gesture();
                true
            }
            Interaction::Drawing { index, .. } => {
                if self.scene.get(index).is_some_and(|el| !tools::is_complete(el)) {
                    self.scene.remove(index);
                    self.selection.clear();
                }
                self.commit_gesture();
                true
            }
            Interaction::Selecting(gesture) => {
                self.selection.set(gesture.finish(&self.scene));
                true
            }
        }
    }

    /// Finish any gesture in progress as if the pointer had been released,
    /// so a mutation never lands inside an open batch.
    fn settle_interaction(&mut self) {
        self.pointer_up();
    }

    fn commit_gesture(&mut self) {
        if self.history.end_batch(&self.scene) {
            self.notify();
        }
    }

    /// Abandon an in-progress gesture, reverting any live changes it made.
    fn cancel_interaction(&mut self) -> bool {
        match std::mem::take(&mut self.interaction) {
            Interaction::Idle => false,
            Interaction::Selecting(_) => true,
            Interaction::Moving { .. } | Interaction::Drawing { .. } => {
                if let Some(before) = self.history.cancel_batch() {
                    if before.len() < self.scene.len() {
                        self.selection.clear();
                    }
                    self.scene = before;
                }
                true
            }
        }
    }

    fn apply_shortcut(&mut self, action: ShortcutAction) -> bool {
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selected() > 0,
            ShortcutAction::Duplicate => !self.duplicate_selected().is_empty(),
            ShortcutAction::SelectAll => {
                self.select_all();
                true
            }
            ShortcutAction::Cancel => {
                if self.cancel_interaction() {
                    return true;
                }
                let had = !self.selection.is_empty();
                self.selection.clear();
                had
            }
            ShortcutAction::BringForward => self.reorder(ZOrder::BringForward).is_some(),
            ShortcutAction::SendBackward => self.reorder(ZOrder::SendBackward).is_some(),
            ShortcutAction::BringToFront => self.reorder(ZOrder::BringToFront).is_some(),
            ShortcutAction::SendToBack => self.reorder(ZOrder::SendToBack).is_some(),
            ShortcutAction::ToolSelect => self.switch_tool(ToolKind::Select),
            ShortcutAction::ToolText => self.switch_tool(ToolKind::Text),
            ShortcutAction::ToolRectangle => self.switch_tool(ToolKind::Rectangle),
            ShortcutAction::ToolCircle => self.switch_tool(ToolKind::Circle),
            ShortcutAction::ToolLine => self.switch_tool(ToolKind::Line),
            ShortcutAction::ToolPen => self.switch_tool(ToolKind::Pen),
            ShortcutAction::ToggleDragMode => false,
        }
    }

    fn switch_tool(&mut self, tool: ToolKind) -> bool {
        self.set_tool(tool);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use md_core::{Color, ElementKind};
    use pretty_assertions::assert_eq;

    fn rect(x: f32, y: f32) -> DesignElement {
        DesignElement::new(
            x,
            y,
            ElementKind::Rectangle {
                fill: Color::BLACK,
                stroke: None,
                stroke_width: 1.0,
            },
        )
        .with_size(20.0, 20.0)
    }

    #[test]
    fn drag_is_one_undo_step() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.add_element(rect(0.0, 0.0));
        let steps = session.history().undo_steps();

        session.handle(&InputEvent::pointer_down(10.0, 10.0));
        for i in 1..=5 {
            session.handle(&InputEvent::pointer_move(10.0 + i as f32 * 4.0, 10.0));
        }
        session.handle(&InputEvent::pointer_up(30.0, 10.0));

        assert_eq!(session.scene().get(0).unwrap().x, 20.0);
        assert_eq!(session.history().undo_steps(), steps + 1);
        assert!(session.undo());
        assert_eq!(session.scene().get(0).unwrap().x, 0.0);
    }

    #[test]
    fn click_without_move_records_nothing() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.add_element(rect(0.0, 0.0));
        let steps = session.history().undo_steps();
        session.handle(&InputEvent::pointer_down(5.0, 5.0));
        session.handle(&InputEvent::pointer_up(5.0, 5.0));
        assert_eq!(session.history().undo_steps(), steps);
        assert_eq!(session.selection().selected_index(), Some(0));
    }

    #[test]
    fn escape_reverts_an_active_drag() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.add_element(rect(0.0, 0.0));
        session.handle(&InputEvent::pointer_down(5.0, 5.0));
        session.handle(&InputEvent::pointer_move(50.0, 50.0));
        assert_eq!(session.scene().get(0).unwrap().x, 45.0);

        assert!(session.handle(&InputEvent::key("Escape", Modifiers::NONE)));
        assert_eq!(session.scene().get(0).unwrap().x, 0.0);
        // The pointer-up after cancelling is ignored.
        assert!(!session.handle(&InputEvent::pointer_up(50.0, 50.0)));
    }

    #[test]
    fn drawing_tool_snaps_and_selects() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.set_settings(CanvasSettings {
            grid_enabled: true,
            snap_to_grid: true,
            ..CanvasSettings::default()
        });
        session.set_tool(ToolKind::Rectangle);
        session.handle(&InputEvent::pointer_down(53.0, 47.0));
        session.handle(&InputEvent::pointer_up(53.0, 47.0));

        let el = session.scene().get(0).unwrap();
        assert_eq!((el.x, el.y), (60.0, 40.0));
        assert_eq!(session.selection().indices(), &[0]);
    }

    #[test]
    fn short_pen_stroke_is_discarded() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.set_tool(ToolKind::Pen);
        let steps = session.history().undo_steps();
        session.handle(&InputEvent::pointer_down(10.0, 10.0));
        session.handle(&InputEvent::pointer_up(10.0, 10.0));
        assert!(session.scene().is_empty());
        assert_eq!(session.history().undo_steps(), steps);
    }

    #[test]
    fn delete_clears_selection_and_duplicate_offsets() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.add_element(rect(0.0, 0.0));
        session.add_element(rect(100.0, 0.0));
        session.select_all();
        assert_eq!(session.duplicate_selected(), vec![2, 3]);
        let copy = session.scene().get(3).unwrap();
        assert_eq!((copy.x, copy.y), (120.0, 20.0));

        assert_eq!(session.delete_selected(), 2);
        assert!(session.selection().is_empty());
        assert_eq!(session.scene().len(), 2);
        assert_eq!(session.delete_selected(), 0);
    }

    #[test]
    fn region_mode_replaces_selection() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.add_element(rect(0.0, 0.0));
        session.add_element(rect(200.0, 200.0));
        session.set_selection_mode(SelectionMode::Rectangle);

        session.handle(&InputEvent::pointer_down(-5.0, -5.0));
        session.handle(&InputEvent::pointer_move(50.0, 50.0));
        assert!(session.gesture().is_some());
        session.handle(&InputEvent::pointer_up(50.0, 50.0));
        assert_eq!(session.selection().indices(), &[0]);
        assert!(session.gesture().is_none());
    }

    #[test]
    fn shortcuts_respect_text_focus() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.add_element(rect(0.0, 0.0));
        session.set_focus(Focus::TextInput);
        assert!(!session.handle(&InputEvent::key("z", Modifiers::CTRL)));
        assert_eq!(session.scene().len(), 1);

        session.set_focus(Focus::Canvas);
        assert!(session.handle(&InputEvent::key("z", Modifiers::CTRL)));
        assert!(session.scene().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_every_commit() {
        let mut session = EditorSession::new(EditorConfig::default());
        let mut rx = session.subscribe();
        session.add_element(rect(0.0, 0.0));
        session.update_element(0, rect(5.0, 5.0));
        // Identical update is not a change.
        session.update_element(0, rect(5.0, 5.0));

        let EditorEvent::DesignChanged(first) = rx.recv().await.unwrap();
        assert_eq!(first.len(), 1);
        let EditorEvent::DesignChanged(second) = rx.recv().await.unwrap();
        assert_eq!(second.get(0).unwrap().x, 5.0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn document_round_trip_keeps_category() {
        let mut session = EditorSession::new(EditorConfig::default());
        let mut doc = session.document();
        doc.category = "hoodie".into();
        doc.elements.push(rect(1.0, 2.0));
        session.load_document(doc);
        assert_eq!(session.scene().len(), 1);
        assert!(!session.history().can_undo());
        assert_eq!(session.document().category, "hoodie");
    }

    fn circle(x: f32, y: f32) -> DesignElement {
        DesignElement::new(
            x,
            y,
            ElementKind::Circle {
                fill: Color::BLACK,
                stroke: None,
                stroke_width: 1.0,
            },
        )
        .with_size(10.0, 10.0)
    }

    #[test]
    fn reorder_mid_draw_leaves_other_elements_alone() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.add_element(circle(0.0, 0.0));
        session.set_tool(ToolKind::Rectangle);
        let steps = session.history().undo_steps();

        session.handle(&InputEvent::pointer_down(300.0, 300.0));
        assert!(session.handle(&InputEvent::key("[", Modifiers::CTRL)));
        session.handle(&InputEvent::pointer_move(400.0, 420.0));
        session.handle(&InputEvent::pointer_up(400.0, 420.0));

        let circle = session.scene().get(1).unwrap();
        assert_eq!(circle.type_name(), "circle");
        assert_eq!((circle.x, circle.y), (0.0, 0.0));
        assert_eq!((circle.width, circle.height), (Some(10.0), Some(10.0)));
        assert_eq!(session.scene().get(0).unwrap().type_name(), "rectangle");
        // Drawing and reordering are separate steps.
        assert_eq!(session.history().undo_steps(), steps + 2);
    }

    #[test]
    fn delete_during_drag_stays_in_sync_with_subscribers() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.add_element(rect(0.0, 0.0));
        let mut rx = session.subscribe();

        session.handle(&InputEvent::pointer_down(5.0, 5.0));
        session.handle(&InputEvent::pointer_move(50.0, 50.0));
        assert!(session.handle(&InputEvent::key("Delete", Modifiers::NONE)));
        session.handle(&InputEvent::key("Escape", Modifiers::NONE));
        session.handle(&InputEvent::pointer_up(50.0, 50.0));

        assert!(session.scene().is_empty());
        let mut last = None;
        while let Ok(EditorEvent::DesignChanged(scene)) = rx.try_recv() {
            last = Some(scene);
        }
        assert_eq!(last.as_ref(), Some(session.scene()));

        // The drag and the delete undo separately.
        assert!(session.undo());
        assert_eq!(session.scene().get(0).unwrap().x, 45.0);
        assert!(session.undo());
        assert_eq!(session.scene().get(0).unwrap().x, 0.0);
    }

    #[test]
    fn shift_click_deselect_does_not_start_a_drag() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.add_element(rect(0.0, 0.0));
        session.add_element(rect(100.0, 0.0));
        session.select_all();

        session.handle(&InputEvent::PointerDown {
            x: 5.0,
            y: 5.0,
            modifiers: Modifiers::SHIFT,
        });
        assert_eq!(session.selection().indices(), &[1]);
        assert!(!session.handle(&InputEvent::pointer_move(40.0, 5.0)));
        assert_eq!(session.scene().get(1).unwrap().x, 100.0);
    }

    #[test]
    fn inserted_images_get_the_default_box() {
        let mut session = EditorSession::new(EditorConfig::default());
        let index = session.insert_image("logo.png", Point::new(12.0, 8.0));
        let el = session.scene().get(index).unwrap();
        assert_eq!(el.image_source(), Some("logo.png"));
        assert_eq!((el.width, el.height), (Some(100.0), Some(100.0)));
        assert_eq!(session.selection().selected_index(), Some(index));
    }
}
