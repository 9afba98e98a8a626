//! Selection state and in-progress region gestures.

use md_core::{Point, Scene};
use md_render::{select_in_circle, select_in_freeform, select_in_rect};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Single,
    Rectangle,
    Circle,
    Freeform,
}

/// Selected element indices, kept sorted and unique. The first index
/// doubles as the single-mode `selected_index`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    mode: SelectionMode,
    indices: SmallVec<[usize; 8]>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    pub fn set_single(&mut self, index: Option<usize>) {
        self.indices.clear();
        self.indices.extend(index);
    }

    /// Replace the selection.
    pub fn set(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.indices = indices.into_iter().collect();
        self.indices.sort_unstable();
        self.indices.dedup();
    }

    pub fn toggle(&mut self, index: usize) {
        match self.indices.binary_search(&index) {
            Ok(pos) => {
                self.indices.remove(pos);
            }
            Err(pos) => self.indices.insert(pos, index),
        }
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Re-resolve after element `removed` was deleted from the scene.
    pub fn after_remove(&mut self, removed: usize) {
        self.indices.retain(|i| *i != removed);
        for i in self.indices.iter_mut() {
            if *i > removed {
                *i -= 1;
            }
        }
    }
}

/// Region geometry that exists only while a selection drag is active.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionGesture {
    pub mode: SelectionMode,
    pub start: Point,
    pub end: Point,
    /// Sampled pointer positions, freeform mode only.
    pub path: Vec<Point>,
}

impl SelectionGesture {
    pub fn begin(mode: SelectionMode, at: Point) -> Self {
        Self {
            mode,
            start: at,
            end: at,
            path: if mode == SelectionMode::Freeform {
                vec![at]
            } else {
                Vec::new()
            },
        }
    }

    pub fn update(&mut self, at: Point) {
        self.end = at;
        if self.mode == SelectionMode::Freeform {
            self.path.push(at);
        }
    }

    /// Indices selected by the finished gesture.
    pub fn finish(&self, scene: &Scene) -> Vec<usize> {
        match self.mode {
            SelectionMode::Rectangle => select_in_rect(scene, self.start, self.end),
            SelectionMode::Circle => select_in_circle(scene, self.start, self.end),
            SelectionMode::Freeform => select_in_freeform(scene, &self.path),
            SelectionMode::Single => md_render::hit_test(scene, self.end.x, self.end.y)
                .into_iter()
                .collect(),
        }
    }
}
