//! crates/scroll_saga_core/src/navigation.rs
//!
//! Position tracking over a novel's chapter stubs.

use crate::domain::ChapterStub;

/// A navigation request from the reader controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterMove {
    First,
    Last,
    Next,
    Previous,
    Select(u32),
}

/// Tracks which chapter is displayed. Resolving a move never changes the
/// position; callers commit with `move_to` once the content has arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterCursor {
    chapters: Vec<ChapterStub>,
    position: Option<usize>,
}

impl ChapterCursor {
    pub fn new(mut chapters: Vec<ChapterStub>) -> Self {
        chapters.sort_by_key(|stub| stub.number);
        chapters.dedup_by_key(|stub| stub.number);
        Self {
            chapters,
            position: None,
        }
    }

    pub fn chapters(&self) -> &[ChapterStub] {
        &self.chapters
    }

    pub fn current(&self) -> Option<&ChapterStub> {
        self.position.and_then(|index| self.chapters.get(index))
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.position, Some(index) if index > 0)
    }

    pub fn has_next(&self) -> bool {
        matches!(self.position, Some(index) if index + 1 < self.chapters.len())
    }

    /// The chapter number `movement` leads to, or `None` when that control is disabled.
    pub fn resolve(&self, movement: ChapterMove) -> Option<u32> {
        let index = match movement {
            ChapterMove::First => 0,
            ChapterMove::Last => self.chapters.len().checked_sub(1)?,
            ChapterMove::Next => {
                if !self.has_next() {
                    return None;
                }
                self.position? + 1
            }
            ChapterMove::Previous => {
                if !self.has_previous() {
                    return None;
                }
                self.position? - 1
            }
            ChapterMove::Select(number) => self.index_of(number)?,
        };
        self.chapters.get(index).map(|stub| stub.number)
    }

    /// Makes `number` the current chapter. Returns false for unknown numbers.
    pub fn move_to(&mut self, number: u32) -> bool {
        match self.index_of(number) {
            Some(index) => {
                self.position = Some(index);
                true
            }
            None => false,
        }
    }

    fn index_of(&self, number: u32) -> Option<usize> {
        self.chapters.iter().position(|stub| stub.number == number)
    }
}
